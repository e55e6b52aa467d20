// src/exec/mod.rs

//! Process execution layer.
//!
//! The CLI's unit of work is an external command, run with
//! `tokio::process::Command` while the observer watches the root.

pub mod command;

pub use command::CommandWork;
