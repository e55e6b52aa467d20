// src/config/mod.rs

//! Configuration loading and validation for changetar.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load an optional config file from disk (`loader.rs`).
//! - Validate values before they reach the observer (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, resolve_config};
pub use model::{ArchiveSection, ConfigFile, ObserveSection, RawConfigFile};
