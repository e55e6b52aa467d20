// src/exec/command.rs

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, bail};
use tokio::process::Command;
use tracing::info;

use crate::errors::{ChangetarError, Result};

/// An external command run as the observed unit of work.
///
/// The program is executed directly (no shell) with the observation root as
/// its working directory and the parent's stdio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandWork {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
}

impl CommandWork {
    /// `argv[0]` is the program, the rest are its arguments.
    pub fn from_argv(argv: &[String], cwd: impl Into<PathBuf>) -> Result<Self> {
        let Some((program, args)) = argv.split_first() else {
            return Err(ChangetarError::ConfigError(
                "no command given to run".to_string(),
            ));
        };
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            cwd: cwd.into(),
        })
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// The command line, space separated, for logs and messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion. A non-zero exit status is an error.
    pub async fn run(&self) -> anyhow::Result<()> {
        let cmdline = self.display();
        info!(cmd = %cmdline, cwd = ?self.cwd, "starting command");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning `{cmdline}`"))?;

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for `{cmdline}`"))?;

        let code = status.code().unwrap_or(-1);
        info!(cmd = %cmdline, exit_code = code, success = status.success(), "command exited");

        if !status.success() {
            bail!("`{cmdline}` exited with status {code}");
        }
        Ok(())
    }
}
