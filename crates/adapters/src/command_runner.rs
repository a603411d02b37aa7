// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Shell-command capability consumed by the Dependency Resolver (spec.md
//! §4.4 step 4: "execute the unioned commands in order"). Distinct from
//! [`crate::child::ChildSpawner`] — these are short environment-setup
//! commands (`npm i`, `cargo fetch`), not the long-lived agent executor.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command `{command}` exited with {code:?}: {stderr}")]
    Failed { command: String, code: Option<i32>, stderr: String },

    #[error("io error running command: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs one resolution command to completion in `cwd` (spec.md §4.4).
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, cwd: &Path, command: &str) -> Result<(), CommandError>;
}

/// Runs commands through `/bin/sh -c`, the same invocation shape the
/// blocked lane's own environment-setup `commands` are written against.
pub struct ShellCommandRunner;

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(&self, cwd: &Path, command: &str) -> Result<(), CommandError> {
        let output = Command::new("/bin/sh").arg("-c").arg(command).current_dir(cwd).output().await?;
        if !output.status.success() {
            return Err(CommandError::Failed {
                command: command.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "command_runner_tests.rs"]
mod tests;
