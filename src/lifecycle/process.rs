//! Process boundary for nginx invocations.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::CommandError;

/// Runs an external command to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, binary: &Path, args: &[OsString]) -> Result<(), CommandError>;
}

/// Runs commands as real child processes with inherited stdout/stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, binary: &Path, args: &[OsString]) -> Result<(), CommandError> {
        let shown = binary.display().to_string();
        tracing::debug!(binary = %shown, ?args, "Running command");

        let status = Command::new(binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| CommandError::Spawn {
                binary: shown.clone(),
                source,
            })?;

        if !status.success() {
            return Err(CommandError::Exit {
                binary: shown,
                status,
            });
        }
        Ok(())
    }
}
