// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

use super::*;
use tempfile::tempdir;

#[tokio::test]
async fn runs_successful_command() {
    let dir = tempdir().unwrap();
    let runner = ShellCommandRunner;
    runner.run(dir.path(), "exit 0").await.unwrap();
}

#[tokio::test]
async fn surfaces_non_zero_exit_with_stderr() {
    let dir = tempdir().unwrap();
    let runner = ShellCommandRunner;
    let err = runner.run(dir.path(), "echo boom 1>&2; exit 1").await.unwrap_err();
    assert!(format!("{err}").contains("boom") || matches!(err, CommandError::Failed { .. }));
}
