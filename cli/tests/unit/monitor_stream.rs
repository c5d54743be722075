//! Unit tests for the install output monitor driving a real subprocess.
//!
//! `sh` stands in for pip: the monitor only sees a line stream and an exit
//! code, so a script that prints pip-shaped lines exercises the whole path.

#![allow(clippy::expect_used)]

use std::process::Stdio;

use pipgate_cli::monitor::monitor_child;
use tokio::process::{Child, Command};

fn sh(script: &str) -> Child {
    Command::new("sh")
        .arg("-c")
        .arg(script)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .expect("spawn sh")
}

const BLOCK_LINE: &str = "ERROR: HTTP error 403 while getting \
     http://127.0.0.1:8000/pypi/packages/numpy-2.3.5-cp313-cp313-win_amd64.whl.metadata";

#[tokio::test]
async fn test_monitor_reports_blocked_package_when_pip_fails() {
    let child = sh(&format!("echo 'Collecting numpy'; echo '{BLOCK_LINE}'; exit 7"));
    let report = monitor_child(child).await.expect("monitor");
    assert_eq!(report.exit_code, 7);
    assert_eq!(report.blocked.len(), 1);
    assert_eq!(report.blocked[0].name, "numpy");
    assert_eq!(report.blocked[0].version, "2.3.5");
}

#[tokio::test]
async fn test_monitor_reports_nothing_when_pip_succeeds() {
    // a stray block signal with a zero exit is not surfaced
    let child = sh(&format!("echo '{BLOCK_LINE}'; exit 0"));
    let report = monitor_child(child).await.expect("monitor");
    assert_eq!(report.exit_code, 0);
    assert!(report.blocked.is_empty());
}

#[tokio::test]
async fn test_monitor_scans_stderr_as_well() {
    let child = sh(&format!("echo '{BLOCK_LINE}' 1>&2; exit 1"));
    let report = monitor_child(child).await.expect("monitor");
    assert_eq!(report.exit_code, 1);
    assert_eq!(report.blocked.len(), 1);
}

#[tokio::test]
async fn test_monitor_deduplicates_across_both_streams() {
    let child = sh(&format!("echo '{BLOCK_LINE}'; echo '{BLOCK_LINE}' 1>&2; exit 1"));
    let report = monitor_child(child).await.expect("monitor");
    assert_eq!(report.blocked.len(), 1);
}

#[tokio::test]
async fn test_monitor_propagates_exit_code_without_signals() {
    let child = sh("echo 'Successfully installed requests-2.32.0'; exit 3");
    let report = monitor_child(child).await.expect("monitor");
    assert_eq!(report.exit_code, 3);
    assert!(report.blocked.is_empty());
}

#[tokio::test]
async fn test_monitor_drains_output_larger_than_a_pipe_buffer() {
    // 256 KiB of output; the monitor must keep reading while the child
    // writes or the child would block on a full pipe
    let child = sh("i=0; while [ $i -lt 4096 ]; do \
         echo 'Downloading something-with-a-reasonably-long-line-of-output'; \
         i=$((i+1)); done; exit 0");
    let report = monitor_child(child).await.expect("monitor");
    assert_eq!(report.exit_code, 0);
}
