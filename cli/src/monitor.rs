//! Install output monitor — scans pip's live output for firewall blocks.
//!
//! The authoritative allow/block decision happens before pip is spawned; this
//! monitor is a secondary safety net that catches blocks pip hits on its own,
//! e.g. for a transitive dependency that was never explicitly validated. Every
//! line is forwarded unchanged so the user still sees pip's real progress.

use std::fmt;

use anyhow::{Context, Result};
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;

/// Markers pip emits when the index answers a download with 403.
const BLOCK_SIGNALS: [&str; 2] = ["HTTP error 403", "403 Client Error: Forbidden"];

/// Shape of a package download URL on a block-signal line, e.g.
/// `/packages/numpy-2.3.5-cp313-cp313-win_amd64.whl.metadata`.
///
/// The name/version split at the first `-` followed by a digit is a
/// heuristic: it can mis-split names with digit-led hyphenated segments.
/// A stricter pattern would silently drop legitimate detections.
const PACKAGE_URL_PATTERN: &str = r"/packages/([a-zA-Z0-9_-]+)-([\d.]+[a-zA-Z0-9.]*)";

/// A package/version pair extracted from a blocked download URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedPackage {
    /// Lower-cased package name.
    pub name: String,
    /// Version as extracted, not re-validated.
    pub version: String,
}

impl fmt::Display for BlockedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=={}", self.name, self.version)
    }
}

// ── Line scanner ──────────────────────────────────────────────────────────────

/// Scans install output lines for block signals, collecting offending
/// packages into an insertion-ordered set deduplicated by `(name, version)`.
pub struct InstallScan {
    package_url: Regex,
    blocked: Vec<BlockedPackage>,
}

impl InstallScan {
    /// # Panics
    ///
    /// Panics if the extraction pattern is invalid (it is a compile-time
    /// constant and will not panic).
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn new() -> Self {
        Self {
            package_url: Regex::new(PACKAGE_URL_PATTERN).expect("valid pattern"),
            blocked: Vec::new(),
        }
    }

    /// Inspect one line of install output. Signal lines without an
    /// extractable package URL are observed but add no record.
    pub fn observe(&mut self, line: &str) {
        if !BLOCK_SIGNALS.iter().any(|signal| line.contains(signal)) {
            return;
        }
        let Some(caps) = self.package_url.captures(line) else {
            return;
        };
        let record = BlockedPackage {
            name: caps[1].to_lowercase(),
            version: caps[2].to_string(),
        };
        if !self.blocked.contains(&record) {
            self.blocked.push(record);
        }
    }

    /// Records collected so far, in first-occurrence order.
    #[must_use]
    pub fn blocked(&self) -> &[BlockedPackage] {
        &self.blocked
    }

    /// Surface the collected set only when the subprocess actually failed;
    /// a zero exit means pip recovered (or nothing was blocked) and the
    /// records are not reported.
    #[must_use]
    pub fn finish(self, exit_code: i32) -> Vec<BlockedPackage> {
        if exit_code == 0 {
            Vec::new()
        } else {
            self.blocked
        }
    }
}

impl Default for InstallScan {
    fn default() -> Self {
        Self::new()
    }
}

// ── Stream driver ─────────────────────────────────────────────────────────────

/// Report produced after the monitored subprocess exits.
#[derive(Debug)]
pub struct InstallReport {
    /// The subprocess's real exit code, propagated unchanged.
    pub exit_code: i32,
    /// Blocked packages surfaced by [`InstallScan::finish`].
    pub blocked: Vec<BlockedPackage>,
}

/// Stream a child's stdout and stderr through the scanner as one interleaved
/// line stream, forwarding every line unchanged, then wait for the exit code.
///
/// Both pipes are read concurrently with the child running, so the child
/// never blocks on a full pipe buffer and the user sees progress live.
///
/// # Errors
///
/// Returns an error if waiting on the child fails.
pub async fn monitor_child(mut child: Child) -> Result<InstallReport> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    // One forwarding task per pipe, both feeding a single channel: the
    // scanner sees the combined stream in arrival order.
    let (tx, mut rx) = mpsc::channel::<String>(64);
    let stdout_task = stdout.map(|out| tokio::spawn(forward_lines(out, tx.clone())));
    let stderr_task = stderr.map(|err| tokio::spawn(forward_lines(err, tx.clone())));
    drop(tx);

    let mut scan = InstallScan::new();
    while let Some(line) = rx.recv().await {
        println!("{line}");
        scan.observe(&line);
    }
    if let Some(task) = stdout_task {
        let _ = task.await;
    }
    if let Some(task) = stderr_task {
        let _ = task.await;
    }

    let status = child.wait().await.context("waiting for pip")?;
    // `code()` is None when the child died to a signal; report failure.
    let exit_code = status.code().unwrap_or(1);
    Ok(InstallReport {
        exit_code,
        blocked: scan.finish(exit_code),
    })
}

async fn forward_lines<R>(reader: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).await.is_err() {
            break;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
