//! pip subprocess wrapper.
//!
//! pip is a black box here: this module only assembles its argument list and
//! spawns it with both output streams piped for the monitor. Validation has
//! already happened by the time anything in this module runs.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Child;

/// Program run when no override is configured.
pub const DEFAULT_PIP_PROGRAM: &str = "pip";

/// An assembled `pip install` invocation.
#[derive(Debug)]
pub struct PipInstall {
    /// Program to execute (normally `pip`; tests substitute a stub).
    pub program: String,
    /// Package specifiers, used when no requirements file is given.
    pub packages: Vec<String>,
    /// Requirements file forwarded as `-r <path>`.
    pub requirement: Option<String>,
    pub upgrade: bool,
    pub index_url: Option<String>,
    pub extra_index_url: Option<String>,
    pub trusted_host: Option<String>,
    pub no_deps: bool,
}

impl Default for PipInstall {
    fn default() -> Self {
        Self {
            program: DEFAULT_PIP_PROGRAM.to_string(),
            packages: Vec::new(),
            requirement: None,
            upgrade: false,
            index_url: None,
            extra_index_url: None,
            trusted_host: None,
            no_deps: false,
        }
    }
}

impl PipInstall {
    /// Argument vector passed to the program, starting with `install`.
    ///
    /// A requirements file replaces the positional package list; everything
    /// else is appended only when set.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["install".to_string()];
        if let Some(requirement) = &self.requirement {
            args.push("-r".to_string());
            args.push(requirement.clone());
        } else {
            args.extend(self.packages.iter().cloned());
        }
        if self.upgrade {
            args.push("--upgrade".to_string());
        }
        if let Some(url) = &self.index_url {
            args.push("--index-url".to_string());
            args.push(url.clone());
        }
        if let Some(url) = &self.extra_index_url {
            args.push("--extra-index-url".to_string());
            args.push(url.clone());
        }
        if let Some(host) = &self.trusted_host {
            args.push("--trusted-host".to_string());
            args.push(host.clone());
        }
        if self.no_deps {
            args.push("--no-deps".to_string());
        }
        args
    }

    /// Spawn the install with both output streams piped for the monitor.
    /// `kill_on_drop` is set as a safety net; the normal path waits for exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the process fails to spawn.
    pub fn spawn(&self) -> Result<Child> {
        tokio::process::Command::new(&self.program)
            .args(self.to_args())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.program))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
