//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use crate::firewall::DEFAULT_FIREWALL_URL;
use crate::pip::DEFAULT_PIP_PROGRAM;

/// Secure pip wrapper gated by a package firewall
#[derive(Parser)]
#[command(
    name = "pipgate",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install packages after firewall validation
    Install(commands::install::InstallArgs),

    /// Show whether a package is blocked and why
    Audit(commands::audit::AuditArgs),

    /// Check that the firewall is reachable
    Check(commands::check::CheckArgs),

    /// Show version
    Version {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

/// Resolve the firewall base URL from the environment.
///
/// The core client never reads the environment itself; the override is
/// resolved here and passed down by value.
#[must_use]
pub fn firewall_url() -> String {
    std::env::var("PIPGATE_FIREWALL_URL").unwrap_or_else(|_| DEFAULT_FIREWALL_URL.to_string())
}

/// Resolve the pip program from the environment (stubbed out in tests).
#[must_use]
pub fn pip_program() -> String {
    std::env::var("PIPGATE_PIP").unwrap_or_else(|_| DEFAULT_PIP_PROGRAM.to_string())
}

impl Cli {
    /// Execute the CLI command, returning the process exit code.
    ///
    /// # Errors
    ///
    /// Returns an error if a command fails before it can produce an exit
    /// code (bad arguments, unreadable files, pip failing to spawn).
    pub async fn run(self) -> Result<i32> {
        let Cli {
            quiet,
            no_color,
            command,
        } = self;
        let ctx = crate::output::OutputContext::new(no_color, quiet);
        match command {
            Command::Install(args) => {
                commands::install::run(&ctx, args, &firewall_url(), &pip_program()).await
            }
            Command::Audit(args) => commands::audit::run(&ctx, args, &firewall_url()).await,
            Command::Check(args) => commands::check::run(&ctx, args, &firewall_url()).await,
            Command::Version { json } => {
                commands::version::run(json);
                Ok(0)
            }
        }
    }
}
