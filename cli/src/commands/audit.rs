//! Audit command — ask the firewall whether (and why) a package is blocked.

use anyhow::{Context, Result};
use clap::Args;

use crate::firewall::{BlockStatus, FirewallClient};
use crate::output::{OutputContext, progress};
use crate::package::PackageRef;

/// Arguments for the audit command.
#[derive(Args)]
pub struct AuditArgs {
    /// Package name to audit (a pinned version is ignored)
    pub package: String,

    /// Print the firewall's normalized response as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run `pipgate audit`. Exits non-zero only when the firewall could not be
/// queried.
///
/// # Errors
///
/// Returns an error if the specifier is malformed or JSON output fails.
pub async fn run(ctx: &OutputContext, args: AuditArgs, firewall_url: &str) -> Result<i32> {
    let package = PackageRef::parse(&args.package)?;
    let client = FirewallClient::new(firewall_url)?;

    let spinner = ctx
        .show_progress()
        .then(|| progress::spinner(&format!("Checking {}", package.name)));
    let info = client.blocked_info(&package.name).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&info).context("JSON serialization")?
        );
        return Ok(i32::from(info.status == BlockStatus::Error));
    }

    match info.status {
        BlockStatus::Blocked => {
            let reason = if info.reasons.is_empty() {
                "No specific reason provided".to_string()
            } else {
                info.reasons.join("; ")
            };
            ctx.blocked_panel(
                &info.package,
                &format!("{} version(s)", info.blocked_versions),
                &reason,
                &client.audit_url(&info.package),
            );
            if !info.blocked_versions_list.is_empty() {
                ctx.kv("Blocked versions", &info.blocked_versions_list.join(", "));
            }
            Ok(0)
        }
        BlockStatus::Allowed => {
            ctx.success(&format!("Package '{}' is allowed", info.package));
            ctx.kv("Blocked versions", "none");
            Ok(0)
        }
        BlockStatus::Error => {
            ctx.error(&format!(
                "Error checking package: {}",
                info.error.as_deref().unwrap_or("unknown error")
            ));
            Ok(1)
        }
        BlockStatus::Unknown => {
            ctx.warn(&format!(
                "Package status unknown: {}",
                info.error.as_deref().unwrap_or("no detail")
            ));
            Ok(1)
        }
    }
}
