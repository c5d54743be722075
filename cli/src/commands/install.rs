//! Install command — firewall validation first, then pip.
//!
//! Flow: resolve the package list (arguments or requirements file), validate
//! each package sequentially against the firewall (short-circuit on the first
//! block), then hand the list to pip and monitor its output for blocks the
//! pre-check could not see (transitive dependencies).

use std::path::Path;

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize as _;

use crate::firewall::FirewallClient;
use crate::monitor;
use crate::output::{OutputContext, progress};
use crate::package::{self, PackageRef};
use crate::pip::PipInstall;

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Package(s) to install (e.g. requests, keras==3.11.2)
    pub packages: Vec<String>,

    /// Skip security validation (use with caution)
    #[arg(short, long)]
    pub force: bool,

    /// Upgrade package to the newest available version
    #[arg(short = 'U', long)]
    pub upgrade: bool,

    /// Install from the given requirements file
    #[arg(short = 'r', long)]
    pub requirement: Option<String>,

    /// Base URL of the package index, passed through to pip
    #[arg(short = 'i', long)]
    pub index_url: Option<String>,

    /// Extra index URL, passed through to pip
    #[arg(long)]
    pub extra_index_url: Option<String>,

    /// Mark this host as trusted, passed through to pip
    #[arg(long)]
    pub trusted_host: Option<String>,

    /// Don't install package dependencies
    #[arg(long)]
    pub no_deps: bool,
}

/// Run `pipgate install`. Returns the process exit code: pip's own code once
/// pip ran, 1 when validation blocked the install.
///
/// # Errors
///
/// Returns an error if no packages were given, the requirements file is
/// unreadable, a specifier is malformed, or pip cannot be spawned.
pub async fn run(
    ctx: &OutputContext,
    args: InstallArgs,
    firewall_url: &str,
    pip_program: &str,
) -> Result<i32> {
    let specs = if let Some(requirement) = &args.requirement {
        package::read_requirements(Path::new(requirement))?
    } else {
        args.packages.clone()
    };
    if specs.is_empty() {
        anyhow::bail!("no packages specified; pass a package or -r requirements.txt");
    }

    if args.force {
        ctx.warn("Skipping security validation (--force)");
    } else if !validate_all(ctx, &specs, firewall_url).await? {
        ctx.error("Installation aborted due to security policy violations");
        return Ok(1);
    }

    ctx.info(&format!("Installing {}", specs.join(", ")));
    let pip = PipInstall {
        program: pip_program.to_string(),
        packages: if args.requirement.is_some() {
            Vec::new()
        } else {
            specs
        },
        requirement: args.requirement,
        upgrade: args.upgrade,
        index_url: args.index_url,
        extra_index_url: args.extra_index_url,
        trusted_host: args.trusted_host,
        no_deps: args.no_deps,
    };

    let child = pip.spawn()?;
    let report = monitor::monitor_child(child).await?;

    if !report.blocked.is_empty() {
        println!();
        ctx.error(&format!(
            "Firewall blocked {} package(s)",
            report.blocked.len()
        ));
        for pkg in &report.blocked {
            println!("  {} {pkg}", "✗".style(ctx.styles.error));
        }
        println!();
        ctx.info(&format!(
            "For details, run: pipgate audit {}",
            report.blocked[0].name
        ));
    }

    Ok(report.exit_code)
}

/// Validate every specifier in order against one shared client, stopping at
/// the first block. Returns whether all packages passed.
async fn validate_all(ctx: &OutputContext, specs: &[String], firewall_url: &str) -> Result<bool> {
    let client = FirewallClient::new(firewall_url)?;

    for spec in specs {
        let package = PackageRef::parse(spec)?;
        let spinner = ctx
            .show_progress()
            .then(|| progress::spinner(&format!("Checking {spec}")));

        let result = client.validate(&package.name, package.version.as_deref()).await;

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        if result.is_blocked() {
            let name = package.name.to_lowercase();
            ctx.blocked_panel(
                &name,
                package.version.as_deref().unwrap_or("latest"),
                &result.reason,
                &client.audit_url(&name),
            );
            return Ok(false);
        }
        ctx.success(&format!("{spec} passed validation"));
    }

    Ok(true)
}
