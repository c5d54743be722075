//! Check command — firewall reachability probe.

use anyhow::Result;
use clap::Args;

use crate::firewall::FirewallClient;
use crate::output::{OutputContext, progress};

/// Arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {
    /// Firewall API URL (defaults to PIPGATE_FIREWALL_URL or the loopback default)
    #[arg(long)]
    pub url: Option<String>,
}

/// Run `pipgate check`. Exit code 0 when the firewall answers, 1 otherwise.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub async fn run(ctx: &OutputContext, args: CheckArgs, default_url: &str) -> Result<i32> {
    let url = args.url.as_deref().unwrap_or(default_url);
    let client = FirewallClient::new(url)?;

    let spinner = ctx
        .show_progress()
        .then(|| progress::spinner("Checking firewall connectivity"));
    let reachable = client.check_connectivity().await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    if reachable {
        ctx.success(&format!("Firewall is reachable at {}", client.base_url()));
        Ok(0)
    } else {
        ctx.error(&format!(
            "Firewall is not reachable at {}",
            client.base_url()
        ));
        ctx.kv("Hint", "make sure the package firewall is running");
        Ok(1)
    }
}
