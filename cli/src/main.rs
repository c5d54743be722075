//! pipgate - secure pip wrapper gated by a package firewall

use clap::Parser;

use pipgate_cli::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match cli.run().await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
