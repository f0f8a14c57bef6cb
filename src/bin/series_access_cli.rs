//!
//! series_access CLI binary
//! ------------------------
//! Inspect and change series ACLs on an admin node from the command line:
//! list the built-in templates, show how a series' ACL classifies, switch a
//! series to a template and browse the role directory.

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use series_access::cli::commands::{self, Command};
use series_access::client::HttpAdminApi;
use series_access::config::AdminConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("invalid log filter")?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "series_access_cli".to_string());
    let args: Vec<String> = args.collect();

    let invocation = match commands::parse(&args) {
        Ok(inv) => inv,
        Err(e) => {
            eprintln!("{}", e.message());
            eprintln!("{}", commands::usage(&program));
            std::process::exit(2);
        }
    };
    if invocation.command == Command::Help {
        eprintln!("{}", commands::usage(&program));
        return Ok(());
    }

    let cfg = AdminConfig::load()
        .context("Failed to load configuration")?
        .merged(&invocation.overrides);
    info!(target: "series_access", "admin node {}", cfg.base_url);
    let api = Arc::new(HttpAdminApi::new(&cfg).context("Failed to build HTTP client")?);

    let out = commands::run(api, &cfg, &invocation.command).await?;
    println!("{}", out.trim_end());
    Ok(())
}
