//! CLI for the waitlist API client.

mod commands;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use waitlist_core::config::{self, WaitlistConfig};
use waitlist_core::retry::RetryPolicy;
use waitlist_core::transport::HttpTransport;
use waitlist_core::waitlist::WaitlistClient;

use commands::{run_config, run_info, run_join};

/// Top-level CLI for the waitlist client.
#[derive(Debug, Parser)]
#[command(name = "waitlist")]
#[command(about = "Join the waitlist and query its status", long_about = None)]
pub struct Cli {
    /// API base URL (overrides WAITLIST_API_URL and config.toml).
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Join the waitlist with an email address.
    Join {
        /// Email address to register.
        email: String,
        /// If rate limited, wait out the cooldown and try once more.
        #[arg(long)]
        wait: bool,
    },

    /// Show how many people are on the waitlist.
    Info,

    /// Print the effective configuration as TOML.
    Config,
}

fn build_client(cfg: &WaitlistConfig) -> Result<WaitlistClient<HttpTransport>> {
    let transport = HttpTransport::from_config(cfg)?;
    let policy = RetryPolicy::from_config(&cfg.retry);
    Ok(WaitlistClient::with_policy(transport, policy))
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load()?;
        if let Some(url) = cli.api_url {
            cfg.base_url = Some(url);
            cfg.validate()?;
        }
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Join { email, wait } => {
                let client = Arc::new(build_client(&cfg)?);
                run_join(client, &cfg, &email, wait).await?;
            }
            CliCommand::Info => run_info(&build_client(&cfg)?).await?,
            CliCommand::Config => run_config(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
