//! `waitlist config` – print the effective configuration.

use anyhow::Result;
use waitlist_core::config::WaitlistConfig;

pub fn run_config(cfg: &WaitlistConfig) -> Result<()> {
    print!("{}", toml::to_string_pretty(cfg)?);
    Ok(())
}
