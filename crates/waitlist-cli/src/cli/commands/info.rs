//! `waitlist info` – show waitlist size.

use anyhow::Result;
use waitlist_core::retry::classify;
use waitlist_core::transport::Transport;
use waitlist_core::waitlist::{WaitlistClient, WaitlistInfo};

pub async fn run_info<T: Transport>(client: &WaitlistClient<T>) -> Result<()> {
    match client.get_info().await {
        Ok(info) => {
            println!("{}", format_info(&info));
            Ok(())
        }
        Err(e) => {
            tracing::debug!(error = %e, "info request failed");
            anyhow::bail!("{}", classify(&e).message)
        }
    }
}

pub(crate) fn format_info(info: &WaitlistInfo) -> String {
    let people = if info.count == 1 { "person" } else { "people" };
    match info.message.as_deref() {
        Some(msg) => format!("{} {} on the waitlist. {}", info.count, people, msg),
        None => format!("{} {} on the waitlist.", info.count, people),
    }
}
