//! `waitlist join <email>` – submit through a cooldown controller.

use std::sync::Arc;

use anyhow::{bail, Result};
use waitlist_core::config::WaitlistConfig;
use waitlist_core::cooldown::CooldownController;
use waitlist_core::transport::Transport;
use waitlist_core::waitlist::WaitlistClient;

pub async fn run_join<T: Transport>(
    client: Arc<WaitlistClient<T>>,
    cfg: &WaitlistConfig,
    email: &str,
    wait: bool,
) -> Result<()> {
    let ctl = CooldownController::new(client).with_fallback_cooldown(cfg.rate_limit_fallback_secs);

    let err = match ctl.submit(email).await {
        Ok(resp) => {
            println!("{}", resp.message);
            return Ok(());
        }
        Err(e) => e,
    };
    // Only the user-facing message is printed; details go to the log.
    tracing::debug!(error = ?err, "join failed");
    if !(wait && err.is_rate_limited() && ctl.state().countdown > 0) {
        bail!("{}", err);
    }

    println!("{}", err);
    wait_out_cooldown(&ctl).await;
    match ctl.submit(email).await {
        Ok(resp) => {
            println!("{}", resp.message);
            Ok(())
        }
        Err(e) => bail!("{}", e),
    }
}

/// Print each countdown tick until the controller accepts submits again.
async fn wait_out_cooldown<T: Transport>(ctl: &CooldownController<T>) {
    let mut rx = ctl.subscribe();
    loop {
        let countdown = rx.borrow_and_update().countdown;
        if countdown == 0 {
            break;
        }
        println!("Retrying in {countdown}s...");
        if rx.changed().await.is_err() {
            break;
        }
    }
}
