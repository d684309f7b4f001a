//! Daily one-shot tasks.
//!
//! Two best-effort actions run once per account per run: submitting the
//! shared daily cipher, and the keys mini-game (start, wait, claim). No
//! failure here is ever escalated; the server rejects duplicate claims,
//! so nothing is recorded locally.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use rand::Rng;
use tracing::{info, warn};

use crate::api::ClickerApi;
use crate::config::DailyConfig;
use crate::types::{Account, DailyReport};

/// Credential characters embedded in the mini-game claim cipher.
const MINIGAME_TOKEN_SUFFIX_LEN: usize = 10;

/// Exclusive upper bound of the random mini-game prefix.
const MINIGAME_PREFIX_BOUND: u32 = 1_000_000_000;

/// Plain-text mini-game claim: `0` + 9-digit prefix, `|`, token suffix.
pub fn minigame_claim_plaintext(account: &Account, prefix: u32) -> String {
    let suffix = account.credential_suffix(MINIGAME_TOKEN_SUFFIX_LEN);
    format!("0{prefix:09}|{suffix}")
}

/// Base64 form of [`minigame_claim_plaintext`], as the server expects it.
pub fn minigame_claim_cipher(account: &Account, prefix: u32) -> String {
    BASE64_STANDARD.encode(minigame_claim_plaintext(account, prefix))
}

pub fn random_minigame_prefix() -> u32 {
    rand::rng().random_range(0..MINIGAME_PREFIX_BOUND)
}

pub struct DailyTaskRunner {
    minigame_wait: Duration,
}

impl DailyTaskRunner {
    pub fn new(minigame_wait: Duration) -> Self {
        Self { minigame_wait }
    }

    pub fn from_config(cfg: &DailyConfig) -> Self {
        Self::new(Duration::from_secs(cfg.minigame_wait_secs))
    }

    /// Run both daily tasks; never fails.
    pub async fn run(&self, api: &dyn ClickerApi, account: &Account, cipher: &str) -> DailyReport {
        DailyReport {
            cipher_claimed: self.claim_daily_cipher(api, cipher).await,
            minigame_claimed: self.play_keys_minigame(api, account).await,
        }
    }

    /// Submit the shared daily cipher. An empty cipher skips the call.
    pub async fn claim_daily_cipher(&self, api: &dyn ClickerApi, cipher: &str) -> bool {
        if cipher.is_empty() {
            return false;
        }

        match api.claim_daily_cipher(cipher).await {
            Ok(()) => {
                info!(cipher, "Daily cipher claimed");
                true
            }
            Err(e) => {
                warn!(error = %e, "Could not claim daily cipher");
                false
            }
        }
    }

    /// Start the keys mini-game, wait the required real time, then claim.
    pub async fn play_keys_minigame(&self, api: &dyn ClickerApi, account: &Account) -> bool {
        if let Err(e) = api.start_keys_minigame().await {
            warn!(error = %e, "Could not start keys minigame");
            return false;
        }
        info!("Keys minigame started");

        tokio::time::sleep(self.minigame_wait).await;

        let cipher = minigame_claim_cipher(account, random_minigame_prefix());
        match api.claim_keys_minigame(&cipher).await {
            Ok(()) => {
                info!("Daily keys minigame claimed");
                true
            }
            Err(e) => {
                warn!(error = %e, "Could not claim daily keys minigame");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
