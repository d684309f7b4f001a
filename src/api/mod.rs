//! Game API integration.
//!
//! Defines the `ClickerApi` trait (one async method per endpoint the
//! engines need) and provides the HTTP implementation:
//! - `proxy`   — a proxy-bound HTTP channel plus public-IP diagnostics
//! - `session` — bearer-authenticated calls to the game API over that channel

pub mod proxy;
pub mod session;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::types::{ClickerError, Upgrade};

pub const SYNC_PATH: &str = "/clicker/sync";
pub const UPGRADES_FOR_BUY_PATH: &str = "/clicker/upgrades-for-buy";
pub const BUY_UPGRADE_PATH: &str = "/clicker/buy-upgrade";
pub const CLAIM_DAILY_CIPHER_PATH: &str = "/clicker/claim-daily-cipher";
pub const START_KEYS_MINIGAME_PATH: &str = "/clicker/start-keys-minigame";
pub const CLAIM_KEYS_MINIGAME_PATH: &str = "/clicker/claim-daily-keys-minigame";

/// Error code the server uses when an upgrade cannot be bought yet.
pub const UPGRADE_COOLDOWN_CODE: &str = "UPGRADE_COOLDOWN";

/// Abstraction over one authenticated channel to the game API.
///
/// Every call is a suspension point; implementations map non-200
/// answers to [`ClickerError::HttpStatus`] or
/// [`ClickerError::CooldownRejection`] and connection failures or
/// timeouts to [`ClickerError::Transport`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickerApi: Send + Sync {
    /// Current coin balance (`/clicker/sync`).
    async fn balance(&self) -> Result<Decimal, ClickerError>;

    /// Upgrades on offer, in server order (`/clicker/upgrades-for-buy`).
    async fn upgrades_for_buy(&self) -> Result<Vec<Upgrade>, ClickerError>;

    /// Buy one upgrade; `timestamp` is Unix seconds.
    async fn buy_upgrade(&self, upgrade_id: &str, timestamp: i64) -> Result<(), ClickerError>;

    async fn claim_daily_cipher(&self, cipher: &str) -> Result<(), ClickerError>;

    async fn start_keys_minigame(&self) -> Result<(), ClickerError>;

    /// `cipher` is already base64-encoded.
    async fn claim_keys_minigame(&self, cipher: &str) -> Result<(), ClickerError>;
}
