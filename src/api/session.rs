//! Authenticated game session.
//!
//! Pairs one [`Account`] with one [`ProxyClient`]: every request goes
//! through the account's proxy and carries `Authorization: Bearer <token>`.
//! All endpoints are `POST` with a JSON body (`{}` when there is nothing
//! to send) and only a 200 counts as success.

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::proxy::ProxyClient;
use super::{
    ClickerApi, BUY_UPGRADE_PATH, CLAIM_DAILY_CIPHER_PATH, CLAIM_KEYS_MINIGAME_PATH,
    START_KEYS_MINIGAME_PATH, SYNC_PATH, UPGRADES_FOR_BUY_PATH, UPGRADE_COOLDOWN_CODE,
};
use crate::types::{whole_seconds, Account, ClickerError, Upgrade};

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncResponse {
    clicker_user: ClickerUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClickerUser {
    balance_coins: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpgradesForBuyResponse {
    upgrades_for_buy: Vec<Upgrade>,
}

/// Error body; only the cooldown fields matter to us.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default, rename = "cooldownSeconds")]
    cooldown_seconds: Option<f64>,
}

/// Map a non-200 answer to the matching error kind.
pub(crate) fn classify_failure(endpoint: &str, status: u16, body: &str) -> ClickerError {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        if parsed.error_code.as_deref() == Some(UPGRADE_COOLDOWN_CODE) {
            let secs = parsed.cooldown_seconds.map(whole_seconds).unwrap_or(0);
            return ClickerError::CooldownRejection {
                cooldown_seconds: secs,
            };
        }
    }
    ClickerError::HttpStatus {
        endpoint: endpoint.to_string(),
        status,
        body: body.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One authenticated channel to the game API.
pub struct Session {
    account: Account,
    proxy: ProxyClient,
    base_url: String,
}

impl Session {
    pub fn new(account: Account, proxy: ProxyClient, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            account,
            proxy,
            base_url,
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    // -- Internal helpers ------------------------------------------------

    /// POST `body` to `path`; anything other than 200 is an error.
    async fn post(&self, path: &str, body: &Value) -> Result<reqwest::Response, ClickerError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, account = %self.account.masked(), "POST");

        let resp = self
            .proxy
            .http()
            .post(&url)
            .bearer_auth(self.account.credential())
            .json(body)
            .send()
            .await
            .map_err(|e| ClickerError::Transport {
                endpoint: path.to_string(),
                message: e.to_string(),
            })?;

        if resp.status() != StatusCode::OK {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_failure(path, status, &text));
        }

        Ok(resp)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, ClickerError> {
        self.post(path, body)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ClickerError::Decode {
                endpoint: path.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl ClickerApi for Session {
    async fn balance(&self) -> Result<Decimal, ClickerError> {
        let sync: SyncResponse = self.post_json(SYNC_PATH, &json!({})).await?;
        Ok(sync.clicker_user.balance_coins)
    }

    async fn upgrades_for_buy(&self) -> Result<Vec<Upgrade>, ClickerError> {
        let resp: UpgradesForBuyResponse =
            self.post_json(UPGRADES_FOR_BUY_PATH, &json!({})).await?;
        Ok(resp.upgrades_for_buy)
    }

    async fn buy_upgrade(&self, upgrade_id: &str, timestamp: i64) -> Result<(), ClickerError> {
        let payload = json!({ "upgradeId": upgrade_id, "timestamp": timestamp });
        self.post(BUY_UPGRADE_PATH, &payload).await?;
        Ok(())
    }

    async fn claim_daily_cipher(&self, cipher: &str) -> Result<(), ClickerError> {
        self.post(CLAIM_DAILY_CIPHER_PATH, &json!({ "cipher": cipher }))
            .await?;
        Ok(())
    }

    async fn start_keys_minigame(&self) -> Result<(), ClickerError> {
        self.post(START_KEYS_MINIGAME_PATH, &json!({})).await?;
        Ok(())
    }

    async fn claim_keys_minigame(&self, cipher: &str) -> Result<(), ClickerError> {
        self.post(CLAIM_KEYS_MINIGAME_PATH, &json!({ "cipher": cipher }))
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
