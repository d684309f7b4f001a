//! Configuration loading from TOML with environment variable overrides.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! field has a default, so a partial (or missing) file is valid. The two
//! per-run answers (upgrade mode, daily cipher) may also come from the
//! environment so a run can be fully non-interactive.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Env var that overrides `[run] upgrade_mode`.
pub const UPGRADE_MODE_ENV: &str = "HAMSTER_UPGRADE_MODE";
/// Env var that overrides `[run] daily_cipher`.
pub const DAILY_CIPHER_ENV: &str = "HAMSTER_DAILY_CIPHER";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub files: FilesConfig,
    pub upgrades: UpgradesConfig,
    pub daily: DailyConfig,
    pub run: RunConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Channel-level timeout applied to every outbound call.
    pub timeout_secs: u64,
    /// Endpoint answering `{"ip": "..."}`, queried through each proxy.
    pub ip_lookup_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.hamsterkombatgame.io".to_string(),
            timeout_secs: 10,
            ip_lookup_url: "https://api.ipify.org?format=json".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FilesConfig {
    /// One bearer token per line.
    pub credentials: String,
    /// One proxy URI per line.
    pub proxies: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            credentials: "authorization.csv".to_string(),
            proxies: "proxy.csv".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UpgradesConfig {
    /// Upgrades priced at or above this are never bought.
    pub price_ceiling: Decimal,
    /// Pause after each successful purchase.
    pub purchase_pause_ms: u64,
}

impl Default for UpgradesConfig {
    fn default() -> Self {
        Self {
            price_ceiling: dec!(500000),
            purchase_pause_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DailyConfig {
    /// Real time the server expects between mini-game start and claim.
    pub minigame_wait_secs: u64,
}

impl Default for DailyConfig {
    fn default() -> Self {
        Self {
            minigame_wait_secs: 20,
        }
    }
}

/// Answers normally collected by the interactive prompts.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RunConfig {
    pub upgrade_mode: Option<bool>,
    pub daily_cipher: Option<String>,
}

/// Resolved per-run inputs handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub upgrade_mode: bool,
    /// Shared across every account; empty means "skip the cipher claim".
    pub daily_cipher: String,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            info!(path, "No config file found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Apply `HAMSTER_UPGRADE_MODE` / `HAMSTER_DAILY_CIPHER` if set.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(raw) = std::env::var(UPGRADE_MODE_ENV) {
            self.run.upgrade_mode = Some(
                parse_flag(&raw)
                    .with_context(|| format!("Invalid value for {UPGRADE_MODE_ENV}: {raw}"))?,
            );
        }
        if let Ok(cipher) = std::env::var(DAILY_CIPHER_ENV) {
            self.run.daily_cipher = Some(normalize_cipher(&cipher));
        }
        Ok(())
    }
}

/// Accepts `y/yes/true/1` and `n/no/false/0`, case-insensitive.
pub fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Ok(true),
        "n" | "no" | "false" | "0" => Ok(false),
        other => anyhow::bail!("expected yes/no, got '{other}'"),
    }
}

/// Daily ciphers are entered trimmed and upper-cased.
pub fn normalize_cipher(raw: &str) -> String {
    raw.trim().to_uppercase()
}
