//! Scripted game API for integration testing.
//!
//! Provides a deterministic `ClickerApi` implementation whose catalog,
//! balance and buy answers are fully controllable from test code, plus a
//! `SessionFactory` that hands out one scripted API per account. Every
//! call is recorded in a log shared with the test.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use hamster_upgrader::api::ClickerApi;
use hamster_upgrader::engine::orchestrator::SessionFactory;
use hamster_upgrader::types::{Account, ClickerError, ProxyEndpoint, Upgrade};

/// Shared record of `(account label, call)` pairs.
pub type CallLog = Arc<Mutex<Vec<(String, String)>>>;

pub fn upgrade(id: &str, price: Decimal) -> Upgrade {
    Upgrade {
        id: id.to_string(),
        name: id.to_uppercase(),
        price,
        is_available: true,
        is_expired: false,
        cooldown_seconds: 0,
    }
}

pub fn transport_error(endpoint: &str) -> ClickerError {
    ClickerError::Transport {
        endpoint: endpoint.to_string(),
        message: "operation timed out".to_string(),
    }
}

/// A scripted game API for one account.
pub struct ScriptedApi {
    label: String,
    /// Answers for successive catalog fetches; empty catalog once drained.
    catalogs: Mutex<VecDeque<Result<Vec<Upgrade>, ClickerError>>>,
    balance: Result<Decimal, ClickerError>,
    /// Buy answers by upgrade id; absent ids succeed.
    buy_errors: HashMap<String, ClickerError>,
    panic_on_catalog: bool,
    log: CallLog,
}

impl ScriptedApi {
    pub fn new(balance: Decimal) -> Self {
        Self {
            label: String::new(),
            catalogs: Mutex::new(VecDeque::new()),
            balance: Ok(balance),
            buy_errors: HashMap::new(),
            panic_on_catalog: false,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_catalog(self, catalog: Vec<Upgrade>) -> Self {
        self.catalogs.lock().unwrap().push_back(Ok(catalog));
        self
    }

    pub fn with_catalog_error(self, error: ClickerError) -> Self {
        self.catalogs.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn with_balance_error(mut self, error: ClickerError) -> Self {
        self.balance = Err(error);
        self
    }

    pub fn with_buy_error(mut self, upgrade_id: &str, error: ClickerError) -> Self {
        self.buy_errors.insert(upgrade_id.to_string(), error);
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_catalog = true;
        self
    }

    pub fn log(&self) -> CallLog {
        Arc::clone(&self.log)
    }

    fn record(&self, call: impl Into<String>) {
        self.log
            .lock()
            .unwrap()
            .push((self.label.clone(), call.into()));
    }
}

#[async_trait]
impl ClickerApi for ScriptedApi {
    async fn balance(&self) -> Result<Decimal, ClickerError> {
        self.record("sync");
        self.balance.clone()
    }

    async fn upgrades_for_buy(&self) -> Result<Vec<Upgrade>, ClickerError> {
        self.record("upgrades-for-buy");
        if self.panic_on_catalog {
            panic!("scripted panic in catalog fetch");
        }
        self.catalogs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn buy_upgrade(&self, upgrade_id: &str, _timestamp: i64) -> Result<(), ClickerError> {
        self.record(format!("buy-upgrade:{upgrade_id}"));
        match self.buy_errors.get(upgrade_id) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    async fn claim_daily_cipher(&self, cipher: &str) -> Result<(), ClickerError> {
        self.record(format!("claim-daily-cipher:{cipher}"));
        Ok(())
    }

    async fn start_keys_minigame(&self) -> Result<(), ClickerError> {
        self.record("start-keys-minigame");
        Ok(())
    }

    async fn claim_keys_minigame(&self, _cipher: &str) -> Result<(), ClickerError> {
        self.record("claim-daily-keys-minigame");
        Ok(())
    }
}

/// Hands each account the script registered for its credential.
pub struct ScriptedFactory {
    scripts: Mutex<HashMap<String, ScriptedApi>>,
    log: CallLog,
    /// `(credential, proxy)` for every session opened, in order.
    pub opened: Mutex<Vec<(String, String)>>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            log: Arc::new(Mutex::new(Vec::new())),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn script(self, credential: &str, mut api: ScriptedApi) -> Self {
        api.label = credential.to_string();
        api.log = Arc::clone(&self.log);
        self.scripts
            .lock()
            .unwrap()
            .insert(credential.to_string(), api);
        self
    }

    /// Calls made on behalf of `credential`, in order.
    pub fn calls_for(&self, credential: &str) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|(label, _)| label == credential)
            .map(|(_, call)| call.clone())
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.log.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    type Api = ScriptedApi;

    fn open(&self, account: &Account, proxy: &ProxyEndpoint) -> Result<ScriptedApi, ClickerError> {
        let credential = account.credential().to_string();
        self.opened
            .lock()
            .unwrap()
            .push((credential.clone(), proxy.address().to_string()));

        let mut api = self
            .scripts
            .lock()
            .unwrap()
            .remove(&credential)
            .unwrap_or_else(|| ScriptedApi::new(Decimal::ZERO));
        api.label = credential;
        api.log = Arc::clone(&self.log);
        Ok(api)
    }

    async fn public_ip(&self, proxy: &ProxyEndpoint) -> String {
        format!("ip-of-{}", proxy.address())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_scripted_catalogs_drain_in_order() {
        let api = ScriptedApi::new(dec!(10))
            .with_catalog(vec![upgrade("a", dec!(1))])
            .with_catalog_error(transport_error("/clicker/upgrades-for-buy"));

        assert_eq!(api.upgrades_for_buy().await.unwrap().len(), 1);
        assert!(api.upgrades_for_buy().await.is_err());
        assert!(api.upgrades_for_buy().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scripted_buy_errors() {
        let api = ScriptedApi::new(dec!(10)).with_buy_error(
            "locked",
            ClickerError::CooldownRejection {
                cooldown_seconds: 5,
            },
        );
        assert!(api.buy_upgrade("open", 0).await.is_ok());
        assert!(api.buy_upgrade("locked", 0).await.unwrap_err().is_cooldown());

        let calls: Vec<_> = api.log().lock().unwrap().iter().map(|(_, c)| c.clone()).collect();
        assert_eq!(calls, vec!["buy-upgrade:open", "buy-upgrade:locked"]);
    }

    #[tokio::test]
    async fn test_factory_labels_calls_by_account() {
        let factory = ScriptedFactory::new().script("tok-a", ScriptedApi::new(dec!(5)));
        let api = factory
            .open(&Account::new("tok-a"), &ProxyEndpoint::new("http://p:1"))
            .unwrap();
        api.balance().await.unwrap();

        assert_eq!(factory.calls_for("tok-a"), vec!["sync"]);
        assert_eq!(
            factory.opened.lock().unwrap()[0],
            ("tok-a".to_string(), "http://p:1".to_string())
        );
    }
}
