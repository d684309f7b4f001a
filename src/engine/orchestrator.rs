//! Account orchestrator.
//!
//! Walks the account list in order, pairs each account with a proxy
//! round-robin, and for each one runs the daily tasks and (in upgrade
//! mode) the purchase loop. Accounts are processed strictly one after
//! another; a failure or panic in one account is logged and the run moves
//! on to the next.

use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{error, info};

use crate::api::proxy::ProxyClient;
use crate::api::session::Session;
use crate::api::ClickerApi;
use crate::config::{ApiConfig, RunOptions};
use crate::engine::daily::DailyTaskRunner;
use crate::engine::upgrades::UpgradePurchaseEngine;
use crate::types::{Account, AccountReport, ClickerError, ProxyEndpoint, RunSummary};

// ---------------------------------------------------------------------------
// Session factory
// ---------------------------------------------------------------------------

/// Opens one API channel per account and reports the proxy's exit IP.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Api: ClickerApi + 'static;

    fn open(&self, account: &Account, proxy: &ProxyEndpoint) -> Result<Self::Api, ClickerError>;

    /// Exit IP of `proxy`, or a sentinel such as `Unknown` / `Error`.
    async fn public_ip(&self, proxy: &ProxyEndpoint) -> String;
}

/// Production factory: one proxied `reqwest` session per account.
pub struct HttpSessionFactory {
    api: ApiConfig,
}

impl HttpSessionFactory {
    pub fn new(api: ApiConfig) -> Self {
        Self { api }
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    type Api = Session;

    fn open(&self, account: &Account, proxy: &ProxyEndpoint) -> Result<Session, ClickerError> {
        let client = ProxyClient::new(proxy.clone(), self.api.timeout())?;
        Ok(Session::new(account.clone(), client, &self.api.base_url))
    }

    async fn public_ip(&self, proxy: &ProxyEndpoint) -> String {
        match ProxyClient::new(proxy.clone(), self.api.timeout()) {
            Ok(client) => client.public_ip(&self.api.ip_lookup_url).await.to_string(),
            Err(_) => "Error".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Proxy assignment
// ---------------------------------------------------------------------------

/// Pair account `i` with `proxies[i % proxies.len()]`.
///
/// An empty proxy list is a configuration error.
pub fn assign_proxies(
    accounts: &[Account],
    proxies: &[ProxyEndpoint],
) -> Result<Vec<(Account, ProxyEndpoint)>, ClickerError> {
    if proxies.is_empty() {
        return Err(ClickerError::Config(
            "proxy list is empty; at least one proxy is required".to_string(),
        ));
    }

    Ok(accounts
        .iter()
        .enumerate()
        .map(|(i, account)| (account.clone(), proxies[i % proxies.len()].clone()))
        .collect())
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct AccountOrchestrator<F: SessionFactory> {
    factory: F,
    daily: DailyTaskRunner,
    engine: UpgradePurchaseEngine,
}

impl<F: SessionFactory> AccountOrchestrator<F> {
    pub fn new(factory: F, daily: DailyTaskRunner, engine: UpgradePurchaseEngine) -> Self {
        Self {
            factory,
            daily,
            engine,
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Process every account in order and return the run totals.
    ///
    /// Fails before any network call if `proxies` is empty; otherwise
    /// per-account failures are counted in the summary, never returned.
    pub async fn run(
        &self,
        accounts: &[Account],
        proxies: &[ProxyEndpoint],
        options: RunOptions,
    ) -> Result<RunSummary, ClickerError> {
        let pairs = assign_proxies(accounts, proxies)?;

        info!(
            accounts = pairs.len(),
            proxies = proxies.len(),
            upgrade_mode = options.upgrade_mode,
            "Starting run"
        );

        let mut summary = RunSummary::default();

        for (index, (account, proxy)) in pairs.iter().enumerate() {
            let outcome = AssertUnwindSafe(self.process_account(index, account, proxy, &options))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(report)) => {
                    summary.accounts_processed += 1;
                    if let Some(purchases) = &report.purchases {
                        summary.total_purchases += purchases.purchases.len();
                        summary.total_spent += purchases.spent;
                    }
                    summary.reports.push(report);
                }
                Ok(Err(e)) => {
                    error!(
                        account = index + 1,
                        token = %account.masked(),
                        error = %e,
                        "Account failed, moving to next account"
                    );
                    summary.accounts_failed += 1;
                }
                Err(_) => {
                    error!(
                        account = index + 1,
                        token = %account.masked(),
                        "Account processing panicked, moving to next account"
                    );
                    summary.accounts_failed += 1;
                }
            }
        }

        info!(summary = %summary, "All tokens processed");
        Ok(summary)
    }

    /// Daily tasks, then (in upgrade mode) the purchase loop for one account.
    pub async fn process_account(
        &self,
        index: usize,
        account: &Account,
        proxy: &ProxyEndpoint,
        options: &RunOptions,
    ) -> Result<AccountReport, ClickerError> {
        let ip = self.factory.public_ip(proxy).await;
        info!("========== Account {} | ip: {} ==========", index + 1, ip);

        let api = self.factory.open(account, proxy)?;

        let daily = self.daily.run(&api, account, &options.daily_cipher).await;

        let purchases = if options.upgrade_mode {
            let report = self.engine.run_to_exhaustion(&api).await;
            info!(
                account = index + 1,
                token = %account.masked(),
                cycles = report.cycles,
                bought = report.purchases.len(),
                spent = format!("{:.0}", report.spent),
                end = %report.end,
                "Purchase loop finished"
            );
            Some(report)
        } else {
            None
        };

        Ok(AccountReport {
            index,
            ip,
            daily,
            purchases,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
