//! Upgrade purchase engine.
//!
//! Greedy, first-eligible-first-bought allocation: each cycle refetches
//! the catalog and the balance, walks the catalog in server order, and
//! buys every upgrade that is available, not expired, under the price
//! ceiling and affordable with the locally tracked balance. Cycles repeat
//! until one buys nothing or the catalog cannot be fetched.

use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::api::ClickerApi;
use crate::config::UpgradesConfig;
use crate::types::{
    ClickerError, CycleReport, LoopEnd, PurchaseLoopReport, PurchaseOutcome, PurchasedUpgrade,
    Upgrade,
};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Tunables for the purchase loop.
#[derive(Debug, Clone)]
pub struct PurchasePolicy {
    /// Upgrades priced at or above this are never bought.
    pub price_ceiling: Decimal,
    /// Courtesy pause after each successful purchase.
    pub purchase_pause: Duration,
}

impl Default for PurchasePolicy {
    fn default() -> Self {
        Self::from(&UpgradesConfig::default())
    }
}

impl From<&UpgradesConfig> for PurchasePolicy {
    fn from(cfg: &UpgradesConfig) -> Self {
        Self {
            price_ceiling: cfg.price_ceiling,
            purchase_pause: Duration::from_millis(cfg.purchase_pause_ms),
        }
    }
}

impl PurchasePolicy {
    /// Whether `upgrade` may be bought with `balance` coins.
    ///
    /// Cooldown is checked separately by the engine so that cooling-down
    /// upgrades can be reported as such.
    pub fn is_eligible(&self, upgrade: &Upgrade, balance: Decimal) -> bool {
        upgrade.is_available
            && !upgrade.is_expired
            && upgrade.price < self.price_ceiling
            && upgrade.price <= balance
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct UpgradePurchaseEngine {
    policy: PurchasePolicy,
}

impl UpgradePurchaseEngine {
    pub fn new(policy: PurchasePolicy) -> Self {
        Self { policy }
    }

    /// Run one pass over a freshly fetched catalog.
    ///
    /// Returns `Err` only for a buy failure that is not a cooldown
    /// rejection; the caller must stop purchasing for this account.
    pub async fn run_purchase_cycle(
        &self,
        api: &dyn ClickerApi,
    ) -> Result<CycleReport, ClickerError> {
        let upgrades = match api.upgrades_for_buy().await {
            Ok(upgrades) => upgrades,
            Err(e) => {
                warn!(error = %e, "Failed to fetch upgrade list");
                return Ok(CycleReport::new(PurchaseOutcome::CatalogFetchFailed));
            }
        };

        let mut balance = match api.balance().await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(error = %e, "Failed to fetch balance, assuming 0 for this cycle");
                Decimal::ZERO
            }
        };

        debug!(
            upgrades = upgrades.len(),
            balance = format!("{balance:.0}"),
            "Evaluating catalog"
        );

        let mut report = CycleReport::new(PurchaseOutcome::NoneEligible);

        for upgrade in &upgrades {
            if upgrade.is_cooling_down() {
                info!(
                    upgrade = %upgrade.name,
                    cooldown_secs = upgrade.cooldown_seconds,
                    "Upgrade is cooling down"
                );
                report.cooldown_skips += 1;
                continue;
            }

            if !self.policy.is_eligible(upgrade, balance) {
                debug!(upgrade = %upgrade, balance = format!("{balance:.0}"), "Not eligible");
                continue;
            }

            let timestamp = Utc::now().timestamp();
            match api.buy_upgrade(&upgrade.id, timestamp).await {
                Ok(()) => {
                    info!(
                        balance = format!("{balance:.0}"),
                        upgrade = %upgrade.name,
                        price = format!("{:.0}", upgrade.price),
                        "Upgrade purchased"
                    );
                    balance -= upgrade.price;
                    report.spent += upgrade.price;
                    report.purchased.push(PurchasedUpgrade {
                        id: upgrade.id.clone(),
                        name: upgrade.name.clone(),
                        price: upgrade.price,
                    });
                    report.outcome = PurchaseOutcome::Purchased;
                }
                Err(e) if e.is_cooldown() => {
                    info!(
                        upgrade = %upgrade.name,
                        reason = %e,
                        "Server reports upgrade is cooling down"
                    );
                    report.cooldown_skips += 1;
                    continue;
                }
                Err(e) => return Err(e),
            }

            tokio::time::sleep(self.policy.purchase_pause).await;
        }

        Ok(report)
    }

    /// Repeat [`run_purchase_cycle`](Self::run_purchase_cycle) until it
    /// buys nothing, the catalog fetch fails, or a buy hard-fails.
    ///
    /// Never returns an error: the reason the loop ended is in
    /// [`PurchaseLoopReport::end`].
    pub async fn run_to_exhaustion(&self, api: &dyn ClickerApi) -> PurchaseLoopReport {
        let mut loop_report = PurchaseLoopReport {
            cycles: 0,
            purchases: Vec::new(),
            spent: Decimal::ZERO,
            end: LoopEnd::NoneEligible,
        };

        loop {
            loop_report.cycles += 1;

            let cycle = match self.run_purchase_cycle(api).await {
                Ok(cycle) => cycle,
                Err(e) => {
                    warn!(
                        cycle = loop_report.cycles,
                        error = %e,
                        "Unexpected purchase failure, moving to next account"
                    );
                    loop_report.end = LoopEnd::HardFailure(e.to_string());
                    break;
                }
            };

            debug!(
                cycle = loop_report.cycles,
                outcome = %cycle.outcome,
                bought = cycle.purchased.len(),
                cooldown_skips = cycle.cooldown_skips,
                "Purchase cycle finished"
            );
            loop_report.spent += cycle.spent;
            loop_report.purchases.extend(cycle.purchased);

            match cycle.outcome {
                PurchaseOutcome::Purchased => continue,
                PurchaseOutcome::NoneEligible => {
                    info!(
                        cycle = loop_report.cycles,
                        "No upgrades available or eligible, moving to next account"
                    );
                    loop_report.end = LoopEnd::NoneEligible;
                    break;
                }
                PurchaseOutcome::CatalogFetchFailed => {
                    loop_report.end = LoopEnd::CatalogFetchFailed;
                    break;
                }
            }
        }

        loop_report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
