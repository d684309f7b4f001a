//! hamster-upgrader entry point.
//!
//! Loads configuration, initialises structured logging, asks the per-run
//! questions, loads the account and proxy lists, then processes every
//! account in order until done or interrupted.

use anyhow::Result;
use tracing::{error, info, warn};

use hamster_upgrader::config::AppConfig;
use hamster_upgrader::engine::daily::DailyTaskRunner;
use hamster_upgrader::engine::orchestrator::{AccountOrchestrator, HttpSessionFactory};
use hamster_upgrader::engine::upgrades::{PurchasePolicy, UpgradePurchaseEngine};
use hamster_upgrader::prompt;
use hamster_upgrader::storage;

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let mut cfg = AppConfig::load_or_default(CONFIG_PATH)?;
    cfg.apply_env_overrides()?;

    let options = {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut output = std::io::stdout();
        prompt::resolve_run_options(&cfg.run, &mut input, &mut output)?
    };

    let accounts = storage::load_accounts(&cfg.files.credentials)?;
    let proxies = storage::load_proxies(&cfg.files.proxies)?;

    info!(
        accounts = accounts.len(),
        proxies = proxies.len(),
        upgrade_mode = options.upgrade_mode,
        cipher = %options.daily_cipher,
        price_ceiling = %cfg.upgrades.price_ceiling,
        "Upgrader starting up"
    );

    let orchestrator = AccountOrchestrator::new(
        HttpSessionFactory::new(cfg.api.clone()),
        DailyTaskRunner::from_config(&cfg.daily),
        UpgradePurchaseEngine::new(PurchasePolicy::from(&cfg.upgrades)),
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tokio::select! {
        result = orchestrator.run(&accounts, &proxies, options) => {
            match result {
                Ok(summary) => info!(
                    processed = summary.accounts_processed,
                    failed = summary.accounts_failed,
                    bought = summary.total_purchases,
                    spent = format!("{:.0}", summary.total_spent),
                    "Run complete"
                ),
                Err(e) => {
                    error!(error = %e, "Run aborted");
                    return Err(e.into());
                }
            }
        }
        _ = &mut shutdown => {
            warn!("Shutdown signal received, stopping before remaining accounts.");
        }
    }

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hamster_upgrader=info"));

    let json_logging = std::env::var("HAMSTER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
