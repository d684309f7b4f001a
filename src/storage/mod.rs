//! Credential and proxy list loading.
//!
//! Both lists are line-delimited text files: each line is trimmed and
//! blank lines are skipped. Failing to read either file is the only
//! startup failure of a run.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::types::{Account, ProxyEndpoint};

/// Trimmed, non-empty lines of `contents`.
pub fn parse_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Read `path` and return its trimmed, non-empty lines.
pub fn load_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(parse_lines(&contents))
}

/// One account per line of the credentials file.
pub fn load_accounts(path: impl AsRef<Path>) -> Result<Vec<Account>> {
    let path = path.as_ref();
    let accounts: Vec<Account> = load_lines(path)?.into_iter().map(Account::new).collect();
    info!(path = %path.display(), count = accounts.len(), "Accounts loaded");
    Ok(accounts)
}

/// One proxy URI per line of the proxies file.
pub fn load_proxies(path: impl AsRef<Path>) -> Result<Vec<ProxyEndpoint>> {
    let path = path.as_ref();
    let proxies: Vec<ProxyEndpoint> = load_lines(path)?
        .into_iter()
        .map(ProxyEndpoint::new)
        .collect();
    info!(path = %path.display(), count = proxies.len(), "Proxies loaded");
    Ok(proxies)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
