//! Interactive configuration step.
//!
//! Asks the two per-run questions (upgrade mode, today's cipher) unless
//! the configuration already answers them. Generic over the reader and
//! writer so the engines never touch the terminal.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};

use crate::config::{normalize_cipher, RunConfig, RunOptions};

pub const UPGRADE_QUESTION: &str = "Upgrade cards? (y/n): ";
pub const CIPHER_QUESTION: &str = "Today's morse cipher to decode: ";

/// Print `question` and read one line (without the newline).
pub fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    write!(output, "{question}").context("Failed to write prompt")?;
    output.flush().context("Failed to flush prompt")?;

    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read answer")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Only `y` (trimmed, any case) enables upgrade mode.
pub fn ask_upgrade_mode<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<bool> {
    let answer = ask(input, output, UPGRADE_QUESTION)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

pub fn ask_daily_cipher<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<String> {
    let answer = ask(input, output, CIPHER_QUESTION)?;
    Ok(normalize_cipher(&answer))
}

/// Fill in whatever `run` leaves unanswered by prompting.
pub fn resolve_run_options<R: BufRead, W: Write>(
    run: &RunConfig,
    input: &mut R,
    output: &mut W,
) -> Result<RunOptions> {
    let upgrade_mode = match run.upgrade_mode {
        Some(mode) => mode,
        None => ask_upgrade_mode(input, output)?,
    };
    let daily_cipher = match &run.daily_cipher {
        Some(cipher) => normalize_cipher(cipher),
        None => ask_daily_cipher(input, output)?,
    };
    Ok(RunOptions {
        upgrade_mode,
        daily_cipher,
    })
}
