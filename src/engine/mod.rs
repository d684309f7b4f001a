//! Core engines: daily tasks, upgrade purchasing, and the per-account
//! orchestrator that drives both.

pub mod daily;
pub mod orchestrator;
pub mod upgrades;
