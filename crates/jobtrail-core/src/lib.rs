//! jobtrail-core library.
//!
//! Brings stored job-application records from older shapes to the current
//! one through a ledger-tracked sequence of migrations.
//!
//! # Conventions
//!
//! - **Errors**: [`error::EngineError`] for typed failures crossing crate
//!   boundaries; `anyhow::Result` with context inside migrations.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`, `debug!`).
//! - **Store access**: every call to [`db::RecordStore`] completes before the
//!   next one starts.

pub mod backfill;
pub mod config;
pub mod db;
pub mod error;
pub mod inference;
pub mod ledger;
pub mod migrate;
pub mod model;
pub mod validate;
pub mod workflow;
