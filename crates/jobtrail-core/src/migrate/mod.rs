//! Versioned data migrations over application records.
//!
//! Each unit is identified by a zero-padded id (`"001"`, `"002"`, ...) and
//! runs in ascending id order. Units must be idempotent: the runner may
//! re-execute a completed unit under `force`, and a unit that failed halfway
//! is simply re-run from the top.
//!
//! # Adding a migration
//!
//! 1. Implement [`Migration`] in a new `mNNN_*.rs` module.
//! 2. Return [`Reversibility::Reversible`] with a [`Rollback`] impl, or
//!    [`Reversibility::Irreversible`] with the reason rollback is impossible.
//! 3. Register it in [`all_migrations`].

pub mod m001_normalize_events;
pub mod m002_infer_status_dates;
pub mod m003_reconcile_workflow;
pub mod m004_recalculate_status;
pub mod m005_sanitize_titles;
pub mod m006_backfill_events;
pub mod runner;

pub use runner::{MigrationRunner, MigrationStatus, RunOptions, RunReport};

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::RecordStore;

/// Per-run inputs shared by every unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationContext {
    /// Simulate only: no store writes of any kind.
    pub dry_run: bool,
    /// Date stamped on events synthesized during this run.
    pub run_date: NaiveDate,
}

/// What a unit did (or would do, under dry-run).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub documents_modified: usize,
    pub messages: Vec<String>,
}

impl MigrationOutcome {
    pub fn note(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }
}

/// A named, versioned transformation over the record store.
pub trait Migration {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;

    /// Apply (or, with `ctx.dry_run`, simulate) the transformation.
    ///
    /// # Errors
    ///
    /// Any error aborts the whole run. Records already written stay written.
    fn execute(
        &self,
        store: &dyn RecordStore,
        ctx: &MigrationContext,
    ) -> anyhow::Result<MigrationOutcome>;

    fn reversibility(&self) -> Reversibility<'_>;
}

/// Undo support for a migration.
pub trait Rollback {
    /// Revert the migration's effect across the store.
    ///
    /// # Errors
    ///
    /// Returns the first store error encountered.
    fn rollback(&self, store: &dyn RecordStore) -> anyhow::Result<MigrationOutcome>;
}

/// Whether a unit can be undone.
pub enum Reversibility<'a> {
    Reversible(&'a dyn Rollback),
    Irreversible { reason: &'static str },
}

/// Reported result of running or rolling back one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationResult {
    pub id: String,
    pub name: String,
    pub description: String,
    pub success: bool,
    pub dry_run: bool,
    pub documents_modified: usize,
    pub messages: Vec<String>,
    pub errors: Vec<String>,
}

impl MigrationResult {
    pub(crate) fn succeeded(unit: &dyn Migration, dry_run: bool, outcome: MigrationOutcome) -> Self {
        Self {
            id: unit.id().to_string(),
            name: unit.name().to_string(),
            description: unit.description().to_string(),
            success: true,
            dry_run,
            documents_modified: outcome.documents_modified,
            messages: outcome.messages,
            errors: Vec::new(),
        }
    }

    pub(crate) fn failed(unit: &dyn Migration, dry_run: bool, error: String) -> Self {
        Self {
            id: unit.id().to_string(),
            name: unit.name().to_string(),
            description: unit.description().to_string(),
            success: false,
            dry_run,
            documents_modified: 0,
            messages: Vec::new(),
            errors: vec![error],
        }
    }
}

/// Every registered migration, in execution order.
#[must_use]
pub fn all_migrations() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(m001_normalize_events::NormalizeEventShape),
        Box::new(m002_infer_status_dates::InferStatusDates),
        Box::new(m003_reconcile_workflow::ReconcileWorkflow::default()),
        Box::new(m004_recalculate_status::RecalculateCurrentStatus::default()),
        Box::new(m005_sanitize_titles::SanitizeEventTitles),
        Box::new(m006_backfill_events::BackfillLifecycleEvents),
    ]
}

#[cfg(test)]
pub(crate) fn test_context(dry_run: bool) -> MigrationContext {
    MigrationContext {
        dry_run,
        run_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or_default(),
    }
}
