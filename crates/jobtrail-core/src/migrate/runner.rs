//! Ledger-aware orchestration of migration units.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Migration, MigrationContext, MigrationResult, Reversibility, all_migrations};
use crate::db::RecordStore;
use crate::error::EngineError;
use crate::ledger::Ledger;
use crate::validate::{ValidationReport, validate_data};

/// Flags for one invocation of [`MigrationRunner::run_migrations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub dry_run: bool,
    pub force: bool,
    /// Ledger timestamp; its calendar date becomes the run date.
    pub started_at: DateTime<Utc>,
}

impl RunOptions {
    #[must_use]
    pub fn new(dry_run: bool, force: bool) -> Self {
        Self {
            dry_run,
            force,
            started_at: Utc::now(),
        }
    }

    #[must_use]
    pub const fn at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }
}

/// Everything one run did, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub force: bool,
    pub results: Vec<MigrationResult>,
    /// Units skipped because the ledger already lists them.
    pub skipped: Vec<String>,
    /// Id of the unit whose failure stopped the run.
    pub aborted_at: Option<String>,
}

impl RunReport {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.aborted_at.is_none()
    }
}

/// Ledger state of one registered unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub id: String,
    pub name: String,
    pub description: String,
    pub reversible: bool,
    pub applied_at: Option<DateTime<Utc>>,
}

pub struct MigrationRunner<'a> {
    store: &'a dyn RecordStore,
    ledger: &'a dyn Ledger,
    units: Vec<Box<dyn Migration>>,
}

impl<'a> MigrationRunner<'a> {
    /// Runner over every registered migration.
    #[must_use]
    pub fn new(store: &'a dyn RecordStore, ledger: &'a dyn Ledger) -> Self {
        Self::with_migrations(store, ledger, all_migrations())
    }

    /// Runner over an explicit unit list. Units are sorted by id.
    #[must_use]
    pub fn with_migrations(
        store: &'a dyn RecordStore,
        ledger: &'a dyn Ledger,
        mut units: Vec<Box<dyn Migration>>,
    ) -> Self {
        units.sort_by(|a, b| a.id().cmp(b.id()));
        Self {
            store,
            ledger,
            units,
        }
    }

    fn find(&self, id: &str) -> Option<&dyn Migration> {
        self.units
            .iter()
            .find(|unit| unit.id() == id)
            .map(|unit| &**unit)
    }

    /// Execute pending units in id order, stopping at the first failure.
    ///
    /// A failed unit is recorded in the report rather than returned as an
    /// error; check [`RunReport::is_success`].
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read or written.
    pub fn run_migrations(&self, opts: RunOptions) -> Result<RunReport, EngineError> {
        let ctx = MigrationContext {
            dry_run: opts.dry_run,
            run_date: opts.started_at.date_naive(),
        };
        let mut report = RunReport {
            dry_run: opts.dry_run,
            force: opts.force,
            results: Vec::new(),
            skipped: Vec::new(),
            aborted_at: None,
        };

        for unit in &self.units {
            let unit: &dyn Migration = &**unit;
            if self.ledger.has_run(unit.id())? && !opts.dry_run && !opts.force {
                tracing::info!(id = unit.id(), name = unit.name(), "already applied, skipping");
                report.skipped.push(unit.id().to_string());
                continue;
            }

            tracing::info!(id = unit.id(), name = unit.name(), dry_run = opts.dry_run, "running migration");
            match unit.execute(self.store, &ctx) {
                Ok(outcome) => {
                    if !opts.dry_run {
                        self.ledger.mark_run(unit.id(), opts.started_at)?;
                    }
                    tracing::info!(
                        id = unit.id(),
                        modified = outcome.documents_modified,
                        "migration finished"
                    );
                    report
                        .results
                        .push(MigrationResult::succeeded(unit, opts.dry_run, outcome));
                }
                Err(err) => {
                    let failure = EngineError::UnitFailed {
                        id: unit.id().to_string(),
                        message: format!("{err:#}"),
                    };
                    tracing::error!(id = unit.id(), error = %failure, "migration failed, aborting run");
                    report.results.push(MigrationResult::failed(
                        unit,
                        opts.dry_run,
                        format!("{err:#}"),
                    ));
                    report.aborted_at = Some(unit.id().to_string());
                    break;
                }
            }
        }

        Ok(report)
    }

    /// Undo one unit and drop its ledger entry.
    ///
    /// Irreversible units and failed rollbacks yield a result with
    /// `success == false`; the ledger is left untouched in both cases.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownMigration`] for an unregistered id, or a
    /// store error if the ledger cannot be updated.
    pub fn rollback_migration(&self, id: &str) -> Result<MigrationResult, EngineError> {
        let unit = self
            .find(id)
            .ok_or_else(|| EngineError::UnknownMigration(id.to_string()))?;

        let rollback = match unit.reversibility() {
            Reversibility::Reversible(rollback) => rollback,
            Reversibility::Irreversible { reason } => {
                tracing::warn!(id, reason, "rollback not supported");
                return Ok(MigrationResult::failed(
                    unit,
                    false,
                    format!("rollback not supported: {reason}"),
                ));
            }
        };

        tracing::info!(id, name = unit.name(), "rolling back migration");
        match rollback.rollback(self.store) {
            Ok(outcome) => {
                let removed = self.ledger.unmark(id)?;
                if !removed {
                    tracing::warn!(id, "rolled back a migration with no ledger entry");
                }
                Ok(MigrationResult::succeeded(unit, false, outcome))
            }
            Err(err) => {
                tracing::error!(id, error = %format!("{err:#}"), "rollback failed");
                Ok(MigrationResult::failed(unit, false, format!("{err:#}")))
            }
        }
    }

    /// Whether the unit `id` supports rollback.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownMigration`] for an unregistered id.
    pub fn is_reversible(&self, id: &str) -> Result<bool, EngineError> {
        self.find(id)
            .map(|unit| matches!(unit.reversibility(), Reversibility::Reversible(_)))
            .ok_or_else(|| EngineError::UnknownMigration(id.to_string()))
    }

    /// Run the structural validator over the whole store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn validate_data(&self, sample_size: usize) -> Result<ValidationReport, EngineError> {
        validate_data(self.store, sample_size)
    }

    /// Every registered unit with its ledger state.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub fn status(&self) -> Result<Vec<MigrationStatus>, EngineError> {
        let entries = self.ledger.entries()?;
        Ok(self
            .units
            .iter()
            .map(|unit| MigrationStatus {
                id: unit.id().to_string(),
                name: unit.name().to_string(),
                description: unit.description().to_string(),
                reversible: matches!(unit.reversibility(), Reversibility::Reversible(_)),
                applied_at: entries
                    .iter()
                    .find(|entry| entry.migration_id == unit.id())
                    .map(|entry| entry.run_at),
            })
            .collect())
    }
}
