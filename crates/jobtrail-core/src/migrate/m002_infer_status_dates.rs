//! 002: fill absent status-date fields from event history.
//!
//! Existing fields are never overwritten. Rollback clears all six fields,
//! including any that were set by hand before this migration ran.

use anyhow::Context;

use super::{Migration, MigrationContext, MigrationOutcome, Reversibility, Rollback};
use crate::db::RecordStore;
use crate::inference::infer_status_dates;
use crate::model::{StatusDates, StatusField};

#[derive(Debug, Clone, Copy, Default)]
pub struct InferStatusDates;

fn field_list(fields: &[StatusField]) -> String {
    fields
        .iter()
        .map(|field| field.key())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Migration for InferStatusDates {
    fn id(&self) -> &'static str {
        "002"
    }

    fn name(&self) -> &'static str {
        "infer-status-dates"
    }

    fn description(&self) -> &'static str {
        "Fill missing status dates from event titles"
    }

    fn execute(
        &self,
        store: &dyn RecordStore,
        ctx: &MigrationContext,
    ) -> anyhow::Result<MigrationOutcome> {
        let mut outcome = MigrationOutcome::default();

        for mut record in store.scan_applications()? {
            let inferred = infer_status_dates(&record.events);
            let mut dates = record.status_dates;
            let filled = dates.fill_absent(&inferred);
            if filled.is_empty() {
                continue;
            }

            outcome.documents_modified += 1;
            if ctx.dry_run {
                outcome.note(format!("{}: would add {}", record.id, field_list(&filled)));
                continue;
            }
            record.status_dates = dates;
            store
                .update_application(&record)
                .with_context(|| format!("failed to write status dates for {}", record.id))?;
            tracing::debug!(record = %record.id, fields = %field_list(&filled), "status dates inferred");
        }

        outcome.note(format!(
            "status dates filled on {} record(s)",
            outcome.documents_modified
        ));
        Ok(outcome)
    }

    fn reversibility(&self) -> Reversibility<'_> {
        Reversibility::Reversible(self)
    }
}

impl Rollback for InferStatusDates {
    fn rollback(&self, store: &dyn RecordStore) -> anyhow::Result<MigrationOutcome> {
        let mut outcome = MigrationOutcome::default();

        for mut record in store.scan_applications()? {
            if record.status_dates.is_empty() {
                continue;
            }
            record.status_dates = StatusDates::default();
            store
                .update_application(&record)
                .with_context(|| format!("failed to clear status dates for {}", record.id))?;
            outcome.documents_modified += 1;
        }

        if outcome.documents_modified > 0 {
            tracing::warn!(
                records = outcome.documents_modified,
                "all status dates cleared, including values not set by inference"
            );
        }
        outcome.note(format!(
            "status dates cleared on {} record(s), including any set manually",
            outcome.documents_modified
        ));
        Ok(outcome)
    }
}
