//! 006: synthesize timeline events for status dates that have none.
//!
//! New events are dated with the run date and placed before the existing
//! events. See [`crate::backfill`] for the titles and duplicate rules.

use anyhow::Context;

use super::{Migration, MigrationContext, MigrationOutcome, Reversibility, Rollback};
use crate::backfill::{is_synthetic, lifecycle_events};
use crate::db::RecordStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct BackfillLifecycleEvents;

impl Migration for BackfillLifecycleEvents {
    fn id(&self) -> &'static str {
        "006"
    }

    fn name(&self) -> &'static str {
        "backfill-lifecycle-events"
    }

    fn description(&self) -> &'static str {
        "Add creation and stage events derived from status dates"
    }

    fn execute(
        &self,
        store: &dyn RecordStore,
        ctx: &MigrationContext,
    ) -> anyhow::Result<MigrationOutcome> {
        let mut outcome = MigrationOutcome::default();
        let mut events_added = 0;

        for mut record in store.scan_applications()? {
            let mut added =
                lifecycle_events(&record.id, &record.status_dates, ctx.run_date, &record.events);
            if added.is_empty() {
                continue;
            }

            outcome.documents_modified += 1;
            events_added += added.len();
            if ctx.dry_run {
                let titles: Vec<&str> = added.iter().filter_map(|e| e.title.as_deref()).collect();
                outcome.note(format!(
                    "{}: would add {} event(s): {}",
                    record.id,
                    added.len(),
                    titles.join(", ")
                ));
                continue;
            }
            added.append(&mut record.events);
            record.events = added;
            store
                .update_application(&record)
                .with_context(|| format!("failed to write backfilled events for {}", record.id))?;
        }

        outcome.note(format!(
            "{events_added} event(s) added across {} record(s)",
            outcome.documents_modified
        ));
        Ok(outcome)
    }

    fn reversibility(&self) -> Reversibility<'_> {
        Reversibility::Reversible(self)
    }
}

impl Rollback for BackfillLifecycleEvents {
    fn rollback(&self, store: &dyn RecordStore) -> anyhow::Result<MigrationOutcome> {
        let mut outcome = MigrationOutcome::default();
        let mut events_removed = 0;

        for mut record in store.scan_applications()? {
            let before = record.events.len();
            record.events.retain(|event| !is_synthetic(event));
            let removed = before - record.events.len();
            if removed == 0 {
                continue;
            }
            store
                .update_application(&record)
                .with_context(|| format!("failed to remove backfilled events for {}", record.id))?;
            outcome.documents_modified += 1;
            events_removed += removed;
        }

        if events_removed > 0 {
            tracing::warn!(
                events = events_removed,
                "removed events by generated text; user events with identical text are removed too"
            );
        }
        outcome.note(format!(
            "{events_removed} generated event(s) removed from {} record(s)",
            outcome.documents_modified
        ));
        Ok(outcome)
    }
}
