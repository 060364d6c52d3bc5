//! 001: rewrite legacy timeline events into the canonical shape.
//!
//! `title` is taken from `title`, then `eventType`, then `statusName`, then
//! [`DEFAULT_EVENT_TITLE`]; `description` from `description`, then `notes`.
//! Legacy keys are dropped. Rollback cannot recover `statusId`.

use anyhow::Context;

use super::{Migration, MigrationContext, MigrationOutcome, Reversibility, Rollback};
use crate::db::RecordStore;
use crate::model::{DEFAULT_EVENT_TITLE, EventDoc, EventShape};

/// Placeholder written into `statusId` when reverting to the legacy shape.
pub const UNKNOWN_STATUS_ID: &str = "unknown";

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeEventShape;

fn to_canonical(event: &EventDoc) -> EventDoc {
    EventDoc {
        id: event.id.clone(),
        title: Some(
            event
                .effective_title()
                .unwrap_or(DEFAULT_EVENT_TITLE)
                .to_string(),
        ),
        description: event.description.clone().or_else(|| event.notes.clone()),
        date: event.date.clone(),
        extra: event.extra.clone(),
        ..EventDoc::default()
    }
}

fn to_legacy(event: &EventDoc) -> EventDoc {
    EventDoc {
        id: event.id.clone(),
        event_type: event.title.clone(),
        status_id: Some(UNKNOWN_STATUS_ID.to_string()),
        status_name: event.title.clone(),
        notes: event.description.clone(),
        date: event.date.clone(),
        extra: event.extra.clone(),
        ..EventDoc::default()
    }
}

impl Migration for NormalizeEventShape {
    fn id(&self) -> &'static str {
        "001"
    }

    fn name(&self) -> &'static str {
        "normalize-event-shape"
    }

    fn description(&self) -> &'static str {
        "Rewrite legacy {eventType, statusName, notes} events as {title, description}"
    }

    fn execute(
        &self,
        store: &dyn RecordStore,
        ctx: &MigrationContext,
    ) -> anyhow::Result<MigrationOutcome> {
        let mut outcome = MigrationOutcome::default();
        let mut events_rewritten = 0;

        for mut record in store.scan_applications()? {
            if record.events.is_empty() {
                continue;
            }
            let normalized: Vec<EventDoc> = record.events.iter().map(to_canonical).collect();
            let changed = record
                .events
                .iter()
                .zip(&normalized)
                .filter(|(before, after)| before != after)
                .count();
            if changed == 0 {
                continue;
            }

            outcome.documents_modified += 1;
            events_rewritten += changed;
            if ctx.dry_run {
                outcome.note(format!("{}: would normalize {changed} event(s)", record.id));
                continue;
            }
            record.events = normalized;
            store
                .update_application(&record)
                .with_context(|| format!("failed to write normalized events for {}", record.id))?;
            tracing::debug!(record = %record.id, events = changed, "events normalized");
        }

        outcome.note(format!(
            "{events_rewritten} event(s) across {} record(s) normalized",
            outcome.documents_modified
        ));
        Ok(outcome)
    }

    fn reversibility(&self) -> Reversibility<'_> {
        Reversibility::Reversible(self)
    }
}

impl Rollback for NormalizeEventShape {
    fn rollback(&self, store: &dyn RecordStore) -> anyhow::Result<MigrationOutcome> {
        let mut outcome = MigrationOutcome::default();
        let mut events_reverted = 0;

        for mut record in store.scan_applications()? {
            let mut changed = 0;
            for event in &mut record.events {
                if event.shape() == EventShape::Canonical {
                    *event = to_legacy(event);
                    changed += 1;
                }
            }
            if changed == 0 {
                continue;
            }
            store
                .update_application(&record)
                .with_context(|| format!("failed to write legacy events for {}", record.id))?;
            outcome.documents_modified += 1;
            events_reverted += changed;
        }

        if events_reverted > 0 {
            tracing::warn!(
                events = events_reverted,
                "statusId cannot be recovered; reverted events carry '{UNKNOWN_STATUS_ID}'"
            );
        }
        outcome.note(format!(
            "{events_reverted} event(s) reverted to the legacy shape; statusId set to \"{UNKNOWN_STATUS_ID}\" (original values are lost)"
        ));
        Ok(outcome)
    }
}
