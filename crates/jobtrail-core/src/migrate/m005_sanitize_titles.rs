//! 005: replace missing or blank event titles with [`DEFAULT_EVENT_TITLE`].
//!
//! Applies to every event whatever its shape. Legacy keys on an event are
//! left alone, so the event stays legacy-shaped until 001 rewrites it.

use anyhow::Context;

use super::{Migration, MigrationContext, MigrationOutcome, Reversibility};
use crate::db::RecordStore;
use crate::model::{DEFAULT_EVENT_TITLE, EventDoc};

#[derive(Debug, Clone, Copy, Default)]
pub struct SanitizeEventTitles;

fn needs_title(event: &EventDoc) -> bool {
    event
        .title
        .as_deref()
        .is_none_or(|title| title.trim().is_empty())
}

impl Migration for SanitizeEventTitles {
    fn id(&self) -> &'static str {
        "005"
    }

    fn name(&self) -> &'static str {
        "sanitize-event-titles"
    }

    fn description(&self) -> &'static str {
        "Give events with a missing or blank title the default title"
    }

    fn execute(
        &self,
        store: &dyn RecordStore,
        ctx: &MigrationContext,
    ) -> anyhow::Result<MigrationOutcome> {
        let mut outcome = MigrationOutcome::default();

        for mut record in store.scan_applications()? {
            let mut fixed = 0;
            for event in record.events.iter_mut().filter(|event| needs_title(event)) {
                event.title = Some(DEFAULT_EVENT_TITLE.to_string());
                fixed += 1;
            }
            if fixed == 0 {
                continue;
            }

            outcome.documents_modified += 1;
            if ctx.dry_run {
                outcome.note(format!("{}: would retitle {fixed} event(s)", record.id));
                continue;
            }
            store
                .update_application(&record)
                .with_context(|| format!("failed to write sanitized titles for {}", record.id))?;
        }

        outcome.note(format!(
            "titles sanitized on {} record(s)",
            outcome.documents_modified
        ));
        Ok(outcome)
    }

    fn reversibility(&self) -> Reversibility<'_> {
        Reversibility::Irreversible {
            reason: "original blank titles are indistinguishable from real \"Event\" titles",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::migrate::test_context;
    use crate::model::{ApplicationRecord, RecordShape};

    fn titled(title: Option<&str>) -> EventDoc {
        EventDoc {
            id: Some("e".into()),
            title: title.map(Into::into),
            date: Some("2025-01-01".into()),
            ..EventDoc::default()
        }
    }

    #[test]
    fn blank_missing_and_whitespace_titles_are_replaced() {
        let store = SqliteStore::open_in_memory().expect("store");
        store
            .insert_applications(&[ApplicationRecord::new("a1", "u1").with_events(vec![
                titled(None),
                titled(Some("")),
                titled(Some("   ")),
                titled(Some("Offer call")),
            ])])
            .expect("insert");

        let outcome = SanitizeEventTitles
            .execute(&store, &test_context(false))
            .expect("execute");
        assert_eq!(outcome.documents_modified, 1);

        let titles: Vec<_> = store.scan_applications().expect("scan")[0]
            .events
            .iter()
            .filter_map(|e| e.title.clone())
            .collect();
        assert_eq!(titles, vec!["Event", "Event", "Event", "Offer call"]);

        let again = SanitizeEventTitles
            .execute(&store, &test_context(false))
            .expect("execute");
        assert_eq!(again.documents_modified, 0);
    }

    #[test]
    fn untitled_legacy_events_are_retitled_and_keep_their_keys() {
        let legacy = EventDoc {
            id: Some("l1".into()),
            event_type: Some("Interview".into()),
            status_id: Some("s1".into()),
            ..EventDoc::default()
        };
        assert!(needs_title(&legacy));
        assert!(needs_title(&titled(Some("\t"))));

        let store = SqliteStore::open_in_memory().expect("store");
        store
            .insert_applications(&[ApplicationRecord::new("a1", "u1").with_events(vec![legacy])])
            .expect("insert");
        SanitizeEventTitles
            .execute(&store, &test_context(false))
            .expect("execute");

        let record = &store.scan_applications().expect("scan")[0];
        let event = &record.events[0];
        assert_eq!(event.title.as_deref(), Some(DEFAULT_EVENT_TITLE));
        assert_eq!(event.event_type.as_deref(), Some("Interview"));
        assert_eq!(event.status_id.as_deref(), Some("s1"));
        assert_eq!(record.event_shape(), RecordShape::Legacy);
    }
}
