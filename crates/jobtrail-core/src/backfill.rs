//! Synthetic lifecycle events derived from status dates.
//!
//! Synthetic events are dated with the date they are generated (the
//! migration run date, or the creation date on the live path). The original
//! status date survives only inside the description text, e.g.
//! `"Applied to position on 2025-01-15"`.
//!
//! Duplicate detection and rollback both rely on exact text: an existing
//! event suppresses a stage when its title is one of that stage's recognized
//! titles, and [`is_synthetic`] recognizes exactly the title/description
//! pairs produced here. A user-authored event with identical text is
//! indistinguishable from a generated one.

use chrono::NaiveDate;

use crate::model::{EventDoc, StatusDates, StatusField, parse_calendar_date};

/// Title of the event marking the start of tracking.
pub const CREATED_TITLE: &str = "Application created";
/// Description paired with [`CREATED_TITLE`].
pub const CREATED_DESCRIPTION: &str = "Application tracking started";

/// How one status-date field is rendered as a timeline event.
#[derive(Debug, Clone, Copy)]
pub struct StageEvent {
    pub field: StatusField,
    pub title: &'static str,
    /// Existing titles that count as "this stage is already on the timeline".
    pub recognized_titles: &'static [&'static str],
    pub description_prefix: &'static str,
}

impl StageEvent {
    #[must_use]
    pub fn description(&self, status_date: NaiveDate) -> String {
        format!(
            "{} on {}",
            self.description_prefix,
            status_date.format("%Y-%m-%d")
        )
    }

    fn is_recognized(&self, title: &str) -> bool {
        self.recognized_titles.contains(&title)
    }

    fn matches_description(&self, description: &str) -> bool {
        description
            .strip_prefix(self.description_prefix)
            .and_then(|rest| rest.strip_prefix(" on "))
            .is_some_and(|date| {
                date.len() == 10 && parse_calendar_date(date).is_some()
            })
    }
}

/// Stage events in workflow order.
pub const STAGE_EVENTS: [StageEvent; 6] = [
    StageEvent {
        field: StatusField::AppliedDate,
        title: "Applied",
        recognized_titles: &["Applied", "Application submitted"],
        description_prefix: "Applied to position",
    },
    StageEvent {
        field: StatusField::PhoneScreenDate,
        title: "Phone screen scheduled",
        recognized_titles: &["Phone screen scheduled", "Phone screen", "Phone Screen"],
        description_prefix: "Phone screen",
    },
    StageEvent {
        field: StatusField::Round1Date,
        title: "First round interview",
        recognized_titles: &["First round interview", "Round 1", "Round 1 interview"],
        description_prefix: "First round interview",
    },
    StageEvent {
        field: StatusField::Round2Date,
        title: "Second round interview",
        recognized_titles: &["Second round interview", "Round 2", "Round 2 interview"],
        description_prefix: "Second round interview",
    },
    StageEvent {
        field: StatusField::AcceptedDate,
        title: "Offer accepted",
        recognized_titles: &["Offer accepted", "Accepted"],
        description_prefix: "Offer accepted",
    },
    StageEvent {
        field: StatusField::DeclinedDate,
        title: "Application declined",
        recognized_titles: &["Application declined", "Declined", "Rejected"],
        description_prefix: "Application declined",
    },
];

/// Deterministic id for a synthetic event.
#[must_use]
pub fn synthetic_event_id(record_id: &str, title: &str, event_date: NaiveDate) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(record_id.as_bytes());
    hasher.update(&[0]);
    hasher.update(title.as_bytes());
    hasher.update(&[0]);
    hasher.update(event_date.to_string().as_bytes());
    let hex = hasher.finalize().to_hex();
    format!("evt-{}", &hex.as_str()[..12])
}

fn has_title(existing: &[EventDoc], title: &str) -> bool {
    existing
        .iter()
        .any(|event| event.title.as_deref() == Some(title))
}

/// Synthetic events missing from `existing`, in timeline order.
///
/// The caller places the returned events before the existing ones. An empty
/// result means the record's timeline is already complete.
#[must_use]
pub fn lifecycle_events(
    record_id: &str,
    dates: &StatusDates,
    event_date: NaiveDate,
    existing: &[EventDoc],
) -> Vec<EventDoc> {
    let stamp = event_date.format("%Y-%m-%d").to_string();
    let mut created = Vec::new();

    if !has_title(existing, CREATED_TITLE) {
        created.push(EventDoc::canonical(
            synthetic_event_id(record_id, CREATED_TITLE, event_date),
            CREATED_TITLE,
            Some(CREATED_DESCRIPTION.to_string()),
            stamp.clone(),
        ));
    }

    for stage in &STAGE_EVENTS {
        let Some(status_date) = dates.get(stage.field) else {
            continue;
        };
        let already_present = existing.iter().any(|event| {
            event
                .title
                .as_deref()
                .is_some_and(|title| stage.is_recognized(title))
        });
        if already_present {
            continue;
        }
        created.push(EventDoc::canonical(
            synthetic_event_id(record_id, stage.title, event_date),
            stage.title,
            Some(stage.description(status_date)),
            stamp.clone(),
        ));
    }

    created
}

/// Whether `event` carries exactly the text this module generates.
#[must_use]
pub fn is_synthetic(event: &EventDoc) -> bool {
    let (Some(title), Some(description)) = (event.title.as_deref(), event.description.as_deref())
    else {
        return false;
    };
    if title == CREATED_TITLE {
        return description == CREATED_DESCRIPTION;
    }
    STAGE_EVENTS
        .iter()
        .any(|stage| stage.title == title && stage.matches_description(description))
}
