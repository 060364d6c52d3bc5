//! Status-date inference from free-text event history.
//!
//! Each event title is lower-cased and tested against fixed keyword sets.
//! A title may hit several sets; each hit is considered independently.
//!
//! | keywords                                                       | field             | multiple hits |
//! |----------------------------------------------------------------|-------------------|---------------|
//! | applied, application                                           | `appliedDate`     | earliest      |
//! | phone screen, phone call, screening                            | `phoneScreenDate` | latest        |
//! | interview, round 1, first round, technical                     | `round1Date`      | latest        |
//! | round 2, second round, final round, onsite                     | `round2Date`      | latest        |
//! | accepted, offer, hired                                         | `acceptedDate`    | latest        |
//! | rejected, declined, rejection, not selected, passed            | `declinedDate`    | latest        |
//!
//! Undated events (or dates that do not parse) are ignored. When nothing hits
//! the applied set, `appliedDate` falls back to the earliest dated event.
//!
//! The keyword sets are deliberately literal: "screening" is always a phone
//! screen here, even when the event describes a technical screen.

use chrono::NaiveDate;

use crate::model::{EventDoc, StatusDates, StatusField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pick {
    Earliest,
    Latest,
}

struct KeywordRule {
    field: StatusField,
    keywords: &'static [&'static str],
    pick: Pick,
}

const RULES: [KeywordRule; 6] = [
    KeywordRule {
        field: StatusField::AppliedDate,
        keywords: &["applied", "application"],
        pick: Pick::Earliest,
    },
    KeywordRule {
        field: StatusField::PhoneScreenDate,
        keywords: &["phone screen", "phone call", "screening"],
        pick: Pick::Latest,
    },
    KeywordRule {
        field: StatusField::Round1Date,
        keywords: &["interview", "round 1", "first round", "technical"],
        pick: Pick::Latest,
    },
    KeywordRule {
        field: StatusField::Round2Date,
        keywords: &["round 2", "second round", "final round", "onsite"],
        pick: Pick::Latest,
    },
    KeywordRule {
        field: StatusField::AcceptedDate,
        keywords: &["accepted", "offer", "hired"],
        pick: Pick::Latest,
    },
    KeywordRule {
        field: StatusField::DeclinedDate,
        keywords: &["rejected", "declined", "rejection", "not selected", "passed"],
        pick: Pick::Latest,
    },
];

fn keep(current: Option<NaiveDate>, candidate: NaiveDate, pick: Pick) -> NaiveDate {
    match (current, pick) {
        (None, _) => candidate,
        (Some(existing), Pick::Earliest) => existing.min(candidate),
        (Some(existing), Pick::Latest) => existing.max(candidate),
    }
}

/// Infer status dates from an event list.
///
/// Pure: the result says nothing about which fields a record already has.
/// Callers merge with [`StatusDates::fill_absent`].
#[must_use]
pub fn infer_status_dates(events: &[EventDoc]) -> StatusDates {
    let mut inferred = StatusDates::default();
    let mut earliest_any: Option<NaiveDate> = None;

    for event in events {
        let Some(date) = event.calendar_date() else {
            continue;
        };
        earliest_any = Some(keep(earliest_any, date, Pick::Earliest));

        let Some(title) = event.effective_title() else {
            continue;
        };
        let title = title.to_lowercase();

        for rule in &RULES {
            if rule.keywords.iter().any(|kw| title.contains(kw)) {
                let slot = inferred.slot_mut(rule.field);
                *slot = Some(keep(*slot, date, rule.pick));
            }
        }
    }

    if inferred.applied_date.is_none() {
        inferred.applied_date = earliest_any;
    }

    inferred
}
