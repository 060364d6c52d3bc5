//! Timeline events stored inside an application document.
//!
//! Two shapes coexist in older stores:
//!
//! - **legacy**: `{id, eventType, statusId, statusName, notes, date}`
//! - **canonical**: `{id, title, description, date}`
//!
//! [`EventDoc`] deserializes either shape (or a mix of both keys) so that
//! migrations can read a partially-migrated store. Unknown keys are preserved
//! via `#[serde(flatten)]`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Fallback title for events that carry no usable title.
pub const DEFAULT_EVENT_TITLE: &str = "Event";

/// Which schema generation an event document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventShape {
    Legacy,
    Canonical,
}

/// A single event as stored, in whichever shape it currently has.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl EventDoc {
    /// Build a canonical event.
    #[must_use]
    pub fn canonical(
        id: impl Into<String>,
        title: impl Into<String>,
        description: Option<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            title: Some(title.into()),
            description,
            date: Some(date.into()),
            ..Self::default()
        }
    }

    /// An event is legacy-shaped when any pre-migration key is present.
    #[must_use]
    pub const fn shape(&self) -> EventShape {
        if self.event_type.is_some()
            || self.status_id.is_some()
            || self.status_name.is_some()
            || self.notes.is_some()
        {
            EventShape::Legacy
        } else {
            EventShape::Canonical
        }
    }

    /// The best available title across both shapes:
    /// `title`, then `eventType`, then `statusName`.
    #[must_use]
    pub fn effective_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .or(self.event_type.as_deref())
            .or(self.status_name.as_deref())
    }

    /// The event date as a calendar date, if it parses.
    #[must_use]
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(parse_calendar_date)
    }
}

/// Parse a stored date string into a calendar date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps, and naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` timestamps. Anything else yields `None`.
#[must_use]
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|ts| ts.date())
}
