use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::event::{EventDoc, EventShape, parse_calendar_date};

/// One of the six canonical status-date fields, in workflow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusField {
    AppliedDate,
    PhoneScreenDate,
    Round1Date,
    Round2Date,
    AcceptedDate,
    DeclinedDate,
}

impl StatusField {
    /// All fields in workflow order.
    pub const ALL: [Self; 6] = [
        Self::AppliedDate,
        Self::PhoneScreenDate,
        Self::Round1Date,
        Self::Round2Date,
        Self::AcceptedDate,
        Self::DeclinedDate,
    ];

    /// The document key for this field.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::AppliedDate => "appliedDate",
            Self::PhoneScreenDate => "phoneScreenDate",
            Self::Round1Date => "round1Date",
            Self::Round2Date => "round2Date",
            Self::AcceptedDate => "acceptedDate",
            Self::DeclinedDate => "declinedDate",
        }
    }
}

impl fmt::Display for StatusField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Status dates are written as `YYYY-MM-DD` but read through
/// [`parse_calendar_date`], so timestamp forms decode to their calendar date.
/// A blank string reads as absent; any other unparseable value is an error.
fn status_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_calendar_date(&raw)
        .map(Some)
        .ok_or_else(|| de::Error::custom(format!("invalid status date '{raw}'")))
}

/// The six optional status dates. Each marks when the application reached
/// that stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDates {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "status_date"
    )]
    pub applied_date: Option<NaiveDate>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "status_date"
    )]
    pub phone_screen_date: Option<NaiveDate>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "status_date"
    )]
    pub round1_date: Option<NaiveDate>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "status_date"
    )]
    pub round2_date: Option<NaiveDate>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "status_date"
    )]
    pub accepted_date: Option<NaiveDate>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "status_date"
    )]
    pub declined_date: Option<NaiveDate>,
}

impl StatusDates {
    #[must_use]
    pub const fn get(&self, field: StatusField) -> Option<NaiveDate> {
        match field {
            StatusField::AppliedDate => self.applied_date,
            StatusField::PhoneScreenDate => self.phone_screen_date,
            StatusField::Round1Date => self.round1_date,
            StatusField::Round2Date => self.round2_date,
            StatusField::AcceptedDate => self.accepted_date,
            StatusField::DeclinedDate => self.declined_date,
        }
    }

    pub fn slot_mut(&mut self, field: StatusField) -> &mut Option<NaiveDate> {
        match field {
            StatusField::AppliedDate => &mut self.applied_date,
            StatusField::PhoneScreenDate => &mut self.phone_screen_date,
            StatusField::Round1Date => &mut self.round1_date,
            StatusField::Round2Date => &mut self.round2_date,
            StatusField::AcceptedDate => &mut self.accepted_date,
            StatusField::DeclinedDate => &mut self.declined_date,
        }
    }

    /// Populated fields with their dates, in workflow order.
    pub fn populated(&self) -> impl Iterator<Item = (StatusField, NaiveDate)> + '_ {
        StatusField::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|date| (field, date)))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.populated().next().is_none()
    }

    /// Copy every field of `inferred` into `self` where `self` has none.
    ///
    /// Returns the fields that were filled.
    pub fn fill_absent(&mut self, inferred: &Self) -> Vec<StatusField> {
        let mut filled = Vec::new();
        for (field, date) in inferred.populated() {
            let slot = self.slot_mut(field);
            if slot.is_none() {
                *slot = Some(date);
                filled.push(field);
            }
        }
        filled
    }
}

/// Cached snapshot of the furthest-reached stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentStatus {
    pub id: String,
    pub name: String,
}

/// A job application document as held by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub events: Vec<EventDoc>,
    #[serde(flatten)]
    pub status_dates: StatusDates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_status: Option<CurrentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ApplicationRecord {
    #[must_use]
    pub fn new(id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            events: Vec::new(),
            status_dates: StatusDates::default(),
            current_status: None,
            created_at: None,
            extra: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: Vec<EventDoc>) -> Self {
        self.events = events;
        self
    }

    /// Classify the record's event list by shape.
    #[must_use]
    pub fn event_shape(&self) -> RecordShape {
        let mut legacy = false;
        let mut canonical = false;
        for event in &self.events {
            match event.shape() {
                EventShape::Legacy => legacy = true,
                EventShape::Canonical => canonical = true,
            }
        }
        match (legacy, canonical) {
            (false, false) => RecordShape::NoEvents,
            (true, false) => RecordShape::Legacy,
            (false, true) => RecordShape::Canonical,
            (true, true) => RecordShape::Mixed,
        }
    }
}

/// Shape of a whole record's event list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordShape {
    NoEvents,
    Legacy,
    Canonical,
    /// Both shapes inside one record. Always an error condition.
    Mixed,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn record_document_roundtrips_with_extra_fields() {
        let json = r#"{
            "id": "app-1",
            "userId": "u1",
            "company": "Initech",
            "appliedDate": "2025-01-05",
            "events": [{"title": "Applied", "date": "2025-01-05"}],
            "currentStatus": {"id": "st-1", "name": "Applied"}
        }"#;
        let record: ApplicationRecord = serde_json::from_str(json).expect("parse");
        assert_eq!(record.status_dates.applied_date, Some(date(2025, 1, 5)));
        assert_eq!(record.extra.get("company"), Some(&Value::from("Initech")));
        assert!(!record.extra.contains_key("appliedDate"));

        let back = serde_json::to_value(&record).expect("serialize");
        assert_eq!(back["company"], "Initech");
        assert_eq!(back["appliedDate"], "2025-01-05");
        assert!(back.get("declinedDate").is_none());
    }

    #[test]
    fn timestamp_status_dates_decode_to_calendar_dates() {
        let json = r#"{
            "id": "app-2",
            "userId": "u1",
            "appliedDate": "2025-01-15T00:00:00.000Z",
            "round1Date": "2025-02-03T14:30:00",
            "declinedDate": ""
        }"#;
        let record: ApplicationRecord = serde_json::from_str(json).expect("parse");
        assert_eq!(record.status_dates.applied_date, Some(date(2025, 1, 15)));
        assert_eq!(record.status_dates.round1_date, Some(date(2025, 2, 3)));
        assert_eq!(record.status_dates.declined_date, None);

        let back = serde_json::to_value(&record).expect("serialize");
        assert_eq!(back["appliedDate"], "2025-01-15");
        assert_eq!(back["round1Date"], "2025-02-03");
        assert!(back.get("declinedDate").is_none());
    }

    #[test]
    fn garbage_status_date_is_a_decode_error() {
        let json = r#"{"id": "app-3", "userId": "u1", "appliedDate": "last spring"}"#;
        assert!(serde_json::from_str::<ApplicationRecord>(json).is_err());
    }

    #[test]
    fn fill_absent_never_overwrites() {
        let mut existing = StatusDates {
            applied_date: Some(date(2024, 12, 1)),
            ..StatusDates::default()
        };
        let inferred = StatusDates {
            applied_date: Some(date(2025, 1, 1)),
            round1_date: Some(date(2025, 2, 1)),
            ..StatusDates::default()
        };
        let filled = existing.fill_absent(&inferred);
        assert_eq!(filled, vec![StatusField::Round1Date]);
        assert_eq!(existing.applied_date, Some(date(2024, 12, 1)));
        assert_eq!(existing.round1_date, Some(date(2025, 2, 1)));
    }

    #[test]
    fn record_shape_detects_mixed_lists() {
        let legacy = EventDoc {
            event_type: Some("Applied".into()),
            ..EventDoc::default()
        };
        let canonical = EventDoc::canonical("e2", "Applied", None, "2025-01-01");

        let record = ApplicationRecord::new("a", "u").with_events(vec![legacy.clone()]);
        assert_eq!(record.event_shape(), RecordShape::Legacy);

        let record = ApplicationRecord::new("a", "u").with_events(vec![legacy, canonical]);
        assert_eq!(record.event_shape(), RecordShape::Mixed);

        assert_eq!(
            ApplicationRecord::new("a", "u").event_shape(),
            RecordShape::NoEvents
        );
    }
}
