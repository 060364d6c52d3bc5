//! Application records, timeline events, and status definitions.

pub mod application;
pub mod event;
pub mod status;

pub use application::{ApplicationRecord, CurrentStatus, RecordShape, StatusDates, StatusField};
pub use event::{DEFAULT_EVENT_TITLE, EventDoc, EventShape, parse_calendar_date};
pub use status::{StatusDefinition, status_id};
