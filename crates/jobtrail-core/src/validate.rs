//! Structural validator: reports how far the store is from the target shape.
//!
//! Diagnostic only. Nothing here writes to the store, and findings never
//! turn into errors.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::db::RecordStore;
use crate::error::EngineError;
use crate::model::{ApplicationRecord, RecordShape, StatusField};

/// Default number of records sampled for status-date coverage.
pub const DEFAULT_SAMPLE_SIZE: usize = 5;

/// Status-date coverage of one sampled record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSample {
    pub id: String,
    pub shape: &'static str,
    pub events: usize,
    pub status_dates: Vec<&'static str>,
    pub current_status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub total_records: usize,
    pub legacy_records: usize,
    pub canonical_records: usize,
    /// Records whose event list mixes both shapes. Always a defect.
    pub mixed_records: usize,
    pub records_without_events: usize,
    /// Stored documents that do not decode as an application record.
    pub undecodable_records: usize,
    pub mixed_record_ids: Vec<String>,
    pub undecodable_record_ids: Vec<String>,
    /// Records carrying each status-date field, keyed by field name.
    pub status_date_coverage: BTreeMap<&'static str, usize>,
    pub samples: Vec<RecordSample>,
}

impl ValidationReport {
    /// No legacy, mixed, or undecodable records remain.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.legacy_records == 0 && self.mixed_records == 0 && self.undecodable_records == 0
    }
}

const fn shape_name(shape: RecordShape) -> &'static str {
    match shape {
        RecordShape::NoEvents => "no-events",
        RecordShape::Legacy => "legacy",
        RecordShape::Canonical => "canonical",
        RecordShape::Mixed => "mixed",
    }
}

fn sample(record: &ApplicationRecord, shape: RecordShape) -> RecordSample {
    RecordSample {
        id: record.id.clone(),
        shape: shape_name(shape),
        events: record.events.len(),
        status_dates: record
            .status_dates
            .populated()
            .map(|(field, _)| field.key())
            .collect(),
        current_status: record.current_status.as_ref().map(|s| s.name.clone()),
    }
}

/// Scan every record and summarize shapes and status-date coverage.
///
/// # Errors
///
/// Returns an error only if the store cannot be read. Documents that do not
/// decode are counted, not raised.
pub fn validate_data(
    store: &dyn RecordStore,
    sample_size: usize,
) -> Result<ValidationReport, EngineError> {
    let mut report = ValidationReport {
        status_date_coverage: StatusField::ALL.iter().map(|f| (f.key(), 0)).collect(),
        ..ValidationReport::default()
    };

    for row in store.scan_application_rows()? {
        report.total_records += 1;
        let record = match row {
            Ok(record) => record,
            Err(EngineError::Document { record_id, source }) => {
                tracing::warn!(record = %record_id, error = %source, "stored document does not decode");
                report.undecodable_records += 1;
                report.undecodable_record_ids.push(record_id);
                continue;
            }
            Err(err) => return Err(err),
        };
        let shape = record.event_shape();
        match shape {
            RecordShape::NoEvents => report.records_without_events += 1,
            RecordShape::Legacy => report.legacy_records += 1,
            RecordShape::Canonical => report.canonical_records += 1,
            RecordShape::Mixed => {
                report.mixed_records += 1;
                report.mixed_record_ids.push(record.id.clone());
            }
        }
        for (field, _) in record.status_dates.populated() {
            *report.status_date_coverage.entry(field.key()).or_default() += 1;
        }
        if report.samples.len() < sample_size {
            report.samples.push(sample(&record, shape));
        }
    }

    if report.mixed_records > 0 {
        tracing::warn!(
            records = report.mixed_records,
            "records mix legacy and canonical events"
        );
    }
    if report.undecodable_records > 0 {
        tracing::warn!(
            records = report.undecodable_records,
            "records could not be decoded; migrations will stop on them"
        );
    }
    if report.legacy_records > 0 {
        tracing::warn!(
            records = report.legacy_records,
            "records still carry legacy events"
        );
    }
    tracing::info!(
        total = report.total_records,
        canonical = report.canonical_records,
        "validation complete"
    );
    Ok(report)
}
