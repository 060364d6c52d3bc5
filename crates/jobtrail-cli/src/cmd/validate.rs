//! `jt validate`: structural report over the whole store.

use std::io::{self, Write};

use jobtrail_core::config::EffectiveConfig;
use jobtrail_core::db::SqliteStore;
use jobtrail_core::migrate::MigrationRunner;
use jobtrail_core::validate::ValidationReport;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

pub(crate) fn write_validation_text(w: &mut dyn Write, report: &ValidationReport) -> io::Result<()> {
    writeln!(
        w,
        "records={} canonical={} legacy={} mixed={} no_events={} undecodable={}",
        report.total_records,
        report.canonical_records,
        report.legacy_records,
        report.mixed_records,
        report.records_without_events,
        report.undecodable_records
    )?;
    for (field, count) in &report.status_date_coverage {
        writeln!(w, "coverage\t{field}\t{count}")?;
    }
    for id in &report.mixed_record_ids {
        writeln!(w, "mixed\t{id}")?;
    }
    for id in &report.undecodable_record_ids {
        writeln!(w, "undecodable\t{id}")?;
    }
    Ok(())
}

pub(crate) fn write_validation_pretty(
    w: &mut dyn Write,
    report: &ValidationReport,
) -> io::Result<()> {
    pretty_section(w, "Validation")?;
    pretty_kv(w, "records", report.total_records.to_string())?;
    pretty_kv(w, "canonical", report.canonical_records.to_string())?;
    pretty_kv(w, "legacy", report.legacy_records.to_string())?;
    pretty_kv(w, "mixed", report.mixed_records.to_string())?;
    pretty_kv(w, "no events", report.records_without_events.to_string())?;
    if !report.mixed_record_ids.is_empty() {
        pretty_kv(w, "mixed ids", report.mixed_record_ids.join(", "))?;
    }
    if report.undecodable_records > 0 {
        pretty_kv(w, "undecodable", report.undecodable_record_ids.join(", "))?;
    }

    writeln!(w)?;
    writeln!(w, "status-date coverage")?;
    for (field, count) in &report.status_date_coverage {
        writeln!(w, "  {field:<16} {count}")?;
    }

    if !report.samples.is_empty() {
        writeln!(w)?;
        writeln!(w, "sample")?;
        for sample in &report.samples {
            let dates = if sample.status_dates.is_empty() {
                "-".to_string()
            } else {
                sample.status_dates.join(", ")
            };
            writeln!(
                w,
                "  {} ({}, {} events): {dates}",
                sample.id, sample.shape, sample.events
            )?;
        }
    }

    if report.is_clean() {
        writeln!(w, "\nall records are in the canonical shape")
    } else {
        writeln!(w, "\nsome records still need migration; run `jt run`")
    }
}

/// Execute `jt validate`.
pub fn run_validate(
    store: &SqliteStore,
    config: &EffectiveConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let runner = MigrationRunner::new(store, store);
    let report = runner.validate_data(config.project.validate.sample_size)?;
    render_mode(
        output,
        &report,
        |report, w| write_validation_text(w, report),
        |report, w| write_validation_pretty(w, report),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobtrail_core::validate::validate_data;

    #[test]
    fn text_summary_line_counts_shapes() {
        let store = SqliteStore::open_in_memory().expect("store");
        let report = validate_data(&store, 3).expect("validate");
        let mut buf = Vec::new();
        write_validation_text(&mut buf, &report).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("records=0 canonical=0 legacy=0 mixed=0 no_events=0 undecodable=0\n"));
        assert!(text.contains("coverage\tappliedDate\t0"));
    }
}
