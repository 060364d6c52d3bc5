//! `jt run`, `jt force`, `jt dry-run`: execute the migration sequence.

use std::io::Write;

use jobtrail_core::config::EffectiveConfig;
use jobtrail_core::db::SqliteStore;
use jobtrail_core::error::EngineError;
use jobtrail_core::migrate::{MigrationRunner, RunOptions, RunReport};
use jobtrail_core::validate::ValidationReport;
use serde::Serialize;

use super::validate::{write_validation_pretty, write_validation_text};
use super::{write_result_pretty, write_result_text};
use crate::backup;
use crate::output::{OutputMode, pretty_section, render_mode};

/// How the sequence should treat the ledger and the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Pending,
    Force,
    DryRun,
}

impl RunKind {
    const fn options(self) -> (bool, bool) {
        match self {
            Self::Pending => (false, false),
            Self::Force => (false, true),
            Self::DryRun => (true, false),
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Pending => "run",
            Self::Force => "force",
            Self::DryRun => "dry-run",
        }
    }
}

#[derive(Debug, Serialize)]
struct RunOutput<'a> {
    run: &'a RunReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation: Option<ValidationReport>,
}

fn write_text(out: &RunOutput<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    for result in &out.run.results {
        write_result_text(w, result)?;
    }
    for id in &out.run.skipped {
        writeln!(w, "{id}\tskipped\t0\t")?;
    }
    if let Some(validation) = &out.validation {
        write_validation_text(w, validation)?;
    }
    Ok(())
}

fn write_pretty(out: &RunOutput<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    let heading = if out.run.dry_run {
        "Migrations (dry run, nothing written)"
    } else {
        "Migrations"
    };
    pretty_section(w, heading)?;
    for result in &out.run.results {
        write_result_pretty(w, result)?;
    }
    if !out.run.skipped.is_empty() {
        writeln!(w, "already applied: {}", out.run.skipped.join(", "))?;
    }
    if let Some(id) = &out.run.aborted_at {
        writeln!(w, "run aborted at {id}; later migrations did not run")?;
    }
    if let Some(validation) = &out.validation {
        writeln!(w)?;
        write_validation_pretty(w, validation)?;
    }
    Ok(())
}

/// Execute `jt run` / `jt force` / `jt dry-run`.
pub fn run_migrations(
    kind: RunKind,
    store: &SqliteStore,
    config: &EffectiveConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    if kind != RunKind::DryRun {
        backup::advise_backup(&config.store_path, kind.label());
    }

    let (dry_run, force) = kind.options();
    let runner = MigrationRunner::new(store, store);
    let report = runner.run_migrations(RunOptions::new(dry_run, force))?;

    let validation = if report.is_success() && !dry_run {
        Some(runner.validate_data(config.project.validate.sample_size)?)
    } else {
        None
    };

    let out = RunOutput {
        run: &report,
        validation,
    };
    render_mode(output, &out, write_text, write_pretty)?;

    if let Some(id) = &report.aborted_at {
        let message = report
            .results
            .iter()
            .find(|result| &result.id == id)
            .map(|result| result.errors.join("; "))
            .unwrap_or_default();
        return Err(EngineError::UnitFailed {
            id: id.clone(),
            message,
        }
        .into());
    }
    Ok(())
}
