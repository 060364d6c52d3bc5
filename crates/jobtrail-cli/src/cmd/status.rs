//! `jt status`: registered migrations and their ledger state.

use std::io::Write;

use jobtrail_core::db::SqliteStore;
use jobtrail_core::migrate::{MigrationRunner, MigrationStatus};

use crate::output::{OutputMode, pretty_section, render_mode};

fn applied_label(status: &MigrationStatus) -> String {
    status.applied_at.map_or_else(
        || "pending".to_string(),
        |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

fn write_text(statuses: &Vec<MigrationStatus>, w: &mut dyn Write) -> std::io::Result<()> {
    for status in statuses {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            status.id,
            if status.applied_at.is_some() { "applied" } else { "pending" },
            if status.reversible { "reversible" } else { "irreversible" },
            status.name
        )?;
    }
    Ok(())
}

fn write_pretty(statuses: &Vec<MigrationStatus>, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Migrations")?;
    for status in statuses {
        let lock = if status.reversible { "" } else { "  (irreversible)" };
        writeln!(
            w,
            "{}  {:<28} {}{lock}",
            status.id,
            status.name,
            applied_label(status)
        )?;
        writeln!(w, "     {}", status.description)?;
    }
    Ok(())
}

/// Execute `jt status`.
pub fn run_status(store: &SqliteStore, output: OutputMode) -> anyhow::Result<()> {
    let runner = MigrationRunner::new(store, store);
    let statuses = runner.status()?;
    render_mode(output, &statuses, write_text, write_pretty)
}
