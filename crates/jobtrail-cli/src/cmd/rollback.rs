//! `jt rollback <id>`: undo one migration and drop its ledger entry.

use clap::Args;
use jobtrail_core::config::EffectiveConfig;
use jobtrail_core::db::SqliteStore;
use jobtrail_core::error::EngineError;
use jobtrail_core::migrate::MigrationRunner;

use super::{write_result_pretty, write_result_text};
use crate::backup;
use crate::output::{OutputMode, render_mode};

/// Arguments for `jt rollback`.
#[derive(Args, Debug)]
pub struct RollbackArgs {
    /// Migration id to roll back (e.g. 006).
    pub migration_id: String,
}

/// Execute `jt rollback`.
pub fn run_rollback(
    args: &RollbackArgs,
    store: &SqliteStore,
    config: &EffectiveConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let runner = MigrationRunner::new(store, store);
    // Reject unknown ids before advising a backup.
    let reversible = runner.is_reversible(&args.migration_id)?;
    backup::advise_backup(&config.store_path, "rollback");

    let result = runner.rollback_migration(&args.migration_id)?;
    render_mode(
        output,
        &result,
        |result, w| write_result_text(w, result),
        |result, w| write_result_pretty(w, result),
    )?;

    if result.success {
        return Ok(());
    }
    let detail = result.errors.join("; ");
    let err = if reversible {
        EngineError::UnitFailed {
            id: result.id.clone(),
            message: detail,
        }
    } else {
        EngineError::RollbackUnsupported {
            id: result.id.clone(),
            reason: detail,
        }
    };
    Err(err.into())
}
