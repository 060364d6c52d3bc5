//! 004: recompute every record's `currentStatus` from its status dates.

use super::{Migration, MigrationContext, MigrationOutcome, Reversibility};
use crate::db::RecordStore;
use crate::workflow::{StageResolver, StatusResolver};

pub struct RecalculateCurrentStatus {
    resolver: Box<dyn StatusResolver>,
}

impl RecalculateCurrentStatus {
    #[must_use]
    pub fn new(resolver: Box<dyn StatusResolver>) -> Self {
        Self { resolver }
    }
}

impl Default for RecalculateCurrentStatus {
    fn default() -> Self {
        Self::new(Box::new(StageResolver))
    }
}

impl Migration for RecalculateCurrentStatus {
    fn id(&self) -> &'static str {
        "004"
    }

    fn name(&self) -> &'static str {
        "recalculate-current-status"
    }

    fn description(&self) -> &'static str {
        "Recompute each application's current status from its status dates"
    }

    fn execute(
        &self,
        store: &dyn RecordStore,
        ctx: &MigrationContext,
    ) -> anyhow::Result<MigrationOutcome> {
        let mut outcome = MigrationOutcome::default();

        if ctx.dry_run {
            let statuses = store.scan_status_definitions()?;
            for record in store.scan_applications()? {
                let resolved = self.resolver.resolve(&record, &statuses);
                if record.current_status.as_ref() != Some(&resolved) {
                    outcome.documents_modified += 1;
                    outcome.note(format!("{}: would set status to {}", record.id, resolved.name));
                }
            }
            return Ok(outcome);
        }

        outcome.documents_modified = self.resolver.recalculate_all_current_statuses(store)?;
        outcome.note(format!(
            "current status updated on {} record(s)",
            outcome.documents_modified
        ));
        Ok(outcome)
    }

    fn reversibility(&self) -> Reversibility<'_> {
        Reversibility::Irreversible {
            reason: "previous current-status values are not retained",
        }
    }
}
