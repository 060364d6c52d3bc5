//! 003: give every application owner the default status taxonomy.
//!
//! Missing default statuses are created per owning user, then each record's
//! `currentStatus.id` is re-pointed at the definition matching
//! `{userId, currentStatus.name}`. Rollback deletes statuses by name, which
//! also removes user-created statuses that share a default name.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Context;

use super::{Migration, MigrationContext, MigrationOutcome, Reversibility, Rollback};
use crate::db::RecordStore;
use crate::model::StatusDefinition;
use crate::workflow::{DefaultWorkflow, WorkflowProvider, default_status_names};

pub struct ReconcileWorkflow {
    workflow: Box<dyn WorkflowProvider>,
}

impl ReconcileWorkflow {
    #[must_use]
    pub fn new(workflow: Box<dyn WorkflowProvider>) -> Self {
        Self { workflow }
    }
}

impl Default for ReconcileWorkflow {
    fn default() -> Self {
        Self::new(Box::new(DefaultWorkflow))
    }
}

impl Migration for ReconcileWorkflow {
    fn id(&self) -> &'static str {
        "003"
    }

    fn name(&self) -> &'static str {
        "reconcile-workflow-statuses"
    }

    fn description(&self) -> &'static str {
        "Create default workflow statuses per user and re-point current statuses"
    }

    fn execute(
        &self,
        store: &dyn RecordStore,
        ctx: &MigrationContext,
    ) -> anyhow::Result<MigrationOutcome> {
        let mut outcome = MigrationOutcome::default();
        let records = store.scan_applications()?;
        let mut definitions = store.scan_status_definitions()?;

        let owners: BTreeSet<&str> = records.iter().map(|r| r.user_id.as_str()).collect();
        let existing: BTreeSet<(String, String)> = definitions
            .iter()
            .map(|def| (def.user_id.clone(), def.name.clone()))
            .collect();
        let missing: Vec<StatusDefinition> = owners
            .iter()
            .flat_map(|owner| self.workflow.default_statuses(owner))
            .filter(|def| !existing.contains(&(def.user_id.clone(), def.name.clone())))
            .collect();

        if !missing.is_empty() {
            let users: BTreeSet<&str> = missing.iter().map(|def| def.user_id.as_str()).collect();
            if ctx.dry_run {
                outcome.note(format!(
                    "would create {} status definition(s) for {} user(s)",
                    missing.len(),
                    users.len()
                ));
            } else {
                store
                    .insert_status_definitions(&missing)
                    .context("failed to create default status definitions")?;
                outcome.note(format!(
                    "created {} status definition(s) for {} user(s)",
                    missing.len(),
                    users.len()
                ));
                tracing::info!(created = missing.len(), users = users.len(), "default statuses created");
            }
            outcome.documents_modified += missing.len();
        }
        definitions.extend(missing);

        let by_owner_and_name: BTreeMap<(&str, &str), &str> = definitions
            .iter()
            .map(|def| ((def.user_id.as_str(), def.name.as_str()), def.id.as_str()))
            .collect();

        let mut repointed = 0;
        for mut record in records {
            let Some(current) = record.current_status.as_mut() else {
                continue;
            };
            let Some(&target) =
                by_owner_and_name.get(&(record.user_id.as_str(), current.name.as_str()))
            else {
                continue;
            };
            if current.id == target {
                continue;
            }
            current.id = target.to_string();
            repointed += 1;
            if !ctx.dry_run {
                store
                    .update_application(&record)
                    .with_context(|| format!("failed to re-point status for {}", record.id))?;
            }
        }

        outcome.documents_modified += repointed;
        let verb = if ctx.dry_run { "would re-point" } else { "re-pointed" };
        outcome.note(format!("{verb} current status on {repointed} record(s)"));
        Ok(outcome)
    }

    fn reversibility(&self) -> Reversibility<'_> {
        Reversibility::Reversible(self)
    }
}

impl Rollback for ReconcileWorkflow {
    fn rollback(&self, store: &dyn RecordStore) -> anyhow::Result<MigrationOutcome> {
        let names = default_status_names();
        let deleted = store
            .delete_status_definitions_named(&names)
            .context("failed to delete default status definitions")?;
        tracing::warn!(
            deleted,
            "status definitions deleted by name; user-created statuses with default names are gone too"
        );
        Ok(MigrationOutcome {
            documents_modified: deleted,
            messages: vec![format!(
                "deleted {deleted} status definition(s) named after default stages (destructive: includes user-created ones)"
            )],
        })
    }
}
