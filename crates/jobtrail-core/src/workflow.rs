//! Default workflow taxonomy and current-status resolution.
//!
//! Stage order: Not Applied < Applied < Phone Screen < Round 1 < Round 2 <
//! Accepted / Declined. Accepted and Declined share the terminal rank.

use std::fmt;

use crate::db::RecordStore;
use crate::error::EngineError;
use crate::model::{
    ApplicationRecord, CurrentStatus, StatusDates, StatusDefinition, StatusField, status_id,
};

/// A workflow stage an application can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    NotApplied,
    Applied,
    PhoneScreen,
    Round1,
    Round2,
    Accepted,
    Declined,
}

impl Stage {
    pub const ALL: [Self; 7] = [
        Self::NotApplied,
        Self::Applied,
        Self::PhoneScreen,
        Self::Round1,
        Self::Round2,
        Self::Accepted,
        Self::Declined,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NotApplied => "Not Applied",
            Self::Applied => "Applied",
            Self::PhoneScreen => "Phone Screen",
            Self::Round1 => "Round 1",
            Self::Round2 => "Round 2",
            Self::Accepted => "Accepted",
            Self::Declined => "Declined",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::NotApplied => "Saved but not yet applied",
            Self::Applied => "Application submitted",
            Self::PhoneScreen => "Initial phone screen with a recruiter",
            Self::Round1 => "First interview round",
            Self::Round2 => "Second or final interview round",
            Self::Accepted => "Offer accepted",
            Self::Declined => "Application declined or rejected",
        }
    }

    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::NotApplied => 0,
            Self::Applied => 1,
            Self::PhoneScreen => 2,
            Self::Round1 => 3,
            Self::Round2 => 4,
            Self::Accepted | Self::Declined => 5,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Declined)
    }

    /// The status-date field that marks reaching this stage.
    #[must_use]
    pub const fn field(self) -> Option<StatusField> {
        match self {
            Self::NotApplied => None,
            Self::Applied => Some(StatusField::AppliedDate),
            Self::PhoneScreen => Some(StatusField::PhoneScreenDate),
            Self::Round1 => Some(StatusField::Round1Date),
            Self::Round2 => Some(StatusField::Round2Date),
            Self::Accepted => Some(StatusField::AcceptedDate),
            Self::Declined => Some(StatusField::DeclinedDate),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Names of the default taxonomy, in stage order.
#[must_use]
pub fn default_status_names() -> Vec<&'static str> {
    Stage::ALL.iter().map(|stage| stage.name()).collect()
}

/// The furthest stage reached according to `dates`.
///
/// When both terminal dates are set the later one wins; a tie resolves to
/// Accepted.
#[must_use]
pub fn furthest_stage(dates: &StatusDates) -> Stage {
    let terminal = match (dates.accepted_date, dates.declined_date) {
        (Some(accepted), Some(declined)) if declined > accepted => Some(Stage::Declined),
        (Some(_), _) => Some(Stage::Accepted),
        (None, Some(_)) => Some(Stage::Declined),
        (None, None) => None,
    };
    if let Some(stage) = terminal {
        return stage;
    }

    [Stage::Round2, Stage::Round1, Stage::PhoneScreen, Stage::Applied]
        .into_iter()
        .find(|stage| stage.field().and_then(|field| dates.get(field)).is_some())
        .unwrap_or(Stage::NotApplied)
}

/// Supplies the status taxonomy every application owner must have.
pub trait WorkflowProvider {
    fn default_statuses(&self, user_id: &str) -> Vec<StatusDefinition>;
}

/// The built-in Not Applied → … → Accepted/Declined taxonomy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultWorkflow;

impl WorkflowProvider for DefaultWorkflow {
    fn default_statuses(&self, user_id: &str) -> Vec<StatusDefinition> {
        Stage::ALL
            .iter()
            .map(|stage| {
                StatusDefinition::for_user(
                    user_id,
                    stage.name(),
                    stage.description(),
                    stage.is_terminal(),
                )
            })
            .collect()
    }
}

/// Recomputes an application's cached `currentStatus`.
pub trait StatusResolver {
    /// The status `record` should carry, given the known definitions.
    fn resolve(&self, record: &ApplicationRecord, statuses: &[StatusDefinition]) -> CurrentStatus;

    /// Resolve every record and persist the ones whose status changed.
    ///
    /// Returns the number of records written.
    ///
    /// # Errors
    ///
    /// Returns the first store error; records before it stay written.
    fn recalculate_all_current_statuses(
        &self,
        store: &dyn RecordStore,
    ) -> Result<usize, EngineError> {
        let statuses = store.scan_status_definitions()?;
        let mut updated = 0;
        for mut record in store.scan_applications()? {
            let resolved = self.resolve(&record, &statuses);
            if record.current_status.as_ref() != Some(&resolved) {
                record.current_status = Some(resolved);
                store.update_application(&record)?;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

/// Resolves status from the furthest stage reached.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageResolver;

impl StatusResolver for StageResolver {
    fn resolve(&self, record: &ApplicationRecord, statuses: &[StatusDefinition]) -> CurrentStatus {
        let stage = furthest_stage(&record.status_dates);
        let id = statuses
            .iter()
            .find(|def| def.user_id == record.user_id && def.name == stage.name())
            .map_or_else(|| status_id(&record.user_id, stage.name()), |def| def.id.clone());
        CurrentStatus {
            id,
            name: stage.name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use chrono::NaiveDate;

    fn d(raw: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }

    #[test]
    fn stage_ranks_follow_workflow_order() {
        let ranks: Vec<u8> = Stage::ALL.iter().map(|s| s.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4, 5, 5]);
    }

    #[test]
    fn furthest_stage_picks_highest_populated() {
        assert_eq!(furthest_stage(&StatusDates::default()), Stage::NotApplied);

        let dates = StatusDates {
            applied_date: d("2025-01-01"),
            round1_date: d("2025-02-01"),
            ..StatusDates::default()
        };
        assert_eq!(furthest_stage(&dates), Stage::Round1);

        // A later stage wins even without the intermediate ones.
        let dates = StatusDates {
            round2_date: d("2025-01-01"),
            ..StatusDates::default()
        };
        assert_eq!(furthest_stage(&dates), Stage::Round2);
    }

    #[test]
    fn terminal_conflict_resolves_by_later_date() {
        let mut dates = StatusDates {
            accepted_date: d("2025-03-01"),
            declined_date: d("2025-03-05"),
            ..StatusDates::default()
        };
        assert_eq!(furthest_stage(&dates), Stage::Declined);

        dates.declined_date = d("2025-03-01");
        assert_eq!(furthest_stage(&dates), Stage::Accepted);
    }

    #[test]
    fn default_workflow_covers_every_stage() {
        let defs = DefaultWorkflow.default_statuses("u1");
        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, default_status_names());
        assert_eq!(defs.iter().filter(|d| d.is_terminal).count(), 2);
        assert!(defs.iter().all(|d| d.user_id == "u1"));
    }

    #[test]
    fn resolver_prefers_stored_definition_ids() {
        let mut record = ApplicationRecord::new("a1", "u1");
        record.status_dates.phone_screen_date = d("2025-01-01");

        let custom = StatusDefinition {
            id: "legacy-42".into(),
            user_id: "u1".into(),
            name: "Phone Screen".into(),
            description: String::new(),
            is_terminal: false,
        };
        let resolved = StageResolver.resolve(&record, &[custom]);
        assert_eq!(resolved.id, "legacy-42");
        assert_eq!(resolved.name, "Phone Screen");

        let resolved = StageResolver.resolve(&record, &[]);
        assert_eq!(resolved.id, status_id("u1", "Phone Screen"));
    }

    #[test]
    fn recalculate_writes_only_changed_records() {
        let store = SqliteStore::open_in_memory().expect("store");
        let mut applied = ApplicationRecord::new("a1", "u1");
        applied.status_dates.applied_date = d("2025-01-01");
        let untouched = ApplicationRecord::new("a2", "u1");
        store
            .insert_applications(&[applied, untouched])
            .expect("insert");

        assert_eq!(
            StageResolver
                .recalculate_all_current_statuses(&store)
                .expect("recalculate"),
            2
        );
        assert_eq!(
            StageResolver
                .recalculate_all_current_statuses(&store)
                .expect("recalculate"),
            0
        );

        let records = store.scan_applications().expect("scan");
        let names: Vec<_> = records
            .iter()
            .filter_map(|r| r.current_status.as_ref().map(|s| s.name.as_str()))
            .collect();
        assert_eq!(names, vec!["Applied", "Not Applied"]);
    }
}
