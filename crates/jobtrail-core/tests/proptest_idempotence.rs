use jobtrail_core::db::{RecordStore, SqliteStore};
use jobtrail_core::migrate::{Migration, MigrationContext, all_migrations};
use jobtrail_core::model::ApplicationRecord;
use proptest::prelude::*;

use generators::*;

fn ctx() -> MigrationContext {
    MigrationContext {
        dry_run: false,
        run_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or_default(),
    }
}

fn snapshot(store: &SqliteStore) -> String {
    let records = store.scan_applications().expect("scan");
    let defs = store.scan_status_definitions().expect("scan defs");
    format!(
        "{}\n{}",
        serde_json::to_string(&records).expect("encode records"),
        serde_json::to_string(&defs).expect("encode defs")
    )
}

fn seeded(records: &[ApplicationRecord]) -> SqliteStore {
    let store = SqliteStore::open_in_memory().expect("store");
    store.insert_applications(records).expect("insert");
    store
}

fn unit(id: &str) -> Box<dyn Migration> {
    all_migrations()
        .into_iter()
        .find(|unit| unit.id() == id)
        .expect("registered unit")
}

fn assert_idempotent(id: &str, records: &[ApplicationRecord]) -> Result<(), TestCaseError> {
    let store = seeded(records);
    let unit = unit(id);
    unit.execute(&store, &ctx()).expect("first run");
    let once = snapshot(&store);
    let second = unit.execute(&store, &ctx()).expect("second run");
    prop_assert_eq!(second.documents_modified, 0, "unit {} changed documents twice", id);
    prop_assert_eq!(snapshot(&store), once);
    Ok(())
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(128))]

    #[test]
    fn normalize_events_is_idempotent(records in arb_records()) {
        assert_idempotent("001", &records)?;
    }

    #[test]
    fn infer_status_dates_is_idempotent(records in arb_records()) {
        assert_idempotent("002", &records)?;
    }

    #[test]
    fn reconcile_workflow_is_idempotent(records in arb_records()) {
        assert_idempotent("003", &records)?;
    }

    #[test]
    fn sanitize_titles_is_idempotent(records in arb_records()) {
        assert_idempotent("005", &records)?;
    }

    #[test]
    fn backfill_events_is_idempotent(records in arb_records()) {
        assert_idempotent("006", &records)?;
    }

    #[test]
    fn inference_never_overwrites_existing_dates(records in arb_records()) {
        let store = seeded(&records);
        unit("002").execute(&store, &ctx()).expect("run");
        let after = store.scan_applications().expect("scan");
        for (before, after) in records.iter().zip(&after) {
            for (field, date) in before.status_dates.populated() {
                prop_assert_eq!(after.status_dates.get(field), Some(date));
            }
        }
    }

    #[test]
    fn stored_status_date_forms_survive_the_sequence((json, date) in arb_record_json_with_stored_dates()) {
        let record: ApplicationRecord = serde_json::from_str(&json).expect("decode stored form");
        prop_assert_eq!(record.status_dates.applied_date, Some(date));

        let store = seeded(&[record]);
        for unit in all_migrations() {
            unit.execute(&store, &ctx()).expect("run");
        }
        let after = &store.scan_applications().expect("scan")[0];
        prop_assert_eq!(after.status_dates.applied_date, Some(date));
    }

    #[test]
    fn dry_run_never_writes(records in arb_records()) {
        let store = seeded(&records);
        let before = snapshot(&store);
        let dry = MigrationContext { dry_run: true, ..ctx() };
        for unit in all_migrations() {
            unit.execute(&store, &dry).expect("dry run");
        }
        prop_assert_eq!(snapshot(&store), before);
    }
}
