pub mod rollback;
pub mod run;
pub mod status;
pub mod validate;

use std::io::{self, Write};

use jobtrail_core::migrate::MigrationResult;

use crate::output::{pretty_kv, pretty_rule};

const fn outcome_label(result: &MigrationResult) -> &'static str {
    match (result.success, result.dry_run) {
        (true, true) => "simulated",
        (true, false) => "ok",
        (false, _) => "FAILED",
    }
}

/// One block per unit: header, description, counts, messages, errors.
pub(crate) fn write_result_pretty(w: &mut dyn Write, result: &MigrationResult) -> io::Result<()> {
    writeln!(
        w,
        "[{}] {}  {}",
        result.id,
        result.name,
        outcome_label(result)
    )?;
    pretty_kv(w, "description", &result.description)?;
    pretty_kv(w, "modified", result.documents_modified.to_string())?;
    for message in &result.messages {
        writeln!(w, "  - {message}")?;
    }
    for error in &result.errors {
        writeln!(w, "  ! {error}")?;
    }
    pretty_rule(w)
}

/// Tab-separated: id, outcome, modified count, name; then one line per error.
pub(crate) fn write_result_text(w: &mut dyn Write, result: &MigrationResult) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}",
        result.id,
        outcome_label(result),
        result.documents_modified,
        result.name
    )?;
    for error in &result.errors {
        writeln!(w, "{}\terror\t{error}", result.id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(success: bool, dry_run: bool) -> MigrationResult {
        MigrationResult {
            id: "002".into(),
            name: "infer-status-dates".into(),
            description: "Fill missing status dates".into(),
            success,
            dry_run,
            documents_modified: 4,
            messages: vec!["a1: would add appliedDate".into()],
            errors: if success { vec![] } else { vec!["store gone".into()] },
        }
    }

    #[test]
    fn text_row_is_tab_separated() {
        let mut buf = Vec::new();
        write_result_text(&mut buf, &result(true, false)).expect("write");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            "002\tok\t4\tinfer-status-dates\n"
        );
    }

    #[test]
    fn failures_list_errors() {
        let mut buf = Vec::new();
        write_result_text(&mut buf, &result(false, false)).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("002\tFAILED"));
        assert!(text.contains("002\terror\tstore gone"));
    }

    #[test]
    fn pretty_block_shows_dry_run_messages() {
        let mut buf = Vec::new();
        write_result_pretty(&mut buf, &result(true, true)).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("[002] infer-status-dates  simulated"));
        assert!(text.contains("  - a1: would add appliedDate"));
    }
}
