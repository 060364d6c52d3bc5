use std::fmt;
use std::path::PathBuf;

/// Machine-readable error codes for operator-facing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    StoreUnavailable,
    ConfigParseError,
    UnknownMigration,
    MigrationFailed,
    RollbackUnsupported,
    CorruptDocument,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::StoreUnavailable => "E1001",
            Self::ConfigParseError => "E1002",
            Self::UnknownMigration => "E2001",
            Self::MigrationFailed => "E2002",
            Self::RollbackUnsupported => "E2003",
            Self::CorruptDocument => "E3001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::StoreUnavailable => "Record store unavailable",
            Self::ConfigParseError => "Config file parse error",
            Self::UnknownMigration => "Unknown migration id",
            Self::MigrationFailed => "Migration failed",
            Self::RollbackUnsupported => "Rollback not supported",
            Self::CorruptDocument => "Corrupt application document",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::StoreUnavailable => {
                Some("Check the --db path (or JOBTRAIL_DB) and file permissions.")
            }
            Self::ConfigParseError => Some("Fix syntax in .jobtrail/config.toml and retry."),
            Self::UnknownMigration => Some("Run `jt status` to list registered migration ids."),
            Self::MigrationFailed => {
                Some("Fix the reported error, then re-run `jt run`; completed units are skipped.")
            }
            Self::RollbackUnsupported => {
                Some("Restore from the backup taken before the migration ran.")
            }
            Self::CorruptDocument => Some("Inspect the stored JSON document for this record."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Typed failures surfaced by the migration engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to open record store at {path}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("no record store path: pass --db, set JOBTRAIL_DB, or set [store] path")]
    NoStorePath,

    #[error("unknown migration id '{0}'")]
    UnknownMigration(String),

    #[error("migration {id} failed: {message}")]
    UnitFailed { id: String, message: String },

    #[error("migration {id} cannot be rolled back: {reason}")]
    RollbackUnsupported { id: String, reason: String },

    #[error("record store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("application document {record_id} is not valid JSON: {source}")]
    Document {
        record_id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl EngineError {
    /// Map the failure onto its stable [`ErrorCode`].
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Connect { .. } | Self::NoStorePath | Self::Store(_) => {
                ErrorCode::StoreUnavailable
            }
            Self::UnknownMigration(_) => ErrorCode::UnknownMigration,
            Self::UnitFailed { .. } => ErrorCode::MigrationFailed,
            Self::RollbackUnsupported { .. } => ErrorCode::RollbackUnsupported,
            Self::Document { .. } => ErrorCode::CorruptDocument,
        }
    }

    /// Remediation text for the failure.
    #[must_use]
    pub fn suggestion(&self) -> String {
        self.error_code()
            .hint()
            .unwrap_or_else(|| self.error_code().message())
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineError, ErrorCode};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::StoreUnavailable,
            ErrorCode::ConfigParseError,
            ErrorCode::UnknownMigration,
            ErrorCode::MigrationFailed,
            ErrorCode::RollbackUnsupported,
            ErrorCode::CorruptDocument,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::RollbackUnsupported.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn unknown_migration_maps_to_code_and_hint() {
        let err = EngineError::UnknownMigration("999".into());
        assert_eq!(err.error_code(), ErrorCode::UnknownMigration);
        assert!(err.to_string().contains("999"));
        assert!(err.suggestion().contains("jt status"));
    }

    #[test]
    fn missing_store_path_is_a_store_error() {
        let err = EngineError::NoStorePath;
        assert_eq!(err.error_code(), ErrorCode::StoreUnavailable);
        assert!(err.to_string().contains("--db"));
    }

    #[test]
    fn rollback_refusal_points_at_backups() {
        let err = EngineError::RollbackUnsupported {
            id: "004".into(),
            reason: "not retained".into(),
        };
        assert_eq!(err.error_code().code(), "E2003");
        assert!(err.suggestion().contains("backup"));
    }
}
