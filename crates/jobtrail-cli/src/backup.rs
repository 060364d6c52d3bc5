//! Advisory backup step before commands that write records.
//!
//! Nothing is copied; the operator is told how to take a backup.

use std::path::Path;

/// Suggested shell command that snapshots the store next to itself.
pub fn backup_command(store_path: &Path) -> String {
    let path = store_path.display();
    format!("sqlite3 '{path}' \".backup '{path}.bak'\"")
}

pub fn advise_backup(store_path: &Path, action: &str) {
    tracing::warn!(
        store = %store_path.display(),
        action,
        "no automatic backup is taken before this command"
    );
    tracing::info!(command = %backup_command(store_path), "to back up the store first, run");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_targets_sibling_file() {
        let cmd = backup_command(Path::new("/data/jobtrail.db"));
        assert_eq!(
            cmd,
            "sqlite3 '/data/jobtrail.db' \".backup '/data/jobtrail.db.bak'\""
        );
    }
}
