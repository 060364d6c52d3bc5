use serde::{Deserialize, Serialize};

/// A per-user workflow stage definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDefinition {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_terminal: bool,
}

impl StatusDefinition {
    /// Build a definition with the deterministic id for `(user_id, name)`.
    #[must_use]
    pub fn for_user(
        user_id: &str,
        name: &str,
        description: &str,
        is_terminal: bool,
    ) -> Self {
        Self {
            id: status_id(user_id, name),
            user_id: user_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            is_terminal,
        }
    }
}

/// Deterministic status definition id derived from owner and name.
#[must_use]
pub fn status_id(user_id: &str, name: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(user_id.as_bytes());
    hasher.update(&[0]);
    hasher.update(name.as_bytes());
    let hex = hasher.finalize().to_hex();
    format!("st-{}", &hex.as_str()[..12])
}
