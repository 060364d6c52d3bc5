use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::EngineError;
use crate::validate::DEFAULT_SAMPLE_SIZE;

/// Environment variable overriding the store location.
pub const STORE_PATH_ENV: &str = "JOBTRAIL_DB";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub validate: ValidateConfig,
    /// Preferred output mode (`pretty`, `text`, `json`).
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateConfig {
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub store_path: PathBuf,
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".jobtrail/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Default store location under the platform data directory.
///
/// # Errors
///
/// Returns [`EngineError::NoStorePath`] when the platform has no data directory.
pub fn default_store_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or(EngineError::NoStorePath)?;
    Ok(data_dir.join("jobtrail").join("jobtrail.db"))
}

/// Store path precedence: `--db` flag, `JOBTRAIL_DB`, config file, default.
pub fn resolve_store_path(
    cli_db: Option<&Path>,
    env_db: Option<PathBuf>,
    project: &ProjectConfig,
) -> Result<PathBuf> {
    if let Some(path) = cli_db {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = env_db.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path);
    }
    if let Some(path) = &project.store.path {
        return Ok(path.clone());
    }
    default_store_path()
}

pub fn resolve_config(
    project_root: &Path,
    cli_db: Option<&Path>,
) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let env_db = env::var_os(STORE_PATH_ENV).map(PathBuf::from);
    let store_path = resolve_store_path(cli_db, env_db, &project)?;
    Ok(EffectiveConfig {
        project,
        store_path,
    })
}

const fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}
