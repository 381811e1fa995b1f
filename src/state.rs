use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use declarative::Attributes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Current state file format
const STATE_VERSION: u32 = 1;

// ============================================================================
// State Structures
// ============================================================================

/// Last confirmed values of every managed resource
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderState {
    pub version: u32,

    /// Remote schemas keyed by name
    #[serde(default)]
    pub remote_schemas: BTreeMap<String, Attributes>,

    /// Last time the state was written
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            remote_schemas: BTreeMap::new(),
            last_updated: None,
        }
    }
}

// ============================================================================
// Persistence
// ============================================================================

impl ProviderState {
    /// Get the default state file path (~/.local/state/hasura-provider/state.json)
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home
            .join(".local")
            .join("state")
            .join("hasura-provider")
            .join("state.json"))
    }

    /// Load state from disk, or return an empty state if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file {} does not exist, using empty state", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        if state.version > STATE_VERSION {
            anyhow::bail!(
                "State file {} has version {}, this build understands up to {}",
                path.display(),
                state.version,
                STATE_VERSION
            );
        }

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Save state to disk, stamping `last_updated`
    ///
    /// The file is written next to its final location and renamed into
    /// place, so a crash never leaves a truncated state file behind.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        self.last_updated = Some(Utc::now());
        let content =
            serde_json::to_string_pretty(&*self).context("Failed to serialize state to JSON")?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &content)
            .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
        restrict_permissions(&tmp)?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }
}

/// State may hold header values; keep it private to the user
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("Failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
