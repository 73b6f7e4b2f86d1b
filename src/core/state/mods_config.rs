use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::registry::{ModRequirement, ModSummary};

/// The user's enabled-mods selection, persisted as `mods.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModsConfig {
    #[serde(default)]
    pub enabled_mods: Vec<ModSummary>,
}

impl ModsConfig {
    /// Load the selection. A missing file is an empty selection; a corrupt
    /// one is an error, so a bad file never empties the mods folder.
    pub async fn load(path: &Path) -> LauncherResult<Self> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No mods selection at {:?}", path);
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(LauncherError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Ok(serde_json::from_str(&raw)?)
    }

    pub async fn save(&self, path: &Path) -> LauncherResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| LauncherError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json)
            .await
            .map_err(|source| LauncherError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Add a mod unless one with the same project id is already enabled.
    pub fn enable(&mut self, summary: ModSummary) -> bool {
        if self.is_enabled(&summary.project_id) {
            return false;
        }
        self.enabled_mods.push(summary);
        true
    }

    pub fn disable(&mut self, project_id: &str) -> bool {
        let before = self.enabled_mods.len();
        self.enabled_mods.retain(|m| m.project_id != project_id);
        self.enabled_mods.len() != before
    }

    pub fn is_enabled(&self, project_id: &str) -> bool {
        self.enabled_mods.iter().any(|m| m.project_id == project_id)
    }

    /// Seed list for a resolution run.
    pub fn requirements(&self) -> Vec<ModRequirement> {
        self.enabled_mods.iter().map(ModRequirement::from).collect()
    }
}
