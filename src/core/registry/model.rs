use serde::{Deserialize, Serialize};

use crate::core::cache::checked_file_name;
use crate::core::error::LauncherResult;

/// A search hit, also the shape persisted in `mods.json` for enabled mods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModSummary {
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub downloads: u64,
}

impl ModSummary {
    /// `"1.2m downloads"` style label for listings.
    pub fn downloads_label(&self) -> String {
        format!("{} downloads", short_count(self.downloads))
    }
}

/// A reference to a mod by project identity, not yet resolved to a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModRequirement {
    pub project_id: String,
}

impl ModRequirement {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
        }
    }
}

impl From<&ModSummary> for ModRequirement {
    fn from(summary: &ModSummary) -> Self {
        Self::new(summary.project_id.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    Required,
    Optional,
    Incompatible,
    Embedded,
    /// Anything the registry adds later; treated as inert.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRef {
    pub project_id: String,
    pub dependency_type: DependencyType,
}

impl DependencyRef {
    pub fn is_required(&self) -> bool {
        self.dependency_type == DependencyType::Required
    }
}

/// The concrete artifact chosen for one project under a
/// game version / loader pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedVersion {
    pub project_id: String,
    pub version_number: Option<String>,
    pub filename: String,
    pub download_url: String,
    /// SHA-1 of the artifact as published by the registry.
    pub content_hash: Option<String>,
    pub dependencies: Vec<DependencyRef>,
}

impl ResolvedVersion {
    pub fn required_dependencies(&self) -> impl Iterator<Item = ModRequirement> + '_ {
        self.dependencies
            .iter()
            .filter(|d| d.is_required())
            .map(|d| ModRequirement::new(d.project_id.clone()))
    }
}

// ── Wire format ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub hits: Vec<ModSummary>,
}

/// One entry of `GET /project/{id}/version`.
#[derive(Debug, Deserialize)]
pub(crate) struct ProjectVersion {
    #[serde(default)]
    pub version_number: Option<String>,
    #[serde(default)]
    pub files: Vec<VersionFile>,
    #[serde(default)]
    pub dependencies: Vec<WireDependency>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VersionFile {
    #[serde(default)]
    pub primary: bool,
    pub filename: String,
    pub url: String,
    #[serde(default)]
    pub hashes: FileHashes,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FileHashes {
    #[serde(default)]
    pub sha1: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireDependency {
    /// Null for dependencies pinned to a version id only.
    #[serde(default)]
    pub project_id: Option<String>,
    pub dependency_type: DependencyType,
}

impl ProjectVersion {
    /// Pick the primary file (or the first one) and flatten into a
    /// [`ResolvedVersion`]. A version without files resolves to nothing;
    /// a filename that is not a plain file name is an error.
    pub fn into_resolved(self, project_id: &str) -> LauncherResult<Option<ResolvedVersion>> {
        let mut files = self.files;
        let idx = files.iter().position(|f| f.primary).unwrap_or(0);
        if idx >= files.len() {
            return Ok(None);
        }
        let file = files.swap_remove(idx);
        checked_file_name(&file.filename)?;

        let dependencies = self
            .dependencies
            .into_iter()
            .filter_map(|d| {
                d.project_id.map(|project_id| DependencyRef {
                    project_id,
                    dependency_type: d.dependency_type,
                })
            })
            .collect();

        Ok(Some(ResolvedVersion {
            project_id: project_id.to_string(),
            version_number: self.version_number,
            filename: file.filename,
            download_url: file.url,
            content_hash: file.hashes.sha1,
            dependencies,
        }))
    }
}

/// Compact counter: `999`, `1.5k`, `2.3m`, `1b`.
pub fn short_count(n: u64) -> String {
    let mut value = n as f64;
    for unit in ["", "k", "m", "b", "t"] {
        if value < 1000.0 {
            return format!("{}{}", trim_float(value), unit);
        }
        value = (value / 1000.0 * 10.0).round() / 10.0;
    }
    trim_float(value)
}

fn trim_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as u64)
    } else {
        format!("{}", value)
    }
}
