// ─── Version Identity ───
// Classifies installed version ids ("1.20.1-fabric-0.15.0", "1.20.1",
// "fabric-loader-0.15.0-1.20.1") into loader / game version / loader version.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::LauncherError;

/// Mod loaders a game version can run under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LoaderType {
    Vanilla,
    Forge,
    Fabric,
    NeoForge,
    Quilt,
}

impl LoaderType {
    /// Detection order used when classifying a version id by substring.
    const DETECTION_ORDER: [LoaderType; 4] = [
        LoaderType::Forge,
        LoaderType::NeoForge,
        LoaderType::Fabric,
        LoaderType::Quilt,
    ];

    /// Lowercase identifier, as used by the registry and cache partitions.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoaderType::Vanilla => "vanilla",
            LoaderType::Forge => "forge",
            LoaderType::Fabric => "fabric",
            LoaderType::NeoForge => "neoforge",
            LoaderType::Quilt => "quilt",
        }
    }

    /// Human-facing name: first letter capitalized, rest lowercase.
    pub fn display_name(&self) -> &'static str {
        match self {
            LoaderType::Vanilla => "Vanilla",
            LoaderType::Forge => "Forge",
            LoaderType::Fabric => "Fabric",
            LoaderType::NeoForge => "Neoforge",
            LoaderType::Quilt => "Quilt",
        }
    }

    /// Whether this loader can run mods at all.
    pub fn supports_mods(&self) -> bool {
        !matches!(self, LoaderType::Vanilla)
    }
}

impl fmt::Display for LoaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoaderType {
    type Err = LauncherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vanilla" => Ok(LoaderType::Vanilla),
            "forge" => Ok(LoaderType::Forge),
            "fabric" => Ok(LoaderType::Fabric),
            "neoforge" => Ok(LoaderType::NeoForge),
            "quilt" => Ok(LoaderType::Quilt),
            other => Err(LauncherError::UnknownLoader(other.to_string())),
        }
    }
}

/// Result of classifying a version id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionIdentity {
    pub loader: LoaderType,
    pub game_version: String,
    pub loader_version: Option<String>,
}

impl VersionIdentity {
    /// Classify a version id. Never fails: anything unrecognizable becomes
    /// a vanilla identity whose game version is the (lowercased) input.
    ///
    /// Loader detection is a substring match in the order
    /// forge, neoforge, fabric, quilt, so an id containing "neoforge"
    /// also contains "forge" and classifies as [`LoaderType::Forge`].
    pub fn parse(version_id: &str) -> Self {
        let vid = version_id.to_lowercase();
        let tokens: Vec<&str> = vid.split('-').collect();

        let game_version = if starts_with_digit(&vid) {
            tokens[0]
        } else {
            tokens[tokens.len() - 1]
        };

        let loader_version = tokens
            .iter()
            .copied()
            .find(|t| starts_with_digit(t) && *t != game_version)
            .map(str::to_string);

        let loader = LoaderType::DETECTION_ORDER
            .into_iter()
            .find(|l| vid.contains(l.as_str()))
            .unwrap_or(LoaderType::Vanilla);

        Self {
            loader,
            game_version: game_version.to_string(),
            loader_version,
        }
    }
}

impl fmt::Display for VersionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.loader.display_name(), self.game_version)?;
        if let Some(lv) = &self.loader_version {
            write!(f, " ({})", lv)?;
        }
        Ok(())
    }
}

fn starts_with_digit(token: &str) -> bool {
    token.chars().next().is_some_and(|c| c.is_ascii_digit())
}
