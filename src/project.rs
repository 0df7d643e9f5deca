use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::prune::PruneOptions;

/// Persisted settings for repeated prune runs on the same asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub input_path: Option<String>,
    pub output_path: Option<String>,
    /// Mesh to prune when the file holds several skinned meshes.
    pub mesh_name: Option<String>,
    /// Bones treated as deleted from the skeleton.
    pub removed_bones: Vec<String>,
    pub options: PruneOptions,
}

impl ProjectSettings {
    /// Append bone names, skipping any already listed.
    pub fn add_removed_bones<I>(&mut self, names: I)
    where
        I: IntoIterator<Item = String>,
    {
        for name in names {
            if !self.removed_bones.contains(&name) {
                self.removed_bones.push(name);
            }
        }
    }
}

/// Save project settings to a JSON file.
pub fn save_project_settings(path: &Path, settings: &ProjectSettings) -> Result<()> {
    let content = serde_json::to_string_pretty(settings)
        .context("failed to serialize project settings as JSON")?;
    fs::write(path, content)
        .with_context(|| format!("failed to save project settings: {}", path.display()))?;
    Ok(())
}

/// Load project settings from a JSON file.
pub fn load_project_settings(path: &Path) -> Result<ProjectSettings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to load project settings: {}", path.display()))?;
    let settings: ProjectSettings =
        serde_json::from_str(&content).context("failed to parse project settings JSON")?;
    Ok(settings)
}
