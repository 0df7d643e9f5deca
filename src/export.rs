use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::prune::{CLEANED_SUFFIX, PruneReport, PrunedMesh, SkinnedMesh};

#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    report: &'a PruneReport,
    mesh: &'a SkinnedMesh,
}

// ─── Path helpers ─────────────────────────────────────────────────────────────

/// `<input dir>/<mesh name>_cleaned.json`.
pub fn default_output_path(input_path: &Path, mesh_name: &str) -> PathBuf {
    let dir = input_path.parent().unwrap_or_else(|| Path::new(""));
    dir.join(format!("{mesh_name}{CLEANED_SUFFIX}.json"))
}

/// Returns `path` when it does not exist yet, otherwise the first free
/// `<stem> N.<ext>` sibling.
pub fn unique_output_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|n| path.with_file_name(format!("{stem} {n}{extension}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

// ─── Writer ───────────────────────────────────────────────────────────────────

/// Write the pruned mesh and its report as a pretty JSON document.
pub fn write_pruned_mesh(output_path: &Path, pruned: &PrunedMesh) -> Result<()> {
    let document = ExportDocument {
        report: &pruned.report,
        mesh: &pruned.mesh,
    };
    let json_bytes =
        serde_json::to_vec_pretty(&document).context("failed to serialize pruned mesh JSON")?;
    fs::write(output_path, json_bytes)
        .with_context(|| format!("failed to write output: {}", output_path.display()))?;
    Ok(())
}
