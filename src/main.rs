use std::{path::PathBuf, process};

use anyhow::Context;
use clap::Parser;
use skin_prune::{
    LogObserver, PruneOutcome,
    export::{default_output_path, unique_output_path, write_pruned_mesh},
    gltf_source::load_skinned_mesh,
    logging::init_logging,
    project::{ProjectSettings, load_project_settings, save_project_settings},
    prune_mesh,
};

/// Remove geometry weighted to deleted bones from a skinned glTF mesh.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Input .gltf/.glb file (falls back to the settings file).
    input: Option<PathBuf>,
    /// Output JSON path; defaults to `<mesh>_cleaned.json` next to the input.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Name of the skinned mesh to prune.
    #[arg(long)]
    mesh: Option<String>,
    /// Bone to treat as deleted. Repeatable.
    #[arg(long = "remove-bone")]
    remove_bones: Vec<String>,
    /// Also remove vertices left attached only through cut triangles.
    #[arg(long, overrides_with = "no_grow_islands")]
    grow_islands: bool,
    /// Keep island growth off even when the settings file enables it.
    #[arg(long, overrides_with = "grow_islands")]
    no_grow_islands: bool,
    /// Load settings from a JSON project file.
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Save the effective settings to a JSON project file.
    #[arg(long)]
    save_settings: Option<PathBuf>,
}

impl Args {
    /// Explicit growth choice from the command line, if any.
    fn grow_islands_override(&self) -> Option<bool> {
        match (self.grow_islands, self.no_grow_islands) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

fn main() {
    init_logging();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => load_project_settings(path)?,
        None => ProjectSettings::default(),
    };
    if let Some(input) = &args.input {
        settings.input_path = Some(input.to_string_lossy().into_owned());
    }
    if let Some(output) = &args.output {
        settings.output_path = Some(output.to_string_lossy().into_owned());
    }
    if args.mesh.is_some() {
        settings.mesh_name = args.mesh.clone();
    }
    settings.add_removed_bones(args.remove_bones.iter().cloned());
    if let Some(grow) = args.grow_islands_override() {
        settings.options.auto_grow_islands = grow;
    }

    if let Some(path) = &args.save_settings {
        save_project_settings(path, &settings)?;
    }

    let input = settings
        .input_path
        .as_deref()
        .map(PathBuf::from)
        .context("no input file given on the command line or in the settings file")?;

    let loaded = load_skinned_mesh(
        &input,
        settings.mesh_name.as_deref(),
        &settings.removed_bones,
    )?;
    println!(
        "Mesh: {} ({} vertices, {} submeshes, {} blend shapes, {} bones)",
        loaded.mesh.name,
        loaded.mesh.vertex_count(),
        loaded.mesh.submeshes.len(),
        loaded.mesh.blend_shapes.len(),
        loaded.bones.len()
    );

    let outcome = prune_mesh(
        &loaded.mesh,
        &loaded.bones,
        &settings.options,
        &mut LogObserver,
    )?;

    let pruned = match outcome {
        PruneOutcome::Unchanged { vertex_count } => {
            println!(
                "All {vertex_count} vertices are weighted to existing bones. No changes were made."
            );
            return Ok(());
        }
        PruneOutcome::Pruned(pruned) => pruned,
    };

    let output = match &settings.output_path {
        Some(path) => PathBuf::from(path),
        None => unique_output_path(&default_output_path(&input, &loaded.mesh.name)),
    };
    write_pruned_mesh(&output, &pruned)?;

    let report = &pruned.report;
    println!(
        "Removed {} vertices ({} orphaned, {} island) and {} triangles",
        report.summary.vertices_removed,
        report.orphaned_vertices,
        report.island_vertices,
        report.summary.triangles_removed
    );
    println!(
        "Submeshes: {} -> {}, vertices: {} -> {}",
        report.input_submeshes,
        report.output_submeshes,
        report.input_vertices,
        report.output_vertices
    );
    if let Some(bounds) = pruned.mesh.bounds {
        let center = bounds.center();
        let extents = bounds.extents();
        println!(
            "Bounds: center ({:.3}, {:.3}, {:.3}), extents ({:.3}, {:.3}, {:.3})",
            center.x, center.y, center.z, extents.x, extents.y, extents.z
        );
    }
    println!("Output: {}", output.display());

    Ok(())
}
