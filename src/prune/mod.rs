mod attributes;
mod blend_shapes;
mod geometry;
mod islands;
mod remap;
mod topology;
mod types;
mod validation;

use crate::error::{PruneError, PruneResult};
use crate::logging::{PruneEvent, PruneObserver, Stage};

// Re-export public types for callers of this module.
pub use attributes::compact_attributes;
pub use blend_shapes::remap_blend_shapes;
pub use geometry::{SampleCheck, compute_bounds, sample_indices, verify_samples};
pub use islands::{GrowthStats, grow_islands};
pub use remap::IndexRemap;
pub use topology::{RebuiltTopology, rebuild_topology};
pub use types::{
    BONE_SLOTS, BlendShape, BlendShapeFrame, BoneHandle, BoneTable, BoneWeight, Bounds,
    IndexFormat, MaterialRef, OrphanCause, OrphanedVertex, PruneOptions, PruneReport,
    PruneSummary, SkinnedMesh, Submesh, UV_CHANNEL_COUNT, VertexAttributes,
};
pub use validation::{
    VertexPartition, WeightValidation, check_mesh_integrity, find_orphaned_slot,
    validate_bone_weights,
};

/// Suffix appended to the name of every pruned mesh.
pub const CLEANED_SUFFIX: &str = "_cleaned";

// ─── Public API ───────────────────────────────────────────────────────────────

/// Pruned mesh plus the statistics gathered while building it.
#[derive(Debug, Clone)]
pub struct PrunedMesh {
    pub mesh: SkinnedMesh,
    pub report: PruneReport,
}

/// Successful result of a prune run.
#[derive(Debug, Clone)]
pub enum PruneOutcome {
    /// Some vertices were removed and a new mesh was built.
    Pruned(Box<PrunedMesh>),
    /// Every vertex is weighted to an existing bone; nothing was built.
    Unchanged { vertex_count: usize },
}

impl PruneOutcome {
    pub fn summary(&self) -> PruneSummary {
        match self {
            PruneOutcome::Pruned(pruned) => pruned.report.summary,
            PruneOutcome::Unchanged { .. } => PruneSummary::default(),
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, PruneOutcome::Unchanged { .. })
    }

    pub fn into_pruned(self) -> Option<PrunedMesh> {
        match self {
            PruneOutcome::Pruned(pruned) => Some(*pruned),
            PruneOutcome::Unchanged { .. } => None,
        }
    }
}

/// Which vertices survive, before any output buffer is built.
#[derive(Debug, Clone)]
pub struct Classification {
    pub partition: VertexPartition,
    pub orphans: Vec<OrphanedVertex>,
    /// Vertices rejected by weight validation alone.
    pub orphaned_count: usize,
    pub growth: GrowthStats,
}

/// Validate weights and, when enabled, grow the removal set across cut
/// triangles. The mesh must already have passed [`check_mesh_integrity`].
pub fn classify_vertices(
    mesh: &SkinnedMesh,
    bones: &BoneTable,
    options: &PruneOptions,
    observer: &mut dyn PruneObserver,
) -> Classification {
    observer.on_event(&PruneEvent::StageStarted {
        stage: Stage::Validation,
    });
    let WeightValidation {
        mut partition,
        orphans,
    } = validate_bone_weights(
        &mesh.attributes.bone_weights,
        bones,
        options.max_reported_orphans,
    );

    for orphan in &orphans {
        observer.on_event(&PruneEvent::OrphanFound {
            vertex: orphan.vertex,
            slot: orphan.slot,
            bone_index: orphan.bone_index,
            cause: orphan.cause,
        });
    }

    let orphaned_count = partition.remove_count();
    observer.on_event(&PruneEvent::StageFinished {
        stage: Stage::Validation,
        detail: format!(
            "vertices to keep: {}, vertices to remove: {}",
            partition.keep_count(),
            orphaned_count
        ),
    });

    let mut growth = GrowthStats::default();
    if options.auto_grow_islands && !partition.is_identity() && partition.keep_count() > 0 {
        observer.on_event(&PruneEvent::StageStarted {
            stage: Stage::IslandGrowth,
        });
        growth = grow_islands(&mut partition, &mesh.submeshes, |round, moved, remaining| {
            observer.on_event(&PruneEvent::GrowthRound {
                round,
                moved,
                remaining,
            });
        });
        observer.on_event(&PruneEvent::StageFinished {
            stage: Stage::IslandGrowth,
            detail: format!(
                "{} island vertices removed in {} rounds",
                growth.moved, growth.rounds
            ),
        });
    }

    Classification {
        partition,
        orphans,
        orphaned_count,
        growth,
    }
}

/// Remove every vertex weighted to a missing bone and rebuild a compact,
/// self-consistent mesh.
///
/// The input is never modified. All integrity checks run before any output
/// buffer is allocated; on error nothing is produced.
pub fn prune_mesh(
    mesh: &SkinnedMesh,
    bones: &BoneTable,
    options: &PruneOptions,
    observer: &mut dyn PruneObserver,
) -> PruneResult<PruneOutcome> {
    let vertex_count = mesh.vertex_count();
    observer.on_event(&PruneEvent::Started {
        mesh_name: mesh.name.clone(),
        vertex_count,
        submesh_count: mesh.submeshes.len(),
        blend_shape_count: mesh.blend_shapes.len(),
        bone_count: bones.len(),
    });

    observer.on_event(&PruneEvent::StageStarted {
        stage: Stage::Integrity,
    });
    if let Err(violation) = check_mesh_integrity(mesh) {
        let err = PruneError::from(violation);
        observer.on_event(&PruneEvent::Aborted {
            reason: err.to_string(),
        });
        return Err(err);
    }
    observer.on_event(&PruneEvent::StageFinished {
        stage: Stage::Integrity,
        detail: format!(
            "{vertex_count} vertices, {} UV channels, {} triangles",
            mesh.attributes.uv_channel_count(),
            mesh.triangle_count()
        ),
    });

    let classification = classify_vertices(mesh, bones, options, observer);
    let partition = &classification.partition;

    if partition.is_identity() {
        observer.on_event(&PruneEvent::NothingToPrune { vertex_count });
        return Ok(PruneOutcome::Unchanged { vertex_count });
    }

    if partition.keep_count() == 0 {
        let err = PruneError::DegenerateResult {
            vertex_count,
            orphaned: classification.orphaned_count,
            grown: classification.growth.moved,
        };
        observer.on_event(&PruneEvent::Aborted {
            reason: err.to_string(),
        });
        return Err(err);
    }

    observer.on_event(&PruneEvent::StageStarted {
        stage: Stage::Remap,
    });
    let remap = IndexRemap::from_partition(partition);
    observer.on_event(&PruneEvent::StageFinished {
        stage: Stage::Remap,
        detail: format!(
            "{} -> {} vertices",
            remap.old_vertex_count(),
            remap.new_vertex_count()
        ),
    });

    observer.on_event(&PruneEvent::StageStarted {
        stage: Stage::Attributes,
    });
    let attributes = compact_attributes(&mesh.attributes, &remap);
    observer.on_event(&PruneEvent::StageFinished {
        stage: Stage::Attributes,
        detail: format!(
            "{} vertices, normals: {}, tangents: {}, colors: {}, UV channels: {}",
            attributes.vertex_count(),
            attributes.normals.is_some(),
            attributes.tangents.is_some(),
            attributes.colors.is_some(),
            attributes.uv_channel_count()
        ),
    });

    observer.on_event(&PruneEvent::StageStarted {
        stage: Stage::Topology,
    });
    let topology = rebuild_topology(&mesh.submeshes, &mesh.materials, &remap);
    for &submesh in &topology.dropped_submeshes {
        observer.on_event(&PruneEvent::SubmeshDropped {
            submesh,
            material: mesh.materials[submesh]
                .as_ref()
                .map(|material| material.name.clone()),
        });
    }
    observer.on_event(&PruneEvent::StageFinished {
        stage: Stage::Topology,
        detail: format!(
            "{} submeshes kept, {} triangles kept, {} removed",
            topology.submeshes.len(),
            topology.triangles_kept,
            topology.triangles_removed
        ),
    });

    observer.on_event(&PruneEvent::StageStarted {
        stage: Stage::BlendShapes,
    });
    let blend_shapes = remap_blend_shapes(&mesh.blend_shapes, &remap);
    observer.on_event(&PruneEvent::StageFinished {
        stage: Stage::BlendShapes,
        detail: format!("{} blend shapes remapped", blend_shapes.len()),
    });

    let summary = PruneSummary {
        vertices_removed: partition.remove_count(),
        triangles_removed: topology.triangles_removed,
    };

    let output = SkinnedMesh {
        name: format!("{}{CLEANED_SUFFIX}", mesh.name),
        bounds: compute_bounds(&attributes.positions),
        index_format: IndexFormat::for_vertex_count(attributes.vertex_count()),
        attributes,
        submeshes: topology.submeshes,
        materials: topology.materials,
        blend_shapes,
        bind_poses: mesh.bind_poses.clone(),
    };

    let mut sample_mismatches = 0;
    if options.verify_samples {
        observer.on_event(&PruneEvent::StageStarted {
            stage: Stage::Verification,
        });
        for check in verify_samples(mesh, &output, &remap) {
            if !check.matches {
                sample_mismatches += 1;
            }
            observer.on_event(&PruneEvent::SampleChecked {
                new_index: check.new_index,
                old_index: check.old_index,
                matches: check.matches,
            });
        }
        observer.on_event(&PruneEvent::StageFinished {
            stage: Stage::Verification,
            detail: format!("{sample_mismatches} sample mismatches"),
        });
    }

    let report = PruneReport {
        mesh_name: output.name.clone(),
        summary,
        input_vertices: vertex_count,
        output_vertices: output.vertex_count(),
        orphaned_vertices: classification.orphaned_count,
        island_vertices: classification.growth.moved,
        growth_rounds: classification.growth.rounds,
        triangles_kept: topology.triangles_kept,
        input_submeshes: mesh.submeshes.len(),
        output_submeshes: output.submeshes.len(),
        dropped_submeshes: topology.dropped_submeshes,
        blend_shape_count: output.blend_shapes.len(),
        reported_orphans: classification.orphans,
        sample_mismatches,
    };

    observer.on_event(&PruneEvent::Finished { summary });

    Ok(PruneOutcome::Pruned(Box::new(PrunedMesh {
        mesh: output,
        report,
    })))
}
