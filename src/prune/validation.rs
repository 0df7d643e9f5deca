use crate::error::IntegrityViolation;

use super::types::{BoneTable, BoneWeight, OrphanCause, OrphanedVertex, SkinnedMesh};

// ─── Vertex partition ─────────────────────────────────────────────────────────

/// Exhaustive split of `0..V` into kept and removed vertices, backed by a
/// bitset so membership tests are O(1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexPartition {
    removed: Vec<bool>,
    removed_count: usize,
}

impl VertexPartition {
    /// Partition keeping every vertex.
    pub fn keep_all(vertex_count: usize) -> Self {
        Self {
            removed: vec![false; vertex_count],
            removed_count: 0,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.removed.len()
    }

    pub fn keep_count(&self) -> usize {
        self.removed.len() - self.removed_count
    }

    pub fn remove_count(&self) -> usize {
        self.removed_count
    }

    pub fn is_kept(&self, vertex: u32) -> bool {
        !self.removed[vertex as usize]
    }

    pub fn is_removed(&self, vertex: u32) -> bool {
        self.removed[vertex as usize]
    }

    /// Moves `vertex` into the removal set. Returns `false` when it was
    /// already removed.
    pub fn mark_removed(&mut self, vertex: u32) -> bool {
        let slot = &mut self.removed[vertex as usize];
        if *slot {
            return false;
        }
        *slot = true;
        self.removed_count += 1;
        true
    }

    /// True when nothing was removed.
    pub fn is_identity(&self) -> bool {
        self.removed_count == 0
    }

    /// Ascending kept indices.
    pub fn keep_indices(&self) -> Vec<u32> {
        self.collect_where(false)
    }

    /// Ascending removed indices.
    pub fn remove_indices(&self) -> Vec<u32> {
        self.collect_where(true)
    }

    fn collect_where(&self, removed: bool) -> Vec<u32> {
        self.removed
            .iter()
            .enumerate()
            .filter(|&(_, &flag)| flag == removed)
            .map(|(index, _)| index as u32)
            .collect()
    }
}

// ─── Weight validation ────────────────────────────────────────────────────────

/// Result of classifying every vertex by its bone-weight record.
#[derive(Debug, Clone)]
pub struct WeightValidation {
    pub partition: VertexPartition,
    /// First offenders, capped by `max_reported`.
    pub orphans: Vec<OrphanedVertex>,
}

/// Returns the first active slot of `weight` that references a bone outside
/// the table or an absent bone.
pub fn find_orphaned_slot(
    weight: &BoneWeight,
    bones: &BoneTable,
) -> Option<(usize, u32, OrphanCause)> {
    weight
        .active_slots()
        .find_map(|(slot, bone_index)| match bones.get(bone_index as usize) {
            None => Some((slot, bone_index, OrphanCause::OutOfRange)),
            Some(None) => Some((slot, bone_index, OrphanCause::MissingBone)),
            Some(Some(_)) => None,
        })
}

/// Classify each vertex as kept or orphaned.
pub fn validate_bone_weights(
    bone_weights: &[BoneWeight],
    bones: &BoneTable,
    max_reported: usize,
) -> WeightValidation {
    let mut partition = VertexPartition::keep_all(bone_weights.len());
    let mut orphans = Vec::new();

    for (vertex, weight) in bone_weights.iter().enumerate() {
        let Some((slot, bone_index, cause)) = find_orphaned_slot(weight, bones) else {
            continue;
        };
        partition.mark_removed(vertex as u32);
        if orphans.len() < max_reported {
            orphans.push(OrphanedVertex {
                vertex: vertex as u32,
                slot,
                bone_index,
                cause,
            });
        }
    }

    WeightValidation { partition, orphans }
}

// ─── Input integrity ──────────────────────────────────────────────────────────

fn check_len(buffer: &str, actual: usize, expected: usize) -> Result<(), IntegrityViolation> {
    if actual == expected {
        return Ok(());
    }
    Err(IntegrityViolation::BufferLength {
        buffer: buffer.to_string(),
        expected,
        actual,
    })
}

/// Verify every buffer length and triangle index against the vertex count.
pub fn check_mesh_integrity(mesh: &SkinnedMesh) -> Result<(), IntegrityViolation> {
    let attributes = &mesh.attributes;
    let vertex_count = attributes.vertex_count();

    check_len("bone weights", attributes.bone_weights.len(), vertex_count)?;
    if let Some(normals) = &attributes.normals {
        check_len("normals", normals.len(), vertex_count)?;
    }
    if let Some(tangents) = &attributes.tangents {
        check_len("tangents", tangents.len(), vertex_count)?;
    }
    if let Some(colors) = &attributes.colors {
        check_len("colors", colors.len(), vertex_count)?;
    }
    for (channel, uvs) in attributes.uvs.iter().enumerate() {
        if let Some(uvs) = uvs {
            check_len(&format!("uv{channel}"), uvs.len(), vertex_count)?;
        }
    }

    if mesh.materials.len() != mesh.submeshes.len() {
        return Err(IntegrityViolation::MaterialCount {
            submeshes: mesh.submeshes.len(),
            materials: mesh.materials.len(),
        });
    }

    for (submesh_index, submesh) in mesh.submeshes.iter().enumerate() {
        if submesh.indices.len() % 3 != 0 {
            return Err(IntegrityViolation::PartialTriangle {
                submesh: submesh_index,
                len: submesh.indices.len(),
            });
        }
        if let Some(&index) = submesh
            .indices
            .iter()
            .find(|&&index| index as usize >= vertex_count)
        {
            return Err(IntegrityViolation::IndexOutOfRange {
                submesh: submesh_index,
                index,
                vertex_count,
            });
        }
    }

    for shape in &mesh.blend_shapes {
        for (frame_index, frame) in shape.frames.iter().enumerate() {
            let label = |buffer: &str| {
                format!("blend shape '{}' frame {frame_index} {buffer}", shape.name)
            };
            check_len(
                &label("delta positions"),
                frame.delta_positions.len(),
                vertex_count,
            )?;
            if let Some(normals) = &frame.delta_normals {
                check_len(&label("delta normals"), normals.len(), vertex_count)?;
            }
            if let Some(tangents) = &frame.delta_tangents {
                check_len(&label("delta tangents"), tangents.len(), vertex_count)?;
            }
        }
    }

    Ok(())
}
