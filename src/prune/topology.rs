use super::remap::IndexRemap;
use super::types::{MaterialRef, Submesh};

/// Submeshes and materials after triangle filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebuiltTopology {
    pub submeshes: Vec<Submesh>,
    pub materials: Vec<Option<MaterialRef>>,
    /// Original indices of submeshes left without triangles.
    pub dropped_submeshes: Vec<usize>,
    pub triangles_kept: usize,
    pub triangles_removed: usize,
}

/// Keep each triangle whose three corners survive, renumbered through the
/// remap. Empty submeshes are dropped together with their material.
pub fn rebuild_topology(
    submeshes: &[Submesh],
    materials: &[Option<MaterialRef>],
    remap: &IndexRemap,
) -> RebuiltTopology {
    let mut rebuilt = RebuiltTopology::default();

    for (submesh_index, (submesh, material)) in submeshes.iter().zip(materials).enumerate() {
        let mut indices = Vec::with_capacity(submesh.indices.len());
        for triangle in submesh.triangles() {
            match remap.triangle(triangle) {
                Some(translated) => indices.extend_from_slice(&translated),
                None => rebuilt.triangles_removed += 1,
            }
        }

        if indices.is_empty() {
            rebuilt.dropped_submeshes.push(submesh_index);
            continue;
        }

        rebuilt.triangles_kept += indices.len() / 3;
        rebuilt.submeshes.push(Submesh::new(indices));
        rebuilt.materials.push(material.clone());
    }

    rebuilt
}
