//! Property-based tests for vertex classification, remapping and topology
//! reconstruction on random skinned meshes.

use nalgebra::Vector3;
use proptest::prelude::*;
use skin_prune::{
    NullObserver, PruneError, PruneOptions, PruneOutcome,
    prune::{
        BoneHandle, BoneTable, BoneWeight, IndexRemap, MaterialRef, SkinnedMesh, Submesh,
        find_orphaned_slot, grow_islands, rebuild_topology, validate_bone_weights,
    },
    prune_mesh,
};

// =============================================================================
// Strategies
// =============================================================================

/// Bone table of four bones where bone 0 always exists.
fn arb_bones() -> impl Strategy<Value = BoneTable> {
    prop::collection::vec(any::<bool>(), 3).prop_map(|present| {
        std::iter::once(Some(BoneHandle::new("Hips")))
            .chain(
                present
                    .into_iter()
                    .enumerate()
                    .map(|(i, alive)| alive.then(|| BoneHandle::new(format!("Bone{i}")))),
            )
            .collect()
    })
}

/// Slot indices may run past the four-bone table.
fn arb_bone_weight() -> impl Strategy<Value = BoneWeight> {
    (
        prop::array::uniform4(0u32..6),
        prop::array::uniform4(prop_oneof![Just(0.0f32), Just(-1.0f32), 0.1f32..1.0]),
    )
        .prop_map(|(bone_indices, weights)| BoneWeight::new(bone_indices, weights))
}

fn arb_mesh() -> impl Strategy<Value = SkinnedMesh> {
    (3usize..40).prop_flat_map(|vertex_count| {
        let n = vertex_count as u32;
        let weights = prop::collection::vec(arb_bone_weight(), vertex_count);
        let submeshes = prop::collection::vec(
            prop::collection::vec(prop::array::uniform3(0..n), 0..20),
            1..4,
        );
        (weights, submeshes).prop_map(move |(bone_weights, submeshes)| {
            let mut mesh = SkinnedMesh {
                name: "Random".to_string(),
                ..Default::default()
            };
            mesh.attributes.positions = (0..vertex_count)
                .map(|i| Vector3::new(i as f32, 0.0, 0.0))
                .collect();
            mesh.attributes.bone_weights = bone_weights;
            mesh.materials = (0..submeshes.len())
                .map(|i| Some(MaterialRef::new(format!("Material{i}"))))
                .collect();
            mesh.submeshes = submeshes
                .into_iter()
                .map(|triangles| Submesh::new(triangles.into_iter().flatten().collect()))
                .collect();
            mesh
        })
    })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn partition_covers_every_vertex_exactly_once(mesh in arb_mesh(), bones in arb_bones()) {
        let validation = validate_bone_weights(&mesh.attributes.bone_weights, &bones, usize::MAX);
        let partition = validation.partition;

        let keep = partition.keep_indices();
        let remove = partition.remove_indices();
        prop_assert_eq!(keep.len() + remove.len(), mesh.vertex_count());
        prop_assert!(keep.windows(2).all(|pair| pair[0] < pair[1]));
        for vertex in 0..mesh.vertex_count() as u32 {
            let weight = &mesh.attributes.bone_weights[vertex as usize];
            let orphaned = find_orphaned_slot(weight, &bones).is_some();
            prop_assert_eq!(partition.is_removed(vertex), orphaned);
            prop_assert_ne!(keep.contains(&vertex), remove.contains(&vertex));
        }
        prop_assert_eq!(validation.orphans.len(), remove.len());
    }

    #[test]
    fn remap_is_an_order_preserving_bijection(mesh in arb_mesh(), bones in arb_bones()) {
        let partition = validate_bone_weights(&mesh.attributes.bone_weights, &bones, 0).partition;
        let remap = IndexRemap::from_partition(&partition);

        prop_assert_eq!(remap.new_vertex_count(), partition.keep_count());
        for (new_index, &old_index) in remap.keep().iter().enumerate() {
            prop_assert_eq!(remap.get(old_index), Some(new_index as u32));
        }
        for old_index in partition.remove_indices() {
            prop_assert_eq!(remap.get(old_index), None);
        }
    }

    #[test]
    fn every_triangle_is_either_kept_or_counted_as_removed(
        mesh in arb_mesh(),
        bones in arb_bones(),
    ) {
        let partition = validate_bone_weights(&mesh.attributes.bone_weights, &bones, 0).partition;
        let remap = IndexRemap::from_partition(&partition);

        let topology = rebuild_topology(&mesh.submeshes, &mesh.materials, &remap);

        prop_assert_eq!(
            topology.triangles_kept + topology.triangles_removed,
            mesh.triangle_count()
        );
        prop_assert_eq!(topology.submeshes.len(), topology.materials.len());
        prop_assert_eq!(
            topology.submeshes.len() + topology.dropped_submeshes.len(),
            mesh.submeshes.len()
        );
        let expected_kept = mesh
            .submeshes
            .iter()
            .flat_map(Submesh::triangles)
            .filter(|triangle| triangle.iter().all(|&vertex| partition.is_kept(vertex)))
            .count();
        prop_assert_eq!(topology.triangles_kept, expected_kept);
        for submesh in &topology.submeshes {
            prop_assert!(submesh.triangle_count() > 0);
            let new_vertex_count = remap.new_vertex_count();
            prop_assert!(submesh.indices.iter().all(|&index| (index as usize) < new_vertex_count));
        }
    }

    #[test]
    fn island_growth_leaves_no_mixed_triangle(mesh in arb_mesh(), bones in arb_bones()) {
        let mut partition =
            validate_bone_weights(&mesh.attributes.bone_weights, &bones, 0).partition;
        let before = partition.remove_count();

        let stats = grow_islands(&mut partition, &mesh.submeshes, |_, _, _| {});

        prop_assert_eq!(partition.remove_count(), before + stats.moved);
        prop_assert!(stats.rounds <= mesh.vertex_count());
        if partition.keep_count() > 0 {
            for triangle in mesh.submeshes.iter().flat_map(Submesh::triangles) {
                let removed = triangle
                    .iter()
                    .filter(|&&vertex| partition.is_removed(vertex))
                    .count();
                prop_assert!(removed == 0 || removed == 3);
            }
        }
    }

    #[test]
    fn pruned_mesh_references_only_live_bones(
        mesh in arb_mesh(),
        bones in arb_bones(),
        grow in any::<bool>(),
    ) {
        let options = PruneOptions { auto_grow_islands: grow, ..Default::default() };

        match prune_mesh(&mesh, &bones, &options, &mut NullObserver) {
            Ok(PruneOutcome::Pruned(pruned)) => {
                let output = &pruned.mesh;
                prop_assert_eq!(
                    output.attributes.positions.len(),
                    output.attributes.bone_weights.len()
                );
                prop_assert!(output.vertex_count() < mesh.vertex_count());
                prop_assert!(
                    output
                        .attributes
                        .bone_weights
                        .iter()
                        .all(|weight| find_orphaned_slot(weight, &bones).is_none())
                );
                prop_assert_eq!(pruned.report.sample_mismatches, 0);
                prop_assert_eq!(
                    pruned.report.summary.vertices_removed,
                    mesh.vertex_count() - output.vertex_count()
                );
            }
            Ok(PruneOutcome::Unchanged { vertex_count }) => {
                prop_assert_eq!(vertex_count, mesh.vertex_count());
            }
            Err(err) => {
                let is_degenerate = matches!(err, PruneError::DegenerateResult { .. });
                prop_assert!(is_degenerate);
            }
        }
    }
}
