use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use anyhow::{Context, Result, bail};
use gltf::{Document, Node, Semantic, mesh::Mode};
use nalgebra::{Matrix4, Vector2, Vector3, Vector4};
use serde_json::Value;

use crate::prune::{
    BlendShape, BlendShapeFrame, BoneHandle, BoneTable, BoneWeight, IndexFormat, MaterialRef,
    SkinnedMesh, Submesh, UV_CHANNEL_COUNT, VertexAttributes, compute_bounds,
};

/// Frame weight given to glTF morph targets, which carry a single frame.
const MORPH_TARGET_FRAME_WEIGHT: f32 = 100.0;

/// Skinned mesh read from a glTF file together with its bone table.
#[derive(Debug, Clone)]
pub struct LoadedMesh {
    pub mesh: SkinnedMesh,
    pub bones: BoneTable,
}

#[derive(Debug, Default)]
struct MorphAccumulator {
    positions: Vec<Vector3<f32>>,
    normals: Option<Vec<Vector3<f32>>>,
    tangents: Option<Vec<Vector3<f32>>>,
}

/// Load the first skinned mesh node (or the one whose mesh is named
/// `mesh_name`) from a `.gltf`/`.glb` file.
///
/// Primitives become submeshes sharing one vertex buffer. Joints whose name
/// appears in `removed_bones` are marked absent in the bone table.
pub fn load_skinned_mesh(
    path: &Path,
    mesh_name: Option<&str>,
    removed_bones: &[String],
) -> Result<LoadedMesh> {
    let (document, buffers, _images) = gltf::import(path)
        .with_context(|| format!("failed to read glTF: {}", path.display()))?;

    let node = find_skinned_node(&document, mesh_name).with_context(|| match mesh_name {
        Some(name) => format!("no skinned node uses mesh '{name}'"),
        None => "the file contains no skinned mesh node".to_string(),
    })?;
    let (Some(skin), Some(gltf_mesh)) = (node.skin(), node.mesh()) else {
        bail!("node {} lost its skin or mesh binding", node.index());
    };

    let get_buffer = |buffer: gltf::Buffer| buffers.get(buffer.index()).map(|b| &b.0[..]);

    let removed: HashSet<&str> = removed_bones.iter().map(String::as_str).collect();
    let bones: BoneTable = skin
        .joints()
        .map(|joint| {
            let name = joint
                .name()
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| format!("joint_{}", joint.index()));
            (!removed.contains(name.as_str())).then(|| BoneHandle::new(name))
        })
        .collect();

    let bind_poses: Vec<Matrix4<f32>> = skin
        .reader(get_buffer)
        .read_inverse_bind_matrices()
        .map(|matrices| matrices.map(Matrix4::from).collect())
        .unwrap_or_default();

    let mut attributes = VertexAttributes::default();
    let mut submeshes = Vec::<Submesh>::new();
    let mut materials = Vec::<Option<MaterialRef>>::new();
    let mut morphs = Vec::<MorphAccumulator>::new();
    // POSITION accessor index -> (first vertex, vertex count) in the shared buffer.
    let mut vertex_blocks = HashMap::<usize, (u32, u32)>::new();

    for (primitive_index, primitive) in gltf_mesh.primitives().enumerate() {
        if primitive.mode() != Mode::Triangles {
            bail!(
                "primitive {primitive_index} uses {:?}; only triangle lists are supported",
                primitive.mode()
            );
        }

        let target_count = primitive.morph_targets().count();
        if primitive_index == 0 {
            morphs.resize_with(target_count, MorphAccumulator::default);
        } else if target_count != morphs.len() {
            bail!(
                "primitive {primitive_index} has {target_count} morph targets, expected {}",
                morphs.len()
            );
        }

        let position_accessor = primitive
            .get(&Semantic::Positions)
            .with_context(|| format!("primitive {primitive_index} has no POSITION attribute"))?
            .index();
        let reader = primitive.reader(get_buffer);

        let (base, count) = match vertex_blocks.get(&position_accessor) {
            Some(&block) => block,
            None => {
                let first = vertex_blocks.is_empty();
                let base = u32::try_from(attributes.positions.len())
                    .context("vertex count exceeds the 32-bit index range")?;

                let positions: Vec<Vector3<f32>> = reader
                    .read_positions()
                    .with_context(|| {
                        format!("primitive {primitive_index} has no POSITION attribute")
                    })?
                    .map(Vector3::from)
                    .collect();
                let count = u32::try_from(positions.len())
                    .context("vertex count exceeds the 32-bit index range")?;
                attributes.positions.extend(positions);

                let joints = reader
                    .read_joints(0)
                    .with_context(|| {
                        format!("primitive {primitive_index} has no JOINTS_0 attribute")
                    })?
                    .into_u16();
                let weights = reader
                    .read_weights(0)
                    .with_context(|| {
                        format!("primitive {primitive_index} has no WEIGHTS_0 attribute")
                    })?
                    .into_f32();
                attributes.bone_weights.extend(
                    joints
                        .zip(weights)
                        .map(|(j, w)| BoneWeight::new(j.map(u32::from), w)),
                );

                merge_attribute(
                    &mut attributes.normals,
                    reader
                        .read_normals()
                        .map(|values| values.map(Vector3::from).collect()),
                    first,
                    "NORMAL",
                )?;
                merge_attribute(
                    &mut attributes.tangents,
                    reader
                        .read_tangents()
                        .map(|values| values.map(Vector4::from).collect()),
                    first,
                    "TANGENT",
                )?;
                merge_attribute(
                    &mut attributes.colors,
                    reader
                        .read_colors(0)
                        .map(|values| values.into_rgba_f32().map(Vector4::from).collect()),
                    first,
                    "COLOR_0",
                )?;
                for channel in 0..UV_CHANNEL_COUNT {
                    merge_attribute(
                        &mut attributes.uvs[channel],
                        reader
                            .read_tex_coords(channel as u32)
                            .map(|values| values.into_f32().map(Vector2::from).collect()),
                        first,
                        &format!("TEXCOORD_{channel}"),
                    )?;
                }

                for (target_index, (morph, (positions, normals, tangents))) in
                    morphs.iter_mut().zip(reader.read_morph_targets()).enumerate()
                {
                    match positions {
                        Some(values) => morph.positions.extend(values.map(Vector3::from)),
                        // A target without POSITION displaces nothing.
                        None => morph
                            .positions
                            .extend(std::iter::repeat_n(Vector3::zeros(), count as usize)),
                    }
                    let label = format!("morph target {target_index}");
                    merge_attribute(
                        &mut morph.normals,
                        normals.map(|values| values.map(Vector3::from).collect()),
                        first,
                        &format!("{label} NORMAL"),
                    )?;
                    merge_attribute(
                        &mut morph.tangents,
                        tangents.map(|values| values.map(Vector3::from).collect()),
                        first,
                        &format!("{label} TANGENT"),
                    )?;
                }

                vertex_blocks.insert(position_accessor, (base, count));
                (base, count)
            }
        };

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices
                .into_u32()
                .map(|index| offset_index(index, base))
                .collect::<Result<_>>()?,
            None => (0..count)
                .map(|index| offset_index(index, base))
                .collect::<Result<_>>()?,
        };
        submeshes.push(Submesh::new(indices));

        let material = primitive.material();
        materials.push(
            material
                .name()
                .map(MaterialRef::new)
                .or_else(|| material.index().map(|i| MaterialRef::new(format!("material_{i}")))),
        );
    }

    let target_names = extract_target_names(&gltf_mesh);
    let blend_shapes = morphs
        .into_iter()
        .enumerate()
        .map(|(index, morph)| BlendShape {
            name: target_names
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("target_{index}")),
            frames: vec![BlendShapeFrame {
                weight: MORPH_TARGET_FRAME_WEIGHT,
                delta_positions: morph.positions,
                delta_normals: morph.normals,
                delta_tangents: morph.tangents,
            }],
        })
        .collect();

    let name = gltf_mesh
        .name()
        .or_else(|| node.name())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| format!("mesh_{}", gltf_mesh.index()));

    let mesh = SkinnedMesh {
        name,
        bounds: compute_bounds(&attributes.positions),
        index_format: IndexFormat::for_vertex_count(attributes.vertex_count()),
        attributes,
        submeshes,
        materials,
        blend_shapes,
        bind_poses,
    };

    Ok(LoadedMesh { mesh, bones })
}

fn find_skinned_node<'a>(document: &'a Document, mesh_name: Option<&str>) -> Option<Node<'a>> {
    document.nodes().find(|node| {
        let Some(mesh) = node.mesh() else {
            return false;
        };
        node.skin().is_some() && mesh_name.is_none_or(|name| mesh.name() == Some(name))
    })
}

/// Shift a primitive-local index into the shared vertex buffer.
fn offset_index(index: u32, base: u32) -> Result<u32> {
    index
        .checked_add(base)
        .with_context(|| format!("index {index} + {base} exceeds the 32-bit index range"))
}

/// Append `values` to a buffer whose presence must be the same for every
/// primitive.
fn merge_attribute<T>(
    target: &mut Option<Vec<T>>,
    values: Option<Vec<T>>,
    first: bool,
    label: &str,
) -> Result<()> {
    let Some(values) = values else {
        if target.is_some() {
            bail!("{label} is present on some primitives but not on others");
        }
        return Ok(());
    };
    match target {
        Some(buffer) => buffer.extend(values),
        None if first => *target = Some(values),
        None => bail!("{label} is present on some primitives but not on others"),
    }
    Ok(())
}

/// Morph target names stored by exporters under `mesh.extras.targetNames`.
fn extract_target_names(mesh: &gltf::Mesh) -> Vec<String> {
    mesh.extras()
        .as_ref()
        .and_then(|raw| serde_json::from_str::<Value>(raw.get()).ok())
        .and_then(|extras| extras.get("targetNames").cloned())
        .and_then(|names| names.as_array().cloned())
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use serde_json::json;

    use super::*;
    use crate::{NullObserver, PruneError, PruneOptions, prune_mesh};

    /// Writes a four-vertex quad whose two triangles live in separate
    /// primitives that share the POSITION, JOINTS_0 and WEIGHTS_0 accessors.
    /// Vertex 3 is weighted to the `HairRoot` joint, the rest to `Hips`.
    fn write_shared_accessor_gltf(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("skin-prune-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("create temp dir");

        let mut bin = Vec::<u8>::new();
        for position in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]] {
            position.iter().for_each(|v| bin.extend(v.to_le_bytes()));
        }
        for joint in [0u8, 0, 0, 1] {
            bin.extend([joint, 0, 0, 0]);
        }
        for _ in 0..4 {
            [1.0f32, 0.0, 0.0, 0.0]
                .iter()
                .for_each(|v| bin.extend(v.to_le_bytes()));
        }
        for index in [0u16, 1, 2, 0, 1, 3, 2] {
            bin.extend(index.to_le_bytes());
        }
        // Layout: positions 0..48, joints 48..64, weights 64..128,
        // indices (0,1,2) 128..134, padding, indices (1,3,2) 136..142.
        assert_eq!(bin.len(), 142);
        fs::write(dir.join("shared.bin"), &bin).expect("write buffer");

        let attributes = json!({ "POSITION": 0, "JOINTS_0": 1, "WEIGHTS_0": 2 });
        let document = json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "nodes": [0, 1] }],
            "nodes": [
                { "name": "Body", "mesh": 0, "skin": 0 },
                { "name": "Hips", "children": [2] },
                { "name": "HairRoot" }
            ],
            "skins": [{ "joints": [1, 2] }],
            "materials": [{ "name": "Skin" }, { "name": "Hair" }],
            "meshes": [{
                "name": "Body",
                "primitives": [
                    { "attributes": attributes.clone(), "indices": 3, "material": 0 },
                    { "attributes": attributes, "indices": 4, "material": 1 }
                ]
            }],
            "buffers": [{ "byteLength": 142, "uri": "shared.bin" }],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 48 },
                { "buffer": 0, "byteOffset": 48, "byteLength": 16 },
                { "buffer": 0, "byteOffset": 64, "byteLength": 64 },
                { "buffer": 0, "byteOffset": 128, "byteLength": 6 },
                { "buffer": 0, "byteOffset": 136, "byteLength": 6 }
            ],
            "accessors": [
                {
                    "bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3",
                    "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
                },
                { "bufferView": 1, "componentType": 5121, "count": 4, "type": "VEC4" },
                { "bufferView": 2, "componentType": 5126, "count": 4, "type": "VEC4" },
                { "bufferView": 3, "componentType": 5123, "count": 3, "type": "SCALAR" },
                { "bufferView": 4, "componentType": 5123, "count": 3, "type": "SCALAR" }
            ]
        });
        let path = dir.join("shared.gltf");
        fs::write(&path, serde_json::to_vec_pretty(&document).expect("serialize glTF"))
            .expect("write glTF");
        path
    }

    #[test]
    fn given_primitives_sharing_position_accessor_when_loading_then_vertices_are_not_duplicated() {
        let path = write_shared_accessor_gltf("shared-load");

        let loaded = load_skinned_mesh(&path, None, &[]).expect("load glTF");
        fs::remove_dir_all(path.parent().expect("temp dir")).expect("remove temp dir");

        assert_eq!(loaded.mesh.name, "Body");
        assert_eq!(loaded.mesh.vertex_count(), 4);
        assert_eq!(
            loaded.mesh.submeshes,
            vec![Submesh::new(vec![0, 1, 2]), Submesh::new(vec![1, 3, 2])]
        );
        assert_eq!(
            loaded.mesh.materials,
            vec![Some(MaterialRef::new("Skin")), Some(MaterialRef::new("Hair"))]
        );
        assert_eq!(loaded.mesh.attributes.bone_weights[3].bone_indices[0], 1);
        assert_eq!(
            loaded.bones,
            vec![Some(BoneHandle::new("Hips")), Some(BoneHandle::new("HairRoot"))]
        );
    }

    #[test]
    fn given_shared_vertices_across_primitives_when_growing_islands_then_cut_crosses_submeshes() {
        let path = write_shared_accessor_gltf("shared-grow");
        let loaded =
            load_skinned_mesh(&path, Some("Body"), &["HairRoot".to_string()]).expect("load glTF");
        fs::remove_dir_all(path.parent().expect("temp dir")).expect("remove temp dir");
        assert_eq!(loaded.bones[1], None);

        let options = PruneOptions {
            auto_grow_islands: true,
            ..Default::default()
        };
        let err = prune_mesh(&loaded.mesh, &loaded.bones, &options, &mut NullObserver).unwrap_err();

        assert_eq!(
            err,
            PruneError::DegenerateResult {
                vertex_count: 4,
                orphaned: 1,
                grown: 3
            }
        );
    }

    #[test]
    fn given_index_past_u32_range_when_offsetting_then_error_is_returned() {
        assert_eq!(offset_index(2, 5).unwrap(), 7);
        assert!(offset_index(u32::MAX, 1).is_err());
    }

    #[test]
    fn given_attribute_on_first_primitive_only_when_merging_then_error_is_returned() {
        let mut target = None;
        merge_attribute(&mut target, Some(vec![1, 2]), true, "NORMAL").unwrap();
        merge_attribute(&mut target, Some(vec![3]), false, "NORMAL").unwrap();
        assert_eq!(target, Some(vec![1, 2, 3]));

        let err = merge_attribute(&mut target, None, false, "NORMAL").unwrap_err();
        assert!(err.to_string().contains("NORMAL"));
    }

    #[test]
    fn given_attribute_appearing_late_when_merging_then_error_is_returned() {
        let mut target: Option<Vec<u8>> = None;
        merge_attribute(&mut target, None, true, "COLOR_0").unwrap();

        assert!(merge_attribute(&mut target, Some(vec![1]), false, "COLOR_0").is_err());
    }
}
