use super::remap::IndexRemap;
use super::types::VertexAttributes;

/// Gather every present per-vertex buffer through the remap. Absent buffers
/// stay absent.
pub fn compact_attributes(attributes: &VertexAttributes, remap: &IndexRemap) -> VertexAttributes {
    VertexAttributes {
        positions: remap.select(&attributes.positions),
        normals: remap.select_optional(attributes.normals.as_ref()),
        tangents: remap.select_optional(attributes.tangents.as_ref()),
        colors: remap.select_optional(attributes.colors.as_ref()),
        uvs: std::array::from_fn(|channel| remap.select_optional(attributes.uvs[channel].as_ref())),
        bone_weights: remap.select(&attributes.bone_weights),
    }
}
