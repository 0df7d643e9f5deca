use super::remap::IndexRemap;
use super::types::{BlendShape, BlendShapeFrame};

/// Resize every frame's delta buffers to the kept vertex set. Names, frame
/// order and weights are preserved; shapes without frames are kept as empty
/// shapes.
pub fn remap_blend_shapes(shapes: &[BlendShape], remap: &IndexRemap) -> Vec<BlendShape> {
    shapes
        .iter()
        .map(|shape| BlendShape {
            name: shape.name.clone(),
            frames: shape
                .frames
                .iter()
                .map(|frame| BlendShapeFrame {
                    weight: frame.weight,
                    delta_positions: remap.select(&frame.delta_positions),
                    delta_normals: remap.select_optional(frame.delta_normals.as_ref()),
                    delta_tangents: remap.select_optional(frame.delta_tangents.as_ref()),
                })
                .collect(),
        })
        .collect()
}
