use nalgebra::{Point3, Vector3};

use super::remap::IndexRemap;
use super::types::{BoneWeight, Bounds, SkinnedMesh, VertexAttributes};

// ─── Bounds ───────────────────────────────────────────────────────────────────

/// Axis-aligned box around `positions`, or `None` when no finite position
/// exists.
pub fn compute_bounds(positions: &[Vector3<f32>]) -> Option<Bounds> {
    let mut min = Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY);
    let mut max = Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);

    for p in positions {
        min = min.inf(&Point3::from(*p));
        max = max.sup(&Point3::from(*p));
    }

    if min.iter().chain(max.iter()).all(|c| c.is_finite()) {
        Some(Bounds { min, max })
    } else {
        None
    }
}

// ─── Sample verification ──────────────────────────────────────────────────────

/// Result of cross-checking one output vertex against its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleCheck {
    pub new_index: usize,
    pub old_index: usize,
    pub matches: bool,
}

/// New indices at 0, ¼, ½, ¾ and the end of a buffer of `count` entries.
pub fn sample_indices(count: usize) -> Vec<usize> {
    if count == 0 {
        return Vec::new();
    }
    let mut samples = vec![0, count / 4, count / 2, (count / 4) * 3, count - 1];
    samples.sort_unstable();
    samples.dedup();
    samples
}

fn same_bits(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}

fn same_weight(a: &BoneWeight, b: &BoneWeight) -> bool {
    a.bone_indices == b.bone_indices && same_bits(&a.weights, &b.weights)
}

fn optional_matches<T>(
    source: Option<&Vec<T>>,
    output: Option<&Vec<T>>,
    old_index: usize,
    new_index: usize,
    eq: impl Fn(&T, &T) -> bool,
) -> bool {
    match (source, output) {
        (Some(source), Some(output)) => eq(&source[old_index], &output[new_index]),
        (None, None) => true,
        _ => false,
    }
}

fn vertex_matches(
    source: &VertexAttributes,
    output: &VertexAttributes,
    old_index: usize,
    new_index: usize,
) -> bool {
    let vec3 = |a: &Vector3<f32>, b: &Vector3<f32>| same_bits(a.as_slice(), b.as_slice());

    vec3(&source.positions[old_index], &output.positions[new_index])
        && same_weight(
            &source.bone_weights[old_index],
            &output.bone_weights[new_index],
        )
        && optional_matches(
            source.normals.as_ref(),
            output.normals.as_ref(),
            old_index,
            new_index,
            vec3,
        )
}

fn blend_shapes_match(
    source: &SkinnedMesh,
    output: &SkinnedMesh,
    old_index: usize,
    new_index: usize,
) -> bool {
    source
        .blend_shapes
        .iter()
        .zip(&output.blend_shapes)
        .flat_map(|(a, b)| a.frames.iter().zip(&b.frames))
        .filter(|(a, _)| a.delta_positions[old_index] != Vector3::zeros())
        .all(|(a, b)| {
            same_bits(
                a.delta_positions[old_index].as_slice(),
                b.delta_positions[new_index].as_slice(),
            )
        })
}

/// Compare sample output vertices with the vertex they were gathered from.
pub fn verify_samples(
    source: &SkinnedMesh,
    output: &SkinnedMesh,
    remap: &IndexRemap,
) -> Vec<SampleCheck> {
    sample_indices(remap.new_vertex_count())
        .into_iter()
        .map(|new_index| {
            let old_index = remap.keep()[new_index] as usize;
            let matches =
                vertex_matches(&source.attributes, &output.attributes, old_index, new_index)
                    && blend_shapes_match(source, output, old_index, new_index);
            SampleCheck {
                new_index,
                old_index,
                matches,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_positions_when_computing_bounds_then_box_encloses_all() {
        let positions = vec![
            Vector3::new(-1.0, 2.0, 0.5),
            Vector3::new(3.0, -4.0, 0.0),
            Vector3::new(0.0, 0.0, 1.5),
        ];

        let bounds = compute_bounds(&positions).expect("bounds should exist");

        assert_eq!(bounds.min, Point3::new(-1.0, -4.0, 0.0));
        assert_eq!(bounds.max, Point3::new(3.0, 2.0, 1.5));
        assert_eq!(bounds.center(), Point3::new(1.0, -1.0, 0.75));
        assert_eq!(bounds.extents(), Vector3::new(2.0, 3.0, 0.75));
    }

    #[test]
    fn given_no_positions_when_computing_bounds_then_none_is_returned() {
        assert!(compute_bounds(&[]).is_none());
    }

    #[test]
    fn given_small_counts_when_sampling_then_indices_are_unique_and_in_range() {
        assert!(sample_indices(0).is_empty());
        assert_eq!(sample_indices(1), vec![0]);
        assert_eq!(sample_indices(2), vec![0, 1]);
        assert_eq!(sample_indices(8), vec![0, 2, 4, 6, 7]);
    }
}
