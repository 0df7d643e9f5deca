use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};
use serde::{Deserialize, Serialize};

// ─── Constants ────────────────────────────────────────────────────────────────

/// Number of independent texture-coordinate channels a mesh can carry.
pub const UV_CHANNEL_COUNT: usize = 8;

/// Number of (bone, weight) slots in a single bone-weight record.
pub const BONE_SLOTS: usize = 4;

/// Largest vertex count still addressable with 16-bit triangle indices.
pub(super) const U16_INDEX_LIMIT: usize = 65_535;

// ─── Skinning ─────────────────────────────────────────────────────────────────

/// Four-slot skinning record attached to every vertex.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoneWeight {
    pub bone_indices: [u32; BONE_SLOTS],
    pub weights: [f32; BONE_SLOTS],
}

impl BoneWeight {
    pub fn new(bone_indices: [u32; BONE_SLOTS], weights: [f32; BONE_SLOTS]) -> Self {
        Self {
            bone_indices,
            weights,
        }
    }

    /// Single-influence record with full weight on `bone_index`.
    pub fn single(bone_index: u32) -> Self {
        Self::new([bone_index, 0, 0, 0], [1.0, 0.0, 0.0, 0.0])
    }

    /// Iterates `(slot, bone_index)` for every slot whose weight is > 0.
    ///
    /// NaN and negative weights fail the comparison and are skipped.
    pub fn active_slots(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        (0..BONE_SLOTS)
            .filter(|&slot| self.weights[slot] > 0.0)
            .map(|slot| (slot, self.bone_indices[slot]))
    }
}

/// Handle to a live skeleton bone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoneHandle {
    pub name: String,
}

impl BoneHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Bones referenced by skinning slots; `None` marks a bone that no longer
/// exists.
pub type BoneTable = Vec<Option<BoneHandle>>;

/// Opaque reference to the material bound to a submesh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRef {
    pub name: String,
}

impl MaterialRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

// ─── Vertex attributes ────────────────────────────────────────────────────────

/// Parallel per-vertex buffers. Every present buffer has the same length as
/// `positions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexAttributes {
    pub positions: Vec<Vector3<f32>>,
    pub normals: Option<Vec<Vector3<f32>>>,
    pub tangents: Option<Vec<Vector4<f32>>>,
    pub colors: Option<Vec<Vector4<f32>>>,
    pub uvs: [Option<Vec<Vector2<f32>>>; UV_CHANNEL_COUNT],
    pub bone_weights: Vec<BoneWeight>,
}

impl VertexAttributes {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of UV channels that carry data.
    pub fn uv_channel_count(&self) -> usize {
        self.uvs.iter().filter(|channel| channel.is_some()).count()
    }
}

// ─── Topology ─────────────────────────────────────────────────────────────────

/// Triangle list (stride 3) sharing one material.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submesh {
    pub indices: Vec<u32>,
}

impl Submesh {
    pub fn new(indices: Vec<u32>) -> Self {
        Self { indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
    }
}

/// Index width needed to address every vertex of a mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexFormat {
    #[default]
    U16,
    U32,
}

impl IndexFormat {
    pub fn for_vertex_count(vertex_count: usize) -> Self {
        if vertex_count > U16_INDEX_LIMIT {
            IndexFormat::U32
        } else {
            IndexFormat::U16
        }
    }
}

// ─── Blend shapes ─────────────────────────────────────────────────────────────

/// One keyframe of a blend shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlendShapeFrame {
    pub weight: f32,
    pub delta_positions: Vec<Vector3<f32>>,
    pub delta_normals: Option<Vec<Vector3<f32>>>,
    pub delta_tangents: Option<Vec<Vector3<f32>>>,
}

/// Named morph target made of ordered frames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlendShape {
    pub name: String,
    pub frames: Vec<BlendShapeFrame>,
}

// ─── Mesh ─────────────────────────────────────────────────────────────────────

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Bounds {
    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn extents(&self) -> Vector3<f32> {
        (self.max - self.min) * 0.5
    }
}

/// Complete skinned mesh: vertex buffers, submeshes with their paired
/// materials, blend shapes and bind poses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkinnedMesh {
    pub name: String,
    pub attributes: VertexAttributes,
    pub submeshes: Vec<Submesh>,
    pub materials: Vec<Option<MaterialRef>>,
    pub blend_shapes: Vec<BlendShape>,
    pub bind_poses: Vec<Matrix4<f32>>,
    pub bounds: Option<Bounds>,
    pub index_format: IndexFormat,
}

impl SkinnedMesh {
    pub fn vertex_count(&self) -> usize {
        self.attributes.vertex_count()
    }

    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(Submesh::triangle_count).sum()
    }
}

// ─── Options & reports ────────────────────────────────────────────────────────

/// Pruning options shared by CLI and library callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneOptions {
    /// Grows the removal set across triangles that straddle the cut.
    pub auto_grow_islands: bool,
    /// Maximum number of orphaned vertices described individually.
    pub max_reported_orphans: usize,
    /// Cross-checks sample vertices between source and output.
    pub verify_samples: bool,
}

impl Default for PruneOptions {
    fn default() -> Self {
        Self {
            auto_grow_islands: false,
            max_reported_orphans: 20,
            verify_samples: true,
        }
    }
}

/// Why a skinning slot made its vertex orphaned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrphanCause {
    /// Bone index is not smaller than the bone-table length.
    OutOfRange,
    /// Bone index points at an absent bone handle.
    MissingBone,
}

/// Diagnostic entry for one orphaned vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanedVertex {
    pub vertex: u32,
    pub slot: usize,
    pub bone_index: u32,
    pub cause: OrphanCause,
}

/// Counts returned to the caller for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneSummary {
    pub vertices_removed: usize,
    pub triangles_removed: usize,
}

/// Full statistics of a successful prune run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PruneReport {
    pub mesh_name: String,
    pub summary: PruneSummary,
    pub input_vertices: usize,
    pub output_vertices: usize,
    /// Vertices removed by weight validation alone.
    pub orphaned_vertices: usize,
    /// Vertices added to the removal set by island growth.
    pub island_vertices: usize,
    pub growth_rounds: usize,
    pub triangles_kept: usize,
    pub input_submeshes: usize,
    pub output_submeshes: usize,
    pub dropped_submeshes: Vec<usize>,
    pub blend_shape_count: usize,
    pub reported_orphans: Vec<OrphanedVertex>,
    pub sample_mismatches: usize,
}
