use super::validation::VertexPartition;

/// Dense renumbering of kept vertices. Removed vertices map to `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRemap {
    keep: Vec<u32>,
    old_to_new: Vec<Option<u32>>,
}

impl IndexRemap {
    /// Build the map from a partition; kept vertices are numbered in
    /// ascending original order.
    pub fn from_partition(partition: &VertexPartition) -> Self {
        let keep = partition.keep_indices();
        let mut old_to_new = vec![None; partition.vertex_count()];
        for (new_index, &old_index) in keep.iter().enumerate() {
            old_to_new[old_index as usize] = Some(new_index as u32);
        }
        Self { keep, old_to_new }
    }

    /// Kept original indices; position `i` holds the source of new vertex `i`.
    pub fn keep(&self) -> &[u32] {
        &self.keep
    }

    pub fn old_vertex_count(&self) -> usize {
        self.old_to_new.len()
    }

    pub fn new_vertex_count(&self) -> usize {
        self.keep.len()
    }

    pub fn get(&self, old_index: u32) -> Option<u32> {
        self.old_to_new.get(old_index as usize).copied().flatten()
    }

    /// Translate a whole triangle, or `None` when any corner was removed.
    pub fn triangle(&self, triangle: [u32; 3]) -> Option<[u32; 3]> {
        Some([
            self.get(triangle[0])?,
            self.get(triangle[1])?,
            self.get(triangle[2])?,
        ])
    }

    /// Gather `buffer[keep[i]]` for every new index `i`.
    pub fn select<T: Clone>(&self, buffer: &[T]) -> Vec<T> {
        self.keep
            .iter()
            .map(|&old_index| buffer[old_index as usize].clone())
            .collect()
    }

    pub fn select_optional<T: Clone>(&self, buffer: Option<&Vec<T>>) -> Option<Vec<T>> {
        buffer.map(|values| self.select(values))
    }
}
