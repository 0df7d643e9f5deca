use super::types::Submesh;
use super::validation::VertexPartition;

/// Outcome of island growth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrowthStats {
    /// Rounds that moved at least one vertex.
    pub rounds: usize,
    /// Vertices moved from the keep set into the removal set.
    pub moved: usize,
}

/// Grow the removal set to a fixed point across triangles that straddle the
/// cut: every kept corner of a mixed triangle is removed.
///
/// Each round scans every triangle once against the bitset partition.
/// Growth stops when a round moves nothing or when no vertex is kept.
/// `on_round(round, moved, remaining)` is called after each productive round.
pub fn grow_islands(
    partition: &mut VertexPartition,
    submeshes: &[Submesh],
    mut on_round: impl FnMut(usize, usize, usize),
) -> GrowthStats {
    let mut stats = GrowthStats::default();

    if partition.is_identity() {
        return stats;
    }

    let mut pending = Vec::<u32>::new();
    while partition.keep_count() > 0 {
        // Decide from the previous round's state, then apply.
        for triangle in submeshes.iter().flat_map(Submesh::triangles) {
            let removed = triangle
                .iter()
                .filter(|&&vertex| partition.is_removed(vertex))
                .count();
            if removed == 0 || removed == 3 {
                continue;
            }
            pending.extend(
                triangle
                    .iter()
                    .copied()
                    .filter(|&vertex| partition.is_kept(vertex)),
            );
        }

        let moved = pending
            .drain(..)
            .filter(|&vertex| partition.mark_removed(vertex))
            .count();
        if moved == 0 {
            break;
        }

        stats.rounds += 1;
        stats.moved += moved;
        on_round(stats.rounds, moved, partition.keep_count());
    }

    stats
}
