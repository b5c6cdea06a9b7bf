use glam::Vec2;

use std::collections::HashMap;
use std::hash::Hash;

/// Uniform-grid bucket index over slotmap keys.
///
/// Bucket membership is derived from a primitive's axis-aligned bounds with
/// *boundary-inclusive* cell ranges: geometry sitting exactly on a cell
/// boundary belongs to the buckets on both sides (up to four with diagonal
/// inclusion), so a narrow query gathering buckets from either adjacent cell
/// still sees it. That inclusion is a correctness requirement of the query
/// layer, not an optimization.
#[derive(Debug)]
pub struct SpatialGrid<K: Copy + Eq + Hash> {
    cell_size: f32,
    buckets: HashMap<(i32, i32), Vec<K>>,
}

impl<K: Copy + Eq + Hash> SpatialGrid<K> {
    pub fn new(cell_size: f32) -> Self {
        Self { cell_size: cell_size.max(1e-5), buckets: HashMap::new() }
    }

    /// Bucket keys covered by the given bounds, boundary-inclusive on both
    /// sides.
    pub fn cells_for(&self, min: Vec2, max: Vec2) -> Vec<(i32, i32)> {
        let cs = self.cell_size;
        // ceil(min/cs) - 1 includes the lower neighbor when min lies exactly
        // on a boundary; floor(max/cs) likewise includes the upper one.
        let ix0 = (min.x / cs).ceil() as i32 - 1;
        let iy0 = (min.y / cs).ceil() as i32 - 1;
        let ix1 = (max.x / cs).floor() as i32;
        let iy1 = (max.y / cs).floor() as i32;
        let mut out = Vec::with_capacity(((ix1 - ix0 + 1) * (iy1 - iy0 + 1)).max(0) as usize);
        for iy in iy0..=iy1 {
            for ix in ix0..=ix1 {
                out.push((ix, iy));
            }
        }
        out
    }

    /// Register `key` in every listed bucket.
    pub fn insert(&mut self, key: K, cells: &[(i32, i32)]) {
        for &c in cells {
            self.buckets.entry(c).or_default().push(key);
        }
    }

    /// Remove `key` from every listed bucket, dropping buckets that empty out.
    pub fn remove(&mut self, key: K, cells: &[(i32, i32)]) {
        for c in cells {
            if let Some(list) = self.buckets.get_mut(c) {
                list.retain(|&k| k != key);
                if list.is_empty() {
                    self.buckets.remove(c);
                }
            }
        }
    }

    /// Swap membership from `old` cells to `new` in one step, so no query in
    /// between can observe a half-updated index.
    pub fn retrack(&mut self, key: K, old: &[(i32, i32)], new: &[(i32, i32)]) {
        if old == new {
            return;
        }
        self.remove(key, old);
        self.insert(key, new);
    }

    pub fn bucket(&self, cell: (i32, i32)) -> Option<&[K]> {
        self.buckets.get(&cell).map(Vec::as_slice)
    }

    /// Number of non-empty buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// How many buckets list `key`; test support for the symmetry property.
    #[cfg(test)]
    pub fn occurrences(&self, key: K) -> usize {
        self.buckets.values().map(|v| v.iter().filter(|&&k| k == key).count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_for_interior_point_is_single_cell() {
        let g: SpatialGrid<u32> = SpatialGrid::new(10.0);
        let p = Vec2::new(3.0, 4.0);
        assert_eq!(g.cells_for(p, p), vec![(0, 0)]);
    }

    #[test]
    fn test_cells_for_boundary_point_straddles_four_cells() {
        let g: SpatialGrid<u32> = SpatialGrid::new(10.0);
        let p = Vec2::new(10.0, 20.0);
        let cells = g.cells_for(p, p);
        assert_eq!(cells.len(), 4);
        for c in [(0, 1), (1, 1), (0, 2), (1, 2)] {
            assert!(cells.contains(&c), "missing cell {c:?}");
        }
    }

    #[test]
    fn test_cells_for_spanning_box() {
        let g: SpatialGrid<u32> = SpatialGrid::new(10.0);
        let cells = g.cells_for(Vec2::new(1.0, 1.0), Vec2::new(25.0, 9.0));
        // x cells 0..=2, y cell 0 only.
        assert_eq!(cells.len(), 3);
    }

    #[test]
    fn test_retrack_swaps_membership_atomically() {
        let mut g: SpatialGrid<u32> = SpatialGrid::new(10.0);
        let old = vec![(0, 0), (1, 0)];
        let new = vec![(1, 0), (2, 0)];
        g.insert(7, &old);
        g.retrack(7, &old, &new);
        assert!(g.bucket((0, 0)).is_none());
        assert_eq!(g.bucket((1, 0)), Some(&[7u32][..]));
        assert_eq!(g.bucket((2, 0)), Some(&[7u32][..]));
        assert_eq!(g.occurrences(7), 2);
    }

    #[test]
    fn test_remove_drops_empty_buckets() {
        let mut g: SpatialGrid<u32> = SpatialGrid::new(10.0);
        let cells = vec![(0, 0)];
        g.insert(1, &cells);
        g.insert(2, &cells);
        g.remove(1, &cells);
        assert_eq!(g.bucket((0, 0)), Some(&[2u32][..]));
        g.remove(2, &cells);
        assert!(g.is_empty());
    }
}
