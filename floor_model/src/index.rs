//! Uniform-grid spatial index over 2D points.
//!
//! Used for window range queries on true object positions, on anchors and on
//! detectors. Each cell stores the points falling inside it together with
//! their payload.

use crate::geometry::{Point2, Rect};
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct PointIndex<T> {
    cell_size: f64,
    /// Maps cell key (ix, iy) to the points inside that cell.
    cells: HashMap<(i32, i32), Vec<(Point2, T)>>,
    len: usize,
}

impl<T> PointIndex<T> {
    pub fn new(cell_size: f64) -> Self {
        debug_assert!(cell_size > 0.0, "cell size must be positive");
        Self {
            cell_size,
            cells: HashMap::new(),
            len: 0,
        }
    }

    fn cell_of(&self, x: f64, y: f64) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    /// Insert a payload at position `p`.
    pub fn insert(&mut self, p: Point2, payload: T) {
        let key = self.cell_of(p.x, p.y);
        self.cells.entry(key).or_default().push((p, payload));
        self.len += 1;
    }

    pub fn insert_batch<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = (Point2, T)>,
    {
        for (p, payload) in items {
            self.insert(p, payload);
        }
    }

    /// Points of every cell overlapping the box `min..=max`.
    ///
    /// When the box spans more cells than are occupied, the occupied cells are
    /// scanned instead; callers filter by exact geometry either way. Cell order
    /// is unspecified in that case.
    fn candidates(&self, min: (f64, f64), max: (f64, f64)) -> Vec<&(Point2, T)> {
        let spans = |lo: f64, hi: f64| {
            (hi / self.cell_size).floor() - (lo / self.cell_size).floor() + 1.0
        };
        let boxed = spans(min.0, max.0) * spans(min.1, max.1);
        if !(boxed <= self.cells.len() as f64) {
            return self.cells.values().flatten().collect();
        }

        let (ix0, iy0) = self.cell_of(min.0, min.1);
        let (ix1, iy1) = self.cell_of(max.0, max.1);
        let mut found = Vec::new();
        for ix in ix0..=ix1 {
            for iy in iy0..=iy1 {
                if let Some(points) = self.cells.get(&(ix, iy)) {
                    found.extend(points);
                }
            }
        }
        found
    }

    /// All payloads whose point lies inside `window` (boundary inclusive).
    pub fn range_query(&self, window: &Rect) -> Vec<&T> {
        self.candidates((window.min.x, window.min.y), (window.max.x, window.max.y))
            .into_iter()
            .filter(|(p, _)| window.contains(p))
            .map(|(_, payload)| payload)
            .collect()
    }

    /// Payloads within Euclidean distance `radius` of `center`, with their distance.
    pub fn within_radius(&self, center: &Point2, radius: f64) -> Vec<(f64, &T)> {
        self.candidates(
            (center.x - radius, center.y - radius),
            (center.x + radius, center.y + radius),
        )
        .into_iter()
        .filter_map(|(p, payload)| {
            let d = nalgebra::distance(p, center);
            (d <= radius).then_some((d, payload))
        })
        .collect()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.len = 0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_query_spans_cells() {
        let mut index = PointIndex::new(10.0);
        index.insert_batch(vec![
            (Point2::new(1.0, 1.0), 0),
            (Point2::new(15.0, 3.0), 1),
            (Point2::new(35.0, 35.0), 2),
            (Point2::new(-4.0, 2.0), 3),
        ]);
        assert_eq!(index.len(), 4);

        let mut hits: Vec<i32> = index
            .range_query(&Rect::from_coords(-5.0, 0.0, 20.0, 5.0))
            .into_iter()
            .copied()
            .collect();
        hits.sort();
        assert_eq!(hits, vec![0, 1, 3]);
    }

    #[test]
    fn boundary_points_are_inside() {
        let mut index = PointIndex::new(5.0);
        index.insert(Point2::new(10.0, 10.0), "corner");
        let hits = index.range_query(&Rect::from_coords(0.0, 0.0, 10.0, 10.0));
        assert_eq!(hits, vec![&"corner"]);
    }

    #[test]
    fn within_radius_filters_by_distance() {
        let mut index = PointIndex::new(4.0);
        index.insert(Point2::new(0.0, 0.0), 'a');
        index.insert(Point2::new(3.0, 4.0), 'b');
        index.insert(Point2::new(6.0, 0.0), 'c');
        let mut near: Vec<char> = index
            .within_radius(&Point2::new(0.0, 0.0), 5.0)
            .into_iter()
            .map(|(_, c)| *c)
            .collect();
        near.sort();
        assert_eq!(near, vec!['a', 'b']);
    }

    #[test]
    fn clear_empties_index() {
        let mut index = PointIndex::new(1.0);
        index.insert(Point2::new(0.5, 0.5), ());
        index.clear();
        assert!(index.is_empty());
        assert!(index.range_query(&Rect::from_coords(0.0, 0.0, 1.0, 1.0)).is_empty());
    }

    #[test]
    fn unbounded_queries_scan_occupied_cells_only() {
        let mut index = PointIndex::new(1.0);
        index.insert(Point2::new(0.0, 0.0), 'a');
        index.insert(Point2::new(3.0e6, -2.0e6), 'b');

        let mut all: Vec<char> = index
            .within_radius(&Point2::new(1.0, 1.0), f64::INFINITY)
            .into_iter()
            .map(|(_, c)| *c)
            .collect();
        all.sort();
        assert_eq!(all, vec!['a', 'b']);

        let near = index.within_radius(&Point2::new(1.0, 1.0), 1.0e4);
        assert_eq!(near.len(), 1);
        assert_eq!(*near[0].1, 'a');

        let wide = Rect::from_coords(-1.0e12, -1.0e12, 1.0e12, 1.0e12);
        assert_eq!(index.range_query(&wide).len(), 2);
    }
}
