//! Spatial weights derived from a `NeighborGraph`.
//!
//! The graph keeps raw edge weights; statistics work on a transformed copy.
//! `star` rows include the segment itself with raw weight 1 before the
//! transform is applied (the Getis-Ord Gi* convention).

use crate::graph::NeighborGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightTransform {
    /// Every edge weighs 1.
    Binary,
    /// Raw weights divided by their row sum.
    #[default]
    RowStandardized,
}

/// Compact row-major weights matrix (`w_ij`, rows sorted by `j`).
#[derive(Debug, Clone)]
pub struct SpatialWeights {
    offsets: Vec<usize>,
    targets: Vec<usize>,
    values: Vec<f64>,
    col_sums: Vec<f64>,
}

impl SpatialWeights {
    pub fn from_graph(graph: &NeighborGraph, transform: WeightTransform) -> Self {
        Self::build(graph, transform, false)
    }

    /// Self-inclusive weights (segment is its own neighbor with raw weight 1).
    pub fn star(graph: &NeighborGraph, transform: WeightTransform) -> Self {
        Self::build(graph, transform, true)
    }

    fn build(graph: &NeighborGraph, transform: WeightTransform, include_self: bool) -> Self {
        let n = graph.len();
        let mut offsets = Vec::with_capacity(n + 1);
        let mut targets = Vec::new();
        let mut values = Vec::new();
        offsets.push(0);

        for id in graph.segment_ids() {
            let i = id.pos();
            let mut row: Vec<(usize, f64)> = graph
                .neighbors(id)
                .iter()
                .map(|e| {
                    let raw = match transform {
                        WeightTransform::Binary => 1.0,
                        WeightTransform::RowStandardized => e.weight,
                    };
                    (e.neighbor.pos(), raw)
                })
                .collect();
            if include_self {
                row.push((i, 1.0));
                row.sort_by_key(|&(j, _)| j);
            }
            if transform == WeightTransform::RowStandardized {
                let sum: f64 = row.iter().map(|&(_, w)| w).sum();
                if sum > 0.0 {
                    for (_, w) in &mut row {
                        *w /= sum;
                    }
                }
            }
            for (j, w) in row {
                targets.push(j);
                values.push(w);
            }
            offsets.push(targets.len());
        }

        let mut col_sums = vec![0.0; n];
        for (&j, &w) in targets.iter().zip(&values) {
            col_sums[j] += w;
        }

        Self {
            offsets,
            targets,
            values,
            col_sums,
        }
    }

    /// Number of rows.
    pub fn n(&self) -> usize {
        self.offsets.len() - 1
    }

    /// `(j, w_ij)` pairs of row `i`.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.offsets[i]..self.offsets[i + 1];
        self.targets[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    pub fn cardinality(&self, i: usize) -> usize {
        self.offsets[i + 1] - self.offsets[i]
    }

    /// `W_i = sum_j w_ij`
    pub fn row_sum(&self, i: usize) -> f64 {
        self.row(i).map(|(_, w)| w).sum()
    }

    /// `sum_j w_ij^2`
    pub fn row_sum_sq(&self, i: usize) -> f64 {
        self.row(i).map(|(_, w)| w * w).sum()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        let range = self.offsets[i]..self.offsets[i + 1];
        match self.targets[range.clone()].binary_search(&j) {
            Ok(pos) => self.values[range.start + pos],
            Err(_) => 0.0,
        }
    }

    /// Spatial lag `sum_j w_ij x_j` for every row.
    pub fn lag(&self, x: &[f64]) -> Vec<f64> {
        (0..self.n())
            .map(|i| self.row(i).map(|(j, w)| w * x[j]).sum())
            .collect()
    }

    /// `S0 = sum_i sum_j w_ij`
    pub fn s0(&self) -> f64 {
        self.values.iter().sum()
    }

    /// `S1 = 1/2 sum_i sum_j (w_ij + w_ji)^2`
    pub fn s1(&self) -> f64 {
        let mut total = 0.0;
        for i in 0..self.n() {
            for (j, w) in self.row(i) {
                let back = self.get(j, i);
                // pairs present in both directions are visited twice, one-sided pairs once
                total += if back > 0.0 {
                    0.5 * (w + back).powi(2)
                } else {
                    w * w
                };
            }
        }
        total
    }

    /// `S2 = sum_i (w_i. + w_.i)^2`
    pub fn s2(&self) -> f64 {
        (0..self.n())
            .map(|i| (self.row_sum(i) + self.col_sums[i]).powi(2))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{NeighborGraphBuilder, NeighborPolicy};
    use crate::geometry::Polygon;

    fn strip(n: usize) -> NeighborGraph {
        let mut b = NeighborGraphBuilder::new(NeighborPolicy::default());
        for k in 0..n {
            let x = k as f64;
            b.add_segment(
                Polygon::new(vec![[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 1.0]]).unwrap(),
            );
        }
        b.build().unwrap()
    }

    #[test]
    fn row_standardized_rows_sum_to_one() {
        let w = SpatialWeights::from_graph(&strip(4), WeightTransform::RowStandardized);
        for i in 0..4 {
            assert!((w.row_sum(i) - 1.0).abs() < 1e-12);
        }
        assert!((w.s0() - 4.0).abs() < 1e-12);
        // ends have one neighbor, middles split 1/2 - 1/2
        assert_eq!(w.get(0, 1), 1.0);
        assert_eq!(w.get(1, 0), 0.5);
    }

    #[test]
    fn binary_moments_on_symmetric_strip() {
        let w = SpatialWeights::from_graph(&strip(3), WeightTransform::Binary);
        // edges 0-1, 1-2 in both directions
        assert_eq!(w.s0(), 4.0);
        // S1 = 1/2 * 4 * (1+1)^2 = 8
        assert_eq!(w.s1(), 8.0);
        // degrees 1,2,1 -> (2)^2 + (4)^2 + (2)^2 = 24
        assert_eq!(w.s2(), 24.0);
    }

    #[test]
    fn star_rows_include_self() {
        let w = SpatialWeights::star(&strip(3), WeightTransform::Binary);
        assert_eq!(w.cardinality(1), 3);
        assert_eq!(w.get(1, 1), 1.0);
        let rs = SpatialWeights::star(&strip(3), WeightTransform::RowStandardized);
        assert!((rs.get(0, 0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn lag_averages_neighbors() {
        let w = SpatialWeights::from_graph(&strip(3), WeightTransform::RowStandardized);
        assert_eq!(w.lag(&[1.0, 2.0, 3.0]), vec![2.0, 2.0, 2.0]);
    }
}
