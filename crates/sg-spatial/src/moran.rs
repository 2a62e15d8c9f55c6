//! Global Moran's I.
//!
//! `I = (n / S0) * sum_ij w_ij z_i z_j / sum_i z_i^2` over mean-centered
//! values, with analytical moments under the normality and randomization
//! assumptions (Cliff & Ord).

use rand::seq::SliceRandom;
use sg_core::stats::normal_two_sided_p;
use sg_graph::SpatialWeights;
use tracing::debug;

use crate::config::SpatialConfig;
use crate::error::SpatialResult;
use crate::permutation::{folded_p, stream_rng};
use crate::{Outcome, center, check_values};

/// Stream id of the global permutation test (segment streams use `0..n`).
const GLOBAL_STREAM: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoranInterpretation {
    Clustered,
    Dispersed,
    Random,
}

impl MoranInterpretation {
    pub fn as_str(self) -> &'static str {
        match self {
            MoranInterpretation::Clustered => "clustered",
            MoranInterpretation::Dispersed => "dispersed",
            MoranInterpretation::Random => "random",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalMoran {
    pub i: f64,
    pub expected: f64,
    pub variance_normal: f64,
    pub z_normal: f64,
    pub p_normal: f64,
    /// Randomization moments need at least four segments.
    pub variance_randomization: Option<f64>,
    pub z_randomization: Option<f64>,
    pub p_randomization: Option<f64>,
    pub permutation_p: Option<f64>,
    pub interpretation: MoranInterpretation,
}

impl GlobalMoran {
    pub fn z_score(&self) -> f64 {
        self.z_normal
    }

    pub fn p_value(&self) -> f64 {
        self.p_normal
    }
}

fn statistic(w: &SpatialWeights, z: &[f64], s0: f64, sum_sq: f64) -> f64 {
    let cross: f64 = w.lag(z).iter().zip(z).map(|(l, zi)| l * zi).sum();
    (z.len() as f64 / s0) * cross / sum_sq
}

fn z_and_p(i: f64, expected: f64, variance: f64) -> (f64, f64) {
    if variance > 0.0 {
        let z = (i - expected) / variance.sqrt();
        (z, normal_two_sided_p(z))
    } else {
        (0.0, 1.0)
    }
}

pub fn global_moran(
    weights: &SpatialWeights,
    values: &[f64],
    config: &SpatialConfig,
) -> SpatialResult<Outcome<GlobalMoran>> {
    if let Some(reason) = check_values(values, weights.n())? {
        return Ok(Outcome::Undefined(reason));
    }

    let z = center(values);
    let n = z.len() as f64;
    let sum_sq: f64 = z.iter().map(|v| v * v).sum();
    let sum_4: f64 = z.iter().map(|v| v.powi(4)).sum();

    let s0 = weights.s0();
    let s1 = weights.s1();
    let s2 = weights.s2();

    let i = statistic(weights, &z, s0, sum_sq);
    let expected = -1.0 / (n - 1.0);
    let e2 = expected * expected;

    let variance_normal =
        (n * n * s1 - n * s2 + 3.0 * s0 * s0) / ((n * n - 1.0) * s0 * s0) - e2;
    let (z_normal, p_normal) = z_and_p(i, expected, variance_normal);

    let variance_randomization = (z.len() > 3).then(|| {
        let k = (sum_4 / n) / (sum_sq / n).powi(2);
        let a = n * ((n * n - 3.0 * n + 3.0) * s1 - n * s2 + 3.0 * s0 * s0);
        let b = k * ((n * n - n) * s1 - 2.0 * n * s2 + 6.0 * s0 * s0);
        (a - b) / ((n - 1.0) * (n - 2.0) * (n - 3.0) * s0 * s0) - e2
    });
    let rand_zp = variance_randomization.map(|v| z_and_p(i, expected, v));

    let permutation_p = config.global_permutation_test.then(|| {
        let perms = config.effective_permutations() as usize;
        let mut rng = stream_rng(config.seed, GLOBAL_STREAM);
        let mut shuffled = z.clone();
        let mut larger = 0usize;
        for _ in 0..perms {
            shuffled.shuffle(&mut rng);
            if statistic(weights, &shuffled, s0, sum_sq) >= i {
                larger += 1;
            }
        }
        folded_p(larger, perms)
    });

    let interpretation = if p_normal < config.alpha {
        if i > expected {
            MoranInterpretation::Clustered
        } else {
            MoranInterpretation::Dispersed
        }
    } else {
        MoranInterpretation::Random
    };

    debug!(i, expected, z = z_normal, p = p_normal, "global Moran's I");

    Ok(Outcome::Defined(GlobalMoran {
        i,
        expected,
        variance_normal,
        z_normal,
        p_normal,
        variance_randomization,
        z_randomization: rand_zp.map(|(z, _)| z),
        p_randomization: rand_zp.map(|(_, p)| p),
        permutation_p,
        interpretation,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_core::UndefinedReason;
    use sg_graph::{NeighborGraphBuilder, NeighborPolicy, Polygon, WeightTransform};

    fn strip(n: usize) -> SpatialWeights {
        let mut b = NeighborGraphBuilder::new(NeighborPolicy::default());
        for k in 0..n {
            let x = k as f64;
            b.add_segment(
                Polygon::new(vec![[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 1.0]]).unwrap(),
            );
        }
        SpatialWeights::from_graph(&b.build().unwrap(), WeightTransform::Binary)
    }

    #[test]
    fn hand_computed_strip() {
        // binary strip of 4, values 1..4: z = -1.5,-0.5,0.5,1.5
        // sum_ij w z_i z_j = 2*(0.75 - 0.25 + 0.75) = 2.5, sum z^2 = 5, S0 = 6
        let w = strip(4);
        let g = global_moran(&w, &[1.0, 2.0, 3.0, 4.0], &SpatialConfig::default()).unwrap();
        let g = g.defined().unwrap();
        assert!((g.i - (4.0 / 6.0) * 2.5 / 5.0).abs() < 1e-12);
        assert!((g.expected + 1.0 / 3.0).abs() < 1e-12);
        assert!(g.variance_normal > 0.0);
        assert!(g.variance_randomization.is_some());
    }

    #[test]
    fn alternating_values_are_negative() {
        let w = strip(8);
        let vals = [1.0, 9.0, 1.0, 9.0, 1.0, 9.0, 1.0, 9.0];
        let g = global_moran(&w, &vals, &SpatialConfig::default()).unwrap();
        let g = g.defined().unwrap();
        assert!(g.i < -0.9);
        assert_eq!(g.interpretation, MoranInterpretation::Dispersed);
    }

    #[test]
    fn three_segments_have_no_randomization_variance() {
        let w = strip(3);
        let g = global_moran(&w, &[1.0, 2.0, 5.0], &SpatialConfig::default()).unwrap();
        assert!(g.defined().unwrap().variance_randomization.is_none());
    }

    #[test]
    fn constant_attribute_undefined() {
        let w = strip(5);
        let g = global_moran(&w, &[2.0; 5], &SpatialConfig::default()).unwrap();
        assert_eq!(g.reason(), Some(UndefinedReason::ZeroVariance));
        assert_eq!(
            g.reason().unwrap().to_string(),
            "undefined due to zero variance"
        );
    }

    #[test]
    fn permutation_p_is_reproducible() {
        let w = strip(10);
        let vals: Vec<f64> = (0..10).map(|k| (k * k) as f64).collect();
        let cfg = SpatialConfig {
            global_permutation_test: true,
            permutations: 199,
            ..SpatialConfig::default()
        };
        let a = global_moran(&w, &vals, &cfg).unwrap();
        let b = global_moran(&w, &vals, &cfg).unwrap();
        let p = a.defined().unwrap().permutation_p.unwrap();
        assert_eq!(Some(p), b.defined().unwrap().permutation_p);
        assert!(p > 0.0 && p <= 0.5 + 1e-12);
    }
}
