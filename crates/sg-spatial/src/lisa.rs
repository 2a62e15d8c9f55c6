//! Local Moran's I (LISA).

use rayon::prelude::*;
use sg_core::stats::{normal_two_sided_p, population_std};
use sg_graph::SpatialWeights;

use crate::config::{LisaInference, SpatialConfig};
use crate::error::SpatialResult;
use crate::permutation::{folded_p, sample_excluding, stream_rng};
use crate::{Outcome, center, check_values};

/// Position of a segment on the Moran scatterplot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LisaQuadrant {
    HighHigh,
    LowHigh,
    LowLow,
    HighLow,
}

impl LisaQuadrant {
    /// Zero counts as low on both axes.
    pub fn from_signs(z: f64, lag: f64) -> Self {
        match (z > 0.0, lag > 0.0) {
            (true, true) => LisaQuadrant::HighHigh,
            (false, true) => LisaQuadrant::LowHigh,
            (false, false) => LisaQuadrant::LowLow,
            (true, false) => LisaQuadrant::HighLow,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LisaQuadrant::HighHigh => "HH",
            LisaQuadrant::LowHigh => "LH",
            LisaQuadrant::LowLow => "LL",
            LisaQuadrant::HighLow => "HL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LisaCluster {
    Significant(LisaQuadrant),
    NotSignificant,
}

impl LisaCluster {
    pub fn label(self) -> &'static str {
        match self {
            LisaCluster::Significant(LisaQuadrant::HighHigh) => "HH (High-High)",
            LisaCluster::Significant(LisaQuadrant::LowHigh) => "LH (Low-High)",
            LisaCluster::Significant(LisaQuadrant::LowLow) => "LL (Low-Low)",
            LisaCluster::Significant(LisaQuadrant::HighLow) => "HL (High-Low)",
            LisaCluster::NotSignificant => "Not Significant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalMoran {
    pub local_i: f64,
    /// Centered (and optionally standardized) value.
    pub z: f64,
    pub lag: f64,
    pub quadrant: LisaQuadrant,
    pub p_value: f64,
    pub cluster: LisaCluster,
}

pub fn local_moran(
    weights: &SpatialWeights,
    values: &[f64],
    config: &SpatialConfig,
) -> SpatialResult<Outcome<Vec<LocalMoran>>> {
    if let Some(reason) = check_values(values, weights.n())? {
        return Ok(Outcome::Undefined(reason));
    }

    let mut z = center(values);
    if config.standardize {
        // check_values already rejected constant input
        let sd = population_std(values).unwrap_or(1.0);
        z.iter_mut().for_each(|v| *v /= sd);
    }
    let lag = weights.lag(&z);
    let n = z.len();

    let m2 = z.iter().map(|v| v * v).sum::<f64>() / n as f64;
    let m4 = z.iter().map(|v| v.powi(4)).sum::<f64>() / n as f64;
    let b2 = m4 / (m2 * m2);
    let perms = config.effective_permutations() as usize;

    let locals = (0..n)
        .into_par_iter()
        .map(|i| {
            let local_i = z[i] * lag[i];
            let p_value = match config.lisa_inference {
                LisaInference::Permutation => {
                    permutation_p(weights, &z, i, local_i, perms, config.seed)
                }
                LisaInference::Normal => normal_p(weights, i, local_i / m2, n, b2),
            };
            let quadrant = LisaQuadrant::from_signs(z[i], lag[i]);
            let cluster = if p_value < config.alpha {
                LisaCluster::Significant(quadrant)
            } else {
                LisaCluster::NotSignificant
            };
            LocalMoran {
                local_i,
                z: z[i],
                lag: lag[i],
                quadrant,
                p_value,
                cluster,
            }
        })
        .collect();

    Ok(Outcome::Defined(locals))
}

/// Conditional randomization: hold `z_i`, redraw its neighbors from the
/// other segments and keep the row's weights.
fn permutation_p(
    weights: &SpatialWeights,
    z: &[f64],
    i: usize,
    observed: f64,
    perms: usize,
    seed: u64,
) -> f64 {
    let row: Vec<f64> = weights.row(i).map(|(_, w)| w).collect();
    let mut rng = stream_rng(seed, i as u64);
    let mut larger = 0usize;
    for _ in 0..perms {
        let drawn = sample_excluding(&mut rng, z.len(), i, row.len());
        let lag: f64 = row.iter().zip(&drawn).map(|(w, &j)| w * z[j]).sum();
        if z[i] * lag >= observed {
            larger += 1;
        }
    }
    folded_p(larger, perms)
}

/// Two-sided normal p-value from the moments under randomization
/// (Anselin 1995). `scaled_i` is `I_i / m2`.
fn normal_p(weights: &SpatialWeights, i: usize, scaled_i: f64, n: usize, b2: f64) -> f64 {
    let n = n as f64;
    let wi = weights.row_sum(i);
    let wi2 = weights.row_sum_sq(i);
    let expected = -wi / (n - 1.0);
    let variance = wi2 * (n - b2) / (n - 1.0)
        + (wi * wi - wi2) * (2.0 * b2 - n) / ((n - 1.0) * (n - 2.0))
        - wi * wi / ((n - 1.0) * (n - 1.0));
    if variance > 0.0 {
        normal_two_sided_p((scaled_i - expected) / variance.sqrt())
    } else {
        1.0
    }
}
