//! Getis-Ord Gi* hot spot statistic.

use rayon::prelude::*;
use sg_core::stats::{mean, normal_two_sided_p, population_std};
use sg_graph::SpatialWeights;

use crate::error::SpatialResult;
use crate::{Outcome, check_values};

/// Weight spread `(n*S1_i - W_i^2) / (n - 1)` below this is treated as zero.
const SPREAD_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotspotClass {
    HotSpot99,
    HotSpot95,
    HotSpot90,
    ColdSpot99,
    ColdSpot95,
    ColdSpot90,
    NotSignificant,
}

impl HotspotClass {
    pub fn from_z(z: f64) -> Self {
        if z > 2.58 {
            HotspotClass::HotSpot99
        } else if z > 1.96 {
            HotspotClass::HotSpot95
        } else if z > 1.65 {
            HotspotClass::HotSpot90
        } else if z < -2.58 {
            HotspotClass::ColdSpot99
        } else if z < -1.96 {
            HotspotClass::ColdSpot95
        } else if z < -1.65 {
            HotspotClass::ColdSpot90
        } else {
            HotspotClass::NotSignificant
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HotspotClass::HotSpot99 => "Hot Spot (99%)",
            HotspotClass::HotSpot95 => "Hot Spot (95%)",
            HotspotClass::HotSpot90 => "Hot Spot (90%)",
            HotspotClass::ColdSpot99 => "Cold Spot (99%)",
            HotspotClass::ColdSpot95 => "Cold Spot (95%)",
            HotspotClass::ColdSpot90 => "Cold Spot (90%)",
            HotspotClass::NotSignificant => "Not Significant",
        }
    }

    pub fn is_hot(self) -> bool {
        matches!(
            self,
            HotspotClass::HotSpot99 | HotspotClass::HotSpot95 | HotspotClass::HotSpot90
        )
    }

    pub fn is_cold(self) -> bool {
        matches!(
            self,
            HotspotClass::ColdSpot99 | HotspotClass::ColdSpot95 | HotspotClass::ColdSpot90
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GiStar {
    /// `None` when the segment's denominator vanishes (e.g. every segment
    /// is in its neighborhood).
    pub z: Option<f64>,
    pub p_value: Option<f64>,
    pub class: HotspotClass,
}

/// Gi* z-scores. `star` must be self-inclusive weights
/// (`SpatialWeights::star`).
pub fn getis_ord_star(
    star: &SpatialWeights,
    values: &[f64],
) -> SpatialResult<Outcome<Vec<GiStar>>> {
    if let Some(reason) = check_values(values, star.n())? {
        return Ok(Outcome::Undefined(reason));
    }

    let n = values.len() as f64;
    let x_bar = mean(values).unwrap_or(0.0);
    let s = population_std(values).unwrap_or(0.0);

    let out = (0..values.len())
        .into_par_iter()
        .map(|i| {
            let wi = star.row_sum(i);
            let s1i = star.row_sum_sq(i);
            let weighted: f64 = star.row(i).map(|(j, w)| w * values[j]).sum();
            let spread = (n * s1i - wi * wi) / (n - 1.0);
            if spread <= SPREAD_EPS || s <= 0.0 {
                return GiStar {
                    z: None,
                    p_value: None,
                    class: HotspotClass::NotSignificant,
                };
            }
            let z = (weighted - x_bar * wi) / (s * spread.sqrt());
            GiStar {
                z: Some(z),
                p_value: Some(normal_two_sided_p(z)),
                class: HotspotClass::from_z(z),
            }
        })
        .collect();

    Ok(Outcome::Defined(out))
}
