//! Curve Number derivation.
//!
//! `CN_current` is the TR-55 composite of open-space pervious cover (good
//! condition) and impervious cover. Infrastructure lowers it along a
//! saturating curve `R_max * d / (d + K)` down to a floor.

use sg_index::SoilGroup;

use crate::error::{RunoffError, RunoffResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveNumberParams {
    /// Pervious CN for soil groups A, B, C, D.
    pub pervious: [f64; 4],
    pub impervious: f64,
    /// Lowest CN any adjustment may reach.
    pub floor: f64,
    /// Asymptotic CN reduction at very high density.
    pub max_reduction: f64,
    /// Density (sq ft/acre) at which half of `max_reduction` is reached.
    pub half_saturation_density: f64,
}

impl Default for CurveNumberParams {
    fn default() -> Self {
        Self {
            pervious: [39.0, 61.0, 74.0, 80.0],
            impervious: 98.0,
            floor: 30.0,
            max_reduction: 20.0,
            half_saturation_density: 10_000.0,
        }
    }
}

/// Adjusted Curve Number with a flag for segments held at the floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GsiAdjustment {
    pub cn: f64,
    pub at_floor: bool,
}

impl CurveNumberParams {
    pub fn validate(&self) -> RunoffResult<()> {
        let cn_ok = |cn: f64| cn.is_finite() && cn > 0.0 && cn <= 100.0;
        if !self.pervious.iter().all(|&cn| cn_ok(cn)) || !cn_ok(self.impervious) {
            return Err(RunoffError::InvalidParameter {
                what: "table curve numbers must be in (0, 100]",
            });
        }
        if !cn_ok(self.floor) {
            return Err(RunoffError::InvalidParameter {
                what: "curve number floor must be in (0, 100]",
            });
        }
        if !(self.max_reduction.is_finite() && self.max_reduction > 0.0) {
            return Err(RunoffError::InvalidParameter {
                what: "maximum curve number reduction must be positive",
            });
        }
        if !(self.half_saturation_density.is_finite() && self.half_saturation_density > 0.0) {
            return Err(RunoffError::InvalidParameter {
                what: "half-saturation density must be positive",
            });
        }
        Ok(())
    }

    pub fn pervious_cn(&self, soil: SoilGroup) -> f64 {
        let slot = match soil {
            SoilGroup::A => 0,
            SoilGroup::B => 1,
            SoilGroup::C => 2,
            SoilGroup::D => 3,
        };
        self.pervious[slot]
    }

    /// Area-weighted blend of pervious and impervious CN.
    pub fn composite_cn(&self, soil: SoilGroup, imperviousness_pct: f64) -> f64 {
        let f = imperviousness_pct.clamp(0.0, 100.0) / 100.0;
        self.pervious_cn(soil) * (1.0 - f) + self.impervious * f
    }

    /// `max(floor, CN - R_max * d / (d + K))`, never above `cn_current`.
    pub fn adjusted_cn(&self, cn_current: f64, density_sqft_per_acre: f64) -> GsiAdjustment {
        let d = density_sqft_per_acre.max(0.0);
        let reduction = self.max_reduction * d / (d + self.half_saturation_density);
        let raw = cn_current - reduction;
        if raw <= self.floor {
            GsiAdjustment {
                cn: self.floor.min(cn_current),
                at_floor: true,
            }
        } else {
            GsiAdjustment {
                cn: raw,
                at_floor: false,
            }
        }
    }
}
