//! Spatial statistics configuration.

use sg_graph::{NeighborPolicy, WeightTransform};

use crate::error::{SpatialError, SpatialResult};

pub const DEFAULT_PERMUTATIONS: u32 = 999;
pub const DEFAULT_PERMUTATION_CAP: u32 = 99_999;
pub const DEFAULT_SEED: u64 = 12_345;

/// How LISA p-values are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LisaInference {
    /// Conditional randomization: neighbors redrawn from all other segments.
    #[default]
    Permutation,
    /// Analytical moments under randomization (normal approximation).
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialConfig {
    pub transform: WeightTransform,
    pub alpha: f64,
    pub permutations: u32,
    /// Upper bound on `permutations`; larger requests are clamped.
    pub permutation_cap: u32,
    pub seed: u64,
    pub lisa_inference: LisaInference,
    /// Divide centered values by the population standard deviation.
    pub standardize: bool,
    /// Also compute a permutation pseudo p-value for the global statistic.
    pub global_permutation_test: bool,
    /// Separate neighbor policy for Gi*; the main graph is reused when `None`.
    pub hotspot_neighbors: Option<NeighborPolicy>,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            transform: WeightTransform::RowStandardized,
            alpha: 0.05,
            permutations: DEFAULT_PERMUTATIONS,
            permutation_cap: DEFAULT_PERMUTATION_CAP,
            seed: DEFAULT_SEED,
            lisa_inference: LisaInference::Permutation,
            standardize: true,
            global_permutation_test: false,
            hotspot_neighbors: None,
        }
    }
}

impl SpatialConfig {
    pub fn validate(&self) -> SpatialResult<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(SpatialError::InvalidParameter {
                what: "significance level must be in (0, 1)",
            });
        }
        if self.permutation_cap == 0 {
            return Err(SpatialError::InvalidParameter {
                what: "permutation cap must be at least 1",
            });
        }
        let needs_permutations =
            self.lisa_inference == LisaInference::Permutation || self.global_permutation_test;
        if needs_permutations && self.permutations == 0 {
            return Err(SpatialError::InvalidParameter {
                what: "permutation count must be at least 1",
            });
        }
        Ok(())
    }

    /// Permutation count after applying the cap.
    pub fn effective_permutations(&self) -> u32 {
        self.permutations.min(self.permutation_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = SpatialConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.effective_permutations(), 999);
    }

    #[test]
    fn cap_clamps_permutations() {
        let cfg = SpatialConfig {
            permutations: 1_000_000,
            permutation_cap: 5_000,
            ..SpatialConfig::default()
        };
        assert_eq!(cfg.effective_permutations(), 5_000);
    }

    #[test]
    fn zero_permutations_only_ok_for_normal_inference() {
        let mut cfg = SpatialConfig {
            permutations: 0,
            ..SpatialConfig::default()
        };
        assert!(cfg.validate().is_err());
        cfg.lisa_inference = LisaInference::Normal;
        assert!(cfg.validate().is_ok());
        cfg.alpha = 0.0;
        assert!(cfg.validate().is_err());
    }
}
