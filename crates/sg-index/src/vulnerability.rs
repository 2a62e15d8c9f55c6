//! Composite vulnerability index.
//!
//! Five physical factors are normalized to [0, 1], combined with configured
//! weights and scaled to a 0-10 score. Missing inputs fall back to fixed
//! defaults and every fallback is recorded on the segment.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use sg_core::WEIGHT_SUM_TOLERANCE;
use tracing::{debug, info, warn};

use crate::error::{IndexError, IndexResult};

pub const DEFAULT_SLOPE_CAP_PCT: f64 = 15.0;
pub const DEFAULT_DRAINAGE_CAP_FT: f64 = 1000.0;

/// Values used when an input is missing.
pub mod defaults {
    use super::SoilGroup;

    pub const SOIL_GROUP: SoilGroup = SoilGroup::C;
    pub const SLOPE_PCT: f64 = 0.0;
    pub const IMPERVIOUSNESS_PCT: f64 = 50.0;
    pub const FLOOD_ZONE: bool = false;
    /// Normalized proximity, i.e. halfway to the distance cap.
    pub const DRAINAGE_PROXIMITY: f64 = 0.5;
}

/// Hydrologic soil group. Dual classes (A/D, B/D, C/D) resolve to D.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SoilGroup {
    A,
    B,
    C,
    D,
}

impl SoilGroup {
    /// Normalized runoff-potential factor.
    pub fn factor(self) -> f64 {
        match self {
            SoilGroup::A => 0.0,
            SoilGroup::B => 0.33,
            SoilGroup::C => 0.67,
            SoilGroup::D => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SoilGroup::A => "A",
            SoilGroup::B => "B",
            SoilGroup::C => "C",
            SoilGroup::D => "D",
        }
    }
}

impl FromStr for SoilGroup {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(SoilGroup::A),
            "B" => Ok(SoilGroup::B),
            "C" => Ok(SoilGroup::C),
            "D" | "A/D" | "B/D" | "C/D" => Ok(SoilGroup::D),
            _ => Err(IndexError::InvalidParameter {
                what: "unknown hydrologic soil group",
            }),
        }
    }
}

impl fmt::Display for SoilGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VulnerabilityWeights {
    pub imperviousness: f64,
    pub slope: f64,
    pub soil: f64,
    pub flood_zone: f64,
    pub drainage_proximity: f64,
}

impl Default for VulnerabilityWeights {
    fn default() -> Self {
        Self {
            imperviousness: 0.25,
            slope: 0.15,
            soil: 0.20,
            flood_zone: 0.15,
            drainage_proximity: 0.25,
        }
    }
}

impl VulnerabilityWeights {
    fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("imperviousness", self.imperviousness),
            ("slope", self.slope),
            ("soil", self.soil),
            ("flood_zone", self.flood_zone),
            ("drainage_proximity", self.drainage_proximity),
        ]
    }

    pub fn sum(&self) -> f64 {
        self.named().iter().map(|(_, w)| w).sum()
    }

    pub fn validate(&self) -> IndexResult<()> {
        for (name, value) in self.named() {
            if !(value.is_finite() && value >= 0.0) {
                return Err(IndexError::InvalidWeight { name, value });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(IndexError::WeightSum { sum });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VulnerabilityConfig {
    pub weights: VulnerabilityWeights,
    /// Slope (percent) at and above which the slope factor saturates.
    pub slope_cap_pct: f64,
    /// Drainage distance (ft) at and above which proximity is zero.
    pub drainage_cap_ft: f64,
}

impl Default for VulnerabilityConfig {
    fn default() -> Self {
        Self {
            weights: VulnerabilityWeights::default(),
            slope_cap_pct: DEFAULT_SLOPE_CAP_PCT,
            drainage_cap_ft: DEFAULT_DRAINAGE_CAP_FT,
        }
    }
}

impl VulnerabilityConfig {
    pub fn validate(&self) -> IndexResult<()> {
        self.weights.validate()?;
        if !(self.slope_cap_pct.is_finite() && self.slope_cap_pct > 0.0) {
            return Err(IndexError::InvalidParameter {
                what: "slope cap must be positive",
            });
        }
        if !(self.drainage_cap_ft.is_finite() && self.drainage_cap_ft > 0.0) {
            return Err(IndexError::InvalidParameter {
                what: "drainage distance cap must be positive",
            });
        }
        Ok(())
    }
}

/// Raw per-segment inputs as extracted upstream. `None` (or a non-finite
/// number) means the value was not available.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawAttributes {
    pub imperviousness_pct: Option<f64>,
    pub slope_pct: Option<f64>,
    pub soil_group: Option<SoilGroup>,
    pub flood_zone: Option<bool>,
    pub drainage_distance_ft: Option<f64>,
}

/// Input that was replaced by its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultedInput {
    Imperviousness,
    Slope,
    SoilGroup,
    FloodZone,
    DrainageProximity,
}

impl DefaultedInput {
    pub fn as_str(self) -> &'static str {
        match self {
            DefaultedInput::Imperviousness => "imperviousness",
            DefaultedInput::Slope => "slope",
            DefaultedInput::SoilGroup => "soil_group",
            DefaultedInput::FloodZone => "flood_zone",
            DefaultedInput::DrainageProximity => "drainage_proximity",
        }
    }
}

/// Factors in [0, 1] before weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedFactors {
    pub imperviousness: f64,
    pub slope: f64,
    pub soil: f64,
    pub flood_zone: f64,
    pub drainage_proximity: f64,
}

impl NormalizedFactors {
    fn weighted_sum(&self, w: &VulnerabilityWeights) -> f64 {
        self.imperviousness * w.imperviousness
            + self.slope * w.slope
            + self.soil * w.soil
            + self.flood_zone * w.flood_zone
            + self.drainage_proximity * w.drainage_proximity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VulnerabilityClass {
    Low,
    Moderate,
    High,
}

impl VulnerabilityClass {
    pub fn from_score(score: f64) -> Self {
        if score < 3.0 {
            VulnerabilityClass::Low
        } else if score < 6.0 {
            VulnerabilityClass::Moderate
        } else {
            VulnerabilityClass::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VulnerabilityClass::Low => "Low",
            VulnerabilityClass::Moderate => "Moderate",
            VulnerabilityClass::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VulnerabilityScore {
    /// Composite score in [0, 10].
    pub score: f64,
    pub class: VulnerabilityClass,
    /// Soil group actually used (after defaulting).
    pub soil_group: SoilGroup,
    pub factors: NormalizedFactors,
    pub defaults_applied: Vec<DefaultedInput>,
}

fn present(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// Score a single segment. `config` is assumed valid.
pub fn score_segment(raw: &RawAttributes, config: &VulnerabilityConfig) -> VulnerabilityScore {
    let mut defaults_applied = Vec::new();

    let imperviousness_pct = present(raw.imperviousness_pct).unwrap_or_else(|| {
        defaults_applied.push(DefaultedInput::Imperviousness);
        defaults::IMPERVIOUSNESS_PCT
    });
    let slope_pct = present(raw.slope_pct).unwrap_or_else(|| {
        defaults_applied.push(DefaultedInput::Slope);
        defaults::SLOPE_PCT
    });
    let soil_group = raw.soil_group.unwrap_or_else(|| {
        defaults_applied.push(DefaultedInput::SoilGroup);
        defaults::SOIL_GROUP
    });
    let flood_zone = raw.flood_zone.unwrap_or_else(|| {
        defaults_applied.push(DefaultedInput::FloodZone);
        defaults::FLOOD_ZONE
    });
    let drainage_proximity = match present(raw.drainage_distance_ft) {
        Some(d) => 1.0 - d.clamp(0.0, config.drainage_cap_ft) / config.drainage_cap_ft,
        None => {
            defaults_applied.push(DefaultedInput::DrainageProximity);
            defaults::DRAINAGE_PROXIMITY
        }
    };

    let factors = NormalizedFactors {
        imperviousness: imperviousness_pct.clamp(0.0, 100.0) / 100.0,
        slope: slope_pct.clamp(0.0, config.slope_cap_pct) / config.slope_cap_pct,
        soil: soil_group.factor(),
        flood_zone: if flood_zone { 1.0 } else { 0.0 },
        drainage_proximity,
    };

    // Weights may sum to 1 +/- tolerance; keep the score inside its range
    let score = (10.0 * factors.weighted_sum(&config.weights)).clamp(0.0, 10.0);

    VulnerabilityScore {
        score,
        class: VulnerabilityClass::from_score(score),
        soil_group,
        factors,
        defaults_applied,
    }
}

/// Validate the configuration, then score every segment in order.
pub fn score_segments(
    raw: &[RawAttributes],
    config: &VulnerabilityConfig,
) -> IndexResult<Vec<VulnerabilityScore>> {
    config.validate()?;

    let scores: Vec<VulnerabilityScore> =
        raw.par_iter().map(|r| score_segment(r, config)).collect();

    let mut defaulted_segments = 0usize;
    for (i, s) in scores.iter().enumerate() {
        if !s.defaults_applied.is_empty() {
            defaulted_segments += 1;
            let inputs: Vec<&str> = s.defaults_applied.iter().map(|d| d.as_str()).collect();
            debug!(segment = i, defaults = ?inputs, "vulnerability inputs defaulted");
        }
    }
    if defaulted_segments > 0 {
        warn!(
            segments = defaulted_segments,
            total = scores.len(),
            "segments used default vulnerability inputs"
        );
    }
    info!(segments = scores.len(), "vulnerability scored");

    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(imp: f64, slope: f64, soil: SoilGroup, flood: bool, dist: f64) -> RawAttributes {
        RawAttributes {
            imperviousness_pct: Some(imp),
            slope_pct: Some(slope),
            soil_group: Some(soil),
            flood_zone: Some(flood),
            drainage_distance_ft: Some(dist),
        }
    }

    #[test]
    fn extremes_hit_both_ends() {
        let cfg = VulnerabilityConfig::default();
        let worst = score_segment(&full(100.0, 30.0, SoilGroup::D, true, 0.0), &cfg);
        assert!((worst.score - 10.0).abs() < 1e-9);
        assert_eq!(worst.class, VulnerabilityClass::High);

        let best = score_segment(&full(0.0, 0.0, SoilGroup::A, false, 5000.0), &cfg);
        assert!(best.score.abs() < 1e-12);
        assert_eq!(best.class, VulnerabilityClass::Low);
        assert!(best.defaults_applied.is_empty());
    }

    #[test]
    fn mid_values_weighted() {
        let cfg = VulnerabilityConfig::default();
        // imp 0.4, slope 0.5, soil B 0.33, flood 0, proximity 0.75
        let s = score_segment(&full(40.0, 7.5, SoilGroup::B, false, 250.0), &cfg);
        let expected = 10.0 * (0.4 * 0.25 + 0.5 * 0.15 + 0.33 * 0.20 + 0.75 * 0.25);
        assert!((s.score - expected).abs() < 1e-12);
        assert_eq!(s.class, VulnerabilityClass::Moderate);
    }

    #[test]
    fn missing_inputs_use_defaults() {
        let cfg = VulnerabilityConfig::default();
        let s = score_segment(&RawAttributes::default(), &cfg);
        assert_eq!(s.defaults_applied.len(), 5);
        assert_eq!(s.soil_group, SoilGroup::C);
        let expected = 10.0 * (0.5 * 0.25 + 0.0 * 0.15 + 0.67 * 0.20 + 0.0 + 0.5 * 0.25);
        assert!((s.score - expected).abs() < 1e-12);

        let nan = RawAttributes {
            slope_pct: Some(f64::NAN),
            ..full(10.0, 0.0, SoilGroup::A, false, 0.0)
        };
        assert_eq!(
            score_segment(&nan, &cfg).defaults_applied,
            vec![DefaultedInput::Slope]
        );
    }

    #[test]
    fn class_boundaries() {
        assert_eq!(VulnerabilityClass::from_score(2.999), VulnerabilityClass::Low);
        assert_eq!(VulnerabilityClass::from_score(3.0), VulnerabilityClass::Moderate);
        assert_eq!(VulnerabilityClass::from_score(6.0), VulnerabilityClass::High);
    }

    #[test]
    fn dual_soil_groups_resolve_to_d() {
        for s in ["A/D", "b/d", " C/D "] {
            assert_eq!(s.parse::<SoilGroup>().unwrap(), SoilGroup::D);
        }
        assert_eq!("b".parse::<SoilGroup>().unwrap(), SoilGroup::B);
        assert!("E".parse::<SoilGroup>().is_err());
    }

    #[test]
    fn weights_must_sum_to_one() {
        let mut cfg = VulnerabilityConfig::default();
        assert!(cfg.validate().is_ok());
        cfg.weights.slope = 0.2;
        assert!(matches!(
            score_segments(&[RawAttributes::default()], &cfg),
            Err(IndexError::WeightSum { .. })
        ));
        cfg.weights.slope = 0.15;
        cfg.weights.soil = -0.1;
        cfg.weights.flood_zone = 0.45;
        assert!(matches!(
            cfg.validate(),
            Err(IndexError::InvalidWeight { name: "soil", .. })
        ));
    }
}
