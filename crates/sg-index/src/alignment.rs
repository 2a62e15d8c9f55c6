//! Vulnerability / infrastructure alignment: quadrants, gap index and the
//! correlation summary.
//!
//! Quadrant labels are relative to the sample: they split at the medians of
//! the current collection, so the same segment can change label when the
//! collection changes.

use sg_core::stats::{max, mean, median};
use tracing::info;

use crate::correlation::{CorrelationPair, correlate};
use crate::error::{IndexError, IndexResult};

pub const DEFAULT_ALPHA: f64 = 0.05;
/// Gap values above this count as severe in the summary.
pub const HIGH_GAP_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quadrant {
    /// Q1, well aligned.
    HighVulnHighDensity,
    /// Q2, critical gap.
    HighVulnLowDensity,
    /// Q3, overserved.
    LowVulnHighDensity,
    /// Q4, appropriately low.
    LowVulnLowDensity,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::HighVulnHighDensity,
        Quadrant::HighVulnLowDensity,
        Quadrant::LowVulnHighDensity,
        Quadrant::LowVulnLowDensity,
    ];

    /// Values equal to a median fall on the low side.
    pub fn classify(vulnerability: f64, density: f64, median_v: f64, median_d: f64) -> Self {
        match (vulnerability > median_v, density > median_d) {
            (true, true) => Quadrant::HighVulnHighDensity,
            (true, false) => Quadrant::HighVulnLowDensity,
            (false, true) => Quadrant::LowVulnHighDensity,
            (false, false) => Quadrant::LowVulnLowDensity,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Quadrant::HighVulnHighDensity => "HIGH_VULN_HIGH_DENSITY",
            Quadrant::HighVulnLowDensity => "HIGH_VULN_LOW_DENSITY",
            Quadrant::LowVulnHighDensity => "LOW_VULN_HIGH_DENSITY",
            Quadrant::LowVulnLowDensity => "LOW_VULN_LOW_DENSITY",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Quadrant::HighVulnHighDensity => "well aligned",
            Quadrant::HighVulnLowDensity => "critical gap",
            Quadrant::LowVulnHighDensity => "overserved",
            Quadrant::LowVulnLowDensity => "appropriately low",
        }
    }

    fn slot(self) -> usize {
        match self {
            Quadrant::HighVulnHighDensity => 0,
            Quadrant::HighVulnLowDensity => 1,
            Quadrant::LowVulnHighDensity => 2,
            Quadrant::LowVulnLowDensity => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuadrantSummary {
    pub median_vulnerability: f64,
    pub median_density: f64,
    pub labels: Vec<Quadrant>,
    counts: [usize; 4],
}

impl QuadrantSummary {
    pub fn count(&self, q: Quadrant) -> usize {
        self.counts[q.slot()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GapSummary {
    /// Largest observed density (the normalizer, before the zero guard).
    pub max_density: f64,
    pub values: Vec<f64>,
    pub mean_gap: f64,
    pub high_gap_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentConfig {
    /// Significance level for the correlation tests.
    pub alpha: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl AlignmentConfig {
    pub fn validate(&self) -> IndexResult<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(IndexError::InvalidParameter {
                what: "significance level must be in (0, 1)",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentReport {
    pub quadrants: QuadrantSummary,
    pub gap: GapSummary,
    pub correlation: CorrelationPair,
}

fn check_lengths(vulnerability: &[f64], density: &[f64]) -> IndexResult<()> {
    if vulnerability.is_empty() {
        return Err(IndexError::Empty);
    }
    if vulnerability.len() != density.len() {
        return Err(IndexError::LengthMismatch {
            what: "vulnerability vs density",
            left: vulnerability.len(),
            right: density.len(),
        });
    }
    Ok(())
}

pub fn classify_quadrants(vulnerability: &[f64], density: &[f64]) -> IndexResult<QuadrantSummary> {
    check_lengths(vulnerability, density)?;
    let median_v = median(vulnerability).ok_or(IndexError::Empty)?;
    let median_d = median(density).ok_or(IndexError::Empty)?;

    let labels: Vec<Quadrant> = vulnerability
        .iter()
        .zip(density)
        .map(|(&v, &d)| Quadrant::classify(v, d, median_v, median_d))
        .collect();
    let mut counts = [0usize; 4];
    for q in &labels {
        counts[q.slot()] += 1;
    }

    Ok(QuadrantSummary {
        median_vulnerability: median_v,
        median_density: median_d,
        labels,
        counts,
    })
}

/// `max(0, v - d / max_d * 10)`, with `max_d` treated as 1 when it is zero.
pub fn gap_indices(vulnerability: &[f64], density: &[f64]) -> IndexResult<GapSummary> {
    check_lengths(vulnerability, density)?;
    let max_density = max(density).ok_or(IndexError::Empty)?;
    let normalizer = if max_density > 0.0 { max_density } else { 1.0 };

    let values: Vec<f64> = vulnerability
        .iter()
        .zip(density)
        .map(|(&v, &d)| (v - d / normalizer * 10.0).max(0.0))
        .collect();

    Ok(GapSummary {
        max_density,
        mean_gap: mean(&values).unwrap_or(0.0),
        high_gap_count: values.iter().filter(|&&g| g > HIGH_GAP_THRESHOLD).count(),
        values,
    })
}

pub fn analyze_alignment(
    vulnerability: &[f64],
    density: &[f64],
    config: &AlignmentConfig,
) -> IndexResult<AlignmentReport> {
    config.validate()?;
    let quadrants = classify_quadrants(vulnerability, density)?;
    let gap = gap_indices(vulnerability, density)?;
    let correlation = correlate(vulnerability, density, config.alpha);

    info!(
        median_vulnerability = quadrants.median_vulnerability,
        median_density = quadrants.median_density,
        critical_gaps = quadrants.count(Quadrant::HighVulnLowDensity),
        "alignment classified"
    );

    Ok(AlignmentReport {
        quadrants,
        gap,
        correlation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::Correlation;

    #[test]
    fn ties_fall_low() {
        // medians: v = 5, d = 100
        let v = [2.0, 5.0, 8.0];
        let d = [100.0, 300.0, 0.0];
        let q = classify_quadrants(&v, &d).unwrap();
        assert_eq!(
            q.labels,
            vec![
                Quadrant::LowVulnLowDensity,
                Quadrant::LowVulnHighDensity,
                Quadrant::HighVulnLowDensity,
            ]
        );
        assert_eq!(q.count(Quadrant::HighVulnHighDensity), 0);
    }

    #[test]
    fn gap_index_scaling() {
        let g = gap_indices(&[8.0, 8.0, 2.0], &[0.0, 400.0, 200.0]).unwrap();
        assert_eq!(g.max_density, 400.0);
        assert_eq!(g.values, vec![8.0, 0.0, 0.0]);
        assert_eq!(g.high_gap_count, 1);
    }

    #[test]
    fn zero_infrastructure_gap_equals_vulnerability() {
        let g = gap_indices(&[3.0, 7.5], &[0.0, 0.0]).unwrap();
        assert_eq!(g.values, vec![3.0, 7.5]);
        assert_eq!(g.max_density, 0.0);
    }

    #[test]
    fn report_marks_constant_density_undefined() {
        let r = analyze_alignment(&[1.0, 4.0, 9.0], &[0.0; 3], &AlignmentConfig::default())
            .unwrap();
        assert!(matches!(r.correlation.pearson, Correlation::Undefined(_)));
        assert_eq!(r.quadrants.count(Quadrant::LowVulnLowDensity), 2);
        assert_eq!(r.quadrants.count(Quadrant::HighVulnLowDensity), 1);
    }

    #[test]
    fn rejects_mismatched_input_and_bad_alpha() {
        assert!(matches!(
            classify_quadrants(&[1.0], &[1.0, 2.0]),
            Err(IndexError::LengthMismatch { .. })
        ));
        assert!(matches!(gap_indices(&[], &[]), Err(IndexError::Empty)));
        let cfg = AlignmentConfig { alpha: 1.5 };
        assert!(analyze_alignment(&[1.0], &[1.0], &cfg).is_err());
    }
}
