//! Vulnerability / density correlation (Pearson and Spearman).

use sg_core::UndefinedReason;
use sg_core::stats::{self, average_ranks, correlation_p_value, pearson};

/// Minimum sample size for a correlation with a p-value.
pub const MIN_SAMPLES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    Negligible,
    Weak,
    Moderate,
    Strong,
}

impl Strength {
    pub fn from_coefficient(r: f64) -> Self {
        let a = r.abs();
        if a < 0.1 {
            Strength::Negligible
        } else if a < 0.3 {
            Strength::Weak
        } else if a < 0.5 {
            Strength::Moderate
        } else {
            Strength::Strong
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strength::Negligible => "negligible",
            Strength::Weak => "weak",
            Strength::Moderate => "moderate",
            Strength::Strong => "strong",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Positive,
    Negative,
    None,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Positive => "positive",
            Direction::Negative => "negative",
            Direction::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationStats {
    pub coefficient: f64,
    pub p_value: f64,
    pub strength: Strength,
    pub direction: Direction,
    pub significant: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correlation {
    Defined(CorrelationStats),
    Undefined(UndefinedReason),
}

impl Correlation {
    pub fn stats(&self) -> Option<&CorrelationStats> {
        match self {
            Correlation::Defined(s) => Some(s),
            Correlation::Undefined(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationPair {
    pub pearson: Correlation,
    pub spearman: Correlation,
}

fn describe(r: f64, n: usize, alpha: f64) -> Correlation {
    let p_value = correlation_p_value(r, n).unwrap_or(1.0);
    let direction = if r > 0.0 {
        Direction::Positive
    } else if r < 0.0 {
        Direction::Negative
    } else {
        Direction::None
    };
    Correlation::Defined(CorrelationStats {
        coefficient: r,
        p_value,
        strength: Strength::from_coefficient(r),
        direction,
        significant: p_value < alpha,
    })
}

/// Pearson and Spearman correlation of `x` and `y` (equal lengths).
pub fn correlate(x: &[f64], y: &[f64], alpha: f64) -> CorrelationPair {
    let undefined = stats::check_defined(x, MIN_SAMPLES)
        .and_then(|_| stats::check_defined(y, MIN_SAMPLES))
        .err();
    if let Some(reason) = undefined {
        return CorrelationPair {
            pearson: Correlation::Undefined(reason),
            spearman: Correlation::Undefined(reason),
        };
    }

    let n = x.len();
    let pearson_c = match pearson(x, y) {
        Some(r) => describe(r, n, alpha),
        None => Correlation::Undefined(UndefinedReason::ZeroVariance),
    };
    let spearman_c = match pearson(&average_ranks(x), &average_ranks(y)) {
        Some(r) => describe(r, n, alpha),
        None => Correlation::Undefined(UndefinedReason::ZeroVariance),
    };

    CorrelationPair {
        pearson: pearson_c,
        spearman: spearman_c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_monotone_relationship() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 4.0, 9.0, 16.0, 25.0];
        let pair = correlate(&x, &y, 0.05);
        let s = pair.spearman.stats().unwrap();
        assert!((s.coefficient - 1.0).abs() < 1e-12);
        assert!(s.p_value < 1e-10);
        let p = pair.pearson.stats().unwrap();
        assert!(p.coefficient > 0.95 && p.coefficient < 1.0);
        assert_eq!(p.strength, Strength::Strong);
        assert_eq!(p.direction, Direction::Positive);
        assert!(p.significant);
    }

    #[test]
    fn constant_series_is_undefined() {
        let pair = correlate(&[1.0, 2.0, 3.0], &[0.0, 0.0, 0.0], 0.05);
        assert_eq!(
            pair.pearson,
            Correlation::Undefined(UndefinedReason::ZeroVariance)
        );
        assert_eq!(
            pair.spearman,
            Correlation::Undefined(UndefinedReason::ZeroVariance)
        );
    }

    #[test]
    fn too_few_samples() {
        let pair = correlate(&[1.0, 2.0], &[2.0, 1.0], 0.05);
        assert!(matches!(
            pair.pearson,
            Correlation::Undefined(UndefinedReason::TooFewSamples { n: 2, .. })
        ));
    }

    #[test]
    fn strength_bands() {
        assert_eq!(Strength::from_coefficient(0.05), Strength::Negligible);
        assert_eq!(Strength::from_coefficient(-0.2), Strength::Weak);
        assert_eq!(Strength::from_coefficient(0.3), Strength::Moderate);
        assert_eq!(Strength::from_coefficient(-0.5), Strength::Strong);
    }

    #[test]
    fn weak_negative_not_significant() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [3.0, 1.0, 4.0, 1.0, 5.0, 0.0];
        let p = *correlate(&x, &y, 0.05).pearson.stats().unwrap();
        assert_eq!(p.direction, Direction::Negative);
        assert!(!p.significant);
    }
}
