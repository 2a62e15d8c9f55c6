//! Descriptive statistics and reference distributions shared by the
//! alignment and spatial crates.
//!
//! Every helper returns `None` instead of NaN when the statistic is not
//! defined for its input (empty slice, zero variance, too few samples).

use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use crate::numeric::Real;

/// Spread below this fraction of the largest magnitude counts as constant.
pub const ZERO_SPREAD_RTOL: Real = 1e-12;

/// True when `variance` is rounding noise relative to the scale of `values`.
/// The threshold scales with the data, so a series in small units keeps its
/// variance.
pub fn negligible_variance(variance: Real, values: &[Real]) -> bool {
    let scale = values.iter().fold(0.0, |m: Real, v| m.max(v.abs()));
    variance <= (ZERO_SPREAD_RTOL * scale).powi(2)
}

pub fn mean(values: &[Real]) -> Option<Real> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<Real>() / values.len() as Real)
}

/// Median with the even-length convention of averaging the two middle values.
pub fn median(values: &[Real]) -> Option<Real> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(0.5 * (sorted[mid - 1] + sorted[mid]))
    } else {
        Some(sorted[mid])
    }
}

/// Population variance (ddof = 0).
pub fn population_variance(values: &[Real]) -> Option<Real> {
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<Real>() / values.len() as Real)
}

/// Population standard deviation, `None` when the series is constant.
pub fn population_std(values: &[Real]) -> Option<Real> {
    let var = population_variance(values)?;
    if negligible_variance(var, values) {
        None
    } else {
        Some(var.sqrt())
    }
}

pub fn max(values: &[Real]) -> Option<Real> {
    values.iter().copied().reduce(Real::max)
}

pub fn min(values: &[Real]) -> Option<Real> {
    values.iter().copied().reduce(Real::min)
}

/// 1-based ranks with ties resolved to their average rank.
pub fn average_ranks(values: &[Real]) -> Vec<Real> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]).then(a.cmp(&b)));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end share ranks start+1..=end
        let avg = (start + 1 + end) as Real / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg;
        }
        start = end;
    }
    ranks
}

/// Pearson product-moment coefficient. `None` for n < 2 or zero variance.
pub fn pearson(x: &[Real], y: &[Real]) -> Option<Real> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let mut sxy: Real = 0.0;
    let mut sxx: Real = 0.0;
    let mut syy: Real = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let n = x.len() as Real;
    if negligible_variance(sxx / n, x) || negligible_variance(syy / n, y) {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Two-sided p-value of a standard normal z-score.
pub fn normal_two_sided_p(z: Real) -> Real {
    match Normal::new(0.0, 1.0) {
        Ok(dist) => (2.0 * dist.sf(z.abs())).min(1.0),
        Err(_) => 1.0,
    }
}

/// Two-sided p-value for a correlation coefficient `r` over `n` samples
/// using the t distribution with n-2 degrees of freedom.
pub fn correlation_p_value(r: Real, n: usize) -> Option<Real> {
    if n < 3 {
        return None;
    }
    let df = (n - 2) as Real;
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        return Some(0.0);
    }
    let t = r * (df / denom).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * dist.sf(t.abs())).min(1.0))
}

/// Why a statistic could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndefinedReason {
    /// Fewer samples than the statistic needs.
    TooFewSamples { n: usize, required: usize },
    /// The input series is constant.
    ZeroVariance,
}

impl UndefinedReason {
    /// Stable reason code for tables and reports.
    pub fn code(self) -> &'static str {
        match self {
            UndefinedReason::TooFewSamples { .. } => "too_few_samples",
            UndefinedReason::ZeroVariance => "zero_variance",
        }
    }
}

impl std::fmt::Display for UndefinedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UndefinedReason::TooFewSamples { n, required } => {
                write!(f, "undefined: {n} samples, at least {required} required")
            }
            UndefinedReason::ZeroVariance => write!(f, "undefined due to zero variance"),
        }
    }
}

/// Check the two common preconditions of every correlation-like statistic.
pub fn check_defined(values: &[Real], required: usize) -> Result<(), UndefinedReason> {
    if values.len() < required {
        return Err(UndefinedReason::TooFewSamples {
            n: values.len(),
            required,
        });
    }
    if population_std(values).is_none() {
        return Err(UndefinedReason::ZeroVariance);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_reasons() {
        assert_eq!(
            check_defined(&[1.0, 2.0], 3),
            Err(UndefinedReason::TooFewSamples { n: 2, required: 3 })
        );
        let err = check_defined(&[4.0; 5], 3).unwrap_err();
        assert_eq!(err.to_string(), "undefined due to zero variance");
        assert_eq!(err.code(), "zero_variance");
        assert!(check_defined(&[1.0, 2.0, 4.0], 3).is_ok());
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn constant_series_has_no_std() {
        assert_eq!(population_std(&[5.0, 5.0, 5.0]), None);
        let s = population_std(&[1.0, 3.0]).unwrap();
        assert!((s - 1.0).abs() < 1e-12);
    }

    #[test]
    fn small_unit_series_keep_their_variance() {
        let tiny: Vec<Real> = (1..=6).map(|k| k as Real * 1e-7).collect();
        assert!(check_defined(&tiny, 3).is_ok());
        let s = population_std(&tiny).unwrap();
        let unscaled = population_std(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert!((s / unscaled - 1e-7).abs() < 1e-18);

        let y: Vec<Real> = tiny.iter().map(|v| 3.0 * v).collect();
        assert!((pearson(&tiny, &y).unwrap() - 1.0).abs() < 1e-12);

        assert_eq!(check_defined(&[0.1; 5], 3), Err(UndefinedReason::ZeroVariance));
        assert_eq!(check_defined(&[0.0; 4], 3), Err(UndefinedReason::ZeroVariance));
        assert_eq!(population_std(&[1e9; 3]), None);
    }

    #[test]
    fn ranks_average_ties() {
        let r = average_ranks(&[10.0, 20.0, 20.0, 5.0]);
        assert_eq!(r, vec![2.0, 3.5, 3.5, 1.0]);
    }

    #[test]
    fn pearson_perfect_and_degenerate() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]), None);
    }

    #[test]
    fn normal_p_reference_values() {
        assert!((normal_two_sided_p(0.0) - 1.0).abs() < 1e-9);
        assert!((normal_two_sided_p(1.96) - 0.05).abs() < 1e-3);
        assert!((normal_two_sided_p(-2.58) - 0.00988).abs() < 1e-3);
    }

    #[test]
    fn correlation_p_matches_t_table() {
        // r = 0.5, n = 20 -> t = 2.449, df = 18, p ~= 0.0248
        let p = correlation_p_value(0.5, 20).unwrap();
        assert!((p - 0.0248).abs() < 1e-3, "p = {p}");
        assert_eq!(correlation_p_value(1.0, 10), Some(0.0));
        assert_eq!(correlation_p_value(0.3, 2), None);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn pearson_is_bounded(values in prop::collection::vec((-1e3_f64..1e3, -1e3_f64..1e3), 3..40)) {
            let (x, y): (Vec<f64>, Vec<f64>) = values.into_iter().unzip();
            if let Some(r) = pearson(&x, &y) {
                prop_assert!((-1.0..=1.0).contains(&r));
            }
        }

        #[test]
        fn median_lies_within_range(values in prop::collection::vec(-1e6_f64..1e6, 1..50)) {
            let m = median(&values).unwrap();
            prop_assert!(m >= min(&values).unwrap() && m <= max(&values).unwrap());
        }
    }
}
