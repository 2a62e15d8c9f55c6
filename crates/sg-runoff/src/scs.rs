//! SCS (NRCS) Curve Number runoff, U.S. customary units.

use sg_core::{acres, depth_volume_acft, inches};

use crate::error::{RunoffError, RunoffResult};

/// Initial abstraction as a fraction of potential retention.
pub const INITIAL_ABSTRACTION_RATIO: f64 = 0.2;

/// Potential maximum retention `S = 1000 / CN - 10` (inches).
pub fn retention_in(cn: f64) -> RunoffResult<f64> {
    if !(cn.is_finite() && cn > 0.0 && cn <= 100.0) {
        return Err(RunoffError::InvalidCurveNumber { cn });
    }
    Ok(1000.0 / cn - 10.0)
}

/// Runoff depth `Q = (P - Ia)^2 / (P - Ia + S)` for `P > Ia`, else 0.
pub fn runoff_depth_in(precip_in: f64, cn: f64) -> RunoffResult<f64> {
    let s = retention_in(cn)?;
    let ia = INITIAL_ABSTRACTION_RATIO * s;
    if precip_in <= ia {
        return Ok(0.0);
    }
    if s == 0.0 {
        return Ok(precip_in);
    }
    Ok((precip_in - ia).powi(2) / (precip_in - ia + s))
}

/// Runoff volume over a segment, in acre-feet.
pub fn runoff_volume_acft(depth_in: f64, area_acres: f64) -> f64 {
    depth_volume_acft(inches(depth_in), acres(area_acres))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textbook_value() {
        // CN 80, P = 5 in: S = 2.5, Ia = 0.5, Q = 4.5^2 / 7.0
        let q = runoff_depth_in(5.0, 80.0).unwrap();
        assert!((q - 20.25 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn below_initial_abstraction_is_zero() {
        // CN 50: S = 10, Ia = 2
        assert_eq!(runoff_depth_in(2.0, 50.0).unwrap(), 0.0);
        assert!(runoff_depth_in(2.01, 50.0).unwrap() > 0.0);
    }

    #[test]
    fn impervious_passes_everything() {
        assert_eq!(runoff_depth_in(2.9, 100.0).unwrap(), 2.9);
    }

    #[test]
    fn invalid_curve_numbers() {
        for cn in [0.0, -5.0, 100.5, f64::NAN] {
            assert!(matches!(
                runoff_depth_in(1.0, cn),
                Err(RunoffError::InvalidCurveNumber { .. })
            ));
        }
    }

    #[test]
    fn one_foot_over_twelve_acres() {
        assert!((runoff_volume_acft(12.0, 12.0) - 12.0).abs() < 1e-9);
    }
}
