//! sg-spatial: spatial autocorrelation statistics over a `NeighborGraph`.
//!
//! Provides:
//! - Global Moran's I with normality / randomization inference and an
//!   optional permutation pseudo p-value
//! - Local Moran's I (LISA) with conditional permutation or normal inference
//! - Getis-Ord Gi* hot / cold spot classification
//!
//! Degenerate inputs (fewer than three segments, a constant attribute) yield
//! `Outcome::Undefined` with a reason rather than NaN or zero.

pub mod config;
pub mod engine;
pub mod error;
pub mod getis;
pub mod lisa;
pub mod moran;
mod permutation;

pub use config::{LisaInference, SpatialConfig};
pub use engine::{SpatialReport, analyze};
pub use error::{SpatialError, SpatialResult};
pub use getis::{GiStar, HotspotClass, getis_ord_star};
pub use lisa::{LisaCluster, LisaQuadrant, LocalMoran, local_moran};
pub use moran::{GlobalMoran, MoranInterpretation, global_moran};

use sg_core::UndefinedReason;

/// Minimum number of segments for any spatial statistic.
pub const MIN_SEGMENTS: usize = 3;

/// A statistic, or the reason it could not be computed.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Defined(T),
    Undefined(UndefinedReason),
}

impl<T> Outcome<T> {
    pub fn defined(&self) -> Option<&T> {
        match self {
            Outcome::Defined(v) => Some(v),
            Outcome::Undefined(_) => None,
        }
    }

    pub fn reason(&self) -> Option<UndefinedReason> {
        match self {
            Outcome::Defined(_) => None,
            Outcome::Undefined(r) => Some(*r),
        }
    }
}

/// Shape and finiteness checks shared by every statistic. Degenerate but
/// well-formed input comes back as `Some(reason)`.
pub(crate) fn check_values(
    values: &[f64],
    segments: usize,
) -> SpatialResult<Option<UndefinedReason>> {
    if values.len() != segments {
        return Err(SpatialError::LengthMismatch {
            values: values.len(),
            segments,
        });
    }
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(SpatialError::NonFiniteValue {
            segment: sg_core::SegmentId::from_index(i as u32),
        });
    }
    Ok(sg_core::stats::check_defined(values, MIN_SEGMENTS).err())
}

/// Mean-centered values.
pub(crate) fn center(values: &[f64]) -> Vec<f64> {
    let mean = sg_core::stats::mean(values).unwrap_or(0.0);
    values.iter().map(|v| v - mean).collect()
}
