//! sg-runoff: SCS Curve Number runoff under infrastructure scenarios.
//!
//! Provides:
//! - TR-55 composite Curve Numbers and the infrastructure-density adjustment
//! - SCS runoff depth and volume per design storm
//! - BASELINE / REDISTRIBUTE / GAP_INVESTMENT / COMBINED allocation scenarios
//!   with reductions relative to the baseline
//!
//! # Example
//!
//! ```
//! use sg_runoff::scs::runoff_depth_in;
//!
//! // CN 100 turns every inch of rain into runoff
//! assert_eq!(runoff_depth_in(3.4, 100.0).unwrap(), 3.4);
//! assert_eq!(runoff_depth_in(0.5, 60.0).unwrap(), 0.0);
//! ```

pub mod curve_number;
pub mod error;
pub mod scenario;
pub mod scs;
pub mod storm;

pub use curve_number::{CurveNumberParams, GsiAdjustment};
pub use error::{RunoffError, RunoffResult};
pub use scenario::{
    NotApplicable, Plan, RunoffConfig, RunoffReport, RunoffSegment, Scenario, ScenarioOutcome,
    SegmentRunoff, StormResult, run_scenarios,
};
pub use storm::{DesignStorm, default_storms};
