//! Allocation scenarios and their runoff.
//!
//! Each scenario is a transform of the per-segment infrastructure density
//! applied before the Curve Number adjustment. A scenario may fall back to
//! any plan it is allowed to use (REDISTRIBUTE may keep the measured
//! allocation, COMBINED may drop either step); per storm the plan with the
//! least total volume is chosen, so
//! `COMBINED >= max(REDISTRIBUTE, GAP_INVESTMENT) >= 0` in reduction.

use rayon::prelude::*;
use sg_core::SegmentId;
use tracing::{debug, info, warn};

use crate::curve_number::{CurveNumberParams, GsiAdjustment};
use crate::error::{RunoffError, RunoffResult};
use crate::scs::{runoff_depth_in, runoff_volume_acft};
use crate::storm::{DesignStorm, default_storms};

pub const DEFAULT_DENSITY_CEILING: f64 = 1_500.0;
pub const DEFAULT_INVESTMENT_BUDGET_SQFT: f64 = 100_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scenario {
    Baseline,
    Redistribute,
    GapInvestment,
    Combined,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Baseline,
        Scenario::Redistribute,
        Scenario::GapInvestment,
        Scenario::Combined,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Scenario::Baseline => "BASELINE",
            Scenario::Redistribute => "REDISTRIBUTE",
            Scenario::GapInvestment => "GAP_INVESTMENT",
            Scenario::Combined => "COMBINED",
        }
    }

    /// Plans the scenario may use, preferred plan first.
    fn plans(self) -> &'static [Plan] {
        match self {
            Scenario::Baseline => &[Plan::Baseline],
            Scenario::Redistribute => &[Plan::Proportional, Plan::Baseline],
            Scenario::GapInvestment => &[Plan::GapInvestment, Plan::Baseline],
            Scenario::Combined => &[
                Plan::ProportionalThenGap,
                Plan::GapInvestment,
                Plan::Proportional,
                Plan::Baseline,
            ],
        }
    }
}

/// Density allocation actually used for a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plan {
    /// Measured densities.
    Baseline,
    /// Existing footprint reallocated proportional to gap index.
    Proportional,
    /// Measured densities plus the new budget, greedy by gap.
    GapInvestment,
    /// Proportional reallocation, then the new budget.
    ProportionalThenGap,
}

impl Plan {
    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Baseline => "baseline",
            Plan::Proportional => "proportional",
            Plan::GapInvestment => "gap_investment",
            Plan::ProportionalThenGap => "proportional_then_gap",
        }
    }
}

/// Why a scenario's preferred plan could not be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotApplicable {
    /// Total existing infrastructure is zero.
    NoInfrastructure,
    /// Every gap index is zero.
    NoGap,
    /// Investment budget is zero.
    NoBudget,
}

impl NotApplicable {
    pub fn code(self) -> &'static str {
        match self {
            NotApplicable::NoInfrastructure => "no_infrastructure",
            NotApplicable::NoGap => "no_gap",
            NotApplicable::NoBudget => "no_budget",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunoffConfig {
    pub storms: Vec<DesignStorm>,
    pub curve_number: CurveNumberParams,
    /// New footprint (sq ft) for GAP_INVESTMENT.
    pub investment_budget_sqft: f64,
    /// Density no investment may push a segment above.
    pub density_ceiling: f64,
}

impl Default for RunoffConfig {
    fn default() -> Self {
        Self {
            storms: default_storms(),
            curve_number: CurveNumberParams::default(),
            investment_budget_sqft: DEFAULT_INVESTMENT_BUDGET_SQFT,
            density_ceiling: DEFAULT_DENSITY_CEILING,
        }
    }
}

impl RunoffConfig {
    pub fn validate(&self) -> RunoffResult<()> {
        if self.storms.is_empty() {
            return Err(RunoffError::NoStorms);
        }
        for storm in &self.storms {
            storm.validate()?;
        }
        self.curve_number.validate()?;
        if !(self.investment_budget_sqft.is_finite() && self.investment_budget_sqft >= 0.0) {
            return Err(RunoffError::InvalidParameter {
                what: "investment budget must be non-negative",
            });
        }
        if !(self.density_ceiling.is_finite() && self.density_ceiling > 0.0) {
            return Err(RunoffError::InvalidParameter {
                what: "density ceiling must be positive",
            });
        }
        Ok(())
    }
}

/// Per-segment inputs to the runoff model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunoffSegment {
    pub area_acres: f64,
    pub cn_current: f64,
    pub density_sqft_per_acre: f64,
    pub gap_index: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentRunoff {
    pub density_sqft_per_acre: f64,
    pub cn: f64,
    pub depth_in: f64,
    pub volume_acft: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub scenario: Scenario,
    pub plan: Plan,
    /// Set when the scenario's preferred plan could not be built.
    pub not_applicable: Option<NotApplicable>,
    pub segments: Vec<SegmentRunoff>,
    pub total_volume_acft: f64,
    /// Reduction relative to BASELINE.
    pub reduction_acft: f64,
    pub reduction_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StormResult {
    pub storm: DesignStorm,
    /// Total volume with every segment at `CN_current`.
    pub no_infrastructure_volume_acft: f64,
    /// Volume the measured infrastructure already removes.
    pub existing_benefit_acft: f64,
    /// One entry per scenario, in `Scenario::ALL` order.
    pub scenarios: Vec<ScenarioOutcome>,
}

impl StormResult {
    pub fn scenario(&self, scenario: Scenario) -> Option<&ScenarioOutcome> {
        self.scenarios.iter().find(|s| s.scenario == scenario)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunoffReport {
    pub cn_current: Vec<f64>,
    /// Baseline Curve Number after the infrastructure adjustment.
    pub cn_with_gsi: Vec<GsiAdjustment>,
    pub floor_segments: usize,
    pub storms: Vec<StormResult>,
}

fn validate_segments(segments: &[RunoffSegment]) -> RunoffResult<()> {
    for (i, s) in segments.iter().enumerate() {
        let segment = SegmentId::from_index(i as u32);
        if !(s.area_acres.is_finite() && s.area_acres > 0.0) {
            return Err(RunoffError::InvalidArea {
                segment,
                acres: s.area_acres,
            });
        }
        if !(s.cn_current.is_finite() && s.cn_current > 0.0 && s.cn_current <= 100.0) {
            return Err(RunoffError::InvalidCurveNumber { cn: s.cn_current });
        }
        for (what, value) in [("density", s.density_sqft_per_acre), ("gap index", s.gap_index)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(RunoffError::InvalidSegmentValue {
                    segment,
                    what,
                    value,
                });
            }
        }
    }
    Ok(())
}

/// Existing footprint reallocated proportional to gap index.
fn proportional(segments: &[RunoffSegment]) -> Result<Vec<f64>, NotApplicable> {
    let total_sqft: f64 = segments
        .iter()
        .map(|s| s.density_sqft_per_acre * s.area_acres)
        .sum();
    let total_gap: f64 = segments.iter().map(|s| s.gap_index).sum();
    if total_sqft <= 0.0 {
        return Err(NotApplicable::NoInfrastructure);
    }
    if total_gap <= 0.0 {
        return Err(NotApplicable::NoGap);
    }
    Ok(segments
        .iter()
        .map(|s| total_sqft * (s.gap_index / total_gap) / s.area_acres)
        .collect())
}

/// Greedy top-up by descending (baseline) gap index, ties by segment
/// order, each segment raised at most to `ceiling`.
fn gap_investment(
    segments: &[RunoffSegment],
    start: &[f64],
    budget_sqft: f64,
    ceiling: f64,
) -> Result<Vec<f64>, NotApplicable> {
    if budget_sqft <= 0.0 {
        return Err(NotApplicable::NoBudget);
    }
    let mut order: Vec<usize> = (0..segments.len())
        .filter(|&i| segments[i].gap_index > 0.0)
        .collect();
    if order.is_empty() {
        return Err(NotApplicable::NoGap);
    }
    order.sort_by(|&a, &b| {
        segments[b]
            .gap_index
            .total_cmp(&segments[a].gap_index)
            .then(a.cmp(&b))
    });

    let mut density = start.to_vec();
    let mut remaining = budget_sqft;
    for i in order {
        if remaining <= 0.0 {
            break;
        }
        let area = segments[i].area_acres;
        let capacity = (ceiling - density[i]).max(0.0) * area;
        let added = capacity.min(remaining);
        density[i] += added / area;
        remaining -= added;
    }
    Ok(density)
}

struct Evaluated {
    segments: Vec<SegmentRunoff>,
    total: f64,
}

fn evaluate(
    segments: &[RunoffSegment],
    density: &[f64],
    params: &CurveNumberParams,
    precip_in: f64,
) -> RunoffResult<Evaluated> {
    let rows = segments
        .par_iter()
        .zip(density.par_iter())
        .map(|(s, &d)| {
            let cn = params.adjusted_cn(s.cn_current, d).cn;
            let depth_in = runoff_depth_in(precip_in, cn)?;
            Ok(SegmentRunoff {
                density_sqft_per_acre: d,
                cn,
                depth_in,
                volume_acft: runoff_volume_acft(depth_in, s.area_acres),
            })
        })
        .collect::<RunoffResult<Vec<_>>>()?;
    let total = rows.iter().map(|r| r.volume_acft).sum();
    Ok(Evaluated {
        segments: rows,
        total,
    })
}

/// Density vectors for each plan; `Err` holds why a plan is unavailable.
struct Plans {
    baseline: Vec<f64>,
    proportional: Result<Vec<f64>, NotApplicable>,
    gap: Result<Vec<f64>, NotApplicable>,
    proportional_then_gap: Result<Vec<f64>, NotApplicable>,
}

impl Plans {
    fn build(segments: &[RunoffSegment], config: &RunoffConfig) -> Self {
        let baseline: Vec<f64> = segments.iter().map(|s| s.density_sqft_per_acre).collect();
        let proportional = proportional(segments);
        let invest = |start: &[f64]| {
            gap_investment(
                segments,
                start,
                config.investment_budget_sqft,
                config.density_ceiling,
            )
        };
        let gap = invest(&baseline);
        let proportional_then_gap = proportional.as_ref().map_err(|r| *r).and_then(|p| invest(p));
        Self {
            baseline,
            proportional,
            gap,
            proportional_then_gap,
        }
    }

    fn density(&self, plan: Plan) -> Result<&[f64], NotApplicable> {
        let slot = match plan {
            Plan::Baseline => return Ok(&self.baseline),
            Plan::Proportional => &self.proportional,
            Plan::GapInvestment => &self.gap,
            Plan::ProportionalThenGap => &self.proportional_then_gap,
        };
        slot.as_deref().map_err(|r| *r)
    }
}

/// Curve Numbers and per-storm runoff for every scenario.
pub fn run_scenarios(
    segments: &[RunoffSegment],
    config: &RunoffConfig,
) -> RunoffResult<RunoffReport> {
    config.validate()?;
    validate_segments(segments)?;
    let params = &config.curve_number;

    let cn_current: Vec<f64> = segments.iter().map(|s| s.cn_current).collect();
    let cn_with_gsi: Vec<GsiAdjustment> = segments
        .iter()
        .map(|s| params.adjusted_cn(s.cn_current, s.density_sqft_per_acre))
        .collect();
    let floor_segments = cn_with_gsi.iter().filter(|a| a.at_floor).count();
    if floor_segments > 0 {
        warn!(segments = floor_segments, "curve numbers held at the floor");
    }

    let plans = Plans::build(segments, config);

    let mut storms = Vec::with_capacity(config.storms.len());
    for storm in &config.storms {
        let no_infra: f64 = segments
            .iter()
            .map(|s| {
                runoff_depth_in(storm.depth_in, s.cn_current)
                    .map(|q| runoff_volume_acft(q, s.area_acres))
            })
            .sum::<RunoffResult<f64>>()?;

        // Each distinct plan is evaluated once per storm
        let mut cache: Vec<(Plan, Evaluated)> = Vec::new();
        let mut scenarios = Vec::with_capacity(Scenario::ALL.len());
        let mut baseline_total = 0.0;

        for scenario in Scenario::ALL {
            let mut best: Option<(Plan, usize)> = None;
            let mut not_applicable = None;
            for &plan in scenario.plans() {
                let density = match plans.density(plan) {
                    Ok(d) => d,
                    Err(reason) => {
                        not_applicable.get_or_insert(reason);
                        continue;
                    }
                };
                let idx = match cache.iter().position(|(p, _)| *p == plan) {
                    Some(idx) => idx,
                    None => {
                        cache.push((plan, evaluate(segments, density, params, storm.depth_in)?));
                        cache.len() - 1
                    }
                };
                let better = best.is_none_or(|(_, b)| cache[idx].1.total < cache[b].1.total);
                if better {
                    best = Some((plan, idx));
                }
            }
            // Baseline is always available, so every scenario has a plan
            let Some((plan, idx)) = best else {
                continue;
            };
            let chosen = &cache[idx].1;
            if scenario == Scenario::Baseline {
                baseline_total = chosen.total;
            }
            let reduction_acft = baseline_total - chosen.total;
            let reduction_pct = if baseline_total > 0.0 {
                reduction_acft / baseline_total * 100.0
            } else {
                0.0
            };
            debug!(
                storm = %storm.label,
                scenario = scenario.as_str(),
                plan = plan.as_str(),
                reduction_acft,
                "scenario evaluated"
            );
            scenarios.push(ScenarioOutcome {
                scenario,
                plan,
                not_applicable,
                segments: chosen.segments.clone(),
                total_volume_acft: chosen.total,
                reduction_acft,
                reduction_pct,
            });
        }

        info!(
            storm = %storm.label,
            depth_in = storm.depth_in,
            baseline_acft = baseline_total,
            "storm modeled"
        );
        storms.push(StormResult {
            storm: storm.clone(),
            no_infrastructure_volume_acft: no_infra,
            existing_benefit_acft: no_infra - baseline_total,
            scenarios,
        });
    }

    Ok(RunoffReport {
        cn_current,
        cn_with_gsi,
        floor_segments,
        storms,
    })
}
