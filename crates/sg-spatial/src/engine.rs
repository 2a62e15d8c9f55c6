//! Runs the three statistics in order over one attribute.

use std::collections::BTreeMap;

use sg_graph::{NeighborGraph, SpatialWeights};
use tracing::{info, warn};

use crate::config::SpatialConfig;
use crate::error::{SpatialError, SpatialResult};
use crate::getis::{GiStar, getis_ord_star};
use crate::lisa::{LocalMoran, local_moran};
use crate::moran::{GlobalMoran, global_moran};
use crate::Outcome;

#[derive(Debug, Clone, PartialEq)]
pub struct SpatialReport {
    pub global: Outcome<GlobalMoran>,
    pub local: Outcome<Vec<LocalMoran>>,
    pub hotspots: Outcome<Vec<GiStar>>,
    /// Permutation count after the cap.
    pub permutations: u32,
    /// Segments whose neighbors came from the k-nearest fallback.
    pub fallback_segments: usize,
}

impl SpatialReport {
    /// Segment count per LISA cluster label.
    pub fn cluster_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        if let Some(locals) = self.local.defined() {
            for l in locals {
                *counts.entry(l.cluster.label()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Segment count per hot spot class label.
    pub fn hotspot_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        if let Some(gi) = self.hotspots.defined() {
            for g in gi {
                *counts.entry(g.class.label()).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// Global Moran's I, then LISA, then Gi* on `values`.
///
/// Gi* uses `hotspot_graph` when given (e.g. a distance band), otherwise
/// the main graph.
pub fn analyze(
    graph: &NeighborGraph,
    hotspot_graph: Option<&NeighborGraph>,
    values: &[f64],
    config: &SpatialConfig,
) -> SpatialResult<SpatialReport> {
    config.validate()?;
    if let Some(h) = hotspot_graph.filter(|h| h.len() != graph.len()) {
        return Err(SpatialError::LengthMismatch {
            values: h.len(),
            segments: graph.len(),
        });
    }

    let permutations = config.effective_permutations();
    if permutations < config.permutations {
        warn!(
            requested = config.permutations,
            cap = config.permutation_cap,
            "permutation count clamped"
        );
    }

    let weights = SpatialWeights::from_graph(graph, config.transform);
    let global = global_moran(&weights, values, config)?;
    if let Outcome::Undefined(reason) = &global {
        warn!(%reason, "spatial statistics undefined");
    }
    let local = local_moran(&weights, values, config)?;

    let star = SpatialWeights::star(hotspot_graph.unwrap_or(graph), config.transform);
    let hotspots = getis_ord_star(&star, values)?;

    let fallback_segments = graph.fallback_count();
    info!(
        segments = graph.len(),
        fallback_segments,
        permutations,
        "spatial autocorrelation computed"
    );

    Ok(SpatialReport {
        global,
        local,
        hotspots,
        permutations,
        fallback_segments,
    })
}
