//! Design storms.

use crate::error::{RunoffError, RunoffResult};

/// 24-hour design storm: label plus precipitation depth.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignStorm {
    pub label: String,
    pub depth_in: f64,
}

impl DesignStorm {
    pub fn new(label: impl Into<String>, depth_in: f64) -> Self {
        Self {
            label: label.into(),
            depth_in,
        }
    }

    pub fn validate(&self) -> RunoffResult<()> {
        if self.label.trim().is_empty() || !(self.depth_in.is_finite() && self.depth_in > 0.0) {
            return Err(RunoffError::InvalidStorm {
                label: self.label.clone(),
                depth_in: self.depth_in,
            });
        }
        Ok(())
    }
}

/// Return-period depths (inches) for the Puget Sound lowlands.
pub fn default_storms() -> Vec<DesignStorm> {
    [
        ("2-year", 2.2),
        ("5-year", 2.6),
        ("10-year", 2.9),
        ("25-year", 3.4),
        ("50-year", 3.8),
        ("100-year", 4.3),
    ]
    .into_iter()
    .map(|(label, depth)| DesignStorm::new(label, depth))
    .collect()
}
