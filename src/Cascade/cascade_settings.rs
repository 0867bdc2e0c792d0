//! # Cascade Settings Module
//!
//! Numerical settings shared by the ideal-cut search, the budget-fitting loop and the
//! off-design assay iteration. Every iterative procedure of the crate reads its cap from here.
use crate::cascade_errors::{CascadeError, CascadeResult};
use serde::{Deserialize, Serialize};

/// Tolerances and iteration caps of a cascade design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignSettings {
    /// |α - β| target of the ideal-cut search and assay-change target of `compute_assay`
    pub precision: f64,
    /// fractional machine count below which a stage is not rounded up
    pub machine_tolerance: f64,
    pub max_cut_iterations: usize,
    pub max_scaling_iterations: usize,
    pub max_assay_iterations: usize,
    /// bound on each of the enriching and stripping stage walks
    pub max_stages: usize,
    /// cut splitting every stage flow in the design flow balance
    pub cascade_cut: f64,
}

impl Default for DesignSettings {
    fn default() -> Self {
        Self {
            precision: 1e-12,
            machine_tolerance: 1e-11,
            max_cut_iterations: 100,
            max_scaling_iterations: 100,
            max_assay_iterations: 100_000,
            max_stages: 1000,
            cascade_cut: 0.5,
        }
    }
}

impl DesignSettings {
    pub fn new(precision: f64, machine_tolerance: f64) -> Self {
        Self {
            precision,
            machine_tolerance,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> CascadeResult<()> {
        if !(self.precision.is_finite() && self.precision > 0.0) {
            return Err(CascadeError::InvalidParameter(format!(
                "precision must be positive, got {}",
                self.precision
            )));
        }
        if !(self.machine_tolerance.is_finite()
            && self.machine_tolerance >= 0.0
            && self.machine_tolerance < 1.0)
        {
            return Err(CascadeError::InvalidParameter(format!(
                "machine tolerance must lie in [0,1), got {}",
                self.machine_tolerance
            )));
        }
        if !(self.cascade_cut.is_finite() && self.cascade_cut > 0.0 && self.cascade_cut < 1.0) {
            return Err(CascadeError::InvalidParameter(format!(
                "cascade cut must lie in (0,1), got {}",
                self.cascade_cut
            )));
        }
        let caps = [
            ("max_cut_iterations", self.max_cut_iterations),
            ("max_scaling_iterations", self.max_scaling_iterations),
            ("max_assay_iterations", self.max_assay_iterations),
            ("max_stages", self.max_stages),
        ];
        for (name, cap) in caps {
            if cap == 0 {
                return Err(CascadeError::InvalidParameter(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }
        Ok(())
    }
}
