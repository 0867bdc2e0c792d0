//! # Flow Solver Module
//!
//! Steady-state uranium flows entering every stage of a cascade.
//!
//! Stage i is fed by the product of stage i-1 and by the tails of stage i+1; the feed
//! stage (index 0) also takes the external feed F. With L_i the flow into stage i and θ the
//! cut splitting a stage flow:
//! ```text
//! -L_i + θ·L_{i-1} + (1-θ)·L_{i+1} = -F·δ_{i0}
//! ```
//! The design balance uses one cascade cut for every stage. The off-design balance uses each
//! stage's own cut so that the streams leaving a stage are the ones its assays describe.
//! The system is tridiagonal, of size n_enrich + n_strip, and row r holds stage r - n_strip.
use crate::Centrifuge::stage_model::StageModel;
use crate::cascade_errors::{CascadeError, CascadeResult};
use log::debug;
use nalgebra::{DMatrix, DVector};
use std::collections::BTreeMap;

/// Cut used to split stage flows in the balance
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlowCut {
    /// one cut shared by the whole cascade
    Cascade(f64),
    /// the current cut of each stage
    Stage,
}

impl FlowCut {
    fn of(&self, stage: &StageModel) -> f64 {
        match self {
            FlowCut::Cascade(cut) => *cut,
            FlowCut::Stage => stage.cut,
        }
    }
}

pub struct FlowSolver;

impl FlowSolver {
    /// Assembles the flow balance for the given cut
    pub fn assemble(
        stages: &BTreeMap<i32, StageModel>,
        n_enrich: usize,
        n_strip: usize,
        cut: FlowCut,
        external_feed: f64,
    ) -> CascadeResult<(DMatrix<f64>, DVector<f64>)> {
        let n = n_enrich + n_strip;
        if n == 0 || stages.len() != n {
            return Err(CascadeError::InvalidParameter(format!(
                "cascade holds {} stages, expected {} enriching + {} stripping",
                stages.len(),
                n_enrich,
                n_strip
            )));
        }
        if let FlowCut::Cascade(theta) = cut {
            if !(theta.is_finite() && theta > 0.0 && theta < 1.0) {
                return Err(CascadeError::InvalidParameter(format!(
                    "cascade cut must lie in (0,1), got {}",
                    theta
                )));
            }
        }
        let offset = n_strip as i32;
        let mut a = DMatrix::<f64>::zeros(n, n);
        let mut b = DVector::<f64>::zeros(n);
        for row in 0..n {
            let index = row as i32 - offset;
            if !stages.contains_key(&index) {
                return Err(CascadeError::InvalidParameter(format!(
                    "stage {} missing from cascade",
                    index
                )));
            }
            a[(row, row)] = -1.0;
            if let Some(below) = stages.get(&(index - 1)) {
                a[(row, row - 1)] = cut.of(below);
            }
            if let Some(above) = stages.get(&(index + 1)) {
                a[(row, row + 1)] = 1.0 - cut.of(above);
            }
            if index == 0 {
                b[row] = -external_feed;
            }
        }
        Ok((a, b))
    }

    /// Solves the stage flows and writes them into the stages' `feed_flow`
    pub fn solve_stage_flows(
        stages: &mut BTreeMap<i32, StageModel>,
        n_enrich: usize,
        n_strip: usize,
        cut: FlowCut,
        external_feed: f64,
    ) -> CascadeResult<Vec<f64>> {
        if !(external_feed.is_finite() && external_feed > 0.0) {
            return Err(CascadeError::InvalidParameter(format!(
                "external feed must be positive, got {}",
                external_feed
            )));
        }
        let (a, b) = Self::assemble(stages, n_enrich, n_strip, cut, external_feed)?;
        let flows = a.lu().solve(&b).ok_or_else(|| {
            CascadeError::SingularSystem(format!(
                "LU decomposition of the {}-stage flow matrix failed",
                n_enrich + n_strip
            ))
        })?;
        if let Some(bad) = flows.iter().find(|l| !(l.is_finite() && **l > 0.0)) {
            return Err(CascadeError::SingularSystem(format!(
                "non-physical stage flow {}",
                bad
            )));
        }
        let offset = n_strip as i32;
        for (row, flow) in flows.iter().enumerate() {
            if let Some(stage) = stages.get_mut(&(row as i32 - offset)) {
                stage.set_feed_flow(*flow);
            }
        }
        debug!("stage flows: {:?}", flows.as_slice());
        Ok(flows.iter().copied().collect())
    }
}
