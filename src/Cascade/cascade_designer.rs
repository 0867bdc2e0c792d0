//! # Cascade Designer Module
//!
//! ## Aim
//! Turns an ideal stage layout into a buildable cascade: stage flows, machines per stage and,
//! when the number of centrifuges is limited, the largest feed rate the budget can process.
//! An already designed cascade can be re-evaluated at a feed assay other than its design point.
//!
//! ## Main Data Structures
//! - `Cascade`: designed cascade (stages keyed by signed index, flows, machine counts, assays)
//! - `CascadeDesigner`: runs the budget-fitting loop and the off-design assay iteration
//! - `StageRow`: one line of the stage table
//! - `DeclaredCapacity`: throughput and separative-work capacity over a period
//!
//! ## Budget fitting
//! Flows are solved at the maximum feed F with the cascade cut of the settings and machines
//! counted per stage. While the total N
//! exceeds the budget N_max the feed is scaled, F <- F·N_max/N, and the cascade resized.
//!
//! ## Off-design operation
//! With the stage topology fixed, stage streams are split by the stages' own cuts and every
//! stage's feed assay is the flow-weighted mix of the
//! product from the stage below, the tails from the stage above and, for stage 0, the external
//! feed. The mix is swept until the root-sum-square change of all stage assays is below the
//! requested precision.
//! - fixed cut (default): cut and α kept, tail and β from mass balance
//! - `u_cut`: α and β kept, cut re-derived from the assays and flows re-solved each sweep
use crate::Cascade::cascade_builder::{CascadeBuilder, IdealCascade};
use crate::Cascade::cascade_settings::DesignSettings;
use crate::Cascade::flow_solver::{FlowCut, FlowSolver};
use crate::Centrifuge::centrifuge_model::{CentrifugeModel, CentrifugeSpec};
use crate::Centrifuge::stage_model::StageModel;
use crate::cascade_errors::{CascadeError, CascadeResult};
use log::{debug, info, warn};
use prettytable::{Table, row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One line of the stage table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRow {
    pub index: i32,
    pub feed_assay: f64,
    pub product_assay: f64,
    pub tail_assay: f64,
    pub cut: f64,
    pub feed_flow: f64,
    pub machines: usize,
}

/// Capacities declared to the facility over `period` seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeclaredCapacity {
    pub period: f64,
    /// feed rate, kg/s
    pub feed_flow: f64,
    /// uranium processed over the period, kg
    pub throughput: f64,
    /// separative work over the period, kg·SWU
    pub swu_capacity: f64,
}

#[derive(Debug, Clone)]
pub struct Cascade {
    pub stages: BTreeMap<i32, StageModel>,
    pub n_enrich: usize,
    pub n_strip: usize,
    pub feed_assay: f64,
    pub product_assay: f64,
    pub tail_assay: f64,
    /// external feed, kg/s
    pub feed_flow: f64,
    pub product_flow: f64,
    pub tail_flow: f64,
    pub n_machines: usize,
    pub alpha_ref: f64,
    pub delta_u_ref: f64,
    pub settings: DesignSettings,
    model: CentrifugeModel,
}

impl Cascade {
    /// Wraps an ideal layout; flows and machines stay empty until `design_cascade`
    pub fn from_ideal(
        ideal: IdealCascade,
        model: CentrifugeModel,
        settings: DesignSettings,
        feed_assay: f64,
        product_assay: f64,
        tail_assay: f64,
    ) -> Self {
        Self {
            stages: ideal.stages,
            n_enrich: ideal.n_enrich,
            n_strip: ideal.n_strip,
            feed_assay,
            product_assay,
            tail_assay,
            feed_flow: 0.0,
            product_flow: 0.0,
            tail_flow: 0.0,
            n_machines: 0,
            alpha_ref: ideal.alpha_ref,
            delta_u_ref: ideal.delta_u_ref,
            settings,
            model,
        }
    }

    /// Builds and sizes a cascade with default settings
    pub fn construct(
        spec: CentrifugeSpec,
        feed_assay: f64,
        product_assay: f64,
        tail_assay: f64,
        max_feed: f64,
        max_centrifuges: usize,
    ) -> CascadeResult<Self> {
        Self::construct_with_settings(
            spec,
            feed_assay,
            product_assay,
            tail_assay,
            max_feed,
            max_centrifuges,
            DesignSettings::default(),
        )
    }

    pub fn construct_with_settings(
        spec: CentrifugeSpec,
        feed_assay: f64,
        product_assay: f64,
        tail_assay: f64,
        max_feed: f64,
        max_centrifuges: usize,
        settings: DesignSettings,
    ) -> CascadeResult<Self> {
        let designer = CascadeDesigner::new(CentrifugeModel::new(spec)?, settings);
        let mut cascade = designer.build(feed_assay, product_assay, tail_assay)?;
        designer.design_cascade(&mut cascade, max_feed, max_centrifuges)?;
        Ok(cascade)
    }

    pub fn feed_flow(&self) -> f64 {
        self.feed_flow
    }

    pub fn machine_count(&self) -> usize {
        self.n_machines
    }

    pub fn n_stages(&self) -> usize {
        self.n_enrich + self.n_strip
    }

    pub fn top_stage(&self) -> Option<&StageModel> {
        self.stages.get(&(self.n_enrich as i32 - 1))
    }

    pub fn bottom_stage(&self) -> Option<&StageModel> {
        self.stages.get(&-(self.n_strip as i32))
    }

    /// Stages from the most depleted to the most enriched
    pub fn stage_table(&self) -> Vec<StageRow> {
        self.stages
            .iter()
            .map(|(index, stage)| StageRow {
                index: *index,
                feed_assay: stage.feed_assay,
                product_assay: stage.product_assay,
                tail_assay: stage.tail_assay,
                cut: stage.cut,
                feed_flow: stage.feed_flow,
                machines: stage.n_machines,
            })
            .collect()
    }

    /// Separative power of all installed machines, kg·SWU/s
    pub fn separative_power(&self) -> f64 {
        self.n_machines as f64 * self.delta_u_ref
    }

    pub fn declared_capacity(&self, period: f64) -> DeclaredCapacity {
        DeclaredCapacity {
            period,
            feed_flow: self.feed_flow,
            throughput: self.feed_flow * period,
            swu_capacity: self.separative_power() * period,
        }
    }

    /// Re-evaluates the cascade at another feed assay with stage cuts held fixed
    pub fn compute_assay(&self, feed_assay: f64, precision: f64) -> CascadeResult<Cascade> {
        self.compute_assay_with(feed_assay, precision, false)
    }

    pub fn compute_assay_with(
        &self,
        feed_assay: f64,
        precision: f64,
        u_cut: bool,
    ) -> CascadeResult<Cascade> {
        CascadeDesigner::new(self.model.clone(), self.settings.clone())
            .compute_assay(self, feed_assay, precision, u_cut)
    }

    pub fn pretty_print(&self) {
        let mut table = Table::new();
        table.add_row(row![
            "Stage",
            "Feed assay",
            "Product assay",
            "Tail assay",
            "Cut",
            "Flow, kg/s",
            "Machines"
        ]);
        for stage in self.stage_table().iter().rev() {
            table.add_row(row![
                stage.index,
                format!("{:.6}", stage.feed_assay),
                format!("{:.6}", stage.product_assay),
                format!("{:.6}", stage.tail_assay),
                format!("{:.5}", stage.cut),
                format!("{:.4e}", stage.feed_flow),
                stage.machines
            ]);
        }
        table.printstd();

        let mut totals = Table::new();
        totals.add_row(row!["Parameter", "Value", "Units"]);
        totals.add_row(row!["Enriching stages", self.n_enrich, "-"]);
        totals.add_row(row!["Stripping stages", self.n_strip, "-"]);
        totals.add_row(row!["Feed assay", format!("{:.6}", self.feed_assay), "-"]);
        totals.add_row(row!["Product assay", format!("{:.6}", self.product_assay), "-"]);
        totals.add_row(row!["Tail assay", format!("{:.6}", self.tail_assay), "-"]);
        totals.add_row(row!["Feed flow", format!("{:.4e}", self.feed_flow), "kg/s"]);
        totals.add_row(row!["Product flow", format!("{:.4e}", self.product_flow), "kg/s"]);
        totals.add_row(row!["Tail flow", format!("{:.4e}", self.tail_flow), "kg/s"]);
        totals.add_row(row!["Machines", self.n_machines, "-"]);
        totals.add_row(row!["Reference alpha", format!("{:.6}", self.alpha_ref), "-"]);
        totals.add_row(row![
            "Separative power",
            format!("{:.4e}", self.separative_power()),
            "kg-SWU/s"
        ]);
        totals.printstd();
    }
}

pub struct CascadeDesigner {
    model: CentrifugeModel,
    pub settings: DesignSettings,
}

impl CascadeDesigner {
    pub fn new(model: CentrifugeModel, settings: DesignSettings) -> Self {
        Self { model, settings }
    }

    /// Ideal stage layout for the design assays
    pub fn build(&self, feed_assay: f64, product_assay: f64, tail_assay: f64) -> CascadeResult<Cascade> {
        let ideal = CascadeBuilder::new(self.model.clone(), self.settings.clone())
            .build_ideal_cascade(feed_assay, product_assay, tail_assay)?;
        Ok(Cascade::from_ideal(
            ideal,
            self.model.clone(),
            self.settings.clone(),
            feed_assay,
            product_assay,
            tail_assay,
        ))
    }

    /// Solves flows at `feed` and counts machines stage by stage
    fn size_stages(&self, cascade: &mut Cascade, feed: f64) -> CascadeResult<usize> {
        FlowSolver::solve_stage_flows(
            &mut cascade.stages,
            cascade.n_enrich,
            cascade.n_strip,
            FlowCut::Cascade(self.settings.cascade_cut),
            feed,
        )?;
        let mut total = 0;
        for stage in cascade.stages.values_mut() {
            total += stage.machines_needed(self.settings.machine_tolerance)?;
        }
        Ok(total)
    }

    /// Sizes the cascade at `max_feed`, scaling the feed down until the machine count fits
    /// `max_centrifuges`. Returns the total machine count and the feed rate.
    pub fn design_cascade(
        &self,
        cascade: &mut Cascade,
        max_feed: f64,
        max_centrifuges: usize,
    ) -> CascadeResult<(usize, f64)> {
        if !(max_feed.is_finite() && max_feed > 0.0) {
            return Err(CascadeError::InvalidParameter(format!(
                "maximum feed must be positive, got {}",
                max_feed
            )));
        }
        let n_stages = cascade.n_stages();
        if max_centrifuges < n_stages {
            return Err(CascadeError::InsufficientHardware(format!(
                "{} centrifuges cannot equip {} stages",
                max_centrifuges, n_stages
            )));
        }

        let mut feed = max_feed;
        let mut total = self.size_stages(cascade, feed)?;
        info!("{} machines needed at the maximum feed {:.4e} kg/s", total, feed);
        if total > max_centrifuges {
            warn!(
                "machine budget {} below the {} machines of the maximum feed, scaling feed down",
                max_centrifuges, total
            );
        }
        let mut iterations = 0;
        while total > max_centrifuges {
            if iterations >= self.settings.max_scaling_iterations {
                return Err(CascadeError::non_convergence(
                    "feed scaling",
                    iterations,
                    format!("{} machines still above budget {}", total, max_centrifuges),
                ));
            }
            feed /= total as f64 / max_centrifuges as f64;
            total = self.size_stages(cascade, feed)?;
            iterations += 1;
            debug!(
                "feed scaling iteration {}: feed = {:.6e} kg/s, machines = {}",
                iterations, feed, total
            );
        }
        if let Some((index, _)) = cascade.stages.iter().find(|(_, s)| s.n_machines == 0) {
            return Err(CascadeError::InsufficientHardware(format!(
                "stage {} is left without machines at feed {:e} kg/s",
                index, feed
            )));
        }

        cascade.feed_flow = feed;
        cascade.product_flow = feed * (cascade.feed_assay - cascade.tail_assay)
            / (cascade.product_assay - cascade.tail_assay);
        cascade.tail_flow = feed - cascade.product_flow;
        cascade.n_machines = total;
        info!(
            "cascade designed: {} machines, feed {:.4e} kg/s, product {:.4e} kg/s",
            total, feed, cascade.product_flow
        );
        Ok((total, feed))
    }

    /// Settles a stage's outlet assays around its current feed assay
    fn settle_stage(stage: &mut StageModel, u_cut: bool) -> CascadeResult<()> {
        if u_cut {
            stage.compute_product_assay();
            stage.compute_tail_assay();
            stage.compute_cut_from_alpha_beta()?;
        } else {
            stage.compute_beta_from_alpha_and_cut();
        }
        if !(stage.tail_assay > 0.0 && stage.product_assay < 1.0) {
            return Err(CascadeError::InvalidParameter(format!(
                "stage fed at {} gives non-physical assays: product {}, tail {}",
                stage.feed_assay, stage.product_assay, stage.tail_assay
            )));
        }
        Ok(())
    }

    fn assay_snapshot(stages: &BTreeMap<i32, StageModel>) -> Vec<f64> {
        stages
            .values()
            .flat_map(|s| [s.feed_assay, s.product_assay, s.tail_assay])
            .collect()
    }

    /// Feed assays obtained by mixing the streams entering each stage
    fn mixed_feed_assays(
        stages: &BTreeMap<i32, StageModel>,
        external_feed: f64,
        external_assay: f64,
    ) -> Vec<(i32, f64)> {
        stages
            .keys()
            .map(|&index| {
                let mut u235 = 0.0;
                let mut total = 0.0;
                if let Some(below) = stages.get(&(index - 1)) {
                    u235 += below.product_flow() * below.product_assay;
                    total += below.product_flow();
                }
                if let Some(above) = stages.get(&(index + 1)) {
                    u235 += above.tail_flow() * above.tail_assay;
                    total += above.tail_flow();
                }
                if index == 0 {
                    u235 += external_feed * external_assay;
                    total += external_feed;
                }
                (index, u235 / total)
            })
            .collect()
    }

    /// Stage assays of `cascade` fed at `feed_assay`, stage topology and machines unchanged
    pub fn compute_assay(
        &self,
        cascade: &Cascade,
        feed_assay: f64,
        precision: f64,
        u_cut: bool,
    ) -> CascadeResult<Cascade> {
        if !(feed_assay.is_finite() && feed_assay > 0.0 && feed_assay < 1.0) {
            return Err(CascadeError::InvalidParameter(format!(
                "feed assay must lie in (0,1), got {}",
                feed_assay
            )));
        }
        if !(precision.is_finite() && precision > 0.0) {
            return Err(CascadeError::InvalidParameter(format!(
                "precision must be positive, got {}",
                precision
            )));
        }
        if !(cascade.feed_flow > 0.0) {
            return Err(CascadeError::InvalidParameter(
                "cascade has no feed flow: design it before evaluating off-design assays"
                    .to_string(),
            ));
        }
        let mut result = cascade.clone();
        let (n_enrich, n_strip) = (result.n_enrich as i32, result.n_strip as i32);
        let feed = result.feed_flow;
        let stages = &mut result.stages;

        // first guess: straight propagation along the stage ladder
        let mut inlet = feed_assay;
        for index in 0..n_enrich {
            let stage = stages
                .get_mut(&index)
                .ok_or_else(|| CascadeError::InvalidParameter(format!("stage {} missing", index)))?;
            stage.set_feed_assay(inlet)?;
            Self::settle_stage(stage, u_cut)?;
            inlet = stage.product_assay;
        }
        inlet = stages
            .get(&0)
            .map(|s| s.tail_assay)
            .ok_or_else(|| CascadeError::InvalidParameter("stage 0 missing".to_string()))?;
        for index in (-n_strip..0).rev() {
            let stage = stages
                .get_mut(&index)
                .ok_or_else(|| CascadeError::InvalidParameter(format!("stage {} missing", index)))?;
            stage.set_feed_assay(inlet)?;
            Self::settle_stage(stage, u_cut)?;
            inlet = stage.tail_assay;
        }
        FlowSolver::solve_stage_flows(
            stages,
            n_enrich as usize,
            n_strip as usize,
            FlowCut::Stage,
            feed,
        )?;

        let mut converged = false;
        let mut change = f64::INFINITY;
        let mut sweeps = 0;
        while sweeps < self.settings.max_assay_iterations {
            if u_cut {
                FlowSolver::solve_stage_flows(
                    stages,
                    n_enrich as usize,
                    n_strip as usize,
                    FlowCut::Stage,
                    feed,
                )?;
            }
            let before = Self::assay_snapshot(stages);
            for (index, assay) in Self::mixed_feed_assays(stages, feed, feed_assay) {
                if let Some(stage) = stages.get_mut(&index) {
                    stage.set_feed_assay(assay)?;
                    Self::settle_stage(stage, u_cut)?;
                }
            }
            let after = Self::assay_snapshot(stages);
            change = before
                .iter()
                .zip(after.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                .sqrt();
            sweeps += 1;
            if change < precision {
                converged = true;
                break;
            }
        }
        if !converged {
            return Err(CascadeError::non_convergence(
                "off-design assay mixing",
                sweeps,
                format!("assay change {:e} above precision {:e}", change, precision),
            ));
        }
        debug!("off-design assays settled after {} sweeps", sweeps);

        let top = result
            .top_stage()
            .map(|s| (s.product_assay, s.product_flow()))
            .ok_or_else(|| CascadeError::InvalidParameter("top stage missing".to_string()))?;
        let bottom = result
            .bottom_stage()
            .map(|s| (s.tail_assay, s.tail_flow()))
            .ok_or_else(|| CascadeError::InvalidParameter("bottom stage missing".to_string()))?;
        result.feed_assay = feed_assay;
        (result.product_assay, result.product_flow) = top;
        (result.tail_assay, result.tail_flow) = bottom;
        info!(
            "cascade fed at {:.5}: product {:.6}, tail {:.6} after {} sweeps",
            feed_assay, result.product_assay, result.tail_assay, sweeps
        );
        Ok(result)
    }
}
