//! # Cascade Builder Module
//!
//! ## Aim
//! Lays out the stages of an ideal (no-mixing) cascade for given feed, product and tail assays.
//!
//! ## Algorithm
//! 1. Stage 0 is fed at the cascade feed assay and operated at its ideal cut. Its α and dU
//!    become the reference values of the whole cascade.
//! 2. Enriching walk: stage i+1 is fed with the product of stage i (α = β = α_ref,
//!    dU = dU_ref, cut from mass balance) while the last product is below the target product.
//! 3. Stripping walk: stage i-1 is fed with the tail of stage i while the last tail is above
//!    the target tail.
//!
//! Stage indices are signed: 0..n_enrich-1 enrich, -1..-n_strip strip.
use crate::Cascade::cascade_settings::DesignSettings;
use crate::Centrifuge::centrifuge_model::CentrifugeModel;
use crate::Centrifuge::stage_model::StageModel;
use crate::cascade_errors::{CascadeError, CascadeResult};
use log::{debug, info};
use std::collections::BTreeMap;

/// Stage layout of an ideal cascade before flows are assigned
#[derive(Debug, Clone)]
pub struct IdealCascade {
    pub stages: BTreeMap<i32, StageModel>,
    pub n_enrich: usize,
    pub n_strip: usize,
    pub alpha_ref: f64,
    pub delta_u_ref: f64,
}

impl IdealCascade {
    pub fn n_stages(&self) -> usize {
        self.n_enrich + self.n_strip
    }
}

/// Checks 0 < tail < feed < product < 1
pub fn check_design_assays(feed: f64, product: f64, tail: f64) -> CascadeResult<()> {
    let ordered = tail > 0.0 && tail < feed && feed < product && product < 1.0;
    if ordered && feed.is_finite() && product.is_finite() && tail.is_finite() {
        Ok(())
    } else {
        Err(CascadeError::InvalidParameter(format!(
            "assays must satisfy 0 < tail < feed < product < 1, got tail = {}, feed = {}, product = {}",
            tail, feed, product
        )))
    }
}

pub struct CascadeBuilder {
    model: CentrifugeModel,
    settings: DesignSettings,
}

impl CascadeBuilder {
    pub fn new(model: CentrifugeModel, settings: DesignSettings) -> Self {
        Self { model, settings }
    }

    fn reference_stage(&self, feed_assay: f64, reference: &StageModel) -> CascadeResult<StageModel> {
        StageModel::with_reference(
            self.model.clone(),
            feed_assay,
            self.settings.precision,
            reference.alpha,
            reference.delta_u,
        )
    }

    pub fn build_ideal_cascade(
        &self,
        feed_assay: f64,
        product_assay: f64,
        tail_assay: f64,
    ) -> CascadeResult<IdealCascade> {
        check_design_assays(feed_assay, product_assay, tail_assay)?;
        self.settings.validate()?;

        let first = StageModel::ideal(
            self.model.clone(),
            feed_assay,
            self.settings.precision,
            self.settings.max_cut_iterations,
        )?;
        info!(
            "feed stage: cut = {:.6}, alpha = {:.6}, dU = {:.4e} kg-SWU/s after {} iterations",
            first.cut, first.alpha, first.delta_u, first.cut_iterations
        );

        let mut stages = BTreeMap::new();
        stages.insert(0, first.clone());

        // enriching section
        let mut last_product = first.product_assay;
        let mut index: i32 = 0;
        while last_product < product_assay {
            if index as usize + 1 >= self.settings.max_stages {
                return Err(CascadeError::non_convergence(
                    "enriching stage walk",
                    index as usize + 1,
                    format!(
                        "product assay {} still below target {}",
                        last_product, product_assay
                    ),
                ));
            }
            let stage = self.reference_stage(last_product, &first)?;
            index += 1;
            last_product = stage.product_assay;
            debug!("enriching stage {}: x_p = {}", index, last_product);
            stages.insert(index, stage);
        }
        let n_enrich = index as usize + 1;

        // stripping section
        let mut last_tail = first.tail_assay;
        let mut index: i32 = 0;
        while last_tail > tail_assay {
            if (-index) as usize >= self.settings.max_stages {
                return Err(CascadeError::non_convergence(
                    "stripping stage walk",
                    (-index) as usize,
                    format!("tail assay {} still above target {}", last_tail, tail_assay),
                ));
            }
            let stage = self.reference_stage(last_tail, &first)?;
            index -= 1;
            last_tail = stage.tail_assay;
            debug!("stripping stage {}: x_w = {}", index, last_tail);
            stages.insert(index, stage);
        }
        let n_strip = (-index) as usize;

        info!(
            "ideal cascade laid out: {} enriching and {} stripping stages",
            n_enrich, n_strip
        );
        Ok(IdealCascade {
            stages,
            n_enrich,
            n_strip,
            alpha_ref: first.alpha,
            delta_u_ref: first.delta_u,
        })
    }
}
