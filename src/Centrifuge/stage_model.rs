//! # Stage Model Module
//!
//! ## Aim
//! One cascade stage: a group of identical centrifuges working in parallel at the same cut,
//! fed at one assay and splitting the feed into an enriched product and a depleted tail.
//!
//! ## Main Data Structures
//! - `StageModel`: stage state (cut, dU, α, β, assays, feed flow, machine count) together with
//!   the shared `CentrifugeModel` it is built of
//!
//! ## Key Methods
//! - `StageModel::ideal()`: stage whose cut is found by `find_ideal_cut` (α = β)
//! - `StageModel::with_reference()`: stage reusing the reference α and dU of the feed stage
//! - `compute_alpha_from_delta_u()`, `compute_product_assay()`, `compute_beta_from_alpha_and_cut()`,
//!   `compute_tail_assay()`, `compute_cut_from_alpha_beta()`: the stage relations
//! - `machines_needed()`: machines required to process the stage feed flow
//!
//! ## Stage relations
//! ```text
//! α  = 1 + sqrt(2·dU·(1-θ)/(θ·f_m)),        f_m = F_UF6·(M_238/M)²
//! x_p = αR_f/(1+αR_f),                     R_f = x_f/(1-x_f)
//! x_w = (x_f - θ·x_p)/(1-θ),               β = R_f·(1-x_w)/x_w
//! θ  = (x_f - x_w)/(x_p - x_w)
//! L_m = 2·dU·θ/((1-θ)·(α-1)²)             uranium feed of one machine
//! ```
use crate::Centrifuge::centrifuge_model::CentrifugeModel;
use crate::cascade_errors::{CascadeError, CascadeResult};
use log::debug;

/// Secant seeds of the ideal-cut search, also the bounds its iterates must stay within
const CUT_SEED_LOW: f64 = 0.1;
const CUT_SEED_HIGH: f64 = 0.9;

#[derive(Debug, Clone)]
pub struct StageModel {
    model: CentrifugeModel,
    pub feed_assay: f64,
    pub product_assay: f64,
    pub tail_assay: f64,
    pub cut: f64,
    /// separative power of one machine, kg·SWU/s
    pub delta_u: f64,
    pub alpha: f64,
    pub beta: f64,
    /// uranium flow entering the stage, kg/s
    pub feed_flow: f64,
    pub n_machines: usize,
    pub precision: f64,
    /// secant iterations spent by the last ideal-cut search
    pub cut_iterations: usize,
}

fn check_assay(name: &str, assay: f64) -> CascadeResult<()> {
    if assay.is_finite() && assay > 0.0 && assay < 1.0 {
        Ok(())
    } else {
        Err(CascadeError::InvalidParameter(format!(
            "{} assay must lie in (0,1), got {}",
            name, assay
        )))
    }
}

impl StageModel {
    /// Bare stage at `feed_assay`; separation parameters are left for the caller to set.
    pub fn new(model: CentrifugeModel, feed_assay: f64, precision: f64) -> CascadeResult<Self> {
        check_assay("feed", feed_assay)?;
        if !(precision.is_finite() && precision > 0.0) {
            return Err(CascadeError::InvalidParameter(format!(
                "precision must be positive, got {}",
                precision
            )));
        }
        Ok(Self {
            model,
            feed_assay,
            product_assay: 0.0,
            tail_assay: 0.0,
            cut: 0.5,
            delta_u: 0.0,
            alpha: 1.0,
            beta: 1.0,
            feed_flow: 0.0,
            n_machines: 0,
            precision,
            cut_iterations: 0,
        })
    }

    /// Stage operated at its ideal cut
    pub fn ideal(
        model: CentrifugeModel,
        feed_assay: f64,
        precision: f64,
        max_iterations: usize,
    ) -> CascadeResult<Self> {
        let mut stage = Self::new(model, feed_assay, precision)?;
        stage.find_ideal_cut(max_iterations)?;
        Ok(stage)
    }

    /// Stage of an ideal cascade: α = β = `alpha`, dU = `delta_u`, cut from mass balance
    pub fn with_reference(
        model: CentrifugeModel,
        feed_assay: f64,
        precision: f64,
        alpha: f64,
        delta_u: f64,
    ) -> CascadeResult<Self> {
        if !(alpha.is_finite() && alpha > 1.0) {
            return Err(CascadeError::InvalidParameter(format!(
                "reference separation factor must exceed 1, got {}",
                alpha
            )));
        }
        let mut stage = Self::new(model, feed_assay, precision)?;
        stage.delta_u = delta_u;
        stage.alpha = alpha;
        stage.beta = alpha;
        stage.compute_product_assay();
        stage.compute_tail_assay();
        stage.compute_cut_from_alpha_beta()?;
        Ok(stage)
    }

    /// Uranium feed of one machine in the unit of the α relation
    fn alpha_feed(&self) -> f64 {
        let spec = self.model.spec();
        spec.feed_rate * spec.uranium_mass_fraction().powi(2)
    }

    /// α from the current dU and cut
    pub fn compute_alpha_from_delta_u(&mut self) -> f64 {
        let ratio = 2.0 * (self.delta_u / self.alpha_feed()) * (1.0 - self.cut) / self.cut;
        self.alpha = 1.0 + ratio.sqrt();
        self.alpha
    }

    /// Product assay from α and the feed assay
    pub fn compute_product_assay(&mut self) -> f64 {
        let r = self.alpha * self.feed_assay / (1.0 - self.feed_assay);
        self.product_assay = r / (1.0 + r);
        self.product_assay
    }

    /// Tail assay from the mass balance at the current cut, then β from that tail.
    /// Updates the product assay first.
    pub fn compute_beta_from_alpha_and_cut(&mut self) -> f64 {
        self.compute_product_assay();
        self.tail_assay = (self.feed_assay - self.cut * self.product_assay) / (1.0 - self.cut);
        self.beta =
            self.feed_assay / (1.0 - self.feed_assay) * (1.0 - self.tail_assay) / self.tail_assay;
        self.beta
    }

    /// Tail assay from β and the feed assay
    pub fn compute_tail_assay(&mut self) -> f64 {
        let a = self.feed_assay / (1.0 - self.feed_assay) / self.beta;
        self.tail_assay = a / (1.0 + a);
        self.tail_assay
    }

    /// Cut closing the mass balance for the current product and tail assays
    pub fn compute_cut_from_alpha_beta(&mut self) -> CascadeResult<f64> {
        let cut = (self.feed_assay - self.tail_assay) / (self.product_assay - self.tail_assay);
        if !(cut.is_finite() && cut > 0.0 && cut < 1.0) {
            return Err(CascadeError::InvalidParameter(format!(
                "cut from x_f = {}, x_p = {}, x_w = {} is outside (0,1): {}",
                self.feed_assay, self.product_assay, self.tail_assay, cut
            )));
        }
        self.cut = cut;
        Ok(cut)
    }

    /// Sets the cut, re-evaluates dU, α and β and returns the residual α - β
    fn ideal_residual(&mut self, cut: f64) -> CascadeResult<f64> {
        self.cut = cut;
        self.delta_u = self.model.compute_separative_power(cut)?;
        self.compute_alpha_from_delta_u();
        self.compute_beta_from_alpha_and_cut();
        let residual = self.alpha - self.beta;
        if !residual.is_finite() {
            return Err(CascadeError::non_convergence(
                "ideal cut search",
                self.cut_iterations,
                format!("residual α-β is not finite at cut {}", cut),
            ));
        }
        Ok(residual)
    }

    /// Secant search for the cut where α = β, seeded at 0.1 and 0.9. An iterate leaving
    /// (0.1, 0.9) ends the search with `NonConvergence`.
    /// On success the stage holds the ideal cut, dU, α, β and both outlet assays.
    pub fn find_ideal_cut(&mut self, max_iterations: usize) -> CascadeResult<f64> {
        self.cut_iterations = 0;
        let mut previous_cut = CUT_SEED_LOW;
        let mut previous_residual = self.ideal_residual(previous_cut)?;
        let mut cut = CUT_SEED_HIGH;
        let mut residual = self.ideal_residual(cut)?;

        while residual.abs() > self.precision {
            if self.cut_iterations >= max_iterations {
                return Err(CascadeError::non_convergence(
                    "ideal cut search",
                    self.cut_iterations,
                    format!("|α-β| = {:e} at cut {}", residual.abs(), cut),
                ));
            }
            let slope = (previous_residual - residual) / (previous_cut - cut);
            if slope == 0.0 || !slope.is_finite() {
                return Err(CascadeError::non_convergence(
                    "ideal cut search",
                    self.cut_iterations,
                    format!("flat secant at cut {}", cut),
                ));
            }
            let next_cut = cut - residual / slope;
            if !(next_cut > CUT_SEED_LOW && next_cut < CUT_SEED_HIGH) {
                return Err(CascadeError::non_convergence(
                    "ideal cut search",
                    self.cut_iterations,
                    format!(
                        "secant step left ({}, {}): cut {}",
                        CUT_SEED_LOW, CUT_SEED_HIGH, next_cut
                    ),
                ));
            }
            previous_cut = cut;
            previous_residual = residual;
            cut = next_cut;
            residual = self.ideal_residual(cut)?;
            self.cut_iterations += 1;
            debug!(
                "ideal cut iteration {}: cut = {}, α-β = {:e}",
                self.cut_iterations, cut, residual
            );
        }
        self.compute_product_assay();
        self.compute_tail_assay();
        Ok(self.cut)
    }

    /// Uranium feed one machine of this stage can process, kg/s.
    /// From dU = L·θ(1-θ)·ε²/2 with the heads-to-tails enrichment ε = (β-1)/θ, and α = β
    /// on cascade stages: L = 2·dU·θ/((1-θ)·(α-1)²).
    pub fn machine_feed(&self) -> f64 {
        2.0 * self.delta_u * self.cut / ((1.0 - self.cut) * (self.alpha - 1.0).powi(2))
    }

    /// Machines needed for the stage feed flow. The exact count is rounded up
    /// unless it lies within `tolerance` of its floor.
    pub fn machines_needed(&mut self, tolerance: f64) -> CascadeResult<usize> {
        let capacity = self.machine_feed();
        if !(capacity.is_finite() && capacity > 0.0) {
            return Err(CascadeError::InvalidParameter(format!(
                "machine feed capacity is not positive: {}",
                capacity
            )));
        }
        if !(self.feed_flow.is_finite() && self.feed_flow >= 0.0) {
            return Err(CascadeError::InvalidParameter(format!(
                "stage feed flow must be non-negative, got {}",
                self.feed_flow
            )));
        }
        let exact = self.feed_flow / capacity;
        let whole = exact.floor();
        let count = if exact - whole > tolerance {
            whole + 1.0
        } else {
            whole
        };
        self.n_machines = count as usize;
        Ok(self.n_machines)
    }

    /// Separative power of the whole stage, kg·SWU/s
    pub fn stage_separative_power(&self) -> f64 {
        self.n_machines as f64 * self.delta_u
    }

    pub fn product_flow(&self) -> f64 {
        self.cut * self.feed_flow
    }

    pub fn tail_flow(&self) -> f64 {
        (1.0 - self.cut) * self.feed_flow
    }

    pub fn set_feed_assay(&mut self, feed_assay: f64) -> CascadeResult<()> {
        check_assay("feed", feed_assay)?;
        self.feed_assay = feed_assay;
        Ok(())
    }

    pub fn set_feed_flow(&mut self, feed_flow: f64) {
        self.feed_flow = feed_flow;
    }
}
