//! # Centrifuge Module
//!
//! Physics of a single gas centrifuge and of one cascade stage built from identical machines.
//!
//! ## Contents
//! - `centrifuge_model`: Ratz/Glaser separative power dU(θ) of one machine
//! - `stage_model`: stage separation factors, assays, ideal-cut search and machine count
//!
//! ## Conventions
//! All assays are U-235 atom fractions in (0,1). Flows are kg of uranium per second.
//! Separation factors are defined on abundance ratios R = x/(1-x):
//! ```text
//! α = R_product / R_feed      (heads separation factor)
//! β = R_feed / R_tail         (tails separation factor)
//! ```
//! A stage is "ideal" when α = β; the cut θ = P/F is then fixed by the machine physics.

pub mod centrifuge_model;
pub mod stage_model;
mod stage_model_tests;
