//! # Cascade Module
//!
//! Design of a counter-current gas-centrifuge cascade.
//!
//! ```text
//!            product P, x_p
//!                 ^
//!        [ stage n_enrich-1 ]
//!               ...                 enriching section
//!        [ stage 1          ]
//! F, x_f ->[ stage 0        ]
//!        [ stage -1         ]
//!               ...                 stripping section
//!        [ stage -n_strip   ]
//!                 v
//!            tails W, x_w
//! ```
//! Each stage sends its product up to the next stage and its tails down to the previous one.
//!
//! ## Contents
//! - `cascade_settings`: tolerances and iteration caps (`DesignSettings`)
//! - `cascade_builder`: ideal stage layout (`CascadeBuilder`, `IdealCascade`)
//! - `flow_solver`: banded stage-flow balance solved with LU (`FlowSolver`)
//! - `cascade_designer`: machine counts, budget fitting, off-design assays (`Cascade`, `CascadeDesigner`)

pub mod cascade_builder;
pub mod cascade_designer;
pub mod cascade_settings;
pub mod flow_solver;
