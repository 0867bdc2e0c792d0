//! Auxiliary input/output: JSON task files and design reports.
pub mod task_loader;
