//! Runnable demonstrations of the cascade design workflow.
pub mod cascade_examples;
