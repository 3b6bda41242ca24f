//! # Pipeline Module
//!
//! Orchestrates the full duplicate detection workflow.
//!
//! ## Pipeline Stages
//! 1. **Enumerate** - Query the driver utility and parse the catalog
//! 2. **Analyze** - Classify duplicates and correlate store folders
//! 3. **Report** - Join both views into the cleanup report
//!
//! ## Parallelism
//! The classifier and the correlator share no state and run side by
//! side on rayon; the correlator additionally measures store folders
//! in parallel.

mod executor;

pub use executor::{Pipeline, PipelineBuilder, PipelineResult};
