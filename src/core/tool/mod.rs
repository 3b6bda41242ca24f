//! # Tool Module
//!
//! The boundary to the external driver utility.
//!
//! Everything the engine needs from the platform fits in two calls:
//! enumerate the staged drivers, and delete one staged driver by name.
//! Both run an external command; the engine consumes only captured text
//! and a classified outcome, so tests substitute the whole boundary
//! with a fake.

mod pnputil;

pub use pnputil::PnpUtil;

use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// Marker the utility prints when it refuses to delete a driver that an
/// installed device still uses.
const IN_USE_MARKER: &str = "One or more devices are presently installed using the specified INF";

/// Outcome of one deletion attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteOutcome {
    /// The staged driver was removed
    Deleted,
    /// The utility refused because an installed device still uses this
    /// driver. This refusal is the safety guarantee the whole tool
    /// leans on; it is an expected outcome, not an error.
    RefusedInUse,
    /// Any other unsuccessful completion
    Failed {
        /// Exit code, absent when the process died without one
        code: Option<i32>,
        /// Captured command output for diagnostics
        output: String,
    },
}

/// Classify a finished deletion command.
///
/// Success means deleted; a refusal is recognized by the in-use marker
/// in the output; everything else is a plain failure carrying whatever
/// the command printed.
pub fn classify_delete_outcome(code: Option<i32>, output: &str) -> DeleteOutcome {
    match code {
        Some(0) => DeleteOutcome::Deleted,
        _ if output.contains(IN_USE_MARKER) => DeleteOutcome::RefusedInUse,
        _ => DeleteOutcome::Failed {
            code,
            output: output.to_string(),
        },
    }
}

/// The operations the engine needs from the platform utility.
///
/// [`PnpUtil`] is the production implementation; tests implement this
/// trait to run the pipeline against canned output.
pub trait DriverTool: Send + Sync {
    /// Run the enumeration command and return its captured text output
    fn enumerate(&self) -> Result<String, ToolError>;

    /// Ask the utility to remove one staged driver, never forcing.
    ///
    /// `Err` is reserved for failing to run the utility at all; a
    /// command that ran and was refused or failed is `Ok` with the
    /// classified outcome.
    fn delete_driver(&self, published_name: &str) -> Result<DeleteOutcome, ToolError>;
}
