//! Event type definitions for progress reporting.

use crate::core::tool::DeleteOutcome;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the cleaner pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Driver enumeration/parsing events
    Enumerate(EnumerateEvent),
    /// Repository correlation events
    Correlate(CorrelateEvent),
    /// Deletion phase events
    Delete(DeleteEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events while querying the enumeration utility and building the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EnumerateEvent {
    /// The external utility is being invoked
    Started,
    /// Catalog built and dates resolved
    Completed { total_drivers: usize },
}

/// Events while correlating the catalog against on-disk storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CorrelateEvent {
    /// Correlation has started
    Started,
    /// The descriptor directory has been indexed
    IndexBuilt { descriptors: usize },
    /// Store subdirectories counted, measurement beginning
    FoldersListed { total_folders: usize },
    /// Progress update while walking store folders
    Progress(CorrelateProgress),
    /// A non-fatal anomaly was noticed; correlation continues
    Warning { message: String },
    /// Correlation completed
    Completed { total_entries: usize },
}

/// Progress information while walking the driver-store repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelateProgress {
    /// Store subdirectories examined so far
    pub folders_seen: usize,
    /// Entries resolved to a catalog identifier so far
    pub entries_resolved: usize,
    /// Folder currently being measured
    pub current_path: PathBuf,
}

/// Events during the deletion phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DeleteEvent {
    /// Deletion has started
    Started {
        total_entries: usize,
        expected_bytes: u64,
    },
    /// One deletion call is about to be issued
    Attempting { published_name: String },
    /// One deletion call finished with the given outcome
    Outcome {
        published_name: String,
        outcome: DeleteOutcome,
        size_bytes: u64,
    },
    /// Deletion finished (or was cancelled partway)
    Completed {
        reclaimed_bytes: u64,
        expected_bytes: u64,
    },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
    /// Pipeline encountered a fatal error
    Error { message: String },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    /// Invoking the utility and building the catalog
    Enumerating,
    /// Classifier and correlator running side by side
    Analyzing,
    /// Joining classification with correlation
    Reporting,
}

/// Summary of a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Staged drivers in the catalog
    pub total_drivers: usize,
    /// Drivers superseded by a newer member of their class
    pub superseded_drivers: usize,
    /// Store folders resolved to a catalog identifier
    pub repository_entries: usize,
    /// Folders marked reclaimable
    pub reclaimable_entries: usize,
    /// Total reclaimable size in bytes
    pub reclaimable_bytes: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Enumerating => write!(f, "Enumerating staged drivers"),
            PipelinePhase::Analyzing => write!(f, "Analyzing"),
            PipelinePhase::Reporting => write!(f, "Reporting"),
        }
    }
}
