//! # Core Module
//!
//! The UI-agnostic driver-store cleanup engine.
//!
//! ## Modules
//! - `catalog` - Parses utility output into the staged-driver catalog
//! - `classifier` - Groups drivers and elects the newest per class
//! - `repository` - Correlates on-disk store folders with the catalog
//! - `report` - Joins both views into the final decision list
//! - `cleanup` - Drives sequential deletion through the tool boundary
//! - `tool` - The external driver utility seam
//! - `pipeline` - Orchestrates the full workflow

pub mod catalog;
pub mod classifier;
pub mod cleanup;
pub mod pipeline;
pub mod report;
pub mod repository;
pub mod tool;

// Re-export commonly used types
pub use catalog::{DriverCatalog, DriverRecord, DriverVersion};
pub use classifier::{DuplicateMap, EquivalenceKey};
pub use cleanup::{CleanupResult, CleanupSummary, DeletionRecord};
pub use report::{CleanupReport, ReportEntry};
pub use repository::{RepositoryConfig, RepositoryEntry};
pub use tool::{DeleteOutcome, DriverTool, PnpUtil};
