//! # Report Module
//!
//! Joins classifier output with correlator output into the final
//! decision list: every resolved store folder, largest first, with
//! superseded ones marked reclaimable.
//!
//! The report never deletes anything. It is the one artifact the CLI
//! renders and, if the user confirms, hands to the cleanup executor.

mod export;

pub use export::{export_csv, export_json, export_to_file, ExportFormat};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

use crate::core::catalog::DriverCatalog;
use crate::core::classifier::DuplicateMap;
use crate::core::repository::RepositoryEntry;

/// One store folder in the final listing, joined with its catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Published name of the staged driver
    pub published_name: String,
    /// Vendor string from the catalog
    pub provider: String,
    /// Device class from the catalog
    pub class_name: String,
    /// Driver date exactly as enumerated
    pub raw_date: String,
    /// Driver version exactly as enumerated
    pub raw_version: String,
    /// Store folder backing this driver
    pub folder_path: PathBuf,
    /// Measured folder size
    pub size_bytes: u64,
    /// Canonical published name this driver is superseded by, if any
    pub duplicate_of: Option<String>,
}

impl ReportEntry {
    /// Superseded entries are the reclaimable ones
    pub fn is_reclaimable(&self) -> bool {
        self.duplicate_of.is_some()
    }

    /// One-line human description,
    /// e.g. `"Display adapters" by "NVIDIA" v31.0.15.3598 at 03/25/2023 [oem42.inf]`
    pub fn describe(&self) -> String {
        format!(
            "\"{}\" by \"{}\" v{} at {} [{}]",
            self.class_name, self.provider, self.raw_version, self.raw_date, self.published_name
        )
    }
}

/// The full sorted listing plus reclaim accounting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupReport {
    /// All resolved store folders, descending by size
    pub entries: Vec<ReportEntry>,
    /// Total size of the reclaimable subset
    pub reclaimable_bytes: u64,
}

impl CleanupReport {
    /// The reclaimable subset, in listing (descending size) order
    pub fn reclaimable(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| e.is_reclaimable())
    }

    pub fn reclaimable_count(&self) -> usize {
        self.reclaimable().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Join the three inputs into the final report.
///
/// Entries are sorted descending by size with the folder path as a
/// deterministic tie-break. A folder that resolved to a published name
/// the catalog does not know is dropped with a warning; without a
/// catalog record it can never be classified, much less deleted.
pub fn build_report(
    catalog: &DriverCatalog,
    duplicates: &DuplicateMap,
    mut entries: Vec<RepositoryEntry>,
) -> CleanupReport {
    entries.sort_by(|a, b| {
        b.size_bytes
            .cmp(&a.size_bytes)
            .then_with(|| a.folder_path.cmp(&b.folder_path))
    });

    let mut report_entries = Vec::with_capacity(entries.len());
    let mut reclaimable_bytes = 0u64;

    for entry in entries {
        let Some(record) = catalog.get(&entry.published_name) else {
            warn!(
                published_name = %entry.published_name,
                folder = %entry.folder_path.display(),
                "store folder resolves to a name the enumeration did not report, dropping"
            );
            continue;
        };

        let duplicate_of = duplicates
            .canonical_for(&entry.published_name)
            .map(String::from);
        if duplicate_of.is_some() {
            reclaimable_bytes += entry.size_bytes;
        }

        report_entries.push(ReportEntry {
            published_name: entry.published_name,
            provider: record.provider.clone(),
            class_name: record.class_name.clone(),
            raw_date: record.raw_date.clone(),
            raw_version: record.raw_version.clone(),
            folder_path: entry.folder_path,
            size_bytes: entry.size_bytes,
            duplicate_of,
        });
    }

    CleanupReport {
        entries: report_entries,
        reclaimable_bytes,
    }
}
