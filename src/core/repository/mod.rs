//! # Repository Module
//!
//! Correlates on-disk driver storage with the catalog.
//!
//! The driver store keeps one folder per staged package, named
//! `<descriptor>.inf_<suffix>`, with a copy of the descriptor file
//! inside. The published `oemNN.inf` files live elsewhere, in a flat
//! descriptor directory, and nothing ties the two together by name.
//! The correlation key is the descriptor *content*: a store folder
//! belongs to `oem42.inf` exactly when its internal descriptor file is
//! byte-identical to the published one.
//!
//! ## Example
//! ```rust,ignore
//! use driver_store_cleaner::core::repository::{correlate, RepositoryConfig};
//!
//! let config = RepositoryConfig::from_system_root(r"C:\Windows");
//! let correlation = correlate(&config)?;
//! println!("{} OEM folders", correlation.entries.len());
//! ```

mod correlator;

pub use correlator::{correlate, correlate_with_events};

use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::RepoWarning;

/// Filesystem locations the correlator reads.
///
/// Always passed explicitly so tests can point the correlator at a
/// fixture tree instead of a live Windows installation.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Flat directory holding the published `oem*.inf` descriptor files
    pub descriptor_dir: PathBuf,
    /// Driver-store repository root, one subdirectory per staged package
    pub store_dir: PathBuf,
}

impl RepositoryConfig {
    /// Derive both locations from a Windows installation root,
    /// e.g. the `SystemRoot` environment variable.
    pub fn from_system_root(system_root: impl Into<PathBuf>) -> Self {
        let root = system_root.into();
        Self {
            descriptor_dir: root.join("inf"),
            store_dir: root
                .join("system32")
                .join("DriverStore")
                .join("FileRepository"),
        }
    }
}

/// One driver-store folder resolved to a catalog identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryEntry {
    /// Full path of the store folder
    pub folder_path: PathBuf,
    /// Descriptor file name extracted from the folder name,
    /// e.g. `nvlddmkm.inf` out of `nvlddmkm.inf_amd64_7f3a`
    pub descriptor_file_name: String,
    /// Published name the folder's descriptor content resolved to
    pub published_name: String,
    /// Recursive size of the folder. Every directory entry contributes
    /// its own reported size, the folder itself included, so this runs
    /// slightly above a plain sum of file sizes.
    pub size_bytes: u64,
}

/// Descriptor content to published descriptor file name.
///
/// Keyed by exact byte content. Two published descriptors with
/// identical bytes keep only the first-seen name; the collision is
/// reported as a warning, never an error.
#[derive(Debug, Clone, Default)]
pub struct DescriptorIndex {
    by_content: HashMap<Vec<u8>, String>,
}

impl DescriptorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor under its content key.
    ///
    /// On a content collision the existing mapping is kept and its name
    /// is returned so the caller can report the skipped file.
    pub fn insert(&mut self, content: Vec<u8>, descriptor_file_name: String) -> Option<String> {
        match self.by_content.entry(content) {
            Entry::Occupied(kept) => Some(kept.get().clone()),
            Entry::Vacant(slot) => {
                slot.insert(descriptor_file_name);
                None
            }
        }
    }

    /// Resolve descriptor content to its published name
    pub fn resolve(&self, content: &[u8]) -> Option<&str> {
        self.by_content.get(content).map(String::as_str)
    }

    /// Number of distinct descriptor contents indexed
    pub fn len(&self) -> usize {
        self.by_content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_content.is_empty()
    }
}

/// Result of a correlation run
#[derive(Debug)]
pub struct CorrelationResult {
    /// Store folders that resolved to a published descriptor
    pub entries: Vec<RepositoryEntry>,
    /// Non-fatal anomalies noticed along the way
    pub warnings: Vec<RepoWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_derives_both_paths_from_system_root() {
        let config = RepositoryConfig::from_system_root("/mnt/windows");
        assert_eq!(config.descriptor_dir, PathBuf::from("/mnt/windows/inf"));
        assert_eq!(
            config.store_dir,
            PathBuf::from("/mnt/windows/system32/DriverStore/FileRepository")
        );
    }

    #[test]
    fn index_resolves_by_exact_content() {
        let mut index = DescriptorIndex::new();
        assert!(index.insert(b"[Version]\nA".to_vec(), "oem1.inf".into()).is_none());
        assert!(index.insert(b"[Version]\nB".to_vec(), "oem2.inf".into()).is_none());

        assert_eq!(index.len(), 2);
        assert_eq!(index.resolve(b"[Version]\nA"), Some("oem1.inf"));
        assert_eq!(index.resolve(b"[Version]\nC"), None);
    }

    #[test]
    fn index_keeps_first_seen_on_collision() {
        let mut index = DescriptorIndex::new();
        assert!(index.insert(b"same bytes".to_vec(), "oem1.inf".into()).is_none());

        let kept = index.insert(b"same bytes".to_vec(), "oem9.inf".into());
        assert_eq!(kept.as_deref(), Some("oem1.inf"));

        assert_eq!(index.len(), 1);
        assert_eq!(index.resolve(b"same bytes"), Some("oem1.inf"));
    }
}
