//! Descriptor indexing and store-folder resolution.

use rayon::prelude::*;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{CorrelationResult, DescriptorIndex, RepositoryConfig, RepositoryEntry};
use crate::error::{RepoError, RepoWarning};
use crate::events::{CorrelateEvent, CorrelateProgress, Event, EventSender};

/// Correlate without progress reporting
pub fn correlate(config: &RepositoryConfig) -> Result<CorrelationResult, RepoError> {
    correlate_with_events(config, &crate::events::null_sender())
}

/// Walk the descriptor directory and the store repository, resolving
/// store folders to published descriptor names by content equality.
///
/// Per-descriptor read failures and content collisions degrade to
/// warnings. A missing directory, an unreadable store listing, or a
/// failed folder measurement is fatal; a store folder whose internal
/// descriptor is merely absent is skipped.
pub fn correlate_with_events(
    config: &RepositoryConfig,
    events: &EventSender,
) -> Result<CorrelationResult, RepoError> {
    events.send(Event::Correlate(CorrelateEvent::Started));

    let (index, warnings) = build_descriptor_index(&config.descriptor_dir, events)?;
    events.send(Event::Correlate(CorrelateEvent::IndexBuilt {
        descriptors: index.len(),
    }));

    let entries = resolve_store_folders(&config.store_dir, &index, events)?;
    events.send(Event::Correlate(CorrelateEvent::Completed {
        total_entries: entries.len(),
    }));

    Ok(CorrelationResult { entries, warnings })
}

/// Read every published `oem*.inf` descriptor and index it by content.
///
/// Names are processed in sorted order so that first-seen-wins collision
/// handling does not depend on directory iteration order.
fn build_descriptor_index(
    descriptor_dir: &Path,
    events: &EventSender,
) -> Result<(DescriptorIndex, Vec<RepoWarning>), RepoError> {
    if !descriptor_dir.is_dir() {
        return Err(RepoError::DirectoryNotFound {
            path: descriptor_dir.to_path_buf(),
        });
    }

    let listing = fs::read_dir(descriptor_dir).map_err(|e| RepoError::ListDirectory {
        path: descriptor_dir.to_path_buf(),
        source: e,
    })?;

    let mut names = Vec::new();
    for entry in listing {
        let entry = entry.map_err(|e| RepoError::ListDirectory {
            path: descriptor_dir.to_path_buf(),
            source: e,
        })?;
        let Some(name) = entry.file_name().to_str().map(String::from) else {
            continue;
        };
        if is_published_descriptor(&name) {
            names.push(name);
        }
    }
    names.sort();

    let mut index = DescriptorIndex::new();
    let mut warnings = Vec::new();
    for name in names {
        let path = descriptor_dir.join(&name);
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) => {
                let warning = RepoWarning::UnreadableDescriptor {
                    path,
                    reason: e.to_string(),
                };
                warn!("{warning}");
                events.send(Event::Correlate(CorrelateEvent::Warning {
                    message: warning.to_string(),
                }));
                warnings.push(warning);
                continue;
            }
        };
        if let Some(kept) = index.insert(content, name.clone()) {
            let warning = RepoWarning::DuplicateDescriptorContent { kept, skipped: name };
            warn!("{warning}");
            events.send(Event::Correlate(CorrelateEvent::Warning {
                message: warning.to_string(),
            }));
            warnings.push(warning);
        }
    }

    Ok((index, warnings))
}

/// Published descriptors follow the `oem*.inf` naming scheme.
/// Comparison is case-insensitive to match Windows filename semantics.
fn is_published_descriptor(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with("oem") && lower.ends_with(".inf")
}

/// Examine every immediate store subdirectory and resolve it against
/// the index. Folders are measured in parallel; each folder's work is
/// independent and the output order is fixed later by the report sort.
fn resolve_store_folders(
    store_dir: &Path,
    index: &DescriptorIndex,
    events: &EventSender,
) -> Result<Vec<RepositoryEntry>, RepoError> {
    if !store_dir.is_dir() {
        return Err(RepoError::DirectoryNotFound {
            path: store_dir.to_path_buf(),
        });
    }

    let folder_pattern = Regex::new(r"(?i)^(.*?\.inf)_").unwrap();

    let listing = fs::read_dir(store_dir).map_err(|e| RepoError::ListDirectory {
        path: store_dir.to_path_buf(),
        source: e,
    })?;

    let mut folders: Vec<(PathBuf, String)> = Vec::new();
    for entry in listing {
        let entry = entry.map_err(|e| RepoError::ListDirectory {
            path: store_dir.to_path_buf(),
            source: e,
        })?;
        let file_type = entry.file_type().map_err(|e| RepoError::ListDirectory {
            path: store_dir.to_path_buf(),
            source: e,
        })?;
        if !file_type.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(String::from) else {
            continue;
        };
        folders.push((entry.path(), name));
    }
    folders.sort_by(|a, b| a.1.cmp(&b.1));

    events.send(Event::Correlate(CorrelateEvent::FoldersListed {
        total_folders: folders.len(),
    }));

    let folders_seen = AtomicUsize::new(0);
    let entries_resolved = AtomicUsize::new(0);

    let resolved: Vec<Option<RepositoryEntry>> = folders
        .par_iter()
        .map(|(folder_path, folder_name)| {
            let seen = folders_seen.fetch_add(1, Ordering::Relaxed) + 1;
            events.send(Event::Correlate(CorrelateEvent::Progress(
                CorrelateProgress {
                    folders_seen: seen,
                    entries_resolved: entries_resolved.load(Ordering::Relaxed),
                    current_path: folder_path.clone(),
                },
            )));

            // Not shaped like a driver-package folder; not ours to touch
            let Some(captures) = folder_pattern.captures(folder_name) else {
                return Ok(None);
            };
            let descriptor_file_name = captures[1].to_string();

            let descriptor_path = folder_path.join(&descriptor_file_name);
            let content = match fs::read(&descriptor_path) {
                Ok(content) => content,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(
                        path = %descriptor_path.display(),
                        "store folder has no internal descriptor, skipping"
                    );
                    return Ok(None);
                }
                Err(e) => {
                    return Err(RepoError::ReadDescriptor {
                        path: descriptor_path,
                        source: e,
                    });
                }
            };

            // Content not published under any oem*.inf name: a built-in
            // (non-OEM) package, which can never be reclaimable
            let Some(published_name) = index.resolve(&content) else {
                debug!(folder = %folder_path.display(), "descriptor not published, skipping");
                return Ok(None);
            };

            let size_bytes = folder_size(folder_path)?;
            entries_resolved.fetch_add(1, Ordering::Relaxed);

            Ok(Some(RepositoryEntry {
                folder_path: folder_path.clone(),
                descriptor_file_name,
                published_name: published_name.to_string(),
                size_bytes,
            }))
        })
        .collect::<Result<_, RepoError>>()?;

    Ok(resolved.into_iter().flatten().collect())
}

/// Recursive folder size. Every walked entry contributes its own
/// reported size, directories and the root folder included.
fn folder_size(path: &Path) -> Result<u64, RepoError> {
    let mut total = 0;
    for entry in WalkDir::new(path) {
        let entry = entry.map_err(|e| measure_error(path, e))?;
        let metadata = entry.metadata().map_err(|e| measure_error(path, e))?;
        total += metadata.len();
    }
    Ok(total)
}

fn measure_error(path: &Path, error: walkdir::Error) -> RepoError {
    // Only symlink cycles carry no underlying io error
    let message = error.to_string();
    RepoError::Measure {
        path: path.to_path_buf(),
        source: error
            .into_io_error()
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, message)),
    }
}
