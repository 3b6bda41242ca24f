//! # Error Module
//!
//! Error types for the driver-store cleaner.
//!
//! ## Design Principles
//! - **Abort before acting** - catalog/parsing errors are fatal before any
//!   deletion can be attempted; never act on a partially-understood catalog
//! - **Degrade during correlation** - per-file problems while reading
//!   descriptors become warnings, not run failures
//! - **Include context** - paths, offending lines, exit codes
//! - **Actionable messages** - tell the user what to check next

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum DriverCleanerError {
    #[error("Enumeration output error: {0}")]
    Parse(#[from] ParseError),

    #[error("Driver utility error: {0}")]
    Tool(#[from] ToolError),

    #[error("Driver repository error: {0}")]
    Repo(#[from] RepoError),

    #[error("Failed to write report to {}: {reason}", .path.display())]
    Export { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors while parsing the enumeration utility's text output.
///
/// All of these are fatal: a catalog built from output we only partially
/// understand must never feed a deletion decision.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unexpected utility banner: {first_line:?} (is this really pnputil output?)")]
    UnexpectedOutputHeader { first_line: String },

    #[error("Malformed driver record at line {line:?}: {context}")]
    MalformedRecord { line: String, context: String },

    #[error(
        "No single date convention fits every record ({sample:?} defeated both \
         day/month/year and month/day/year)"
    )]
    AmbiguousDateFormat { sample: String },
}

/// Errors from the external enumeration/deletion utility boundary
#[derive(Error, Debug)]
pub enum ToolError {
    #[error(
        "pnputil was not found on this system. On 64-bit Windows this usually means \
         a 32-bit process looking in the wrong system directory; use a 64-bit build."
    )]
    NotFound,

    #[error("pnputil enumeration failed{}\n{output}", match .code {
        Some(c) => format!(" (exit code {c})"),
        None => String::new(),
    })]
    InvocationFailed { code: Option<i32>, output: String },
}

/// Fatal errors while reading the driver-store repository.
///
/// Missing descriptors inside store folders and unreadable files in the
/// descriptor directory are NOT here - those degrade to [`RepoWarning`].
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Directory not found: {}", .path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed to list {}: {source}", .path.display())]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read descriptor {}: {source}", .path.display())]
    ReadDescriptor {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to measure {}: {source}", .path.display())]
    Measure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Non-fatal anomalies noticed while correlating.
///
/// These are collected into results and logged; they reduce the
/// completeness of the reclaim report but never its safety.
#[derive(Error, Debug)]
pub enum RepoWarning {
    #[error("Skipping unreadable descriptor {}: {reason}", .path.display())]
    UnreadableDescriptor { path: PathBuf, reason: String },

    #[error(
        "Descriptor {skipped} has byte-identical content to {kept}; keeping the \
         first-seen mapping"
    )]
    DuplicateDescriptorContent { kept: String, skipped: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, DriverCleanerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_record_includes_offending_line() {
        let error = ParseError::MalformedRecord {
            line: "garbage without a colon".to_string(),
            context: "expected a labelled field".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("garbage without a colon"));
        assert!(message.contains("expected a labelled field"));
    }

    #[test]
    fn tool_not_found_hints_at_architecture() {
        let message = ToolError::NotFound.to_string();
        assert!(message.contains("64-bit"));
    }

    #[test]
    fn invocation_failed_carries_exit_code() {
        let error = ToolError::InvocationFailed {
            code: Some(3),
            output: "boom".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("exit code 3"));
        assert!(message.contains("boom"));
    }

    #[test]
    fn repo_error_includes_path() {
        let error = RepoError::ReadDescriptor {
            path: PathBuf::from("/store/oem7.inf_amd64_abc/oem7.inf"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = error.to_string();
        assert!(message.contains("oem7.inf_amd64_abc"));
    }

    #[test]
    fn duplicate_content_warning_names_both_files() {
        let warning = RepoWarning::DuplicateDescriptorContent {
            kept: "oem1.inf".to_string(),
            skipped: "oem9.inf".to_string(),
        };
        let message = warning.to_string();
        assert!(message.contains("oem1.inf"));
        assert!(message.contains("oem9.inf"));
    }
}
