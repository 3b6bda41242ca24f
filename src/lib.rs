//! # Driver Store Cleaner
//!
//! A cautious cleaner for the Windows driver store that finds staged
//! driver packages superseded by a newer version and explains exactly
//! what is safe to reclaim.
//!
//! ## Core Philosophy
//! - **Never delete unprompted** - Scanning and deleting are separate steps
//! - **Show WHY** - Every reclaimable folder names the driver that supersedes it
//! - **Degrade, don't die** - Odd descriptors become warnings, not aborts
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and presentation layers:
//! - `core` - The duplicate-driver detection and cleanup engine
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - User-friendly error types
//! - `cli` - Command-line interface (in the binary)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{DriverCleanerError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
