//! # Catalog Module
//!
//! The in-memory model of staged OEM drivers.
//!
//! A catalog is built once per run from the enumeration utility's text
//! output and is read-only afterwards. Records are keyed by their
//! published name (`oem42.inf` style) and keep their enumeration order.
//!
//! ## Example
//! ```rust,ignore
//! use driver_store_cleaner::core::catalog::parse_enumeration;
//!
//! let output = std::fs::read_to_string("pnputil-e.txt")?;
//! let catalog = parse_enumeration(&output)?;
//! println!("{} staged drivers", catalog.len());
//! ```

mod dates;
mod parser;

pub use dates::{resolve_date_format, DateFormat};
pub use parser::parse_enumeration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One staged driver as reported by the enumeration utility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverRecord {
    /// Published descriptor name, e.g. `oem42.inf`. Unique within a catalog.
    pub published_name: String,
    /// Free-text vendor string, e.g. `Intel Corporation`
    pub provider: String,
    /// Free-text device-class string, e.g. `Display adapters`
    pub class_name: String,
    /// Signer/compatibility string. May be empty for unsigned packages.
    pub signer: String,
    /// Date portion of the "date version" pair, exactly as emitted
    pub raw_date: String,
    /// Version portion of the "date version" pair, exactly as emitted
    pub raw_version: String,
    /// Numeric version components extracted from `raw_version`
    pub version: DriverVersion,
    /// Driver date, resolved under the catalog-wide date format
    pub date: NaiveDate,
}

/// Driver version as an ordered tuple of numeric components.
///
/// Comparison is component-wise numeric, so `31.0.15.3598` beats
/// `31.0.9.1234` and `1.10` beats `1.9`. A shorter tuple that is a
/// prefix of a longer one sorts older, and an empty tuple (no digits
/// in the version text) sorts older than everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DriverVersion(Vec<u32>);

impl DriverVersion {
    pub fn new(components: Vec<u32>) -> Self {
        Self(components)
    }

    /// The numeric components in order
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// True when no digits could be extracted from the version text
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// All staged drivers known to the system, keyed by published name.
///
/// Enumeration order is preserved; inserting a record under an already
/// known published name replaces the earlier record in place.
#[derive(Debug, Clone, Default)]
pub struct DriverCatalog {
    records: Vec<DriverRecord>,
    index: HashMap<String, usize>,
}

impl DriverCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any earlier record with the same
    /// published name (last-wins, like plain map semantics).
    pub fn insert(&mut self, record: DriverRecord) {
        match self.index.get(&record.published_name) {
            Some(&slot) => self.records[slot] = record,
            None => {
                self.index
                    .insert(record.published_name.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Look up a record by published name
    pub fn get(&self, published_name: &str) -> Option<&DriverRecord> {
        self.index
            .get(published_name)
            .map(|&slot| &self.records[slot])
    }

    /// Iterate records in enumeration order
    pub fn iter(&self) -> impl Iterator<Item = &DriverRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
