//! # Classifier Module
//!
//! Groups staged drivers into equivalence classes and decides, per
//! class, which member is canonical and which are superseded.
//!
//! ## How It Works
//! 1. Group catalog records by `(class, provider, signer)`
//! 2. Drop groups with a single member (nothing to supersede)
//! 3. Sort each remaining group newest-first by `(version, date)`
//! 4. The first member is canonical; every other member maps to it
//!
//! The equivalence key is a heuristic, not a guarantee from the
//! platform: two packages from one vendor for one device class with one
//! signer are assumed to be versions of the same logical driver. The
//! classifier never touches the filesystem and never decides deletion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::catalog::{DriverCatalog, DriverRecord};

/// The identity heuristic for "same logical driver".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EquivalenceKey {
    pub class_name: String,
    pub provider: String,
    pub signer: String,
}

impl EquivalenceKey {
    pub fn of(record: &DriverRecord) -> Self {
        Self {
            class_name: record.class_name.clone(),
            provider: record.provider.clone(),
            signer: record.signer.clone(),
        }
    }
}

/// Mapping from superseded published name to the canonical (newest)
/// published name of its equivalence class.
///
/// Built once per run from the catalog, read-only afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateMap {
    canonical_by_superseded: HashMap<String, String>,
}

impl DuplicateMap {
    /// The canonical name this driver is superseded by, if any
    pub fn canonical_for(&self, published_name: &str) -> Option<&str> {
        self.canonical_by_superseded
            .get(published_name)
            .map(String::as_str)
    }

    /// True when this driver is an older member of some class
    pub fn is_superseded(&self, published_name: &str) -> bool {
        self.canonical_by_superseded.contains_key(published_name)
    }

    /// Number of superseded drivers
    pub fn len(&self) -> usize {
        self.canonical_by_superseded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical_by_superseded.is_empty()
    }

    /// Iterate `(superseded, canonical)` pairs in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.canonical_by_superseded
            .iter()
            .map(|(superseded, canonical)| (superseded.as_str(), canonical.as_str()))
    }
}

/// Classify the catalog into a duplicate map.
///
/// Pure function of the catalog. Within a group the sort is stable, so
/// records tied on both version and date keep their enumeration order
/// and the result is deterministic for a given catalog.
pub fn classify(catalog: &DriverCatalog) -> DuplicateMap {
    let mut groups: HashMap<EquivalenceKey, Vec<&DriverRecord>> = HashMap::new();
    for record in catalog.iter() {
        groups
            .entry(EquivalenceKey::of(record))
            .or_default()
            .push(record);
    }

    let mut canonical_by_superseded = HashMap::new();
    for mut members in groups.into_values() {
        if members.len() < 2 {
            continue;
        }
        members.sort_by(|a, b| b.version.cmp(&a.version).then_with(|| b.date.cmp(&a.date)));
        let canonical = members[0].published_name.clone();
        for superseded in &members[1..] {
            canonical_by_superseded.insert(superseded.published_name.clone(), canonical.clone());
        }
    }

    DuplicateMap {
        canonical_by_superseded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::DriverVersion;
    use chrono::NaiveDate;

    fn record(name: &str, class: &str, version: &[u32], date: (i32, u32, u32)) -> DriverRecord {
        DriverRecord {
            published_name: name.to_string(),
            provider: "Contoso".to_string(),
            class_name: class.to_string(),
            signer: "Contoso CA".to_string(),
            raw_date: format!("{:02}/{:02}/{}", date.2, date.1, date.0),
            raw_version: version
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join("."),
            version: DriverVersion::new(version.to_vec()),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        }
    }

    fn catalog_of(records: Vec<DriverRecord>) -> DriverCatalog {
        let mut catalog = DriverCatalog::new();
        for r in records {
            catalog.insert(r);
        }
        catalog
    }

    #[test]
    fn newest_version_is_canonical() {
        let catalog = catalog_of(vec![
            record("oem1.inf", "Display", &[1, 0], (2021, 6, 1)),
            record("oem2.inf", "Display", &[2, 0], (2020, 1, 1)),
            record("oem3.inf", "Keyboard", &[9, 9], (2022, 1, 1)),
        ]);

        let duplicates = classify(&catalog);

        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates.canonical_for("oem1.inf"), Some("oem2.inf"));
        assert!(!duplicates.is_superseded("oem2.inf"));
        assert!(!duplicates.is_superseded("oem3.inf"));
    }

    #[test]
    fn version_beats_date() {
        // oem1 is newer by date but older by version; version decides
        let catalog = catalog_of(vec![
            record("oem1.inf", "Display", &[1, 9], (2023, 12, 31)),
            record("oem2.inf", "Display", &[1, 10], (2020, 1, 1)),
        ]);

        let duplicates = classify(&catalog);

        assert_eq!(duplicates.canonical_for("oem1.inf"), Some("oem2.inf"));
    }

    #[test]
    fn date_breaks_version_ties() {
        let catalog = catalog_of(vec![
            record("oem1.inf", "Display", &[5, 0], (2020, 1, 1)),
            record("oem2.inf", "Display", &[5, 0], (2021, 1, 1)),
        ]);

        let duplicates = classify(&catalog);

        assert_eq!(duplicates.canonical_for("oem1.inf"), Some("oem2.inf"));
    }

    #[test]
    fn full_tie_keeps_enumeration_order() {
        // Identical version and date: the stable sort keeps the earlier
        // enumerated record first, so it becomes canonical
        let catalog = catalog_of(vec![
            record("oem1.inf", "Display", &[5, 0], (2020, 1, 1)),
            record("oem2.inf", "Display", &[5, 0], (2020, 1, 1)),
        ]);

        let duplicates = classify(&catalog);

        assert_eq!(duplicates.canonical_for("oem2.inf"), Some("oem1.inf"));
        assert!(!duplicates.is_superseded("oem1.inf"));
    }

    #[test]
    fn singleton_groups_produce_no_duplicates() {
        let catalog = catalog_of(vec![
            record("oem1.inf", "Display", &[1, 0], (2020, 1, 1)),
            record("oem2.inf", "Keyboard", &[1, 0], (2020, 1, 1)),
        ]);

        assert!(classify(&catalog).is_empty());
    }

    #[test]
    fn empty_version_is_superseded_by_any_version() {
        let catalog = catalog_of(vec![
            record("oem1.inf", "Display", &[], (2023, 1, 1)),
            record("oem2.inf", "Display", &[0, 1], (2020, 1, 1)),
        ]);

        let duplicates = classify(&catalog);

        assert_eq!(duplicates.canonical_for("oem1.inf"), Some("oem2.inf"));
    }

    #[test]
    fn three_member_class_maps_all_older_to_newest() {
        let catalog = catalog_of(vec![
            record("oem1.inf", "Display", &[1, 0], (2019, 1, 1)),
            record("oem2.inf", "Display", &[3, 0], (2021, 1, 1)),
            record("oem3.inf", "Display", &[2, 0], (2020, 1, 1)),
        ]);

        let duplicates = classify(&catalog);

        assert_eq!(duplicates.len(), 2);
        let mut pairs: Vec<_> = duplicates.iter().collect();
        pairs.sort();
        assert_eq!(pairs, vec![("oem1.inf", "oem2.inf"), ("oem3.inf", "oem2.inf")]);
    }

    #[test]
    fn provider_and_signer_split_classes() {
        let mut a = record("oem1.inf", "Display", &[1, 0], (2020, 1, 1));
        a.provider = "Contoso".to_string();
        let mut b = record("oem2.inf", "Display", &[2, 0], (2021, 1, 1));
        b.provider = "Fabrikam".to_string();
        let mut c = record("oem3.inf", "Display", &[3, 0], (2022, 1, 1));
        c.signer = "Other CA".to_string();

        let duplicates = classify(&catalog_of(vec![a, b, c]));

        assert!(duplicates.is_empty());
    }

    #[test]
    fn empty_catalog_classifies_to_empty_map() {
        assert!(classify(&DriverCatalog::new()).is_empty());
    }
}
