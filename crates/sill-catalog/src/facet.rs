//! Facet-count aggregators
//!
//! For one facet, tally how many records of an already narrowed list carry
//! each value of that facet. The caller narrows with every filter except the
//! facet's own. Counting is a single forward scan; the output is sorted by
//! ascending count with ties left in discovery order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use sill_core::{Environment, Prerogative, SoftwareRecord};

use crate::RecordList;

/// One option of a facet sidebar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetCount<V> {
    pub value: V,
    pub software_count: usize,
}

impl<V> FacetCount<V> {
    fn zero(value: V) -> Self {
        Self {
            value,
            software_count: 0,
        }
    }
}

/// Which facet a filter or a count belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Facet {
    Organization,
    Category,
    Environment,
    Prerogative,
}

/// Stable sort by ascending count
fn sort_ascending<V>(counts: &mut [FacetCount<V>]) {
    counts.sort_by_key(|c| c.software_count);
}

/// Count string-valued facets
///
/// Values are discovered over the whole `catalog`, so an option stays listed
/// when its count drops to zero. Counts come from `narrowed`; a record
/// counts once per distinct value.
fn tally_observed(
    catalog: &RecordList,
    narrowed: &RecordList,
    values_of: for<'r> fn(&'r SoftwareRecord) -> &'r [String],
) -> Vec<FacetCount<String>> {
    let mut counts: Vec<FacetCount<String>> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for record in catalog.iter() {
        for value in values_of(record) {
            if !positions.contains_key(value.as_str()) {
                positions.insert(value.as_str(), counts.len());
                counts.push(FacetCount::zero(value.clone()));
            }
        }
    }

    let mut seen: Vec<usize> = Vec::new();
    for record in narrowed.iter() {
        seen.clear();
        for value in values_of(record) {
            if let Some(&position) = positions.get(value.as_str()) {
                if !seen.contains(&position) {
                    seen.push(position);
                    counts[position].software_count += 1;
                }
            }
        }
    }

    sort_ascending(&mut counts);
    counts
}

/// Count a closed set of boolean flags
fn tally_flags<V: Copy>(
    narrowed: &RecordList,
    values: &[V],
    has: impl Fn(&SoftwareRecord, V) -> bool,
) -> Vec<FacetCount<V>> {
    let mut counts: Vec<FacetCount<V>> = values.iter().copied().map(FacetCount::zero).collect();
    for record in narrowed.iter() {
        for count in counts.iter_mut() {
            if has(&**record, count.value) {
                count.software_count += 1;
            }
        }
    }
    sort_ascending(&mut counts);
    counts
}

pub fn organization_counts(catalog: &RecordList, narrowed: &RecordList) -> Vec<FacetCount<String>> {
    tally_observed(catalog, narrowed, |r| r.organizations.as_slice())
}

pub fn category_counts(catalog: &RecordList, narrowed: &RecordList) -> Vec<FacetCount<String>> {
    tally_observed(catalog, narrowed, |r| r.categories.as_slice())
}

/// Every environment is listed, even at zero
pub fn environment_counts(narrowed: &RecordList) -> Vec<FacetCount<Environment>> {
    tally_flags(narrowed, &Environment::ALL, |r, env| r.environments.get(env))
}

/// Every prerogative is listed, even at zero
pub fn prerogative_counts(narrowed: &RecordList) -> Vec<FacetCount<Prerogative>> {
    tally_flags(narrowed, &Prerogative::ALL, |r, p| r.prerogative(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::filter_by_organization;
    use crate::testutil::sample_catalog;

    fn count_of<V: PartialEq>(counts: &[FacetCount<V>], value: V) -> usize {
        counts
            .iter()
            .find(|c| c.value == value)
            .map(|c| c.software_count)
            .unwrap_or_else(|| panic!("value missing from facet"))
    }

    #[test]
    fn test_multi_valued_record_counts_in_each_value() {
        let catalog = sample_catalog();
        let counts = category_counts(&catalog, &catalog);
        // Inkscape is both "graphics" and "drawing"
        assert_eq!(count_of(&counts, "graphics".to_string()), 2);
        assert_eq!(count_of(&counts, "drawing".to_string()), 1);
        let total: usize = counts.iter().map(|c| c.software_count).sum();
        assert_eq!(total, catalog.len() + 1);
    }

    #[test]
    fn test_sorted_ascending_with_discovery_order_ties() {
        let catalog = sample_catalog();
        let counts = category_counts(&catalog, &catalog);
        let values: Vec<&str> = counts.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(
            values,
            vec!["office", "mail", "drawing", "media", "education", "graphics"]
        );
    }

    #[test]
    fn test_values_observed_over_whole_catalog() {
        let catalog = sample_catalog();
        let narrowed = filter_by_organization(&catalog, Some("CNRS"));
        let counts = category_counts(&catalog, &narrowed);
        assert_eq!(counts.len(), 6);
        assert_eq!(count_of(&counts, "office".to_string()), 0);
        assert_eq!(count_of(&counts, "graphics".to_string()), 2);
    }

    #[test]
    fn test_organization_counts() {
        let catalog = sample_catalog();
        let counts = organization_counts(&catalog, &catalog);
        assert_eq!(count_of(&counts, "DINUM".to_string()), 2);
        assert_eq!(count_of(&counts, "CNRS".to_string()), 2);
        assert_eq!(count_of(&counts, "Ministère".to_string()), 1);
    }

    #[test]
    fn test_environment_counts_list_every_environment() {
        let catalog = sample_catalog();
        let counts = environment_counts(&catalog);
        assert_eq!(counts.len(), Environment::ALL.len());
        assert_eq!(count_of(&counts, Environment::Linux), 4);
        assert_eq!(count_of(&counts, Environment::Browser), 1);
        assert_eq!(count_of(&counts, Environment::Smartphone), 1);
    }

    #[test]
    fn test_prerogative_counts_derive_installable() {
        let catalog = sample_catalog();
        let counts = prerogative_counts(&catalog);
        assert_eq!(count_of(&counts, Prerogative::IsInstallableOnUserTerminal), 5);
        assert_eq!(count_of(&counts, Prerogative::DoRespectRgaa), 2);
        assert_eq!(count_of(&counts, Prerogative::IsFromFrenchPublicServices), 1);
    }

    #[test]
    fn test_duplicate_values_in_one_record_count_once() {
        let mut record = SoftwareRecord::new(1, "Dup");
        record.categories = vec!["x".to_string(), "x".to_string()];
        let catalog: RecordList = vec![std::sync::Arc::new(record)].into();
        let counts = category_counts(&catalog, &catalog);
        assert_eq!(counts, vec![FacetCount { value: "x".to_string(), software_count: 1 }]);
    }
}
