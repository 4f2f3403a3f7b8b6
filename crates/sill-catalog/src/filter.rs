//! Filter predicates
//!
//! Every predicate takes the current narrowed list and one filter value and
//! returns a further narrowed list. Inputs are never mutated or reordered, and
//! an inactive filter hands back the very same list.

use std::collections::BTreeSet;
use std::sync::Arc;

use sill_core::{ByAddress, Environment, Memo, Prerogative, SearchConfig};
use sill_search::{is_blank, SearchIndex};

use crate::{Record, RecordList};

fn retain(records: &RecordList, keep: impl Fn(&Record) -> bool) -> RecordList {
    records.iter().filter(|r| keep(*r)).cloned().collect::<Vec<_>>().into()
}

pub fn filter_by_organization(records: &RecordList, organization: Option<&str>) -> RecordList {
    match organization {
        None => Arc::clone(records),
        Some(org) => retain(records, |r| r.has_organization(org)),
    }
}

pub fn filter_by_category(records: &RecordList, category: Option<&str>) -> RecordList {
    match category {
        None => Arc::clone(records),
        Some(category) => retain(records, |r| r.has_category(category)),
    }
}

pub fn filter_by_environment(records: &RecordList, environment: Option<Environment>) -> RecordList {
    match environment {
        None => Arc::clone(records),
        Some(env) => retain(records, |r| r.environments.get(env)),
    }
}

pub fn filter_by_prerogative(records: &RecordList, prerogative: Prerogative) -> RecordList {
    retain(records, |r| r.prerogative(prerogative))
}

/// Successive narrowing, one prerogative at a time
pub fn filter_by_prerogatives(records: &RecordList, prerogatives: &BTreeSet<Prerogative>) -> RecordList {
    prerogatives
        .iter()
        .fold(Arc::clone(records), |narrowed, p| filter_by_prerogative(&narrowed, *p))
}

/// Composite key a record is searched by
pub fn search_key(record: &Record) -> String {
    format!("{} {} {}", record.name, record.description, record.software_id)
}

/// Free-text predicate with single-slot caches
///
/// The index is rebuilt only when the record list changes, and the last
/// `(records, query)` result is kept.
pub struct SearchFilter {
    config: SearchConfig,
    index: Memo<ByAddress<[Record]>, Arc<SearchIndex>>,
    result: Memo<(ByAddress<[Record]>, String), RecordList>,
}

impl SearchFilter {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            index: Memo::new(),
            result: Memo::new(),
        }
    }

    pub fn apply(&self, records: &RecordList, query: &str) -> RecordList {
        if is_blank(query) {
            return Arc::clone(records);
        }

        let key = (ByAddress(Arc::clone(records)), query.to_string());
        self.result.get_or_compute(key, || {
            let index = self.index.get_or_compute(ByAddress(Arc::clone(records)), || {
                Arc::new(SearchIndex::build(records.iter().map(search_key), &self.config))
            });
            index
                .search(query)
                .into_iter()
                .map(|position| Arc::clone(&records[position]))
                .collect::<Vec<_>>()
                .into()
        })
    }

    /// Whether a search index is currently cached for `records`
    pub fn has_index_for(&self, records: &RecordList) -> bool {
        self.index.is_cached(&ByAddress(Arc::clone(records)))
    }
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}
