//! Sort comparators
//!
//! Sorting is stable: records with equal keys keep their relative order, so
//! sorting an already sorted list leaves it unchanged.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use sill_core::SoftwareRecord;

use crate::RecordList;

/// Named sort orders offered by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortId {
    #[serde(rename = "added_time")]
    AddedTime,
    #[serde(rename = "update_time")]
    UpdateTime,
    #[serde(rename = "last_version_publication_date")]
    LastVersionPublicationDate,
    #[serde(rename = "user_count")]
    UserCount,
    #[serde(rename = "user_count_ASC")]
    UserCountAsc,
    #[serde(rename = "referent_count")]
    ReferentCount,
    #[serde(rename = "referent_count_ASC")]
    ReferentCountAsc,
}

impl SortId {
    pub const ALL: [SortId; 7] = [
        SortId::AddedTime,
        SortId::UpdateTime,
        SortId::LastVersionPublicationDate,
        SortId::UserCount,
        SortId::UserCountAsc,
        SortId::ReferentCount,
        SortId::ReferentCountAsc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddedTime => "added_time",
            Self::UpdateTime => "update_time",
            Self::LastVersionPublicationDate => "last_version_publication_date",
            Self::UserCount => "user_count",
            Self::UserCountAsc => "user_count_ASC",
            Self::ReferentCount => "referent_count",
            Self::ReferentCountAsc => "referent_count_ASC",
        }
    }

    /// Only the two `_ASC` orders put the smallest value first
    pub fn is_ascending(&self) -> bool {
        matches!(self, Self::UserCountAsc | Self::ReferentCountAsc)
    }

    fn key(&self, record: &SoftwareRecord) -> i64 {
        match self {
            Self::AddedTime => record.added_time,
            Self::UpdateTime => record.update_time,
            Self::LastVersionPublicationDate => record.last_version_publication_time(),
            Self::UserCount | Self::UserCountAsc => i64::from(record.user_count),
            Self::ReferentCount | Self::ReferentCountAsc => i64::from(record.referent_count),
        }
    }

    /// Compare two records under this order
    pub fn compare(&self, a: &SoftwareRecord, b: &SoftwareRecord) -> Ordering {
        let (ka, kb) = (self.key(a), self.key(b));
        if self.is_ascending() {
            ka.cmp(&kb)
        } else {
            kb.cmp(&ka)
        }
    }
}

impl fmt::Display for SortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown sort '{}'", s))
    }
}

/// Sort an already filtered list; `None` keeps catalog order
pub fn sort_records(records: &RecordList, sort: Option<SortId>) -> RecordList {
    match sort {
        None => Arc::clone(records),
        Some(sort) => {
            let mut sorted = records.to_vec();
            // `sort_by` is a stable merge sort
            sorted.sort_by(|a, b| sort.compare(a, b));
            sorted.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_catalog;

    fn names(records: &RecordList) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_added_time_is_descending() {
        let sorted = sort_records(&sample_catalog(), Some(SortId::AddedTime));
        assert_eq!(
            names(&sorted),
            vec!["Moodle", "VLC", "Inkscape", "GIMP", "Thunderbird", "LibreOffice"]
        );
    }

    #[test]
    fn test_missing_last_version_sorts_last() {
        let sorted = sort_records(&sample_catalog(), Some(SortId::LastVersionPublicationDate));
        // Thunderbird and Moodle have no published version, kept in catalog order
        assert_eq!(
            names(&sorted),
            vec!["Inkscape", "VLC", "LibreOffice", "GIMP", "Thunderbird", "Moodle"]
        );
    }

    #[test]
    fn test_equal_keys_keep_input_order() {
        let sorted = sort_records(&sample_catalog(), Some(SortId::UserCount));
        // Thunderbird and VLC both have 30 users, GIMP and Inkscape 10
        assert_eq!(
            names(&sorted),
            vec!["LibreOffice", "Thunderbird", "VLC", "GIMP", "Inkscape", "Moodle"]
        );

        let sorted = sort_records(&sample_catalog(), Some(SortId::UserCountAsc));
        assert_eq!(
            names(&sorted),
            vec!["Moodle", "GIMP", "Inkscape", "Thunderbird", "VLC", "LibreOffice"]
        );
    }

    #[test]
    fn test_sort_is_idempotent() {
        let catalog = sample_catalog();
        for sort in SortId::ALL {
            let once = sort_records(&catalog, Some(sort));
            let twice = sort_records(&once, Some(sort));
            assert_eq!(names(&once), names(&twice), "not idempotent: {}", sort);
        }
    }

    #[test]
    fn test_no_sort_keeps_list() {
        let catalog = sample_catalog();
        assert!(Arc::ptr_eq(&catalog, &sort_records(&catalog, None)));
    }

    #[test]
    fn test_sort_id_wire_names() {
        for sort in SortId::ALL {
            assert_eq!(sort.as_str().parse::<SortId>(), Ok(sort));
            assert_eq!(serde_json::to_value(sort).unwrap(), sort.as_str());
        }
        assert!("best_match".parse::<SortId>().is_err());
    }
}
