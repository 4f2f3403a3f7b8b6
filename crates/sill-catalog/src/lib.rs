//! SILL Catalog: faceted search, filter and sort over the software catalog
//!
//! The catalog is fetched once and kept in memory. Every state change
//! re-derives the visible list and the facet sidebars synchronously.
//!
//! # Architecture
//!
//! ```text
//! records → search → organization → category → environment → prerogatives → sort → visible
//!              │            │             │            │              │
//!              └────────────┴─────────────┴────────────┴──────────────┘
//!                                         ↓
//!                 facet counts (each facet skips its own filter)
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sill_catalog::{CatalogQuery, CatalogSelectors, RecordList, SortId};
//! use sill_core::SoftwareRecord;
//!
//! let records: RecordList = vec![
//!     Arc::new(SoftwareRecord::new(1, "A").with_category("x").with_counts(5, 0).with_times(100, 100)),
//!     Arc::new(SoftwareRecord::new(2, "B").with_category("x").with_category("y").with_counts(1, 0).with_times(200, 200)),
//! ]
//! .into();
//!
//! let selectors = CatalogSelectors::default();
//!
//! let query = CatalogQuery::new().category("y");
//! let visible = selectors.visible_softwares(&records, &query);
//! assert_eq!(visible.len(), 1);
//! assert_eq!(visible[0].name, "B");
//!
//! let query = CatalogQuery::new().sorted_by(SortId::AddedTime);
//! let names: Vec<_> = selectors
//!     .visible_softwares(&records, &query)
//!     .iter()
//!     .map(|r| r.name.clone())
//!     .collect();
//! assert_eq!(names, ["B", "A"]);
//! ```

use std::sync::Arc;

pub mod facet;
pub mod filter;
pub mod query;
pub mod sort;
pub mod store;

#[cfg(test)]
mod testutil;

/// Shared, immutable catalog record
pub type Record = Arc<sill_core::SoftwareRecord>;

/// A catalog or a derived list of it; cheap to clone, compared by address
/// for memoization
pub type RecordList = Arc<[Record]>;

pub use facet::{Facet, FacetCount};
pub use filter::{
    filter_by_category, filter_by_environment, filter_by_organization, filter_by_prerogative,
    filter_by_prerogatives, SearchFilter,
};
pub use query::{narrow, CatalogQuery, CatalogSelectors, FacetSidebars};
pub use sort::{sort_records, SortId};
pub use store::{CatalogAction, CatalogState, CatalogStore, CatalogViewState};
