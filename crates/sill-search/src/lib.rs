//! SILL Search: fuzzy free-text matching over catalog records
//!
//! Record keys and queries go through the same [`normalizer`], then the
//! [`SearchIndex`] tolerates small typos in query words.
//!
//! # Example
//!
//! ```
//! use sill_core::SearchConfig;
//! use sill_search::SearchIndex;
//!
//! let index = SearchIndex::build(["LibreOffice office suite", "GIMP image editor"], &SearchConfig::default());
//! assert_eq!(index.search("imge editor"), vec![1]);
//! ```

pub mod index;
pub mod normalizer;

pub use index::{levenshtein, SearchIndex};
pub use normalizer::{is_blank, normalize, tokenize};
