//! SILL Client: implementations of the catalog API contract
//!
//! - [`InMemorySillApi`]: a seeded, mutable catalog held in memory
//! - [`CachedApiClient`]: memoizes the list endpoints of any client
//! - [`CatalogSeed`]: JSON description of an initial catalog

pub mod cached;
pub mod memory;
pub mod seed;

pub use cached::CachedApiClient;
pub use memory::{InMemorySillApi, MAX_EXTERNAL_RESULTS};
pub use seed::CatalogSeed;
