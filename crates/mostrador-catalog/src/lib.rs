//! # Mostrador Catalog
//!
//! Local knowledge of the shop's catalog:
//!
//! - [`ingest`] turns loosely shaped upstream records into [`CatalogEntry`] values
//! - [`CatalogCache`] keeps a persisted snapshot with TTL staleness
//! - [`matching`] scores entries against a cleaned query
//! - [`ProductResolver`] combines live lookup, the cache and scoring to answer
//!   "which product is this message about"
//!
//! [`CatalogEntry`]: mostrador_core::CatalogEntry

pub mod cache;
pub mod ingest;
pub mod matching;
pub mod resolver;

pub use cache::{CacheError, CacheSnapshot, CatalogCache, CatalogView, SnapshotSource};
pub use matching::{Match, Matcher};
pub use resolver::ProductResolver;
