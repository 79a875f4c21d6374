//! Shared vocabulary for the Mostrador workspace.
//!
//! Everything that more than one crate needs to agree on lives here: the
//! closed set of intents, catalog entries and their raw wire shape, orders,
//! the single price normalization point and the application configuration.

pub mod config;
pub mod error;
pub mod pricing;
pub mod types;

pub use config::*;
pub use error::*;
pub use pricing::PriceNormalizer;
pub use types::*;
