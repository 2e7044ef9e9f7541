pub mod config;
pub mod index;
pub mod snapshot;

pub use config::IndexConfig;
pub use index::{CatalogIndex, ScoredEntry};
pub use snapshot::{Catalog, CatalogEntry};
