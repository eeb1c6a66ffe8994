//! Region hierarchy subsystem.
//!
//! Builds the country → state → city catalog from a flat table and walks
//! ancestry for the permission resolver.

pub mod catalog;
pub mod source;
pub mod types;

pub use catalog::{Ancestors, RegionCatalog};
pub use source::SourceError;
pub use types::{CatalogError, Region, RegionLevel, RegionRecord};
