//! Territory Gate — regional distribution rights.
//!
//! Regions form a country → state → city hierarchy loaded from a flat table.
//! Distributors carry include/exclude rules on region codes and may inherit
//! from a parent distributor. The resolver answers "may this distributor
//! operate here?" by walking from the most specific region upward.

pub mod config;
pub mod distributor;
pub mod engine;
pub mod policy;
pub mod region;
pub mod resolver;
pub mod server;

pub use distributor::{Distributor, DistributorError, DistributorRegistry, PermissionReport, PermissionSet};
pub use engine::PermissionEngine;
pub use region::{CatalogError, Region, RegionCatalog, RegionLevel, RegionRecord};
pub use resolver::{Decision, DecisionReason, PermissionResolver, ResolutionEvent, ResolutionObserver};
