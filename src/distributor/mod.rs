//! Distributor subsystem: identities, inheritance, and rule sets.

pub mod permissions;
pub mod registry;
pub mod types;

pub use permissions::{PermissionReport, PermissionSet, RuleKind, SkippedCode};
pub use registry::{DistributorRegistry, MAX_CHAIN_DEPTH};
pub use types::{Distributor, DistributorError};
