//! Core types for the distributor subsystem.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::permissions::PermissionSet;

/// An actor whose regional access is governed by include/exclude rules,
/// optionally inheriting unresolved decisions from a parent distributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distributor {
    pub name: String,
    /// Consulted only when this distributor's own rules are silent.
    pub parent: Option<String>,
    #[serde(flatten)]
    pub permissions: PermissionSet,
}

impl Distributor {
    pub(crate) fn new(name: impl Into<String>, parent: Option<String>) -> Self {
        Self {
            name: name.into(),
            parent,
            permissions: PermissionSet::new(),
        }
    }
}

/// Distributor registry errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DistributorError {
    #[error("distributor '{0}' already exists")]
    DuplicateName(String),

    #[error("cannot add '{name}': parent distributor '{parent}' does not exist")]
    UnknownParent { name: String, parent: String },

    #[error("distributor '{0}' does not exist")]
    UnknownDistributor(String),

    #[error("distributor '{0}' already exists with a different parent")]
    ParentFixed(String),

    #[error("distributor name must not be empty")]
    EmptyName,
}
