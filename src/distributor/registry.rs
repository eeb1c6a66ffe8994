//! Distributor identities and their inheritance chain.
//!
//! A parent must already be registered when a child is added, and there is
//! no re-parenting or deletion, so parent links can never form a cycle.

use std::collections::BTreeMap;

use super::types::{Distributor, DistributorError};

/// Upper bound on parent hops followed during a chain walk.
pub const MAX_CHAIN_DEPTH: usize = 64;

#[derive(Debug, Default, Clone)]
pub struct DistributorRegistry {
    distributors: BTreeMap<String, Distributor>,
}

impl DistributorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a distributor with empty rule sets. Names are stored and
    /// matched exactly as given; a blank name is rejected.
    pub fn add(&mut self, name: &str, parent: Option<&str>) -> Result<&Distributor, DistributorError> {
        if name.trim().is_empty() {
            return Err(DistributorError::EmptyName);
        }
        if self.distributors.contains_key(name) {
            return Err(DistributorError::DuplicateName(name.to_string()));
        }
        if let Some(parent) = parent {
            if !self.distributors.contains_key(parent) {
                return Err(DistributorError::UnknownParent {
                    name: name.to_string(),
                    parent: parent.to_string(),
                });
            }
        }

        tracing::debug!(name, parent = parent.unwrap_or("-"), "distributor added");
        let distributor = Distributor::new(name, parent.map(str::to_string));
        Ok(self.distributors.entry(name.to_string()).or_insert(distributor))
    }

    pub fn get(&self, name: &str) -> Option<&Distributor> {
        self.distributors.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Distributor> {
        self.distributors.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.distributors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.distributors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distributors.is_empty()
    }

    /// All distributors sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Distributor> {
        self.distributors.values()
    }

    /// The named distributor followed by its ancestors, nearest first.
    /// Empty if the name is unknown. At most `MAX_CHAIN_DEPTH + 1` entries.
    pub fn chain(&self, name: &str) -> Vec<&Distributor> {
        let mut chain = Vec::new();
        let mut next = self.get(name);
        while let Some(d) = next {
            if chain.len() > MAX_CHAIN_DEPTH {
                tracing::warn!(name, "distributor chain exceeds depth limit, truncating");
                break;
            }
            chain.push(d);
            next = d.parent.as_deref().and_then(|p| self.get(p));
        }
        chain
    }
}
