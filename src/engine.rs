//! Permission engine. Owns the catalog and the registry and exposes the
//! four caller-facing operations: build the catalog, add a distributor,
//! set its permissions, and query.
//!
//! Nothing here is process-global; the caller constructs an engine and
//! passes it to whatever needs it.

use crate::distributor::{DistributorError, DistributorRegistry, PermissionReport};
use crate::region::{CatalogError, RegionCatalog, RegionRecord};
use crate::resolver::{Decision, PermissionResolver, TracingObserver};

#[derive(Debug, Default, Clone)]
pub struct PermissionEngine {
    catalog: RegionCatalog,
    registry: DistributorRegistry,
}

impl PermissionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-built catalog.
    pub fn with_catalog(catalog: RegionCatalog) -> Self {
        Self {
            catalog,
            registry: DistributorRegistry::new(),
        }
    }

    pub fn build_catalog<'a, I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = &'a RegionRecord>,
    {
        self.catalog.load(records)
    }

    /// Load raw six-field rows; fails on the first short row.
    pub fn build_catalog_rows<S: AsRef<str>>(&mut self, rows: &[Vec<S>]) -> Result<usize, CatalogError> {
        self.catalog.load_rows(rows)
    }

    pub fn add_distributor(&mut self, name: &str, parent: Option<&str>) -> Result<(), DistributorError> {
        self.registry.add(name, parent).map(|_| ())
    }

    /// Accumulate include/exclude rules for `name`. Unknown region codes are
    /// skipped and listed in the report.
    pub fn set_permissions<I, E>(&mut self, name: &str, includes: I, excludes: E) -> Result<PermissionReport, DistributorError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let distributor = self
            .registry
            .get_mut(name)
            .ok_or_else(|| DistributorError::UnknownDistributor(name.to_string()))?;
        let report = distributor.permissions.apply(&self.catalog, includes, excludes);
        tracing::debug!(
            distributor = name,
            included = report.included.len(),
            excluded = report.excluded.len(),
            skipped = report.skipped.len(),
            "permissions updated"
        );
        Ok(report)
    }

    pub fn has_permission(&self, distributor: &str, location: &str) -> bool {
        self.resolver().has_permission(distributor, location)
    }

    pub fn explain(&self, distributor: &str, location: &str) -> Decision {
        self.resolver().explain(distributor, location)
    }

    /// A resolver that reports its walk through `tracing`.
    pub fn resolver(&self) -> PermissionResolver<'_> {
        PermissionResolver::new(&self.catalog, &self.registry).with_observer(&TracingObserver)
    }

    pub fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &DistributorRegistry {
        &self.registry
    }
}
