//! The region catalog: owns the immutable country/state/city hierarchy.
//!
//! Built once from flat `(city, state, country)` rows. Loading is idempotent:
//! a code that already exists is reused and its name is never overwritten.

use std::collections::BTreeMap;

use super::types::{CatalogError, Region, RegionLevel, RegionRecord};

/// Every region, keyed by composite code.
#[derive(Debug, Default, Clone)]
pub struct RegionCatalog {
    regions: BTreeMap<String, Region>,
}

impl RegionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from already-parsed records.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a RegionRecord>,
    {
        let mut catalog = Self::new();
        catalog.load(records);
        catalog
    }

    /// Insert every record, country first, then state, then city.
    /// Returns how many regions were newly created.
    pub fn load<'a, I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = &'a RegionRecord>,
    {
        let before = self.regions.len();
        for record in records {
            self.insert_record(record);
        }
        let created = self.regions.len() - before;
        tracing::debug!(created, total = self.regions.len(), "region records loaded");
        created
    }

    /// Insert raw string rows. Stops at the first row with fewer than six
    /// fields; rows before it remain loaded.
    pub fn load_rows<S: AsRef<str>>(&mut self, rows: &[Vec<S>]) -> Result<usize, CatalogError> {
        let before = self.regions.len();
        for (row, fields) in rows.iter().enumerate() {
            let record = RegionRecord::from_fields(fields.as_slice())
                .map_err(|fields| CatalogError::MalformedInput { row, fields })?;
            self.insert_record(&record);
        }
        Ok(self.regions.len() - before)
    }

    fn insert_record(&mut self, record: &RegionRecord) {
        let country = record.country_key();
        let state = record.state_key();
        let city = record.city_key();

        self.ensure(&country, &record.country_name, RegionLevel::Country, None);
        self.ensure(&state, &record.state_name, RegionLevel::State, Some(&country));
        self.ensure(&city, &record.city_name, RegionLevel::City, Some(&state));
    }

    fn ensure(&mut self, code: &str, name: &str, level: RegionLevel, parent: Option<&str>) {
        if self.regions.contains_key(code) {
            return;
        }
        let region = Region::new(code.to_string(), name.to_string(), level, parent.map(str::to_string));
        self.regions.insert(code.to_string(), region);
        if let Some(parent) = parent.and_then(|p| self.regions.get_mut(p)) {
            parent.children.insert(code.to_string());
        }
    }

    /// Exact-match lookup by composite code.
    pub fn lookup(&self, code: &str) -> Option<&Region> {
        self.regions.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.regions.contains_key(code)
    }

    /// The region itself, then its parent, up to the country.
    /// Empty for an unknown code.
    pub fn ancestors_of<'a>(&'a self, code: &str) -> Ancestors<'a> {
        Ancestors {
            catalog: self,
            next: self.lookup(code),
        }
    }

    /// Direct children of a region, in code order.
    pub fn children_of(&self, code: &str) -> Vec<&Region> {
        self.lookup(code)
            .map(|r| r.children.iter().filter_map(|c| self.lookup(c)).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// All regions sorted by code.
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }
}

/// Walk from a region up to its country. Borrowing iterator; each call to
/// [`RegionCatalog::ancestors_of`] starts a fresh walk.
pub struct Ancestors<'a> {
    catalog: &'a RegionCatalog,
    next: Option<&'a Region>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Region;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent.as_deref().and_then(|p| self.catalog.lookup(p));
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next {
            Some(r) => (1, Some(r.level.depth())),
            None => (0, Some(0)),
        }
    }
}
