//! Core types for the region subsystem.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Administrative level of a region. Hierarchies never go deeper than city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionLevel {
    Country,
    State,
    City,
}

impl RegionLevel {
    /// Number of regions in the ancestor chain of a region at this level,
    /// counting the region itself.
    pub fn depth(self) -> usize {
        match self {
            Self::Country => 1,
            Self::State => 2,
            Self::City => 3,
        }
    }
}

impl fmt::Display for RegionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Country => write!(f, "country"),
            Self::State => write!(f, "state"),
            Self::City => write!(f, "city"),
        }
    }
}

/// A node in the country → state → city hierarchy.
///
/// Parent and children are stored as codes; the catalog owns every region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub code: String,
    pub name: String,
    pub level: RegionLevel,
    /// Code of the enclosing region, `None` for a country.
    pub parent: Option<String>,
    /// Codes of regions whose parent is this region.
    #[serde(default)]
    pub children: BTreeSet<String>,
}

impl Region {
    pub(crate) fn new(code: String, name: String, level: RegionLevel, parent: Option<String>) -> Self {
        Self {
            code,
            name,
            level,
            parent,
            children: BTreeSet::new(),
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }
}

/// One row of the flat region table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub city_code: String,
    pub state_code: String,
    pub country_code: String,
    pub city_name: String,
    pub state_name: String,
    pub country_name: String,
}

/// Number of fields a region row must carry.
pub const RECORD_FIELDS: usize = 6;

impl RegionRecord {
    /// Parse a row of `(cityCode, stateCode, countryCode, cityName, stateName, countryName)`.
    ///
    /// Fields are trimmed; anything past the sixth field is ignored.
    /// Returns the number of fields found when the row is too short.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self, usize> {
        if fields.len() < RECORD_FIELDS {
            return Err(fields.len());
        }
        let f = |i: usize| fields[i].as_ref().trim().to_string();
        Ok(Self {
            city_code: f(0),
            state_code: f(1),
            country_code: f(2),
            city_name: f(3),
            state_name: f(4),
            country_name: f(5),
        })
    }

    pub fn country_key(&self) -> String {
        self.country_code.clone()
    }

    /// `STATE-COUNTRY`
    pub fn state_key(&self) -> String {
        format!("{}-{}", self.state_code, self.country_code)
    }

    /// `CITY-STATE-COUNTRY`
    pub fn city_key(&self) -> String {
        format!("{}-{}-{}", self.city_code, self.state_code, self.country_code)
    }
}

/// Region catalog errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// A row could not be split into its six fields.
    #[error("malformed region row {row}: expected {expected} fields, found {fields}", expected = RECORD_FIELDS)]
    MalformedInput { row: usize, fields: usize },
}
