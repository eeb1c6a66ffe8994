//! Per-distributor include/exclude rule sets.
//!
//! The two sets never share a code: excluding a region removes it from the
//! includes. Includes are applied before excludes in every update, so a code
//! named in both lists of one call ends up excluded. Including a code that
//! an earlier call excluded has no effect.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::region::RegionCatalog;

/// Which list a rule came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Include,
    Exclude,
}

/// A rule that named a region missing from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCode {
    pub code: String,
    pub kind: RuleKind,
}

/// Outcome of one permission update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionReport {
    /// Codes accepted into the include set by this call.
    pub included: Vec<String>,
    /// Codes accepted into the exclude set by this call.
    pub excluded: Vec<String>,
    /// Unknown region codes, skipped.
    pub skipped: Vec<SkippedCode>,
}

impl PermissionReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    includes: BTreeSet<String>,
    excludes: BTreeSet<String>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate rules validated against `catalog`. There is no clear;
    /// repeated calls add to what is already there.
    pub fn apply<I, E>(&mut self, catalog: &RegionCatalog, includes: I, excludes: E) -> PermissionReport
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let mut report = PermissionReport::default();

        for code in includes {
            let code = code.as_ref();
            if !catalog.contains(code) {
                tracing::warn!(code, "included region does not exist, skipping");
                report.skipped.push(SkippedCode { code: code.to_string(), kind: RuleKind::Include });
            } else if self.excludes.contains(code) {
                // Exclusions are sticky across calls.
                tracing::debug!(code, "region already excluded, include ignored");
            } else {
                self.includes.insert(code.to_string());
                report.included.push(code.to_string());
            }
        }

        for code in excludes {
            let code = code.as_ref();
            if catalog.contains(code) {
                self.includes.remove(code);
                self.excludes.insert(code.to_string());
                report.excluded.push(code.to_string());
            } else {
                tracing::warn!(code, "excluded region does not exist, skipping");
                report.skipped.push(SkippedCode { code: code.to_string(), kind: RuleKind::Exclude });
            }
        }

        // An exclude later in this call drops an include made earlier in it.
        report.included.retain(|c| !self.excludes.contains(c));
        report
    }

    pub fn is_included(&self, code: &str) -> bool {
        self.includes.contains(code)
    }

    pub fn is_excluded(&self, code: &str) -> bool {
        self.excludes.contains(code)
    }

    pub fn includes(&self) -> &BTreeSet<String> {
        &self.includes
    }

    pub fn excludes(&self) -> &BTreeSet<String> {
        &self.excludes
    }

    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::RegionRecord;

    fn catalog() -> RegionCatalog {
        RegionCatalog::from_records(&[
            RegionRecord::from_fields(&["BLR", "KA", "IN", "Bangalore", "Karnataka", "India"]).unwrap(),
            RegionRecord::from_fields(&["MAA", "TN", "IN", "Chennai", "Tamil Nadu", "India"]).unwrap(),
            RegionRecord::from_fields(&["SEA", "WA", "US", "Seattle", "Washington", "United States"]).unwrap(),
        ])
    }

    const NONE: [&str; 0] = [];

    #[test]
    fn test_apply_includes_and_excludes() {
        let catalog = catalog();
        let mut set = PermissionSet::new();
        let report = set.apply(&catalog, ["US", "IN"], ["KA-IN", "TN-IN"]);

        assert!(report.is_clean());
        assert!(set.is_included("US"));
        assert!(set.is_included("IN"));
        assert!(set.is_excluded("KA-IN"));
        assert!(set.is_excluded("TN-IN"));
    }

    #[test]
    fn test_exclude_wins_within_one_call() {
        let catalog = catalog();
        let mut set = PermissionSet::new();
        let report = set.apply(&catalog, ["KA-IN"], ["KA-IN"]);

        assert!(!set.is_included("KA-IN"));
        assert!(set.is_excluded("KA-IN"));
        assert!(report.included.is_empty());
        assert_eq!(report.excluded, vec!["KA-IN".to_string()]);
    }

    #[test]
    fn test_exclude_removes_earlier_include() {
        let catalog = catalog();
        let mut set = PermissionSet::new();
        set.apply(&catalog, ["IN"], NONE);
        set.apply(&catalog, NONE, ["IN"]);
        assert!(set.includes().is_empty());
        assert!(set.is_excluded("IN"));
    }

    #[test]
    fn test_sets_stay_disjoint() {
        let catalog = catalog();
        let mut set = PermissionSet::new();
        set.apply(&catalog, ["IN", "US", "KA-IN"], ["US"]);
        set.apply(&catalog, ["WA-US"], ["IN", "WA-US"]);
        assert!(set.includes().is_disjoint(set.excludes()));
    }

    #[test]
    fn test_include_after_exclude_is_ignored() {
        let catalog = catalog();
        let mut set = PermissionSet::new();
        set.apply(&catalog, NONE, ["IN"]);
        let report = set.apply(&catalog, ["IN", "US"], NONE);

        assert!(set.includes().is_disjoint(set.excludes()));
        assert!(set.is_excluded("IN"));
        assert!(!set.is_included("IN"));
        assert_eq!(report.included, vec!["US".to_string()]);
        assert!(report.is_clean());
    }

    #[test]
    fn test_unknown_codes_are_reported() {
        let catalog = catalog();
        let mut set = PermissionSet::new();
        let report = set.apply(&catalog, ["IN", "ZZ"], ["XX-IN"]);

        assert!(set.is_included("IN"));
        assert!(!set.is_included("ZZ"));
        assert!(!set.is_excluded("XX-IN"));
        assert_eq!(
            report.skipped,
            vec![
                SkippedCode { code: "ZZ".into(), kind: RuleKind::Include },
                SkippedCode { code: "XX-IN".into(), kind: RuleKind::Exclude },
            ]
        );
    }

    #[test]
    fn test_apply_accumulates() {
        let catalog = catalog();
        let mut set = PermissionSet::new();
        set.apply(&catalog, ["IN"], NONE);
        set.apply(&catalog, ["US"], NONE);
        set.apply(&catalog, ["US"], NONE);
        assert_eq!(set.includes().len(), 2);
    }
}
