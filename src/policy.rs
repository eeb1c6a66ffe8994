//! File-based distributor policy at ~/.territory/policy.json.
//!
//! Lists distributors with their parent and include/exclude codes. Entries are
//! applied in file order, so a parent must appear before its children.
//! Missing fields default gracefully.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::distributor::{DistributorError, PermissionReport};
use crate::engine::PermissionEngine;

/// One distributor entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributorPolicy {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub distributors: Vec<DistributorPolicy>,
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("cannot read policy {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write policy {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid policy JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Distributor(#[from] DistributorError),
}

impl PolicyFile {
    /// Load from `path`. A missing file is an empty policy.
    pub fn load_from(path: &Path) -> Result<Self, PolicyError> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(PolicyError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        Ok(serde_json::from_str(&data)?)
    }

    /// Stamp `updated_at` and write pretty JSON, creating parent directories.
    pub fn save_to(&mut self, path: &Path) -> Result<(), PolicyError> {
        let write_err = |source| PolicyError::Write {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.updated_at = Some(Utc::now());
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(write_err)
    }

    pub fn get(&self, name: &str) -> Option<&DistributorPolicy> {
        self.distributors.iter().find(|d| d.name == name)
    }

    /// Insert a new entry or extend an existing one. A parent can only be set
    /// when the entry is first created.
    pub fn upsert(&mut self, name: &str, parent: Option<&str>, include: &[String], exclude: &[String]) -> Result<(), DistributorError> {
        if let Some(existing) = self.distributors.iter_mut().find(|d| d.name == name) {
            if parent.is_some() && parent != existing.parent.as_deref() {
                return Err(DistributorError::ParentFixed(name.to_string()));
            }
            existing.include.extend(include.iter().cloned());
            existing.exclude.extend(exclude.iter().cloned());
            return Ok(());
        }
        if let Some(parent) = parent {
            if self.get(parent).is_none() {
                return Err(DistributorError::UnknownParent {
                    name: name.to_string(),
                    parent: parent.to_string(),
                });
            }
        }
        self.distributors.push(DistributorPolicy {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            include: include.to_vec(),
            exclude: exclude.to_vec(),
        });
        Ok(())
    }

    /// Register every distributor in `engine` and apply its rules.
    /// Returns one report per entry, in file order.
    pub fn apply(&self, engine: &mut PermissionEngine) -> Result<Vec<PermissionReport>, PolicyError> {
        let mut reports = Vec::with_capacity(self.distributors.len());
        for entry in &self.distributors {
            engine.add_distributor(&entry.name, entry.parent.as_deref())?;
            reports.push(engine.set_permissions(&entry.name, &entry.include, &entry.exclude)?);
        }
        tracing::info!(distributors = reports.len(), "policy applied");
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::RegionRecord;
    use tempfile::TempDir;

    fn engine() -> PermissionEngine {
        let mut engine = PermissionEngine::new();
        engine.build_catalog(&[
            RegionRecord::from_fields(&["BLR", "KA", "IN", "Bangalore", "Karnataka", "India"]).unwrap(),
            RegionRecord::from_fields(&["MAA", "TN", "IN", "Chennai", "Tamil Nadu", "India"]).unwrap(),
            RegionRecord::from_fields(&["SEA", "WA", "US", "Seattle", "Washington", "United States"]).unwrap(),
        ]);
        engine
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let policy = PolicyFile::load_from(&dir.path().join("policy.json")).unwrap();
        assert!(policy.distributors.is_empty());
        assert!(policy.updated_at.is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("policy.json");

        let mut policy = PolicyFile::default();
        policy.upsert("DISTRIBUTOR1", None, &["US".into(), "IN".into()], &["KA-IN".into()]).unwrap();
        policy.upsert("DISTRIBUTOR2", Some("DISTRIBUTOR1"), &[], &["TN-IN".into()]).unwrap();
        policy.save_to(&path).unwrap();

        let loaded = PolicyFile::load_from(&path).unwrap();
        assert!(loaded.updated_at.is_some());
        assert_eq!(loaded.distributors, policy.distributors);
    }

    #[test]
    fn test_minimal_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("policy.json");
        fs::write(&path, r#"{ "distributors": [ { "name": "D1", "include": ["IN"] } ] }"#).unwrap();

        let policy = PolicyFile::load_from(&path).unwrap();
        let d1 = policy.get("D1").unwrap();
        assert!(d1.parent.is_none());
        assert!(d1.exclude.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("policy.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(PolicyFile::load_from(&path), Err(PolicyError::Json(_))));
    }

    #[test]
    fn test_apply_builds_registry() {
        let mut policy = PolicyFile::default();
        policy.upsert("PARENT", None, &["IN".into()], &["KA-IN".into()]).unwrap();
        policy.upsert("CHILD", Some("PARENT"), &["KA-IN".into(), "ZZ".into()], &[]).unwrap();

        let mut engine = engine();
        let reports = policy.apply(&mut engine).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].is_clean());
        assert_eq!(reports[1].skipped.len(), 1);

        assert!(engine.has_permission("CHILD", "BLR-KA-IN"));
        assert!(engine.has_permission("CHILD", "MAA-TN-IN"));
        assert!(!engine.has_permission("PARENT", "BLR-KA-IN"));
        assert!(!engine.has_permission("CHILD", "SEA-WA-US"));
    }

    #[test]
    fn test_apply_child_before_parent_fails() {
        let policy = PolicyFile {
            updated_at: None,
            distributors: vec![
                DistributorPolicy { name: "CHILD".into(), parent: Some("PARENT".into()), ..Default::default() },
                DistributorPolicy { name: "PARENT".into(), ..Default::default() },
            ],
        };
        let mut engine = engine();
        assert!(matches!(
            policy.apply(&mut engine),
            Err(PolicyError::Distributor(DistributorError::UnknownParent { .. }))
        ));
    }

    #[test]
    fn test_apply_keeps_padded_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("policy.json");
        fs::write(
            &path,
            r#"{ "distributors": [
                { "name": "D1 ", "include": ["IN"] },
                { "name": "D2", "parent": "D1 ", "exclude": ["TN-IN"] }
            ] }"#,
        )
        .unwrap();

        let policy = PolicyFile::load_from(&path).unwrap();
        let mut engine = engine();
        policy.apply(&mut engine).unwrap();

        assert!(engine.has_permission("D1 ", "BLR-KA-IN"));
        assert!(engine.has_permission("D2", "BLR-KA-IN"));
        assert!(!engine.has_permission("D2", "MAA-TN-IN"));
        assert!(engine.registry().get("D1").is_none());
    }

    #[test]
    fn test_upsert_extends_existing() {
        let mut policy = PolicyFile::default();
        policy.upsert("D1", None, &["IN".into()], &[]).unwrap();
        policy.upsert("D1", None, &["US".into()], &["KA-IN".into()]).unwrap();
        let d1 = policy.get("D1").unwrap();
        assert_eq!(d1.include, vec!["IN".to_string(), "US".to_string()]);
        assert_eq!(d1.exclude, vec!["KA-IN".to_string()]);
        assert_eq!(policy.distributors.len(), 1);
    }

    #[test]
    fn test_upsert_cannot_reparent() {
        let mut policy = PolicyFile::default();
        policy.upsert("A", None, &[], &[]).unwrap();
        policy.upsert("B", None, &[], &[]).unwrap();
        policy.upsert("C", Some("A"), &[], &[]).unwrap();
        assert_eq!(
            policy.upsert("C", Some("B"), &[], &[]).unwrap_err(),
            DistributorError::ParentFixed("C".into())
        );
        policy.upsert("C", Some("A"), &["IN".into()], &[]).unwrap();
    }

    #[test]
    fn test_upsert_unknown_parent() {
        let mut policy = PolicyFile::default();
        assert!(matches!(
            policy.upsert("D1", Some("NOPE"), &[], &[]),
            Err(DistributorError::UnknownParent { .. })
        ));
    }
}
