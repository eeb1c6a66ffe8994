//! Data file locations. Defaults live under ~/.territory/ and can be
//! overridden per invocation.

use std::path::{Path, PathBuf};

pub const REGIONS_FILE: &str = "regions.csv";
pub const POLICY_FILE: &str = "policy.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub regions: PathBuf,
    pub policy: PathBuf,
}

impl DataPaths {
    /// ~/.territory/regions.csv and ~/.territory/policy.json
    pub fn default_paths() -> Self {
        Self::in_dir(&Self::default_dir())
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            regions: dir.join(REGIONS_FILE),
            policy: dir.join(POLICY_FILE),
        }
    }

    /// Apply explicit overrides on top of the defaults.
    pub fn resolve(regions: Option<PathBuf>, policy: Option<PathBuf>) -> Self {
        let defaults = Self::default_paths();
        Self {
            regions: regions.unwrap_or(defaults.regions),
            policy: policy.unwrap_or(defaults.policy),
        }
    }

    fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".territory")
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::default_paths()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_dir() {
        let paths = DataPaths::in_dir(Path::new("/srv/territory"));
        assert_eq!(paths.regions, PathBuf::from("/srv/territory/regions.csv"));
        assert_eq!(paths.policy, PathBuf::from("/srv/territory/policy.json"));
    }

    #[test]
    fn test_overrides() {
        let paths = DataPaths::resolve(Some(PathBuf::from("cities.csv")), None);
        assert_eq!(paths.regions, PathBuf::from("cities.csv"));
        assert!(paths.policy.ends_with(".territory/policy.json"));
    }
}
