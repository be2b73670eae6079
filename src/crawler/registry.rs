//! Dataset registry
//!
//! Maps dataset names to the seed page their crawl starts from. The name is
//! also the partition key of every persisted page and edge.

use crate::config::{Config, DatasetEntry};
use crate::CrawlError;

/// Pseudo-target that runs every registered dataset in turn
pub const ALL_TARGET: &str = "all";

const BUILTIN_BASE: &str = "https://people.scs.carleton.ca/~avamckenney";

/// Names of the datasets known without any configuration
pub const BUILTIN_DATASETS: [&str; 4] = ["tinyfruits", "fruits100", "fruitsA", "fruitgraph"];

/// What a single invocation should crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Every registered dataset, one after another
    All,
    /// One named dataset
    Dataset(String),
}

impl Target {
    /// Parses a command-line target
    ///
    /// The name is not checked against a registry here; resolving an unknown
    /// name fails later with [`CrawlError::UnknownDataset`].
    pub fn parse(raw: &str) -> Self {
        if raw == ALL_TARGET {
            Self::All
        } else {
            Self::Dataset(raw.to_string())
        }
    }
}

/// Ordered mapping from dataset name to seed URL
#[derive(Debug, Clone)]
pub struct DatasetRegistry {
    entries: Vec<DatasetEntry>,
}

impl DatasetRegistry {
    /// The four datasets served from the course site
    pub fn builtin() -> Self {
        let entries = BUILTIN_DATASETS
            .iter()
            .map(|name| DatasetEntry::new(name, &format!("{}/{}/N-0.html", BUILTIN_BASE, name)))
            .collect();

        Self { entries }
    }

    /// Uses the configured datasets, or the built-in ones if none are configured
    pub fn from_config(config: &Config) -> Self {
        if config.datasets.is_empty() {
            Self::builtin()
        } else {
            Self {
                entries: config.datasets.clone(),
            }
        }
    }

    /// Looks up one dataset by name
    pub fn get(&self, name: &str) -> Result<&DatasetEntry, CrawlError> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| CrawlError::UnknownDataset(name.to_string()))
    }

    /// Expands a target into the datasets to crawl, in order
    pub fn resolve(&self, target: &Target) -> Result<Vec<&DatasetEntry>, CrawlError> {
        match target {
            Target::All => Ok(self.entries.iter().collect()),
            Target::Dataset(name) => Ok(vec![self.get(name)?]),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DatasetRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = DatasetRegistry::builtin();
        assert_eq!(
            registry.names(),
            vec!["tinyfruits", "fruits100", "fruitsA", "fruitgraph"]
        );

        let tiny = registry.get("tinyfruits").unwrap();
        assert_eq!(
            tiny.seed,
            "https://people.scs.carleton.ca/~avamckenney/tinyfruits/N-0.html"
        );
    }

    #[test]
    fn test_unknown_dataset() {
        let registry = DatasetRegistry::builtin();
        match registry.get("vegetables") {
            Err(CrawlError::UnknownDataset(name)) => assert_eq!(name, "vegetables"),
            other => panic!("expected UnknownDataset, got {:?}", other),
        }
    }

    #[test]
    fn test_target_parse() {
        assert_eq!(Target::parse("all"), Target::All);
        assert_eq!(
            Target::parse("fruitsA"),
            Target::Dataset("fruitsA".to_string())
        );
    }

    #[test]
    fn test_resolve_all_keeps_order() {
        let registry = DatasetRegistry::builtin();
        let names: Vec<_> = registry
            .resolve(&Target::All)
            .unwrap()
            .into_iter()
            .map(|entry| entry.name.as_str())
            .collect();
        assert_eq!(names, registry.names());
    }

    #[test]
    fn test_resolve_unknown_dataset_fails() {
        let registry = DatasetRegistry::builtin();
        assert!(registry
            .resolve(&Target::Dataset("nope".to_string()))
            .is_err());
    }

    #[test]
    fn test_config_datasets_replace_builtin() {
        let config = Config {
            datasets: vec![DatasetEntry::new(
                "local",
                "http://127.0.0.1:8080/~owner/local/N-0.html",
            )],
            ..Config::default()
        };

        let registry = DatasetRegistry::from_config(&config);
        assert_eq!(registry.names(), vec!["local"]);
        assert!(registry.get("tinyfruits").is_err());
    }

    #[test]
    fn test_empty_config_uses_builtin() {
        let registry = DatasetRegistry::from_config(&Config::default());
        assert_eq!(registry.len(), 4);
    }
}
