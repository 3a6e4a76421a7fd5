//! Configuration loading and management

use crate::cascade::registry::{DependencyTable, DependentRef};
use crate::cascade::resolver::ResolverOptions;
use crate::core::entity::EntityType;
use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Dependents declared for one root type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRule {
    /// Root entity type (e.g., "course", "userTokens")
    pub root: EntityType,

    /// Types referencing the root, in the order they are cascaded to
    #[serde(default)]
    pub dependents: Vec<DependentRef>,
}

/// Complete configuration for the cascade system
///
/// ```yaml
/// concurrent_dependents: false
/// dependencies:
///   - root: category
///     dependents:
///       - entity: course
///         fields: [Live, Recorded]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Run dependent steps concurrently
    #[serde(default)]
    pub concurrent_dependents: bool,

    /// Relationship graph, one rule per root type
    #[serde(default)]
    pub dependencies: Vec<DependencyRule>,
}

impl CascadeConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.display().to_string()),
            message: e.to_string(),
        })
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Serialize back to YAML
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Build the relationship graph described by this configuration
    ///
    /// Rejects roots declared twice and dependents without reference fields.
    pub fn dependency_table(&self) -> Result<DependencyTable, ConfigError> {
        let mut seen = HashSet::new();
        let mut table = DependencyTable::new();

        for rule in &self.dependencies {
            if !seen.insert(rule.root) {
                return Err(ConfigError::InvalidValue {
                    field: "dependencies.root".to_string(),
                    value: rule.root.to_string(),
                    message: "root declared more than once".to_string(),
                });
            }

            if let Some(dep) = rule.dependents.iter().find(|d| d.fields.is_empty()) {
                return Err(ConfigError::InvalidValue {
                    field: format!("dependencies.{}.dependents.fields", rule.root),
                    value: dep.entity.to_string(),
                    message: "dependent needs at least one reference field".to_string(),
                });
            }

            table.set_dependents(rule.root, rule.dependents.clone());
        }

        tracing::debug!(roots = table.roots().len(), "dependency table loaded");
        Ok(table)
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            concurrent_dependents: self.concurrent_dependents,
        }
    }

    /// The course catalog's standard graph, run sequentially
    pub fn default_config() -> Self {
        let table = DependencyTable::standard();
        Self {
            concurrent_dependents: false,
            dependencies: table
                .roots()
                .into_iter()
                .map(|root| DependencyRule {
                    root,
                    dependents: table.dependents_of(root).to_vec(),
                })
                .collect(),
        }
    }
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self::default_config()
    }
}
