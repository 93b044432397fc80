//! Composer configuration: naming conventions, cluster-wide labels and system defaults.

use serde::{Deserialize, Serialize};
use vigil_core::Labels;

use crate::defaults::SystemDefaults;

pub const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";
pub const DEFAULT_OPERATOR_NAME: &str = "vigil-operator";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComposerConfig {
    /// DNS suffix used in service-discovery strings.
    pub cluster_domain: String,
    /// Value of the `app.kubernetes.io/managed-by` label.
    pub operator_name: String,
    /// Labels stamped on every object, after identity labels and before user labels.
    pub common_labels: Labels,
    pub defaults: SystemDefaults,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            cluster_domain: DEFAULT_CLUSTER_DOMAIN.to_string(),
            operator_name: DEFAULT_OPERATOR_NAME.to_string(),
            common_labels: Labels::new(),
            defaults: SystemDefaults::default(),
        }
    }
}

impl ComposerConfig {
    /// Parse a YAML config document. Partial defaults are layered over the built-in ones.
    pub fn from_yaml(yaml: &str) -> serde_yaml::Result<Self> {
        let mut cfg: ComposerConfig = if yaml.trim().is_empty() {
            ComposerConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        cfg.defaults = cfg.defaults.layered_over_builtin();
        Ok(cfg)
    }

    /// Apply `VIGIL_CLUSTER_DOMAIN` / `VIGIL_OPERATOR_NAME` style overrides from `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("VIGIL_CLUSTER_DOMAIN").filter(|v| !v.is_empty()) {
            self.cluster_domain = v;
        }
        if let Some(v) = lookup("VIGIL_OPERATOR_NAME").filter(|v| !v.is_empty()) {
            self.operator_name = v;
        }
        self
    }
}
