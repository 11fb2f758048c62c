//! Flow catalog and static explanation table
//!
//! The catalog is loaded once from YAML and then only read, so one instance
//! can be shared behind an `Arc` by any number of concurrent resolver calls.

use crate::error::CatalogError;
use chainviz_types::{ActionKind, ExplanationResponse, FlowType, StepMetadata};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

const BUILTIN_CATALOG: &str = include_str!("../catalog/flows.yaml");

/// One flow: metadata, ordered steps and its static explanations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDefinition {
    /// Key used by requests, e.g. `bridge` or `multisig-mint`
    pub flow: String,
    pub title: String,
    pub summary: String,
    /// Simulated actions the flow's diagram drives
    #[serde(default)]
    pub actions: Vec<ActionKind>,
    #[serde(default)]
    pub steps: Vec<StepMetadata>,
    /// Pre-authored explanations keyed by step number (0 = overview)
    #[serde(default)]
    pub explanations: BTreeMap<u32, ExplanationResponse>,
}

impl FlowDefinition {
    pub fn step_count(&self) -> u32 {
        self.steps.len() as u32
    }

    pub fn step(&self, step: u32) -> Option<&StepMetadata> {
        self.steps.iter().find(|s| s.step == step)
    }

    /// Built-in flow type, if the key names one
    pub fn flow_type(&self) -> Option<FlowType> {
        FlowType::from_str(&self.flow).ok()
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for (index, step) in self.steps.iter().enumerate() {
            let expected = index as u32 + 1;
            if step.step != expected {
                return Err(CatalogError::InvalidStep {
                    flow: self.flow.clone(),
                    expected,
                    found: step.step,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    flows: Vec<FlowDefinition>,
}

/// Read-only collection of flow definitions
#[derive(Debug, Clone, Default)]
pub struct FlowCatalog {
    flows: BTreeMap<String, FlowDefinition>,
}

impl FlowCatalog {
    /// Catalog compiled into the crate
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;

        let mut flows = BTreeMap::new();
        for definition in file.flows {
            definition.validate()?;
            if flows.contains_key(&definition.flow) {
                return Err(CatalogError::DuplicateFlow(definition.flow));
            }
            debug!(
                flow = %definition.flow,
                steps = definition.step_count(),
                explanations = definition.explanations.len(),
                "Loaded flow definition"
            );
            flows.insert(definition.flow.clone(), definition);
        }

        Ok(Self { flows })
    }

    /// Load a catalog file from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)?;
        let catalog = Self::from_yaml_str(&yaml)?;
        info!(path = %path.display(), flows = catalog.len(), "Loaded flow catalog");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn flow(&self, key: &str) -> Option<&FlowDefinition> {
        self.flows.get(key)
    }

    pub fn step(&self, key: &str, step: u32) -> Option<&StepMetadata> {
        self.flow(key)?.step(step)
    }

    /// Static table lookup for `(flow, step)`
    pub fn static_explanation(&self, key: &str, step: u32) -> Option<&ExplanationResponse> {
        self.flow(key)?.explanations.get(&step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_builtin_catalog_covers_every_flow_type() {
        let catalog = FlowCatalog::builtin().unwrap();

        for flow in FlowType::iter() {
            let definition = catalog
                .flow(flow.key())
                .unwrap_or_else(|| panic!("missing flow {flow}"));
            assert_eq!(definition.flow_type(), Some(flow));
            assert!(definition.step_count() > 0);
            assert_eq!(definition.actions, flow.default_actions());
            assert!(
                catalog.static_explanation(flow.key(), 0).is_some(),
                "{flow} has no overview"
            );
        }
    }

    #[test]
    fn test_rejects_out_of_order_steps() {
        let yaml = r#"
flows:
  - flow: broken
    title: Broken
    summary: Steps skip a number
    steps:
      - { step: 1, title: One, description: First }
      - { step: 3, title: Three, description: Third }
"#;
        let err = FlowCatalog::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::InvalidStep {
                expected: 2,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_duplicate_flows() {
        let yaml = r#"
flows:
  - { flow: twice, title: A, summary: A }
  - { flow: twice, title: B, summary: B }
"#;
        assert!(matches!(
            FlowCatalog::from_yaml_str(yaml),
            Err(CatalogError::DuplicateFlow(key)) if key == "twice"
        ));
    }
}
