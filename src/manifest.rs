//! Decoding of the deployment descriptions passed in by the broker.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::HashMap;

use crate::error::BindingError;

/// Instance group holding the data nodes.
pub const MONGOD_GROUP: &str = "mongod_node";

/// Properties block of the manifest owned by this service.
pub const PROPERTIES_KEY: &str = "mongo_ops";

/// Instance group name to ordered host list, as reported by the director.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct DeploymentTopology {
    groups: HashMap<String, Vec<String>>,
}

impl DeploymentTopology {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid deployment topology JSON")
    }

    /// Data node hosts in deployment order; empty if the group is absent.
    pub fn mongod_nodes(&self) -> &[String] {
        self.groups
            .get(MONGOD_GROUP)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// The subset of a deployment manifest this adapter reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub properties: Value,
}

impl Manifest {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Invalid deployment manifest YAML")
    }

    pub fn plan_properties(&self) -> Result<&Value, BindingError> {
        self.properties.get(PROPERTIES_KEY).ok_or_else(|| {
            BindingError::Configuration(format!(
                "manifest has no '{PROPERTIES_KEY}' properties"
            ))
        })
    }
}

/// Arbitrary parameters from the bind request. Only checked for validity.
pub fn parse_request_params(json: &str) -> Result<serde_json::Value> {
    serde_json::from_str(json).context("Invalid request parameters JSON")
}
