//! Typed plan configuration.
//!
//! Plan properties arrive as an untyped YAML mapping. They are validated
//! once here and every later step works with [`PlanConfig`].

use std::fmt;

use serde_yaml::Value;

use crate::error::BindingError;

/// Recognized deployment layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    /// A single replica set (including a one-member "standalone").
    Standalone,
    ShardedCluster,
}

impl PlanKind {
    pub fn from_id(id: &str) -> Result<Self, BindingError> {
        match id {
            "standalone" | "replica_set" | "replica-set" => Ok(Self::Standalone),
            "sharded_cluster" | "sharded-cluster" => Ok(Self::ShardedCluster),
            other => Err(BindingError::Configuration(format!(
                "unknown plan_id '{other}'. Must be one of: standalone, replica_set, sharded_cluster"
            ))),
        }
    }
}

/// Password of the built-in administrative account.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredential {
    password: String,
}

impl AdminCredential {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredential")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Declared shape of a sharded cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardLayout {
    pub routers: usize,
    pub config_servers: usize,
    pub replicas: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanConfig {
    pub kind: PlanKind,
    pub admin: AdminCredential,
    /// Present exactly when `kind` is [`PlanKind::ShardedCluster`].
    pub shards: Option<ShardLayout>,
}

impl PlanConfig {
    /// Build from the `mongo_ops` properties mapping of a deployment manifest.
    pub fn from_properties(properties: &Value) -> Result<Self, BindingError> {
        if !properties.is_mapping() {
            return Err(BindingError::Configuration(
                "plan properties must be a mapping".to_string(),
            ));
        }

        let kind = PlanKind::from_id(required_str(properties, "plan_id")?)?;
        let admin = AdminCredential::new(required_str(properties, "admin_password")?);

        let shards = match kind {
            PlanKind::Standalone => None,
            PlanKind::ShardedCluster => {
                let layout = ShardLayout {
                    routers: required_count(properties, "routers")?,
                    config_servers: required_count(properties, "config_servers")?,
                    replicas: required_count(properties, "replicas")?,
                };
                if layout.routers == 0 {
                    return Err(BindingError::Configuration(
                        "sharded plan must declare at least one router".to_string(),
                    ));
                }
                if layout.replicas == 0 {
                    return Err(BindingError::Configuration(
                        "sharded plan must declare at least one replica per shard".to_string(),
                    ));
                }
                Some(layout)
            }
        };

        Ok(Self {
            kind,
            admin,
            shards,
        })
    }
}

fn required_str<'a>(properties: &'a Value, key: &str) -> Result<&'a str, BindingError> {
    match properties.get(key) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(BindingError::Configuration(format!(
            "property '{key}' must be a string"
        ))),
        None => Err(BindingError::Configuration(format!(
            "missing required property '{key}'"
        ))),
    }
}

fn required_count(properties: &Value, key: &str) -> Result<usize, BindingError> {
    let value = properties.get(key).ok_or_else(|| {
        BindingError::Configuration(format!("missing required property '{key}'"))
    })?;
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| {
            BindingError::Configuration(format!(
                "property '{key}' must be a non-negative integer"
            ))
        })
}
