//! Administrative endpoint resolution.
//!
//! Replica-set plans talk to every data node. Sharded plans must talk to
//! the routers only, so the node list is split into cluster roles first.

use std::fmt;

use crate::error::BindingError;
use crate::plan::{PlanConfig, PlanKind, ShardLayout};

/// Port every mongod/mongos process listens on.
pub const DATA_PORT: u16 = 28000;

/// Ordered, non-empty list of `host:port` strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSet(Vec<String>);

impl EndpointSet {
    pub fn new(endpoints: Vec<String>) -> Result<Self, BindingError> {
        if endpoints.is_empty() {
            return Err(BindingError::Topology(
                "no administrative endpoints available".to_string(),
            ));
        }
        Ok(Self(endpoints))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

impl fmt::Display for EndpointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

/// Endpoints of a sharded deployment grouped by role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub routers: Vec<String>,
    pub config_servers: Vec<String>,
    pub shards: Vec<Vec<String>>,
}

/// Splits a sharded deployment's endpoints into cluster roles.
pub trait ClusterLayout: Send + Sync {
    fn resolve(&self, endpoints: &[String], layout: &ShardLayout) -> Result<Cluster, BindingError>;
}

/// Nodes are ordered as routers, then config servers, then shards of
/// `replicas` members each.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialLayout;

impl ClusterLayout for SequentialLayout {
    fn resolve(&self, endpoints: &[String], layout: &ShardLayout) -> Result<Cluster, BindingError> {
        if layout.routers == 0 || layout.replicas == 0 {
            return Err(BindingError::Topology(format!(
                "layout needs at least one router and one replica per shard, got {} routers and {} replicas",
                layout.routers, layout.replicas
            )));
        }

        let required = layout
            .routers
            .checked_add(layout.config_servers)
            .and_then(|n| n.checked_add(layout.replicas));
        if required.is_none_or(|required| endpoints.len() < required) {
            return Err(BindingError::Topology(format!(
                "{} nodes cannot hold {} routers, {} config servers and a shard of {} replicas",
                endpoints.len(),
                layout.routers,
                layout.config_servers,
                layout.replicas
            )));
        }

        let (routers, rest) = endpoints.split_at(layout.routers);
        let (config_servers, shard_nodes) = rest.split_at(layout.config_servers);

        if shard_nodes.len() % layout.replicas != 0 {
            return Err(BindingError::Topology(format!(
                "{} shard nodes do not divide into shards of {} replicas",
                shard_nodes.len(),
                layout.replicas
            )));
        }

        Ok(Cluster {
            routers: routers.to_vec(),
            config_servers: config_servers.to_vec(),
            shards: shard_nodes
                .chunks(layout.replicas)
                .map(<[String]>::to_vec)
                .collect(),
        })
    }
}

/// Resolve the endpoints administrative commands should be sent to.
pub fn resolve_endpoints(
    nodes: &[String],
    plan: &PlanConfig,
    cluster_layout: &dyn ClusterLayout,
) -> Result<EndpointSet, BindingError> {
    if nodes.is_empty() {
        return Err(BindingError::Topology(
            "deployment has no mongod_node instances".to_string(),
        ));
    }

    let servers: Vec<String> = nodes
        .iter()
        .map(|host| format!("{host}:{DATA_PORT}"))
        .collect();

    match (plan.kind, plan.shards.as_ref()) {
        (PlanKind::Standalone, _) => EndpointSet::new(servers),
        (PlanKind::ShardedCluster, Some(layout)) => {
            let cluster = cluster_layout.resolve(&servers, layout)?;
            tracing::debug!(
                "Cluster layout: {} routers, {} config servers, {} shards",
                cluster.routers.len(),
                cluster.config_servers.len(),
                cluster.shards.len()
            );
            EndpointSet::new(cluster.routers)
        }
        (PlanKind::ShardedCluster, None) => Err(BindingError::Configuration(
            "sharded plan without router/config server/replica counts".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::AdminCredential;

    fn hosts(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("10.0.0.{i}")).collect()
    }

    fn standalone() -> PlanConfig {
        PlanConfig {
            kind: PlanKind::Standalone,
            admin: AdminCredential::new("pw"),
            shards: None,
        }
    }

    fn sharded(routers: usize, config_servers: usize, replicas: usize) -> PlanConfig {
        PlanConfig {
            kind: PlanKind::ShardedCluster,
            admin: AdminCredential::new("pw"),
            shards: Some(ShardLayout {
                routers,
                config_servers,
                replicas,
            }),
        }
    }

    #[test]
    fn test_standalone_keeps_order() {
        let endpoints = resolve_endpoints(&hosts(2), &standalone(), &SequentialLayout).unwrap();
        assert_eq!(
            endpoints.as_slice(),
            &["10.0.0.1:28000".to_string(), "10.0.0.2:28000".to_string()]
        );
    }

    #[test]
    fn test_empty_node_list() {
        let err = resolve_endpoints(&[], &standalone(), &SequentialLayout).unwrap_err();
        assert!(matches!(err, BindingError::Topology(_)));
    }

    #[test]
    fn test_sharded_returns_routers_only() {
        let nodes = hosts(8);
        let endpoints = resolve_endpoints(&nodes, &sharded(2, 3, 3), &SequentialLayout).unwrap();
        assert_eq!(endpoints.as_slice().len(), 2);
        for endpoint in endpoints.as_slice() {
            let host = endpoint.strip_suffix(":28000").unwrap();
            assert!(nodes.iter().any(|n| n == host));
        }
    }

    #[test]
    fn test_sharded_too_few_nodes() {
        let err = resolve_endpoints(&hosts(7), &sharded(2, 3, 3), &SequentialLayout).unwrap_err();
        assert!(matches!(err, BindingError::Topology(_)));
    }

    #[test]
    fn test_sharded_uneven_shards() {
        let err = resolve_endpoints(&hosts(10), &sharded(2, 3, 3), &SequentialLayout).unwrap_err();
        assert!(matches!(err, BindingError::Topology(_)));
    }

    #[test]
    fn test_sequential_layout_roles() {
        let servers = hosts(11);
        let cluster = SequentialLayout
            .resolve(
                &servers,
                &ShardLayout {
                    routers: 2,
                    config_servers: 3,
                    replicas: 3,
                },
            )
            .unwrap();
        assert_eq!(cluster.routers, servers[..2].to_vec());
        assert_eq!(cluster.config_servers, servers[2..5].to_vec());
        assert_eq!(cluster.shards.len(), 2);
        assert_eq!(cluster.shards[1], servers[8..11].to_vec());
    }

    #[test]
    fn test_sharded_counts_beyond_address_space() {
        let props: serde_yaml::Value = serde_yaml::from_str(
            "plan_id: sharded_cluster\nadmin_password: pw\nrouters: 18446744073709551615\nconfig_servers: 1\nreplicas: 1\n",
        )
        .unwrap();
        let plan = PlanConfig::from_properties(&props).unwrap();
        let err = resolve_endpoints(&hosts(2), &plan, &SequentialLayout).unwrap_err();
        assert!(matches!(err, BindingError::Topology(_)));
    }

    #[test]
    fn test_sequential_layout_rejects_empty_roles() {
        let servers = hosts(6);
        for (routers, replicas) in [(2, 0), (0, 3)] {
            let err = SequentialLayout
                .resolve(
                    &servers,
                    &ShardLayout {
                        routers,
                        config_servers: 1,
                        replicas,
                    },
                )
                .unwrap_err();
            assert!(matches!(err, BindingError::Topology(_)));
        }
    }

    #[test]
    fn test_endpoint_set_display() {
        let set = EndpointSet::new(vec!["a:1".to_string(), "b:2".to_string()]).unwrap();
        assert_eq!(set.to_string(), "a:1,b:2");
        assert!(EndpointSet::new(Vec::new()).is_err());
    }
}
