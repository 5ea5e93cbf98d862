//! Binding lifecycle: create and delete per-binding database accounts.

use serde::{Deserialize, Serialize};

use crate::admin::{self, AccountSpec, AdminConnector, DEFAULT_DB};
use crate::error::BindingError;
use crate::identity::derive_username;
use crate::plan::PlanConfig;
use crate::secret::{PASSWORD_BYTES, SecretGenerator};
use crate::topology::{ClusterLayout, EndpointSet, resolve_endpoints};

/// Connection details handed to the bound application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingResult {
    pub username: String,
    pub password: String,
    pub database: String,
    pub servers: Vec<String>,
    pub uri: String,
}

/// Format the connection details for a freshly provisioned account.
pub fn assemble(
    username: &str,
    password: &str,
    endpoints: &EndpointSet,
    database: &str,
) -> BindingResult {
    let uri = format!("mongodb://{username}:{password}@{endpoints}/{database}?authSource=admin");

    BindingResult {
        username: username.to_string(),
        password: password.to_string(),
        database: database.to_string(),
        servers: endpoints.to_vec(),
        uri,
    }
}

/// Runs binding operations against injected collaborators.
pub struct Binder<'a> {
    connector: &'a dyn AdminConnector,
    secrets: &'a dyn SecretGenerator,
    cluster_layout: &'a dyn ClusterLayout,
}

impl<'a> Binder<'a> {
    pub fn new(
        connector: &'a dyn AdminConnector,
        secrets: &'a dyn SecretGenerator,
        cluster_layout: &'a dyn ClusterLayout,
    ) -> Self {
        Self {
            connector,
            secrets,
            cluster_layout,
        }
    }

    /// Provision (or overwrite) the account for `binding_id` and return
    /// its connection details.
    pub async fn create_binding(
        &self,
        binding_id: &str,
        nodes: &[String],
        plan: &PlanConfig,
    ) -> Result<BindingResult, BindingError> {
        let username = derive_username(binding_id);
        let endpoints = resolve_endpoints(nodes, plan, self.cluster_layout)?;
        let password = self.secrets.generate(PASSWORD_BYTES)?;

        tracing::info!(
            "Creating binding {} as '{}' via [{}]",
            binding_id,
            username,
            endpoints
        );

        let account = AccountSpec::for_binding(&username, password);
        admin::create_account(self.connector, &endpoints, &plan.admin, &account).await?;

        Ok(assemble(&username, &account.password, &endpoints, DEFAULT_DB))
    }

    /// Remove the account for `binding_id`. Fails if it does not exist.
    pub async fn delete_binding(
        &self,
        binding_id: &str,
        nodes: &[String],
        plan: &PlanConfig,
    ) -> Result<(), BindingError> {
        let username = derive_username(binding_id);
        let endpoints = resolve_endpoints(nodes, plan, self.cluster_layout)?;

        tracing::info!(
            "Deleting binding {} ('{}') via [{}]",
            binding_id,
            username,
            endpoints
        );

        admin::delete_account(self.connector, &endpoints, &plan.admin, &username).await
    }
}
