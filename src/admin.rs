//! Administrative account management.
//!
//! An [`AdminConnector`] opens one authenticated session per operation.
//! Sessions are always closed before [`create_account`] or
//! [`delete_account`] return, whatever the outcome.

use std::fmt;

use async_trait::async_trait;

use crate::error::{BindingError, Operation, ProvisioningFailure};
use crate::plan::AdminCredential;
use crate::topology::EndpointSet;

/// Database holding account metadata; also the authentication source.
pub const ADMIN_DB: &str = "admin";

/// The one application database bindings are granted.
pub const DEFAULT_DB: &str = "default";

/// Built-in administrative account used to open sessions.
pub const ADMIN_USERNAME: &str = "admin";

/// Roles granted on each database a binding can access.
pub const BINDING_ROLES: [&str; 3] = ["userAdmin", "dbAdmin", "readWrite"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    pub role: String,
    pub db: String,
}

/// Account to create or overwrite on the admin database.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountSpec {
    pub username: String,
    pub password: String,
    pub roles: Vec<RoleGrant>,
}

impl AccountSpec {
    /// Binding roles on the admin database and on [`DEFAULT_DB`], nothing else.
    pub fn for_binding(username: impl Into<String>, password: impl Into<String>) -> Self {
        let roles = [ADMIN_DB, DEFAULT_DB]
            .iter()
            .flat_map(|db| {
                BINDING_ROLES.iter().map(move |role| RoleGrant {
                    role: (*role).to_string(),
                    db: (*db).to_string(),
                })
            })
            .collect();

        Self {
            username: username.into(),
            password: password.into(),
            roles,
        }
    }
}

impl fmt::Debug for AccountSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountSpec")
            .field("username", &self.username)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

/// Opens authenticated administrative sessions.
#[async_trait]
pub trait AdminConnector: Send + Sync {
    /// Connect and authenticate, failing fast when no endpoint answers.
    async fn connect(
        &self,
        endpoints: &EndpointSet,
        credential: &AdminCredential,
    ) -> anyhow::Result<Box<dyn AdminSession>>;
}

/// One open administrative session.
#[async_trait]
pub trait AdminSession: Send + Sync {
    /// Create the account, or replace the password and roles of an existing one.
    async fn upsert_user(&self, account: &AccountSpec) -> Result<(), ProvisioningFailure>;

    async fn remove_user(&self, username: &str) -> Result<(), ProvisioningFailure>;

    async fn close(self: Box<Self>);
}

async fn open(
    connector: &dyn AdminConnector,
    operation: Operation,
    endpoints: &EndpointSet,
    credential: &AdminCredential,
) -> Result<Box<dyn AdminSession>, BindingError> {
    connector
        .connect(endpoints, credential)
        .await
        .map_err(|e| {
            tracing::warn!("{} failed to connect to [{}]: {:#}", operation, endpoints, e);
            BindingError::Connection {
                operation,
                endpoints: endpoints.to_string(),
                reason: format!("{e:#}"),
            }
        })
}

/// Upsert the binding account. Existing accounts with the same name are
/// overwritten, invalidating their previous password.
pub async fn create_account(
    connector: &dyn AdminConnector,
    endpoints: &EndpointSet,
    credential: &AdminCredential,
    account: &AccountSpec,
) -> Result<(), BindingError> {
    let operation = Operation::CreateBinding;
    let session = open(connector, operation, endpoints, credential).await?;

    let result = session.upsert_user(account).await;
    session.close().await;

    result.map_err(|failure| {
        tracing::warn!(
            "Upsert of account '{}' rejected by [{}]: {}",
            account.username,
            endpoints,
            failure
        );
        BindingError::Provisioning {
            operation,
            endpoints: endpoints.to_string(),
            failure,
        }
    })
}

/// Remove the binding account. Removing an account that does not exist
/// is an error ([`ProvisioningFailure::AccountNotFound`]).
pub async fn delete_account(
    connector: &dyn AdminConnector,
    endpoints: &EndpointSet,
    credential: &AdminCredential,
    username: &str,
) -> Result<(), BindingError> {
    let operation = Operation::DeleteBinding;
    let session = open(connector, operation, endpoints, credential).await?;

    let result = session.remove_user(username).await;
    session.close().await;

    result.map_err(|failure| {
        tracing::warn!(
            "Removal of account '{}' rejected by [{}]: {}",
            username,
            endpoints,
            failure
        );
        BindingError::Provisioning {
            operation,
            endpoints: endpoints.to_string(),
            failure,
        }
    })
}
