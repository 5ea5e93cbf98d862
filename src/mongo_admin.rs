//! Administrative sessions over the MongoDB driver.

use anyhow::{Context, Result};
use async_trait::async_trait;
use mongodb::{
    Client,
    bson::{Document, doc},
    error::{Error, ErrorKind},
    options::{AuthMechanism, ClientOptions, Credential, ServerAddress},
};
use std::time::Duration;

use crate::admin::{ADMIN_DB, ADMIN_USERNAME, AccountSpec, AdminConnector, AdminSession};
use crate::config::AdapterConfig;
use crate::error::ProvisioningFailure;
use crate::plan::AdminCredential;
use crate::topology::EndpointSet;

/// Server error code for a user that does not exist.
const USER_NOT_FOUND: i32 = 11;

/// Connects with SCRAM-SHA-1 as the built-in admin account.
pub struct MongoAdminConnector {
    app_name: String,
    connect_timeout: Duration,
    server_selection_timeout: Duration,
}

impl MongoAdminConnector {
    pub fn new(config: &AdapterConfig) -> Self {
        Self {
            app_name: config.app_name.clone(),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            server_selection_timeout: Duration::from_secs(config.server_selection_timeout_secs),
        }
    }

    fn client_options(
        &self,
        endpoints: &EndpointSet,
        admin: &AdminCredential,
    ) -> Result<ClientOptions> {
        let hosts = endpoints
            .as_slice()
            .iter()
            .map(|endpoint| {
                ServerAddress::parse(endpoint)
                    .with_context(|| format!("Invalid endpoint '{endpoint}'"))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut credential = Credential::default();
        credential.username = Some(ADMIN_USERNAME.to_string());
        credential.password = Some(admin.password().to_string());
        credential.source = Some(ADMIN_DB.to_string());
        credential.mechanism = Some(AuthMechanism::ScramSha1);

        let mut client_options = ClientOptions::default();
        client_options.hosts = hosts;
        client_options.credential = Some(credential);
        client_options.app_name = Some(self.app_name.clone());
        client_options.connect_timeout = Some(self.connect_timeout);
        client_options.server_selection_timeout = Some(self.server_selection_timeout);

        Ok(client_options)
    }
}

#[async_trait]
impl AdminConnector for MongoAdminConnector {
    async fn connect(
        &self,
        endpoints: &EndpointSet,
        credential: &AdminCredential,
    ) -> Result<Box<dyn AdminSession>> {
        tracing::info!("Opening admin session against [{}]", endpoints);

        let client_options = self.client_options(endpoints, credential)?;
        let client =
            Client::with_options(client_options).context("Failed to create MongoDB client")?;

        // The driver connects lazily; ping forces server selection and authentication.
        if let Err(e) = client.database(ADMIN_DB).run_command(doc! { "ping": 1 }).await {
            client.shutdown().await;
            return Err(anyhow::Error::new(e).context("Admin handshake failed"));
        }

        Ok(Box::new(MongoAdminSession { client }))
    }
}

pub struct MongoAdminSession {
    client: Client,
}

fn command_code(err: &Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command_error) => Some(command_error.code),
        _ => None,
    }
}

fn rejected(err: Error) -> ProvisioningFailure {
    ProvisioningFailure::Rejected(err.to_string())
}

fn role_documents(account: &AccountSpec) -> Vec<Document> {
    account
        .roles
        .iter()
        .map(|grant| doc! { "role": grant.role.as_str(), "db": grant.db.as_str() })
        .collect()
}

#[async_trait]
impl AdminSession for MongoAdminSession {
    async fn upsert_user(&self, account: &AccountSpec) -> Result<(), ProvisioningFailure> {
        let db = self.client.database(ADMIN_DB);
        let roles = role_documents(account);

        let update = doc! {
            "updateUser": account.username.as_str(),
            "pwd": account.password.as_str(),
            "roles": roles.clone(),
        };

        match db.run_command(update).await {
            Ok(_) => {
                tracing::info!("Overwrote existing account '{}'", account.username);
                Ok(())
            }
            Err(e) if command_code(&e) == Some(USER_NOT_FOUND) => {
                let create = doc! {
                    "createUser": account.username.as_str(),
                    "pwd": account.password.as_str(),
                    "roles": roles,
                };
                db.run_command(create).await.map_err(rejected)?;
                tracing::info!("Created account '{}'", account.username);
                Ok(())
            }
            Err(e) => Err(rejected(e)),
        }
    }

    async fn remove_user(&self, username: &str) -> Result<(), ProvisioningFailure> {
        let db = self.client.database(ADMIN_DB);

        match db.run_command(doc! { "dropUser": username }).await {
            Ok(_) => {
                tracing::info!("Removed account '{}'", username);
                Ok(())
            }
            Err(e) if command_code(&e) == Some(USER_NOT_FOUND) => {
                Err(ProvisioningFailure::AccountNotFound(username.to_string()))
            }
            Err(e) => Err(rejected(e)),
        }
    }

    async fn close(self: Box<Self>) {
        self.client.shutdown().await;
    }
}
