//! In-memory stand-ins for the database and the secret source.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::bail;
use async_trait::async_trait;

use crate::admin::{AccountSpec, AdminConnector, AdminSession};
use crate::error::{BindingError, ProvisioningFailure};
use crate::plan::AdminCredential;
use crate::secret::SecretGenerator;
use crate::topology::EndpointSet;

#[derive(Default)]
struct FakeState {
    users: HashMap<String, AccountSpec>,
    opened: usize,
    closed: usize,
    last_endpoints: Option<Vec<String>>,
}

/// Accepts one admin password and keeps accounts in memory.
pub struct FakeConnector {
    admin_password: String,
    reachable: bool,
    reject_writes: bool,
    state: Arc<Mutex<FakeState>>,
}

impl FakeConnector {
    pub fn new(admin_password: &str) -> Self {
        Self {
            admin_password: admin_password.to_string(),
            reachable: true,
            reject_writes: false,
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    pub fn rejecting_writes(mut self) -> Self {
        self.reject_writes = true;
        self
    }

    pub fn opened(&self) -> usize {
        self.state.lock().unwrap().opened
    }

    pub fn closed(&self) -> usize {
        self.state.lock().unwrap().closed
    }

    pub fn password_of(&self, username: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .users
            .get(username)
            .map(|a| a.password.clone())
    }

    pub fn last_endpoints(&self) -> Option<Vec<String>> {
        self.state.lock().unwrap().last_endpoints.clone()
    }
}

#[async_trait]
impl AdminConnector for FakeConnector {
    async fn connect(
        &self,
        endpoints: &EndpointSet,
        credential: &AdminCredential,
    ) -> anyhow::Result<Box<dyn AdminSession>> {
        if !self.reachable {
            bail!("No reachable servers");
        }
        if credential.password() != self.admin_password {
            bail!("Authentication failed");
        }

        let mut state = self.state.lock().unwrap();
        state.opened += 1;
        state.last_endpoints = Some(endpoints.to_vec());

        Ok(Box::new(FakeSession {
            reject_writes: self.reject_writes,
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeSession {
    reject_writes: bool,
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl AdminSession for FakeSession {
    async fn upsert_user(&self, account: &AccountSpec) -> Result<(), ProvisioningFailure> {
        if self.reject_writes {
            return Err(ProvisioningFailure::Rejected("not authorized".to_string()));
        }
        self.state
            .lock()
            .unwrap()
            .users
            .insert(account.username.clone(), account.clone());
        Ok(())
    }

    async fn remove_user(&self, username: &str) -> Result<(), ProvisioningFailure> {
        if self.reject_writes {
            return Err(ProvisioningFailure::Rejected("not authorized".to_string()));
        }
        match self.state.lock().unwrap().users.remove(username) {
            Some(_) => Ok(()),
            None => Err(ProvisioningFailure::AccountNotFound(username.to_string())),
        }
    }

    async fn close(self: Box<Self>) {
        self.state.lock().unwrap().closed += 1;
    }
}

/// Hands out a numbered sequence of passwords.
#[derive(Default)]
pub struct SequenceSecret {
    next: Mutex<usize>,
}

impl SecretGenerator for SequenceSecret {
    fn generate(&self, _byte_len: usize) -> Result<String, BindingError> {
        let mut next = self.next.lock().unwrap();
        *next += 1;
        Ok(format!("secret-{next}"))
    }
}

pub struct FailingSecret;

impl SecretGenerator for FailingSecret {
    fn generate(&self, _byte_len: usize) -> Result<String, BindingError> {
        Err(BindingError::SecretGeneration(
            "entropy source unavailable".to_string(),
        ))
    }
}
