//! Error taxonomy for binding operations.

use std::fmt;

use thiserror::Error;

/// Exit code reported when a delete targets an account that does not exist.
pub const EXIT_BINDING_NOT_FOUND: i32 = 41;

/// The binding lifecycle step an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateBinding,
    DeleteBinding,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateBinding => f.write_str("create-binding"),
            Self::DeleteBinding => f.write_str("delete-binding"),
        }
    }
}

/// Why the remote database refused an account mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisioningFailure {
    #[error("account '{0}' does not exist")]
    AccountNotFound(String),

    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum BindingError {
    #[error("invalid plan configuration: {0}")]
    Configuration(String),

    #[error("deployment topology does not fit the plan: {0}")]
    Topology(String),

    #[error("{operation}: cannot connect to admin endpoints [{endpoints}]: {reason}")]
    Connection {
        operation: Operation,
        endpoints: String,
        reason: String,
    },

    #[error("{operation}: account change rejected by [{endpoints}]: {failure}")]
    Provisioning {
        operation: Operation,
        endpoints: String,
        failure: ProvisioningFailure,
    },

    #[error("failed to generate secret: {0}")]
    SecretGeneration(String),
}

impl BindingError {
    /// Process exit code for the command-line surface.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Provisioning {
                failure: ProvisioningFailure::AccountNotFound(_),
                ..
            } => EXIT_BINDING_NOT_FOUND,
            _ => 1,
        }
    }
}
