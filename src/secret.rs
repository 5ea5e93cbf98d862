//! Random credential generation.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{RngCore, rngs::OsRng};

use crate::error::BindingError;

/// Number of random bytes behind each generated password.
pub const PASSWORD_BYTES: usize = 32;

/// Source of account passwords.
pub trait SecretGenerator: Send + Sync {
    fn generate(&self, byte_len: usize) -> Result<String, BindingError>;
}

/// Reads from the operating system CSPRNG and encodes the bytes as
/// unpadded URL-safe base64, which needs no escaping inside a URI.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSecretGenerator;

impl SecretGenerator for OsSecretGenerator {
    fn generate(&self, byte_len: usize) -> Result<String, BindingError> {
        let mut bytes = vec![0u8; byte_len];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| BindingError::SecretGeneration(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}
