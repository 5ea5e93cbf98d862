//! Account name derivation.
//!
//! The account name is the only link between a binding and the database
//! account created for it, so it must be recomputable from the binding id
//! alone.

use base64::{Engine, engine::general_purpose::STANDARD};
use md5::{Digest, Md5};

/// Prefix shared by every account this adapter creates.
pub const USERNAME_PREFIX: &str = "pcf_";

/// Map a binding id to its database account name.
///
/// The id is base64-encoded and the encoding digested, giving
/// `pcf_` followed by 32 lowercase hex digits.
pub fn derive_username(binding_id: &str) -> String {
    let encoded = STANDARD.encode(binding_id.as_bytes());
    let digest = Md5::digest(encoded.as_bytes());
    format!("{USERNAME_PREFIX}{}", hex::encode(digest))
}
