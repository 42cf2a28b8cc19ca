use std::ops::Deref;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Size of a share secret in bytes (256 bits)
pub const SECRET_SIZE: usize = 32;

/// Errors that can occur generating or decoding secrets
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("unable to gather entropy: {0}")]
    Entropy(#[from] getrandom::Error),
    #[error("invalid secret encoding: {0}")]
    Encoding(#[from] base64::DecodeError),
}

/// A 256-bit signing key scoped to a single shared file path
///
/// Each `Secret` authorizes downloads of exactly one path for one server
/// lifetime. It is minted by the client at share time, handed to the server
/// over the local socket, and used on both sides as the HMAC key for that
/// path's capability tokens. Minting a new secret for the same path
/// supersedes the old one.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Secret([u8; SECRET_SIZE]);

impl Deref for Secret {
    type Target = [u8; SECRET_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; SECRET_SIZE]> for Secret {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        Secret(bytes)
    }
}

impl Secret {
    /// Generate a new random secret using a cryptographically secure RNG
    pub fn generate() -> Result<Self, SecretError> {
        let mut buff = [0; SECRET_SIZE];
        getrandom::getrandom(&mut buff)?;
        Ok(Self(buff))
    }

    /// Create a secret from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `SECRET_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != SECRET_SIZE {
            return Err(anyhow::anyhow!(
                "invalid secret size, expected {}, got {}",
                SECRET_SIZE,
                data.len()
            )
            .into());
        }
        let mut buff = [0; SECRET_SIZE];
        buff.copy_from_slice(data);
        Ok(Self(buff))
    }

    /// Textual encoding used when the secret crosses the IPC boundary
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    /// Decode a secret from its textual transport encoding
    pub fn from_base64(encoded: &str) -> Result<Self, SecretError> {
        let bytes = BASE64.decode(encoded)?;
        Self::from_slice(&bytes)
    }
}
