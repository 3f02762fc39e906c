//! Client identifier and secret for the OAuth client-credentials grant

use crate::error::{Result, ValidationError};
use crate::security::SecureString;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;

/// Process-wide catalog credentials, immutable once built
#[derive(Clone)]
pub struct ClientCredentials {
    client_id: String,
    client_secret: SecureString,
}

impl ClientCredentials {
    /// Create credentials, rejecting empty values
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<SecureString>) -> Result<Self> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();

        if client_id.trim().is_empty() {
            return Err(ValidationError::missing_field("client_id").into());
        }
        if client_secret.is_empty() {
            return Err(ValidationError::missing_field("client_secret").into());
        }

        Ok(Self {
            client_id,
            client_secret,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Value of the `Authorization` header for the token exchange:
    /// `Basic base64(client_id:client_secret)`
    pub fn basic_authorization(&self) -> String {
        let mut raw = Vec::with_capacity(self.client_id.len() + 1 + self.client_secret.as_bytes().len());
        raw.extend_from_slice(self.client_id.as_bytes());
        raw.push(b':');
        raw.extend_from_slice(self.client_secret.as_bytes());

        let encoded = STANDARD.encode(&raw);
        zeroize::Zeroize::zeroize(&mut raw);

        format!("Basic {encoded}")
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret)
            .finish()
    }
}
