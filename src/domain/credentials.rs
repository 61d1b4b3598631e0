// src/domain/credentials.rs

use std::fmt;

/// Startup credentials: an endpoint identifier and its secret.
///
/// Used once, to obtain a device channel. The secret is never printed by
/// `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    endpoint_id: String,
    secret: String,
}

impl Credentials {
    pub fn new(endpoint_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            endpoint_id: endpoint_id.into(),
            secret: secret.into(),
        }
    }

    pub fn endpoint_id(&self) -> &str {
        &self.endpoint_id
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("endpoint_id", &self.endpoint_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}
