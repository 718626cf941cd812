//! Broker credentials, sourced from the environment and never logged or
//! persisted (§6).

use crate::error::BrokerError;
use std::env;

#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
    pub activation_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("activation_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Variables checked, in order:
    /// - `BROKER_USER` (fallback `USER`)
    /// - `BROKER_PASSWORD`
    /// - `BROKER_ACTIVATION_KEY` (defaults to empty string if unset)
    pub fn from_env() -> Result<Self, BrokerError> {
        let user = env::var("BROKER_USER")
            .or_else(|_| env::var("USER"))
            .map_err(|_| BrokerError::fatal("BROKER_USER not set"))?;
        let password = env::var("BROKER_PASSWORD")
            .map_err(|_| BrokerError::fatal("BROKER_PASSWORD not set"))?;
        let activation_key = env::var("BROKER_ACTIVATION_KEY").unwrap_or_default();
        Ok(Self {
            user,
            password,
            activation_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_impl_redacts_secrets() {
        let creds = Credentials {
            user: "trader".into(),
            password: "hunter2".into(),
            activation_key: "zx9fq2".into(),
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("zx9fq2"));
    }
}
