//! Vault client abstraction
//!
//! [`VaultClient`] is the seam between the core and the secrets manager.
//! [`HttpVaultClient`] talks to a real server; [`MemoizedVault`] wraps any
//! client so identical calls within one [`crate::Context`] hit the remote once.

mod http;
mod memo;

pub use http::HttpVaultClient;
pub use memo::MemoizedVault;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Failure reported by, or while talking to, the vault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Vault returned errors\n- {}", .errors.join("\n- "))]
pub struct VaultError {
    /// Request URL, or the raw address when it could not be parsed.
    pub url: String,
    pub errors: Vec<String>,
}

impl VaultError {
    pub fn new(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            errors: vec![error.into()],
        }
    }
}

/// Coordinates of a KV v2 secret read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretRequest {
    pub address: String,
    pub namespace: Option<String>,
    pub path: String,
    pub token: String,
}

/// Metadata returned alongside KV v2 secret data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretMetadata {
    pub created_time: Option<String>,
    pub custom_metadata: Option<Value>,
    pub deletion_time: Option<String>,
    pub destroyed: bool,
    pub version: Option<u64>,
}

/// Body of a KV v2 read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSecret {
    pub data: Option<Map<String, Value>>,
    pub metadata: SecretMetadata,
}

/// `auth/token/lookup-self` data, with the response `lease_id` merged in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenLookup {
    pub accessor: String,
    pub display_name: String,
    pub expire_time: Option<String>,
    pub issue_time: Option<String>,
    pub policies: Vec<String>,
    pub renewable: bool,
    pub ttl: i64,
    #[serde(rename = "type")]
    pub token_type: String,
    pub lease_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenLookup {
    /// Renewal needs both the flag and a lease.
    pub fn is_renewable(&self) -> bool {
        self.renewable && !self.lease_id.is_empty()
    }
}

/// `auth/token/renew-self` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenRenewal {
    pub request_id: String,
    pub lease_id: String,
    pub renewable: bool,
    pub lease_duration: i64,
    pub warnings: Option<Vec<String>>,
    pub auth: Option<Value>,
}

/// Remote operations the core needs from a secrets manager.
#[async_trait]
pub trait VaultClient: Send + Sync {
    /// Read a KV v2 secret. `Ok(None)` when the server returned no body.
    async fn read_secret(&self, request: &SecretRequest)
    -> Result<Option<VaultSecret>, VaultError>;

    /// Look up the calling token.
    async fn lookup_token(
        &self,
        address: &str,
        token: &str,
    ) -> Result<Option<TokenLookup>, VaultError>;

    /// Renew the calling token.
    async fn renew_token(
        &self,
        address: &str,
        token: &str,
    ) -> Result<Option<TokenRenewal>, VaultError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_lists_every_message() {
        let err = VaultError {
            url: "http://vault/v1/x".into(),
            errors: vec!["permission denied".into(), "try again".into()],
        };
        assert_eq!(
            err.to_string(),
            "Vault returned errors\n- permission denied\n- try again"
        );
    }

    #[test]
    fn lookup_keeps_unknown_fields() {
        let lookup: TokenLookup = serde_json::from_value(serde_json::json!({
            "expire_time": "2030-01-01T00:00:00Z",
            "renewable": true,
            "num_uses": 0,
            "type": "service"
        }))
        .unwrap();

        assert_eq!(lookup.token_type, "service");
        assert!(lookup.extra.contains_key("num_uses"));
        assert!(!lookup.is_renewable());
    }
}
