//! Secret resolution

use std::sync::LazyLock;

use futures::future::join_all;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::context::Context;
use crate::issue::{CollectExt, IssueInput, Scope};
use crate::token::Token;
use crate::vault::{SecretMetadata, SecretRequest, VaultClient};
use crate::Result;

static SECRET_NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap());

/// Whether `name` is usable as a secret name.
pub fn is_valid_secret_name(name: &str) -> bool {
    SECRET_NAME_RE.is_match(name)
}

/// A secret fetched from the vault.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Secret {
    pub key: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub path: String,
    #[serde(skip)]
    pub token: Token,
    pub metadata: SecretMetadata,
    pub data: Map<String, Value>,
}

impl Context {
    /// Fetch the secret declared as `name` in the configuration.
    pub async fn get_secret(&self, name: &str) -> Result<Secret> {
        let config = self.config()?;
        let issues = self.issues().scoped(Scope::Secret, Some(name));

        let Some(secret_config) = config.secrets.get(name) else {
            return Err(issues.fail(IssueInput::error("Secret not found")));
        };

        if !is_valid_secret_name(name) {
            return Err(issues.fail(IssueInput::error(
                "Invalid secret name. Please ensure the secret name contains only letters and numbers, and does not include any spaces.",
            )));
        }

        let token = self.get_token(&secret_config.token).await?;

        let request = SecretRequest {
            address: secret_config.address.clone(),
            namespace: secret_config.namespace.clone(),
            path: secret_config.path.clone(),
            token: token.value.clone(),
        };
        let response = self
            .vault()
            .read_secret(&request)
            .await
            .collect_into(&issues)?;

        let Some((data, metadata)) =
            response.and_then(|secret| Some((secret.data?, secret.metadata)))
        else {
            return Err(issues.fail(IssueInput::error("Vault returned no data")));
        };

        if metadata.destroyed {
            return Err(issues.fail(IssueInput::error("Secret has been destroyed")));
        }

        Ok(Secret {
            key: name.to_string(),
            address: secret_config.address.clone(),
            namespace: secret_config.namespace.clone(),
            path: secret_config.path.clone(),
            token,
            metadata,
            data,
        })
    }

    /// Fetch every configured secret concurrently.
    ///
    /// Every secret is attempted so all problems are recorded; the first
    /// failure is returned.
    pub async fn get_secrets(&self) -> Result<Vec<Secret>> {
        let config = self.config()?;
        join_all(config.secrets.keys().map(|name| self.get_secret(name)))
            .await
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("db", true)]
    #[case("App2", true)]
    #[case("my-db", false)]
    #[case("my db", false)]
    #[case("../etc", false)]
    #[case("", false)]
    fn secret_names(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(is_valid_secret_name(name), valid);
    }
}
