//! HTTP vault client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use url::Url;
use vaulty_fs::NormalizedPath;

use super::{SecretRequest, TokenLookup, TokenRenewal, VaultClient, VaultError, VaultSecret};

const TOKEN_HEADER: &str = "X-Vault-Token";

/// Talks to a HashiCorp Vault compatible server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpVaultClient {
    client: Client,
}

impl HttpVaultClient {
    /// Build a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Wrap an existing reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn send(&self, method: Method, url: Url, token: &str) -> Result<Value, VaultError> {
        let source = url.to_string();
        tracing::debug!(%method, url = %source, "vault request");

        let response = self
            .client
            .request(method, url)
            .header(TOKEN_HEADER, token)
            .send()
            .await
            .map_err(|e| VaultError::new(&source, e.to_string()))?;

        let status = response.status();
        let body: Option<Value> = response.json().await.ok();

        if let Some(errors) = body.as_ref().and_then(error_messages) {
            return Err(VaultError {
                url: source,
                errors,
            });
        }

        if !status.is_success() {
            return Err(VaultError::new(
                source,
                format!("Request failed with status code {}", status.as_u16()),
            ));
        }

        Ok(body.unwrap_or(Value::Null))
    }
}

/// Non-empty `errors` array of a vault response body.
fn error_messages(body: &Value) -> Option<Vec<String>> {
    let errors = body.get("errors")?.as_array()?;
    if errors.is_empty() {
        return None;
    }
    Some(
        errors
            .iter()
            .map(|e| match e {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
    )
}

/// `{address}/v1/{segments...}` with dot segments and duplicate slashes removed.
pub(crate) fn endpoint(address: &str, segments: &[&str]) -> Result<Url, VaultError> {
    let base = Url::parse(address).map_err(|e| VaultError::new(address, e.to_string()))?;
    let pathname = segments
        .iter()
        .fold(NormalizedPath::new("/v1"), |path, segment| path.join(segment));
    base.join(pathname.as_str())
        .map_err(|e| VaultError::new(address, e.to_string()))
}

/// KV v2 read URL for `request`.
pub(crate) fn secret_url(request: &SecretRequest) -> Result<Url, VaultError> {
    let namespace = request.namespace.as_deref().unwrap_or("");
    endpoint(&request.address, &[namespace, "data", &request.path])
}

#[async_trait]
impl VaultClient for HttpVaultClient {
    async fn read_secret(
        &self,
        request: &SecretRequest,
    ) -> Result<Option<VaultSecret>, VaultError> {
        let url = secret_url(request)?;
        let source = url.to_string();
        let body = self.send(Method::GET, url, &request.token).await?;

        match body.get("data") {
            None | Some(Value::Null) => Ok(None),
            Some(data) => serde_json::from_value(data.clone())
                .map(Some)
                .map_err(|e| VaultError::new(source, e.to_string())),
        }
    }

    async fn lookup_token(
        &self,
        address: &str,
        token: &str,
    ) -> Result<Option<TokenLookup>, VaultError> {
        let url = endpoint(address, &["auth/token/lookup-self"])?;
        let source = url.to_string();
        let body = self.send(Method::GET, url, token).await?;

        let lease_id = body
            .get("lease_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match body.get("data") {
            Some(Value::Object(data)) => {
                let mut data = data.clone();
                data.insert("lease_id".into(), Value::String(lease_id));
                serde_json::from_value(Value::Object(data))
                    .map(Some)
                    .map_err(|e| VaultError::new(source, e.to_string()))
            }
            _ => Ok(None),
        }
    }

    async fn renew_token(
        &self,
        address: &str,
        token: &str,
    ) -> Result<Option<TokenRenewal>, VaultError> {
        let url = endpoint(address, &["auth/token/renew-self"])?;
        let source = url.to_string();
        let body = self.send(Method::POST, url, token).await?;

        if body.is_null() {
            return Ok(None);
        }
        serde_json::from_value(body)
            .map(Some)
            .map_err(|e| VaultError::new(source, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://vault.example.com", None, "secret/app", "https://vault.example.com/v1/data/secret/app")]
    #[case("https://vault.example.com/", Some("team"), "app", "https://vault.example.com/v1/team/data/app")]
    #[case("https://vault.example.com/ui", Some("team/"), "/app/", "https://vault.example.com/v1/team/data/app")]
    #[case("http://127.0.0.1:8200", Some(""), "a/../b", "http://127.0.0.1:8200/v1/data/b")]
    fn secret_url_joins_segments(
        #[case] address: &str,
        #[case] namespace: Option<&str>,
        #[case] path: &str,
        #[case] expected: &str,
    ) {
        let request = SecretRequest {
            address: address.into(),
            namespace: namespace.map(String::from),
            path: path.into(),
            token: "t".into(),
        };
        assert_eq!(secret_url(&request).unwrap().as_str(), expected);
    }

    #[test]
    fn invalid_address_is_a_vault_error() {
        let err = endpoint("not a url", &["auth/token/lookup-self"]).unwrap_err();
        assert_eq!(err.url, "not a url");
    }

    #[test]
    fn empty_error_array_is_not_an_error() {
        assert_eq!(error_messages(&serde_json::json!({"errors": []})), None);
        assert_eq!(
            error_messages(&serde_json::json!({"errors": ["denied"]})),
            Some(vec!["denied".to_string()])
        );
    }
}
