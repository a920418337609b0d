//! Token lifecycle
//!
//! A token is referenced by name from secret configs. Its value comes from
//! the store or the command line; its metadata comes from the vault. A token
//! must point at exactly one vault address and must not be expired before
//! any secret is fetched with it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;

use crate::context::Context;
use crate::fix::FixKind;
use crate::issue::{CollectExt, IssueInput, IssuesCollector, Scope};
use crate::vault::{TokenLookup, TokenRenewal, VaultClient};
use crate::Result;

/// A resolved token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub key: String,
    pub value: String,
    /// Vault address shared by every secret using the token. Empty when the
    /// token is unused.
    pub address: String,
    pub metadata: Option<TokenLookup>,
    /// `false` when the value came from the command line.
    pub from_store: bool,
}

impl Token {
    /// Parsed `expire_time`, if the vault reported one.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.metadata.as_ref().and_then(expire_time)
    }

    pub fn is_renewable(&self) -> bool {
        self.metadata.as_ref().is_some_and(TokenLookup::is_renewable)
    }
}

fn expire_time(lookup: &TokenLookup) -> Option<DateTime<Utc>> {
    let raw = lookup.expire_time.as_deref().filter(|s| !s.is_empty())?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(time) => Some(time.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!(expire_time = raw, error = %e, "unparsable token expiry");
            None
        }
    }
}

/// A renewed token.
#[derive(Debug, Clone)]
pub struct RenewedToken {
    pub key: String,
    pub renewal: Option<TokenRenewal>,
}

/// Outcome of a batch renewal. Skipped tokens are not renewable; failed
/// ones have an error issue in the collector.
#[derive(Debug, Clone, Default)]
pub struct RenewReport {
    pub renewed: Vec<RenewedToken>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl RenewReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl Context {
    fn token_issues(&self, name: &str) -> IssuesCollector {
        self.issues().scoped(Scope::Token, Some(name))
    }

    /// Store tokens of the current project overlaid with command-line tokens.
    ///
    /// Returns each name with its value and whether it came from the store.
    fn available_tokens(&self) -> Result<BTreeMap<String, (String, bool)>> {
        let stored = self
            .get_project_from_store()?
            .map(|project| project.tokens)
            .unwrap_or_default();

        let mut tokens: BTreeMap<String, (String, bool)> = stored
            .into_iter()
            .map(|(name, value)| (name, (value, true)))
            .collect();
        for (name, value) in &self.options().tokens {
            tokens.insert(name.clone(), (value.clone(), false));
        }
        Ok(tokens)
    }

    /// Resolve a token by name and check it against the configuration and
    /// the vault.
    pub async fn get_token(&self, name: &str) -> Result<Token> {
        let config = self.config()?;
        let issues = self.token_issues(name);

        let Some((value, from_store)) = self
            .available_tokens()?
            .remove(name)
            .filter(|(value, _)| !value.is_empty())
        else {
            return Err(issues.fail(IssueInput::error("Token not found")));
        };

        let mut addresses: Vec<&str> = Vec::new();
        for (_, secret) in config.secrets_using(name) {
            if !addresses.contains(&secret.address.as_str()) {
                addresses.push(&secret.address);
            }
        }

        let address = match addresses.as_slice() {
            [] => {
                issues.add(
                    IssueInput::warn("Token is not used").with_fix(FixKind::DeleteToken {
                        token: name.to_string(),
                    }),
                );
                return Ok(Token {
                    key: name.to_string(),
                    value,
                    address: String::new(),
                    metadata: None,
                    from_store,
                });
            }
            [address] => address.to_string(),
            many => {
                return Err(issues.fail(IssueInput::error(format!(
                    "Token have inconsistent addresses\n- {}",
                    many.join("\n- ")
                ))));
            }
        };

        let metadata = self
            .vault()
            .lookup_token(&address, &value)
            .await
            .collect_into(&issues)?;

        if let Some(expires_at) = metadata.as_ref().and_then(expire_time) {
            if expires_at < Utc::now() {
                return Err(issues.fail(IssueInput::error("Token has expired")));
            }
        }

        Ok(Token {
            key: name.to_string(),
            value,
            address,
            metadata,
            from_store,
        })
    }

    /// Resolve every known token, or only those in `names` when non-empty.
    ///
    /// All tokens are checked even when one fails; the first failure is
    /// returned.
    pub async fn get_tokens(&self, names: &[String]) -> Result<Vec<Token>> {
        let available = self.available_tokens()?;
        let selected: Vec<&String> = available
            .keys()
            .filter(|name| names.is_empty() || names.contains(name))
            .collect();

        join_all(selected.into_iter().map(|name| self.get_token(name)))
            .await
            .into_iter()
            .collect()
    }

    /// Renew one token.
    pub async fn renew_token(&self, name: &str) -> Result<Option<TokenRenewal>> {
        let token = self.get_token(name).await?;
        let issues = self.token_issues(name);

        if token.address.is_empty() {
            return Err(issues.fail(IssueInput::error("Token has no vault address")));
        }

        tracing::info!(token = name, "renewing token");
        self.vault()
            .renew_token(&token.address, &token.value)
            .await
            .collect_into(&issues)
    }

    /// Renew the renewable tokens among `names` (all tokens when empty).
    ///
    /// Tokens without a lease or without the renewable flag are skipped and
    /// listed in the report. A failed renewal is listed as failed without
    /// discarding the others.
    pub async fn renew_tokens(&self, names: &[String]) -> Result<RenewReport> {
        let tokens = self.get_tokens(names).await?;
        let (renewable, skipped): (Vec<Token>, Vec<Token>) =
            tokens.into_iter().partition(Token::is_renewable);

        for token in &skipped {
            tracing::warn!(token = %token.key, "token is not renewable and will not be renewed");
        }

        let outcomes = join_all(renewable.iter().map(|token| self.renew_token(&token.key))).await;

        let mut report = RenewReport {
            skipped: skipped.into_iter().map(|token| token.key).collect(),
            ..RenewReport::default()
        };
        for (token, outcome) in renewable.into_iter().zip(outcomes) {
            match outcome {
                Ok(renewal) => report.renewed.push(RenewedToken {
                    key: token.key,
                    renewal,
                }),
                Err(error) => {
                    tracing::warn!(token = %token.key, %error, "token renewal failed");
                    report.failed.push(token.key);
                }
            }
        }

        Ok(report)
    }

    /// Save tokens for the current project, keeping the others.
    pub fn add_tokens_to_store(&self, tokens: &BTreeMap<String, String>) -> Result<()> {
        let key = self.config()?.project_key();
        self.update_store(|data| {
            data.projects
                .entry(key)
                .or_default()
                .tokens
                .extend(tokens.iter().map(|(k, v)| (k.clone(), v.clone())));
        })
    }

    /// Remove tokens from the current project.
    pub fn remove_tokens_from_store(&self, names: &[String]) -> Result<()> {
        let key = self.config()?.project_key();
        self.update_store(|data| {
            let project = data.projects.entry(key).or_default();
            for name in names {
                project.tokens.remove(name);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(expire_time: Option<&str>, renewable: bool, lease_id: &str) -> TokenLookup {
        TokenLookup {
            expire_time: expire_time.map(String::from),
            renewable,
            lease_id: lease_id.to_string(),
            ..TokenLookup::default()
        }
    }

    #[test]
    fn expiry_parses_rfc3339_with_offset() {
        let parsed = expire_time(&lookup(Some("2018-05-19T11:35:54.466476215-04:00"), false, ""));
        assert_eq!(
            parsed.unwrap().to_rfc3339(),
            "2018-05-19T15:35:54.466476215+00:00"
        );
    }

    #[test]
    fn missing_or_invalid_expiry_is_none() {
        assert!(expire_time(&lookup(None, false, "")).is_none());
        assert!(expire_time(&lookup(Some(""), false, "")).is_none());
        assert!(expire_time(&lookup(Some("tomorrow"), false, "")).is_none());
    }

    #[test]
    fn renewable_needs_flag_and_lease() {
        let token = |metadata| Token {
            key: "t".into(),
            value: "v".into(),
            address: "http://vault/".into(),
            metadata,
            from_store: true,
        };
        assert!(token(Some(lookup(None, true, "lease"))).is_renewable());
        assert!(!token(Some(lookup(None, true, ""))).is_renewable());
        assert!(!token(Some(lookup(None, false, "lease"))).is_renewable());
        assert!(!token(None).is_renewable());
    }
}
