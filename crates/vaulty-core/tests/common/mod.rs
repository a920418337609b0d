//! Shared fixtures for vaulty-core integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use vaulty_core::{
    Context, Options, SecretMetadata, SecretRequest, TokenLookup, TokenRenewal, VaultClient,
    VaultError, VaultSecret,
};
use vaulty_test_utils::project::TestProject;

/// In-memory vault keyed by secret path and token value.
#[derive(Default)]
pub struct FakeVault {
    secrets: Mutex<HashMap<String, Result<VaultSecret, VaultError>>>,
    tokens: Mutex<HashMap<String, TokenLookup>>,
    failing_renewals: Mutex<HashSet<String>>,
    reads: AtomicUsize,
    lookups: AtomicUsize,
    renewals: AtomicUsize,
}

impl FakeVault {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_secret(&self, path: &str, data: Value) {
        let secret = VaultSecret {
            data: data.as_object().cloned(),
            metadata: SecretMetadata {
                version: Some(1),
                ..SecretMetadata::default()
            },
        };
        self.secrets.lock().unwrap().insert(path.to_string(), Ok(secret));
    }

    pub fn set_destroyed(&self, path: &str) {
        let secret = VaultSecret {
            data: Some(Default::default()),
            metadata: SecretMetadata {
                destroyed: true,
                ..SecretMetadata::default()
            },
        };
        self.secrets.lock().unwrap().insert(path.to_string(), Ok(secret));
    }

    pub fn set_error(&self, path: &str, message: &str) {
        self.secrets.lock().unwrap().insert(
            path.to_string(),
            Err(VaultError::new(format!("http://vault.test/v1/data/{path}"), message)),
        );
    }

    pub fn set_token(&self, value: &str, lookup: TokenLookup) {
        self.tokens.lock().unwrap().insert(value.to_string(), lookup);
    }

    /// Make renewals of token value `value` fail.
    pub fn fail_renewal(&self, value: &str) {
        self.failing_renewals.lock().unwrap().insert(value.to_string());
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn renewals(&self) -> usize {
        self.renewals.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VaultClient for FakeVault {
    async fn read_secret(
        &self,
        request: &SecretRequest,
    ) -> Result<Option<VaultSecret>, VaultError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match self.secrets.lock().unwrap().get(&request.path) {
            Some(result) => result.clone().map(Some),
            None => Ok(None),
        }
    }

    async fn lookup_token(
        &self,
        _address: &str,
        token: &str,
    ) -> Result<Option<TokenLookup>, VaultError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(Some(
            self.tokens
                .lock()
                .unwrap()
                .get(token)
                .cloned()
                .unwrap_or_default(),
        ))
    }

    async fn renew_token(
        &self,
        address: &str,
        token: &str,
    ) -> Result<Option<TokenRenewal>, VaultError> {
        self.renewals.fetch_add(1, Ordering::SeqCst);
        if self.failing_renewals.lock().unwrap().contains(token) {
            return Err(VaultError::new(
                format!("{address}/v1/auth/token/renew-self"),
                "permission denied",
            ));
        }
        Ok(Some(TokenRenewal {
            lease_duration: 3600,
            renewable: true,
            ..TokenRenewal::default()
        }))
    }
}

/// Configuration declaring `app` (path `app`) and `db` (path `db`), both
/// read with the token named `main`.
pub const TWO_SECRETS: &str = "\
secrets:
  app:
    address: http://vault.test
    path: app
    token: main
  db:
    address: http://vault.test
    path: db
    token: main
";

/// Canonical project root, the form used as the store key.
pub fn project_key(project: &TestProject) -> String {
    canonical(project).to_string_lossy().into_owned()
}

pub fn canonical(project: &TestProject) -> PathBuf {
    dunce::canonicalize(project.root()).unwrap()
}

/// Options for `project` with an isolated home directory.
pub fn options(project: &TestProject) -> Options {
    Options::new(project.root()).with_home_dir(project.home())
}

/// A context for `project` talking to `vault`, with token `main` supplied
/// on the command line.
pub fn context(project: &TestProject, vault: &Arc<FakeVault>) -> Context {
    let vault: Arc<dyn VaultClient> = vault.clone();
    Context::with_client(options(project).with_token("main", "s.main"), vault)
}

/// A project configured with [`TWO_SECRETS`] and a vault holding both.
pub fn seeded() -> (TestProject, Arc<FakeVault>) {
    let project = TestProject::new();
    project.write_config(".vaultyrc.yml", TWO_SECRETS);

    let vault = FakeVault::new();
    vault.set_secret("app", serde_json::json!({"key": "k-123"}));
    vault.set_secret("db", serde_json::json!({"user": "admin", "pass": "p@ss word"}));
    (project, vault)
}
