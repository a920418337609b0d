//! Per-context memoization of vault calls

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::{SecretRequest, TokenLookup, TokenRenewal, VaultClient, VaultError, VaultSecret};

type Cell<T> = Arc<OnceCell<Result<T, VaultError>>>;

/// Settled or in-flight results keyed by call arguments.
struct Memo<K, T> {
    cells: Mutex<HashMap<K, Cell<T>>>,
}

impl<K: Eq + Hash, T: Clone> Memo<K, T> {
    fn new() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }

    async fn get_or_call<F, Fut>(&self, key: K, call: F) -> Result<T, VaultError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, VaultError>>,
    {
        let cell = {
            let mut cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(cells.entry(key).or_default())
        };
        cell.get_or_init(call).await.clone()
    }
}

/// Wraps a [`VaultClient`] so identical calls share one remote round trip.
///
/// Errors are memoized too: retrying inside the same context returns the
/// first failure.
pub struct MemoizedVault {
    inner: Arc<dyn VaultClient>,
    secrets: Memo<SecretRequest, Option<VaultSecret>>,
    lookups: Memo<(String, String), Option<TokenLookup>>,
    renewals: Memo<(String, String), Option<TokenRenewal>>,
}

impl MemoizedVault {
    pub fn new(inner: Arc<dyn VaultClient>) -> Self {
        Self {
            inner,
            secrets: Memo::new(),
            lookups: Memo::new(),
            renewals: Memo::new(),
        }
    }
}

#[async_trait]
impl VaultClient for MemoizedVault {
    async fn read_secret(
        &self,
        request: &SecretRequest,
    ) -> Result<Option<VaultSecret>, VaultError> {
        self.secrets
            .get_or_call(request.clone(), || self.inner.read_secret(request))
            .await
    }

    async fn lookup_token(
        &self,
        address: &str,
        token: &str,
    ) -> Result<Option<TokenLookup>, VaultError> {
        self.lookups
            .get_or_call((address.to_string(), token.to_string()), || {
                self.inner.lookup_token(address, token)
            })
            .await
    }

    async fn renew_token(
        &self,
        address: &str,
        token: &str,
    ) -> Result<Option<TokenRenewal>, VaultError> {
        self.renewals
            .get_or_call((address.to_string(), token.to_string()), || {
                self.inner.renew_token(address, token)
            })
            .await
    }
}
