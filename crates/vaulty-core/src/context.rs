//! Request-scoped state
//!
//! One [`Context`] lives for one command invocation. It owns the issue list
//! and every lazily computed value (config, store, template engine, template
//! data, memoized vault calls), so two contexts never observe each other.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use crate::config::Config;
use crate::issue::{CollectExt, IssuesCollector, Scope};
use crate::store::Store;
use crate::template::TemplateData;
use crate::vault::{HttpVaultClient, MemoizedVault, VaultClient};
use crate::Result;

/// Default per-request timeout for vault calls.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Invocation options shared by every operation.
#[derive(Debug, Clone)]
pub struct Options {
    /// Directory the command runs from.
    pub cwd: PathBuf,
    /// Explicit configuration file, relative paths resolve against `cwd`.
    pub config: Option<PathBuf>,
    /// Token values supplied on the command line. They win over the store.
    pub tokens: BTreeMap<String, String>,
    pub force: bool,
    pub dry_run: bool,
    /// Directory holding the store file, defaults to the user's home.
    pub home_dir: Option<PathBuf>,
    pub http_timeout: Duration,
}

impl Options {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            config: None,
            tokens: BTreeMap::new(),
            force: false,
            dry_run: false,
            home_dir: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    pub fn with_config(mut self, config: impl Into<PathBuf>) -> Self {
        self.config = Some(config.into());
        self
    }

    pub fn with_token(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tokens.insert(name.into(), value.into());
        self
    }

    pub fn with_home_dir(mut self, home_dir: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(home_dir.into());
        self
    }
}

/// State for one invocation.
pub struct Context {
    options: Options,
    issues: IssuesCollector,
    vault: MemoizedVault,
    pub(crate) config: OnceLock<Option<Arc<Config>>>,
    pub(crate) store: Mutex<Option<Store>>,
    pub(crate) engine: OnceLock<minijinja::Environment<'static>>,
    pub(crate) template_data: tokio::sync::OnceCell<TemplateData>,
}

impl Context {
    /// Context talking to vault over HTTP.
    pub fn new(options: Options) -> Result<Self> {
        let issues = IssuesCollector::new();
        let client = HttpVaultClient::new(options.http_timeout)
            .map_err(|e| crate::Error::Message(e.to_string()))
            .collect_into(&issues.scoped(Scope::Remote, None::<String>))?;
        Ok(Self::build(options, issues, Arc::new(client)))
    }

    /// Context using `client` for every remote call.
    pub fn with_client(options: Options, client: Arc<dyn VaultClient>) -> Self {
        Self::build(options, IssuesCollector::new(), client)
    }

    fn build(options: Options, issues: IssuesCollector, client: Arc<dyn VaultClient>) -> Self {
        Self {
            options,
            issues,
            vault: MemoizedVault::new(client),
            config: OnceLock::new(),
            store: Mutex::new(None),
            engine: OnceLock::new(),
            template_data: tokio::sync::OnceCell::new(),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The shared issue collector.
    pub fn issues(&self) -> &IssuesCollector {
        &self.issues
    }

    pub(crate) fn vault(&self) -> &MemoizedVault {
        &self.vault
    }
}
