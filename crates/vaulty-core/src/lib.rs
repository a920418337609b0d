//! Core services for vaulty
//!
//! This crate checks and repairs the state of a project that renders vault
//! secrets into local files:
//!
//! - **Issue collection**: every check reports deduplicated, severity-ranked
//!   issues, optionally carrying a fix
//! - **Configuration**: project root discovery, config file loading and validation
//! - **Store**: per-project token values kept in the home directory
//! - **Tokens and secrets**: lookup, expiry, renewal and secret reads through a
//!   memoized [`VaultClient`]
//! - **Templates**: discovery, drift detection, rendering and output writes
//! - **Audit and fixes**: run every check at once, then apply the attached fixes
//!
//! # Architecture
//!
//! ```text
//!                    vaulty-cli
//!                        |
//!                   vaulty-core
//!                        |
//!              +---------+---------+
//!              |                   |
//!          vaulty-fs           vaulty-git
//! ```
//!
//! All state of one invocation lives in a [`Context`].
//!
//! # Example
//!
//! ```ignore
//! use vaulty_core::{Context, IssueFilters, Options};
//!
//! async fn audit(cwd: &std::path::Path) -> vaulty_core::Result<()> {
//!     let context = Context::new(Options::new(cwd))?;
//!     let issues = context.run_audit().await;
//!     println!("{} issue(s)", issues.counts(&IssueFilters::all()).total);
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod config;
pub mod context;
pub mod error;
pub mod fix;
pub mod issue;
pub mod project;
pub mod secret;
pub mod store;
pub mod template;
pub mod token;
pub mod vault;

pub use config::{Config, SecretConfig};
pub use context::{Context, DEFAULT_HTTP_TIMEOUT, Options};
pub use error::{Error, Result};
pub use fix::{FailedFix, FixKind, FixReport, pending_fixes};
pub use issue::{
    CollectExt, Issue, IssueCounts, IssueFilters, IssueInput, IssuesCollection, IssuesCollector,
    Scope, Severity,
};
pub use secret::Secret;
pub use store::{STORE_FILENAME, Store, StoreData, StoreProject};
pub use template::{Template, TemplateData};
pub use token::{RenewReport, RenewedToken, Token};
pub use vault::{
    HttpVaultClient, MemoizedVault, SecretMetadata, SecretRequest, TokenLookup, TokenRenewal,
    VaultClient, VaultError, VaultSecret,
};
