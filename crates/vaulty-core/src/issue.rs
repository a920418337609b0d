//! Issue collection
//!
//! Every component reports problems here instead of failing outright. Issues
//! are identified by a hash of their semantic fields, so reporting the same
//! problem twice leaves a single entry. Fatal paths return
//! [`IssuesCollector::error`], which carries a snapshot of everything
//! collected so far.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Error;
use crate::fix::FixKind;

const UNKNOWN_MESSAGE: &str = "An unknown error occurred";

/// Subsystem an issue originates from.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Store,
    Config,
    Secret,
    Token,
    Template,
    Remote,
    #[default]
    Unknown,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Config => "config",
            Self::Secret => "secret",
            Self::Token => "token",
            Self::Template => "template",
            Self::Remote => "remote",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of an issue. Errors sort before warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warn,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub scope: Scope,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<FixKind>,
}

/// Fields supplied when reporting an issue. Missing fields fall back to the
/// collector's defaults.
#[derive(Debug, Clone, Default)]
pub struct IssueInput {
    pub scope: Option<Scope>,
    pub severity: Option<Severity>,
    pub message: Option<String>,
    pub source: Option<String>,
    pub fix: Option<FixKind>,
}

impl IssueInput {
    /// An `error` issue.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Some(Severity::Error),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// A `warn` issue.
    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            severity: Some(Severity::Warn),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_fix(mut self, fix: FixKind) -> Self {
        self.fix = Some(fix);
        self
    }
}

/// Issue counts for a filtered view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCounts {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
    pub fixes: usize,
}

impl IssueCounts {
    pub fn of(issues: &[Issue]) -> Self {
        Self {
            total: issues.len(),
            errors: issues
                .iter()
                .filter(|i| i.severity == Severity::Error)
                .count(),
            warnings: issues
                .iter()
                .filter(|i| i.severity == Severity::Warn)
                .count(),
            fixes: issues.iter().filter(|i| i.fix.is_some()).count(),
        }
    }
}

/// Issues plus their counts, always derived together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuesCollection {
    pub issues: Vec<Issue>,
    pub counts: IssueCounts,
}

impl IssuesCollection {
    fn from_issues(mut issues: Vec<Issue>) -> Self {
        issues.sort_by(|a, b| {
            (a.severity, a.scope, &a.source, &a.message).cmp(&(
                b.severity,
                b.scope,
                &b.source,
                &b.message,
            ))
        });
        let counts = IssueCounts::of(&issues);
        Self { issues, counts }
    }
}

/// Scope/severity filter. Empty lists match everything.
#[derive(Debug, Clone, Default)]
pub struct IssueFilters {
    pub scopes: Vec<Scope>,
    pub severities: Vec<Severity>,
}

impl IssueFilters {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scopes.push(scope);
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severities.push(severity);
        self
    }

    fn matches(&self, issue: &Issue) -> bool {
        (self.scopes.is_empty() || self.scopes.contains(&issue.scope))
            && (self.severities.is_empty() || self.severities.contains(&issue.severity))
    }
}

/// Handle onto a shared issue list.
///
/// Clones and [`scoped`](Self::scoped) handles all append to the same list;
/// they differ only in the defaults applied to new issues.
#[derive(Debug, Clone, Default)]
pub struct IssuesCollector {
    issues: Arc<Mutex<Vec<Issue>>>,
    scope: Scope,
    source: Option<String>,
}

impl IssuesCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle on the same list with different defaults.
    pub fn scoped(&self, scope: Scope, source: Option<impl Into<String>>) -> Self {
        Self {
            issues: Arc::clone(&self.issues),
            scope,
            source: source.map(Into::into),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Issue>> {
        self.issues.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Build an issue without recording it.
    pub fn generate(&self, input: IssueInput) -> Issue {
        let scope = input.scope.unwrap_or(self.scope);
        let severity = input.severity.unwrap_or(Severity::Error);
        let message = input.message.unwrap_or_else(|| UNKNOWN_MESSAGE.to_string());
        let source = input.source.or_else(|| self.source.clone());

        Issue {
            id: issue_id(scope, severity, &message, source.as_deref()),
            scope,
            severity,
            message,
            source,
            fix: input.fix,
        }
    }

    /// Record an issue unless one with the same id exists.
    pub fn add(&self, input: IssueInput) -> &Self {
        let issue = self.generate(input);
        let mut issues = self.lock();
        if !issues.iter().any(|existing| existing.id == issue.id) {
            tracing::debug!(
                scope = %issue.scope,
                severity = %issue.severity,
                source = issue.source.as_deref().unwrap_or("n/a"),
                "{}",
                issue.message
            );
            issues.push(issue);
        }
        self
    }

    /// Record an unexpected error as an `error` issue.
    ///
    /// Collector errors are already recorded and are ignored. Vault errors
    /// are recorded under [`Scope::Remote`] with the request URL as source.
    pub fn add_error(&self, error: &Error) -> &Self {
        match error {
            Error::Issues(_) => self,
            Error::Vault(vault) => self.add(
                IssueInput::error(vault.to_string())
                    .with_scope(Scope::Remote)
                    .with_source(vault.url.clone()),
            ),
            other => self.add(IssueInput::error(other.to_string())),
        }
    }

    /// Record `input` and return the collector error.
    pub fn fail(&self, input: IssueInput) -> Error {
        self.add(input).error()
    }

    pub fn get(&self, filters: &IssueFilters) -> IssuesCollection {
        let issues = self
            .lock()
            .iter()
            .filter(|issue| filters.matches(issue))
            .cloned()
            .collect();
        IssuesCollection::from_issues(issues)
    }

    pub fn counts(&self, filters: &IssueFilters) -> IssueCounts {
        IssueCounts::of(
            &self
                .lock()
                .iter()
                .filter(|issue| filters.matches(issue))
                .cloned()
                .collect::<Vec<_>>(),
        )
    }

    /// Collector error wrapping every issue recorded so far.
    pub fn error(&self) -> Error {
        Error::Issues(self.get(&IssueFilters::all()))
    }
}

/// Convert a fallible result into a collector failure.
pub trait CollectExt<T> {
    /// On error, record it in `issues` and return the collector error.
    fn collect_into(self, issues: &IssuesCollector) -> crate::Result<T>;
}

impl<T, E: Into<Error>> CollectExt<T> for std::result::Result<T, E> {
    fn collect_into(self, issues: &IssuesCollector) -> crate::Result<T> {
        self.map_err(|e| {
            let error = e.into();
            issues.add_error(&error);
            issues.error()
        })
    }
}

/// Hex SHA-256 of the canonical JSON form of the identity fields.
///
/// Keys are sorted and `source` is omitted when absent.
pub fn issue_id(scope: Scope, severity: Severity, message: &str, source: Option<&str>) -> String {
    let mut fields: BTreeMap<&str, &str> = BTreeMap::new();
    fields.insert("message", message);
    fields.insert("scope", scope.as_str());
    fields.insert("severity", severity.as_str());
    if let Some(source) = source {
        fields.insert("source", source);
    }

    // BTreeMap<&str, &str> always serializes
    let canonical = serde_json::to_string(&fields).unwrap_or_default();
    hex::encode(Sha256::digest(canonical.as_bytes()))
}
