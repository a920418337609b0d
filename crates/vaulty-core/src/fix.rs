//! Remediation actions attached to issues

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::issue::{CollectExt, Issue, IssueFilters, Scope, Severity};
use crate::{Error, Result};

/// A remediation an issue can carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FixKind {
    /// Render the template and overwrite its output.
    RenderTemplate { template: String },
    /// Remove the token from the current project in the store.
    DeleteToken { token: String },
    /// Delete the store and recreate it empty.
    ResetStore,
    /// Change the permissions of a file.
    Chmod { path: PathBuf, mode: u32 },
}

impl FixKind {
    /// Destructive fixes need explicit consent before they run.
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::ResetStore)
    }

    /// Whether `issue` was raised on the target of this fix.
    fn targets(&self, issue: &Issue) -> bool {
        let source = issue.source.as_deref();
        match self {
            Self::RenderTemplate { template } => {
                issue.scope == Scope::Template && source == Some(template.as_str())
            }
            Self::DeleteToken { token } => {
                issue.scope == Scope::Token && source == Some(token.as_str())
            }
            Self::ResetStore => issue.scope == Scope::Store,
            Self::Chmod { path, .. } => {
                issue.scope == Scope::Store && source == Some(path.display().to_string().as_str())
            }
        }
    }
}

impl fmt::Display for FixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RenderTemplate { template } => write!(f, "render {template}"),
            Self::DeleteToken { token } => write!(f, "delete token {token} from the store"),
            Self::ResetStore => write!(f, "reset the store"),
            Self::Chmod { path, mode } => write!(f, "chmod {:o} {}", mode, path.display()),
        }
    }
}

/// A fix that could not be applied.
#[derive(Debug, Clone)]
pub struct FailedFix {
    pub fix: FixKind,
    pub reason: String,
}

/// Outcome of a fix run.
#[derive(Debug, Clone, Default)]
pub struct FixReport {
    pub applied: Vec<FixKind>,
    pub skipped: Vec<FixKind>,
    pub failed: Vec<FailedFix>,
}

impl FixReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Distinct fixes carried by `issues`, in issue order.
pub fn pending_fixes(issues: &[Issue]) -> Vec<FixKind> {
    let mut fixes: Vec<FixKind> = Vec::new();
    for fix in issues.iter().filter_map(|issue| issue.fix.as_ref()) {
        if !fixes.contains(fix) {
            fixes.push(fix.clone());
        }
    }
    fixes
}

impl Context {
    /// Execute a single fix.
    pub async fn apply_fix(&self, fix: &FixKind) -> Result<()> {
        tracing::info!(%fix, "applying fix");
        match fix {
            FixKind::RenderTemplate { template } => {
                self.write_template_output(template).await?;
            }
            FixKind::DeleteToken { token } => {
                self.remove_tokens_from_store(std::slice::from_ref(token))?;
            }
            FixKind::ResetStore => self.reset_store()?,
            FixKind::Chmod { path, mode } => {
                let issues = self
                    .issues()
                    .scoped(Scope::Store, Some(path.display().to_string()));
                vaulty_fs::set_file_mode(path, *mode).collect_into(&issues)?;
            }
        }
        Ok(())
    }

    /// Execute every distinct fix carried by `issues`.
    ///
    /// Fixes run concurrently and independently; a failure is reported in
    /// the returned [`FixReport`] without stopping the others. Destructive
    /// fixes are skipped unless `allow_destructive` is set.
    pub async fn fix_all(&self, issues: &[Issue], allow_destructive: bool) -> FixReport {
        let mut report = FixReport::default();
        let mut runnable = Vec::new();

        for fix in pending_fixes(issues) {
            if fix.is_destructive() && !allow_destructive {
                tracing::warn!(%fix, "skipping destructive fix");
                report.skipped.push(fix);
            } else {
                runnable.push(fix);
            }
        }

        let known: HashSet<String> = self
            .issues()
            .get(&IssueFilters::all())
            .issues
            .into_iter()
            .map(|issue| issue.id)
            .collect();
        let outcomes = join_all(runnable.iter().map(|fix| self.apply_fix(fix))).await;

        for (fix, outcome) in runnable.into_iter().zip(outcomes) {
            match outcome {
                Ok(()) => report.applied.push(fix),
                Err(error) => {
                    let reason = failure_reason(&fix, &error, &known);
                    tracing::warn!(%fix, %reason, "fix failed");
                    report.failed.push(FailedFix { fix, reason });
                }
            }
        }

        report
    }
}

/// Message of the error issue a failed fix produced.
///
/// The collector is shared with other checks and with the fixes running
/// alongside, so issues raised on the fix target win, then errors that did
/// not exist before the run when there is exactly one of them.
fn failure_reason(fix: &FixKind, error: &Error, known: &HashSet<String>) -> String {
    let Error::Issues(collection) = error else {
        return error.to_string();
    };
    let errors: Vec<&Issue> = collection
        .issues
        .iter()
        .filter(|issue| issue.severity == Severity::Error)
        .collect();
    let is_new = |issue: &&&Issue| !known.contains(&issue.id);

    let targeted: Vec<&Issue> = errors.iter().copied().filter(|issue| fix.targets(issue)).collect();
    if let Some(issue) = targeted.iter().find(is_new).or_else(|| targeted.first()) {
        return issue.message.clone();
    }

    let new: Vec<&&Issue> = errors.iter().filter(is_new).collect();
    match new.as_slice() {
        [issue] => issue.message.clone(),
        _ => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{IssueInput, IssuesCollector};

    #[test]
    fn only_reset_store_is_destructive() {
        assert!(FixKind::ResetStore.is_destructive());
        assert!(
            !FixKind::Chmod {
                path: "/tmp/x".into(),
                mode: 0o600
            }
            .is_destructive()
        );
        assert!(
            !FixKind::DeleteToken {
                token: "t".into()
            }
            .is_destructive()
        );
    }

    #[test]
    fn pending_fixes_are_distinct() {
        let issues = IssuesCollector::new();
        let render = FixKind::RenderTemplate {
            template: ".env.vaulty".into(),
        };
        issues.add(
            IssueInput::warn("Output does not exist")
                .with_scope(Scope::Template)
                .with_fix(render.clone()),
        );
        issues.add(
            IssueInput::warn("other")
                .with_scope(Scope::Template)
                .with_fix(render.clone()),
        );
        issues.add(IssueInput::error("no fix"));

        let collection = issues.get(&Default::default());
        assert_eq!(pending_fixes(&collection.issues), vec![render]);
    }

    #[test]
    fn display_describes_action() {
        let chmod = FixKind::Chmod {
            path: "/home/u/.vaulty-store".into(),
            mode: 0o600,
        };
        assert_eq!(chmod.to_string(), "chmod 600 /home/u/.vaulty-store");
    }
}
