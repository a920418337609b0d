//! Audit orchestration

use crate::context::Context;
use crate::issue::IssuesCollector;

impl Context {
    /// Run every check concurrently and return the collected issues.
    ///
    /// Fatal errors of individual checks are dropped: each check has already
    /// recorded its issues, and one failing check must not hide the others.
    pub async fn run_audit(&self) -> &IssuesCollector {
        let (config, store, tokens, project, secrets, templates) = futures::join!(
            async { self.config().map(drop) },
            async { self.store().map(drop) },
            self.get_tokens(&[]),
            async { self.get_project_from_store().map(drop) },
            self.get_secrets(),
            async { self.get_templates(&[]).map(drop) },
        );

        let failed = [
            config.is_err(),
            store.is_err(),
            tokens.is_err(),
            project.is_err(),
            secrets.is_err(),
            templates.is_err(),
        ]
        .into_iter()
        .filter(|failed| *failed)
        .count();
        tracing::debug!(failed_checks = failed, "audit finished");

        self.issues()
    }
}
