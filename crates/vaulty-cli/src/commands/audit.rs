//! Audit report and fix commands

use colored::Colorize;
use vaulty_core::{Context, FixKind, IssueFilters, pending_fixes};

use super::prompt::confirm;
use super::report::print_issues;
use super::{plural, print_done};
use crate::error::{CliError, Result};

/// Run the audit report command
///
/// Issues are reported, not failed on: the command succeeds whatever it
/// finds.
pub async fn run_audit_report(ctx: &Context, json: bool) -> Result<()> {
    let collection = ctx.run_audit().await.get(&IssueFilters::all());

    if json {
        println!("{}", serde_json::to_string_pretty(&collection)?);
    } else {
        print_issues(&collection.issues);
    }
    Ok(())
}

/// Run the audit fix command
pub async fn run_audit_fix(ctx: &Context) -> Result<()> {
    let collection = ctx.run_audit().await.get(&IssueFilters::all());
    let fixes = pending_fixes(&collection.issues);

    if fixes.is_empty() {
        println!("{}", "Nothing to fix".dimmed());
        return Ok(());
    }

    if ctx.options().dry_run {
        for fix in &fixes {
            println!("   {} {}", "would".dimmed(), fix);
        }
        return Ok(());
    }

    let allow_destructive = match fixes.iter().find(|fix| fix.is_destructive()) {
        Some(fix) => confirm_destructive(ctx, fix)?,
        None => false,
    };

    let report = ctx.fix_all(&collection.issues, allow_destructive).await;

    for fix in &report.applied {
        println!("   {} {}", "fixed".dimmed(), fix);
    }
    for fix in &report.skipped {
        println!("   {} {}", "skipped".yellow(), fix);
    }
    for failed in &report.failed {
        println!("   {} {}: {}", "failed".red(), failed.fix, failed.reason);
    }

    if !report.applied.is_empty() {
        print_done(&format!("{} applied", plural(report.applied.len(), "fix", "fixes")));
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::user(format!(
            "{} could not be applied",
            plural(report.failed.len(), "fix", "fixes")
        )))
    }
}

fn confirm_destructive(ctx: &Context, fix: &FixKind) -> Result<bool> {
    let message = format!(
        "{}\n\nThis will {}.\nThis action is irreversible.",
        "A destructive fix is available.".bold(),
        fix
    );
    confirm(ctx, &message)
}
