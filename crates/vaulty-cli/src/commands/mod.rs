//! Command implementations for vaulty-cli

pub mod audit;
pub mod config;
pub mod projects;
pub mod prompt;
pub mod render;
pub mod report;
pub mod secrets;
pub mod store;
pub mod templates;
pub mod tokens;

pub use audit::{run_audit_fix, run_audit_report};
pub use config::{run_config_default, run_config_show, run_config_source};
pub use projects::{run_projects_current, run_projects_delete, run_projects_list};
pub use render::run_render;
pub use secrets::run_secrets_show;
pub use store::{run_store_delete, run_store_reset, run_store_show, run_store_source};
pub use templates::{run_templates_delete, run_templates_list, run_templates_write};
pub use tokens::{
    run_tokens_delete, run_tokens_list, run_tokens_lookup, run_tokens_renew, run_tokens_save,
};

use colored::Colorize;
use serde::Serialize;
use vaulty_core::{Context, IssueFilters, Severity};

use crate::error::Result;

const SECTION_WIDTH: usize = 80;

/// Split pattern arguments on whitespace, so `'a/** !b/**'` counts as two.
pub fn split_patterns(raw: &[String]) -> Vec<String> {
    raw.iter()
        .flat_map(|arg| arg.split_whitespace())
        .map(String::from)
        .collect()
}

/// `1 output`, `2 outputs`.
pub fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Print a `─ title ─────` separator.
pub fn print_section(title: &str) {
    let used = title.chars().count() + 3;
    println!(
        "─ {} {}",
        title.bold(),
        "─".repeat(SECTION_WIDTH.saturating_sub(used))
    );
}

/// Print structured data as pretty JSON, or YAML for humans.
pub fn print_data<T: Serialize + ?Sized>(value: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", serde_yaml::to_string(value)?);
    }
    Ok(())
}

/// Fail with the collected issues when any of them is an error.
pub fn fail_on_errors(ctx: &Context) -> Result<()> {
    let errors = IssueFilters::all().severity(Severity::Error);
    if ctx.issues().counts(&errors).total > 0 {
        return Err(ctx.issues().error().into());
    }
    Ok(())
}

/// Print a success line.
pub fn print_done(message: &str) {
    println!("{} {}", "✔".green(), message);
}
