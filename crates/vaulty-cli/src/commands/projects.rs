//! Project commands

use colored::Colorize;
use vaulty_core::Context;

use super::prompt::confirm_or_abort;
use super::print_done;
use crate::error::Result;

/// Run the projects list command
pub fn run_projects_list(ctx: &Context) -> Result<()> {
    let projects = ctx.list_projects()?;

    if projects.is_empty() {
        println!("{}", "No project stored".dimmed());
        return Ok(());
    }

    for project in projects {
        println!("{project}");
    }
    Ok(())
}

/// Run the projects current command
pub fn run_projects_current(ctx: &Context) -> Result<()> {
    println!("{}", ctx.config()?.project_key());
    Ok(())
}

/// Run the projects delete command
pub fn run_projects_delete(ctx: &Context) -> Result<()> {
    if ctx.get_project_from_store()?.is_none() {
        println!("{}", "The project is not stored".dimmed());
        return Ok(());
    }

    let project = ctx.config()?.project_key();
    let message = format!(
        "{}\n\n{}",
        "You are about to delete the following project from the store.".bold(),
        project.cyan()
    );
    if !confirm_or_abort(ctx, &message)? {
        return Ok(());
    }

    if ctx.options().dry_run {
        println!("   {} {}", "would delete".dimmed(), project.cyan());
        return Ok(());
    }

    ctx.remove_project_from_store()?;
    print_done("Project deleted");
    Ok(())
}
