//! Template list, write and delete commands

use colored::Colorize;
use futures::future::join_all;
use vaulty_core::Context;

use super::{fail_on_errors, plural, print_done, split_patterns};
use crate::error::Result;

/// Run the templates list command
pub fn run_templates_list(ctx: &Context, patterns: &[String]) -> Result<()> {
    let names = ctx.find_templates(&split_patterns(patterns))?;

    if names.is_empty() {
        println!("{}", "No templates found".dimmed());
        return Ok(());
    }

    for name in names {
        println!("{name}");
    }
    Ok(())
}

/// Run the templates write command
///
/// Every selected template is attempted. Failures are collected and reported
/// once all outputs that could be written are written.
pub async fn run_templates_write(ctx: &Context, patterns: &[String]) -> Result<()> {
    let names = ctx.find_templates(&split_patterns(patterns))?;

    if names.is_empty() {
        println!("{}", "No templates found".dimmed());
        return Ok(());
    }

    let dry_run = ctx.options().dry_run;
    let outcomes = join_all(names.iter().map(|name| async move {
        if dry_run {
            ctx.get_template(name).map(|template| template.output)
        } else {
            ctx.write_template_output(name)
                .await
                .map(|template| template.output)
        }
    }))
    .await;

    let mut written = 0;
    for (name, outcome) in names.iter().zip(outcomes) {
        match outcome {
            Ok(output) if dry_run => {
                println!("   {} {}", "would write".dimmed(), output.cyan());
                written += 1;
            }
            Ok(output) => {
                tracing::debug!(template = %name, %output, "output written");
                written += 1;
            }
            Err(_) => tracing::debug!(template = %name, "output not written"),
        }
    }

    match (written, dry_run) {
        (0, _) => println!("{}", "No outputs written".dimmed()),
        (n, true) => print_done(&format!("{} would be written", plural(n, "output", "outputs"))),
        (n, false) => print_done(&format!("{} written", plural(n, "output", "outputs"))),
    }

    fail_on_errors(ctx)
}

/// Run the templates delete command
pub fn run_templates_delete(ctx: &Context, patterns: &[String]) -> Result<()> {
    let names = ctx.find_templates(&split_patterns(patterns))?;

    if names.is_empty() {
        println!("{}", "No templates found".dimmed());
        return Ok(());
    }

    let dry_run = ctx.options().dry_run;
    let mut deleted = 0;
    for name in &names {
        let outcome = if dry_run {
            ctx.template_output_path(name).map(|path| {
                let exists = path.is_file();
                if exists {
                    println!("   {} {}", "would delete".dimmed(), path.display().to_string().cyan());
                }
                exists
            })
        } else {
            ctx.delete_template_output(name)
        };

        match outcome {
            Ok(true) => deleted += 1,
            Ok(false) => tracing::debug!(template = %name, "no output to delete"),
            Err(_) => tracing::debug!(template = %name, "output not deleted"),
        }
    }

    match (deleted, dry_run) {
        (0, _) => println!("{}", "No outputs deleted".dimmed()),
        (n, true) => print_done(&format!("{} would be deleted", plural(n, "output", "outputs"))),
        (n, false) => print_done(&format!("{} deleted", plural(n, "output", "outputs"))),
    }

    fail_on_errors(ctx)
}
