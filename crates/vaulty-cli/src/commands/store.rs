//! Store commands

use colored::Colorize;
use vaulty_core::Context;

use super::prompt::confirm_or_abort;
use super::{print_data, print_done};
use crate::error::Result;

/// Run the store show command
pub fn run_store_show(ctx: &Context, json: bool) -> Result<()> {
    let store = ctx.store()?;

    if !store.exists {
        println!("{}", "The store is empty".dimmed());
        return Ok(());
    }

    print_data(&store.data, json)
}

/// Run the store source command
pub fn run_store_source(ctx: &Context) -> Result<()> {
    println!("{}", ctx.store_path()?.display());
    Ok(())
}

/// Run the store delete command
pub fn run_store_delete(ctx: &Context) -> Result<()> {
    let store = ctx.store()?;

    if !store.exists {
        println!("{}", "The store file doesn't exist".dimmed());
        return Ok(());
    }

    let message = format!(
        "{}\n\nThis will delete the store file and all the data it contains.\nThis action is irreversible.",
        "You are about to delete the store.".bold()
    );
    if !confirm_or_abort(ctx, &message)? {
        return Ok(());
    }

    if ctx.options().dry_run {
        println!("   {} {}", "would delete".dimmed(), store.source.display().to_string().cyan());
        return Ok(());
    }

    ctx.delete_store()?;
    print_done("Store deleted");
    Ok(())
}

/// Run the store reset command
pub fn run_store_reset(ctx: &Context) -> Result<()> {
    let message = format!(
        "{}\n\nThis will delete the store file and recreate an empty one.\nThis action is irreversible.",
        "You are about to reset the store.".bold()
    );
    if !confirm_or_abort(ctx, &message)? {
        return Ok(());
    }

    if ctx.options().dry_run {
        println!("   {} {}", "would reset".dimmed(), ctx.store_path()?.display().to_string().cyan());
        return Ok(());
    }

    ctx.reset_store()?;
    print_done("Store reset");
    Ok(())
}
