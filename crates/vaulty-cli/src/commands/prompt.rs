//! Confirmation prompts for destructive commands

use colored::Colorize;
use dialoguer::Confirm;
use vaulty_core::Context;

use crate::error::Result;

/// Ask before a destructive action unless `--force` was given.
pub fn confirm(ctx: &Context, message: &str) -> Result<bool> {
    if ctx.options().force {
        return Ok(true);
    }

    println!("{message}");
    println!();

    Ok(Confirm::new()
        .with_prompt("Do you want to continue?")
        .default(false)
        .interact()?)
}

/// Like [`confirm`], reporting the abort when the user declined.
pub fn confirm_or_abort(ctx: &Context, message: &str) -> Result<bool> {
    let proceed = confirm(ctx, message)?;
    if !proceed {
        println!("{} Aborted", "✖".red());
    }
    Ok(proceed)
}
