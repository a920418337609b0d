//! Token commands

use std::collections::BTreeMap;

use colored::Colorize;
use vaulty_core::{Context, Token};

use super::prompt::confirm_or_abort;
use super::{plural, print_done, print_section};
use crate::error::Result;

fn print_sections<T>(items: &[T], mut print: impl FnMut(&T) -> Result<()>) -> Result<()> {
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            println!();
        }
        print(item)?;
    }
    Ok(())
}

/// Run the tokens list command
pub async fn run_tokens_list(ctx: &Context) -> Result<()> {
    let tokens = ctx.get_tokens(&[]).await?;

    if tokens.is_empty() {
        println!("{}", "No tokens found".dimmed());
        return Ok(());
    }

    print_sections(&tokens, |token: &Token| {
        let expires = token
            .expires_at()
            .map(|time| time.to_rfc3339())
            .unwrap_or_else(|| "n/a".to_string());
        let source = if token.from_store { "Store" } else { "Option" };

        print_section(&token.key);
        println!("{:>8} {}", "Value:", token.value.green());
        println!("{:>8} {}", "Expires:", expires.green());
        println!("{:>8} {}", "Source:", source.green());
        Ok(())
    })
}

/// Run the tokens save command
pub fn run_tokens_save(ctx: &Context, tokens: &[(String, String)]) -> Result<()> {
    if tokens.is_empty() {
        println!("{}", "No token to save".dimmed());
        return Ok(());
    }

    let tokens: BTreeMap<String, String> = tokens.iter().cloned().collect();
    if ctx.options().dry_run {
        for name in tokens.keys() {
            println!("   {} {}", "would save".dimmed(), name.cyan());
        }
        return Ok(());
    }

    ctx.add_tokens_to_store(&tokens)?;
    print_done(&format!("{} saved", plural(tokens.len(), "token", "tokens")));
    Ok(())
}

/// Run the tokens delete command
///
/// Only tokens saved in the store can be deleted; without names every saved
/// token of the project is selected.
pub fn run_tokens_delete(ctx: &Context, names: &[String]) -> Result<()> {
    let stored = ctx
        .get_project_from_store()?
        .map(|project| project.tokens)
        .unwrap_or_default();
    let selected: Vec<String> = stored
        .into_keys()
        .filter(|name| names.is_empty() || names.contains(name))
        .collect();

    if selected.is_empty() {
        println!("{}", "No tokens found".dimmed());
        return Ok(());
    }

    let project = ctx.config()?.project_key();
    let listing: Vec<String> = selected.iter().map(|name| format!("- {name}")).collect();
    let message = format!(
        "{}\n\n{}\n\nProject: {}",
        "You are about to delete the following tokens from the store.".bold(),
        listing.join("\n"),
        project.cyan()
    );
    if !confirm_or_abort(ctx, &message)? {
        return Ok(());
    }

    if ctx.options().dry_run {
        for name in &selected {
            println!("   {} {}", "would delete".dimmed(), name.cyan());
        }
        return Ok(());
    }

    ctx.remove_tokens_from_store(&selected)?;
    print_done(&format!("{} deleted", plural(selected.len(), "token", "tokens")));
    Ok(())
}

/// Run the tokens lookup command
pub async fn run_tokens_lookup(ctx: &Context, names: &[String]) -> Result<()> {
    let tokens = ctx.get_tokens(names).await?;

    if tokens.is_empty() {
        println!("{}", "No tokens found".dimmed());
        return Ok(());
    }

    print_sections(&tokens, |token: &Token| {
        print_section(&token.key);
        match &token.metadata {
            Some(metadata) => println!("{}", serde_json::to_string_pretty(metadata)?),
            None => println!("{}", "No metadata found".dimmed()),
        }
        Ok(())
    })
}

/// Run the tokens renew command
pub async fn run_tokens_renew(ctx: &Context, names: &[String]) -> Result<()> {
    let tokens = ctx.get_tokens(names).await?;
    let (renewable, fixed): (Vec<&Token>, Vec<&Token>) =
        tokens.iter().partition(|token| token.is_renewable());

    if !fixed.is_empty() {
        let heading = if fixed.len() == 1 {
            "The following token is not renewable and will not be renewed:"
        } else {
            "The following tokens are not renewable and will not be renewed:"
        };
        println!("{}", heading.yellow().bold());
        for token in &fixed {
            println!("{}", format!("- {}", token.key).yellow());
        }
    }

    if renewable.is_empty() {
        if !fixed.is_empty() {
            println!();
        }
        println!("{}", "No tokens to renew".dimmed());
        return Ok(());
    }

    if ctx.options().dry_run {
        for token in &renewable {
            println!("   {} {}", "would renew".dimmed(), token.key.cyan());
        }
        return Ok(());
    }

    let names: Vec<String> = renewable.iter().map(|token| token.key.clone()).collect();
    let report = ctx.renew_tokens(&names).await?;
    for renewed in &report.renewed {
        let duration = renewed
            .renewal
            .as_ref()
            .and_then(|renewal| renewal.auth.as_ref())
            .and_then(|auth| auth.get("lease_duration"))
            .and_then(|value| value.as_i64());
        match duration {
            Some(seconds) => println!("   {} {} ({}s)", "renewed".dimmed(), renewed.key.cyan(), seconds),
            None => println!("   {} {}", "renewed".dimmed(), renewed.key.cyan()),
        }
    }
    for failed in &report.failed {
        println!("   {} {}", "failed".red(), failed.cyan());
    }
    if !report.renewed.is_empty() {
        print_done(&format!("{} renewed", plural(report.renewed.len(), "token", "tokens")));
    }
    if report.is_success() {
        Ok(())
    } else {
        Err(ctx.issues().error().into())
    }
}
