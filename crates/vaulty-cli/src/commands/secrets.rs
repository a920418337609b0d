//! Secret commands

use colored::Colorize;
use futures::future::join_all;
use vaulty_core::{Context, Secret};

use super::print_section;
use crate::error::Result;

/// Run the secrets show command
///
/// Without names every configured secret is fetched. Named secrets that are
/// not configured are reported as issues.
pub async fn run_secrets_show(ctx: &Context, names: &[String]) -> Result<()> {
    let secrets: Vec<Secret> = if names.is_empty() {
        ctx.get_secrets().await?
    } else {
        join_all(names.iter().map(|name| ctx.get_secret(name)))
            .await
            .into_iter()
            .collect::<vaulty_core::Result<_>>()?
    };

    if secrets.is_empty() {
        println!("{}", "No secrets found".dimmed());
        return Ok(());
    }

    for (index, secret) in secrets.iter().enumerate() {
        if index > 0 {
            println!();
        }
        print_section(&secret.key);
        println!("{}", serde_json::to_string_pretty(&secret.data)?);
    }
    Ok(())
}
