//! vaulty CLI
//!
//! Renders vault secrets into local files, reports drift between templates,
//! tokens, secrets and outputs, and repairs what it can.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use vaulty_core::{Context, Issue, Options, Severity};

use cli::{
    AuditAction, Cli, Commands, ConfigAction, LogLevel, ProjectsAction, SecretsAction,
    StoreAction, TemplatesAction, TokensAction,
};
use error::{CliError, Result};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    if let Err(e) = run(cli).await {
        report_error(&e);
        std::process::exit(1);
    }
}

/// Log to stderr. `RUST_LOG` wins over `--log-level`.
fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn report_error(error: &CliError) {
    let errors: Vec<Issue> = error
        .issues()
        .map(|collection| {
            collection
                .issues
                .iter()
                .filter(|issue| issue.severity == Severity::Error)
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    if errors.is_empty() {
        eprintln!("{}: {}", "error".red().bold(), error);
    } else {
        println!();
        commands::report::print_issues(&errors);
    }
}

fn options(cli: &Cli) -> Result<Options> {
    let cwd = std::env::current_dir()?;
    let mut options = Options::new(match &cli.cwd {
        Some(dir) => cwd.join(dir),
        None => cwd,
    });
    options.config = cli.config.clone();
    options.tokens = cli.tokens.iter().cloned().collect();
    options.force = cli.force;
    options.dry_run = cli.dry_run;
    options.home_dir = cli.home.clone();
    Ok(options)
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::new(options(&cli)?)?;
    tracing::debug!(cwd = %ctx.options().cwd.display(), "running command");
    execute_command(&ctx, cli.command).await
}

async fn execute_command(ctx: &Context, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Render { patterns } => commands::run_render(ctx, &patterns).await,
        Commands::Templates { action } => cmd_templates(ctx, action).await,
        Commands::Tokens { action } => cmd_tokens(ctx, action).await,
        Commands::Secrets { action } => match action {
            SecretsAction::Show { names } => commands::run_secrets_show(ctx, &names).await,
        },
        Commands::Store { action } => cmd_store(ctx, action),
        Commands::Config { action } => cmd_config(ctx, action),
        Commands::Projects { action } => cmd_projects(ctx, action),
        Commands::Audit { action } => match action {
            AuditAction::Report { json } => commands::run_audit_report(ctx, json).await,
            AuditAction::Fix => commands::run_audit_fix(ctx).await,
        },
    }
}

async fn cmd_templates(ctx: &Context, action: TemplatesAction) -> Result<()> {
    match action {
        TemplatesAction::List { patterns } => commands::run_templates_list(ctx, &patterns),
        TemplatesAction::Write { patterns } => commands::run_templates_write(ctx, &patterns).await,
        TemplatesAction::Delete { patterns } => commands::run_templates_delete(ctx, &patterns),
    }
}

async fn cmd_tokens(ctx: &Context, action: TokensAction) -> Result<()> {
    match action {
        TokensAction::List => commands::run_tokens_list(ctx).await,
        TokensAction::Save { tokens } => commands::run_tokens_save(ctx, &tokens),
        TokensAction::Delete { names } => commands::run_tokens_delete(ctx, &names),
        TokensAction::Lookup { names } => commands::run_tokens_lookup(ctx, &names).await,
        TokensAction::Renew { names } => commands::run_tokens_renew(ctx, &names).await,
    }
}

fn cmd_store(ctx: &Context, action: StoreAction) -> Result<()> {
    match action {
        StoreAction::Show { json } => commands::run_store_show(ctx, json),
        StoreAction::Source => commands::run_store_source(ctx),
        StoreAction::Delete => commands::run_store_delete(ctx),
        StoreAction::Reset => commands::run_store_reset(ctx),
    }
}

fn cmd_config(ctx: &Context, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show { json } => commands::run_config_show(ctx, json),
        ConfigAction::Source => commands::run_config_source(ctx),
        ConfigAction::Default { json } => commands::run_config_default(ctx, json),
    }
}

fn cmd_projects(ctx: &Context, action: ProjectsAction) -> Result<()> {
    match action {
        ProjectsAction::List => commands::run_projects_list(ctx),
        ProjectsAction::Current => commands::run_projects_current(ctx),
        ProjectsAction::Delete => commands::run_projects_delete(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn options_follow_global_flags() {
        let cli = Cli::parse_from([
            "vaulty",
            "--cwd",
            "/srv/app",
            "--config",
            "vaulty.config.yml",
            "--tokens",
            "main:s.abc",
            "--force",
            "--dry-run",
            "--home",
            "/tmp/home",
            "audit",
            "report",
        ]);
        let options = options(&cli).unwrap();

        assert_eq!(options.cwd, PathBuf::from("/srv/app"));
        assert_eq!(options.config, Some(PathBuf::from("vaulty.config.yml")));
        assert_eq!(options.tokens.get("main").map(String::as_str), Some("s.abc"));
        assert!(options.force);
        assert!(options.dry_run);
        assert_eq!(options.home_dir, Some(PathBuf::from("/tmp/home")));
    }

    #[test]
    fn relative_cwd_resolves_against_current_dir() {
        let cli = Cli::parse_from(["vaulty", "--cwd", "sub", "projects", "current"]);
        let options = options(&cli).unwrap();
        assert_eq!(options.cwd, std::env::current_dir().unwrap().join("sub"));
    }
}
