//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// vaulty - Render vault secrets into local files and keep them in sync
#[derive(Parser, Debug)]
#[command(name = "vaulty")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to run from (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Configuration file to use instead of searching for one
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Token values taking precedence over the store
    ///
    /// Repeat the flag or separate entries with commas.
    #[arg(
        long = "tokens",
        global = true,
        value_name = "NAME:VALUE",
        value_delimiter = ',',
        value_parser = parse_token
    )]
    pub tokens: Vec<(String, String)>,

    /// Skip confirmation prompts and allow destructive fixes
    #[arg(short, long, global = true)]
    pub force: bool,

    /// Show what would change without changing anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Log level, overridden by RUST_LOG
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Directory holding the store file
    #[arg(long, global = true, env = "VAULTY_HOME", hide = true)]
    pub home: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Parse `NAME:VALUE`. The value may itself contain colons.
pub fn parse_token(raw: &str) -> Result<(String, String), String> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() && !value.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected NAME:VALUE, got \"{raw}\"")),
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Render templates to stdout without writing their outputs
    ///
    /// Patterns are globs relative to the project root; prefix one with '!'
    /// to exclude matches. Quote them so the shell leaves them alone.
    ///
    /// Examples:
    ///   vaulty render                         # Render every template
    ///   vaulty render '.env.vaulty'           # Render one template
    ///   vaulty render '**/*.json.*' '!src/**' # Filter with globs
    Render {
        /// Glob patterns selecting templates
        patterns: Vec<String>,
    },

    /// Manage templates and their outputs
    Templates {
        #[command(subcommand)]
        action: TemplatesAction,
    },

    /// Manage the tokens of the current project
    Tokens {
        #[command(subcommand)]
        action: TokensAction,
    },

    /// Inspect secrets
    Secrets {
        #[command(subcommand)]
        action: SecretsAction,
    },

    /// Manage the token store
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },

    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Manage the projects recorded in the store
    Projects {
        #[command(subcommand)]
        action: ProjectsAction,
    },

    /// Check the project and repair what can be repaired
    Audit {
        #[command(subcommand)]
        action: AuditAction,
    },
}

/// Template actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TemplatesAction {
    /// List templates
    List {
        /// Glob patterns selecting templates
        patterns: Vec<String>,
    },

    /// Render templates and write their outputs
    ///
    /// Examples:
    ///   vaulty templates write
    ///   vaulty templates write '**/*.{js,json}.*' '!src/**/*'
    ///   vaulty templates write --tokens main:s.gVg7 -- '.env.vaulty'
    Write {
        /// Glob patterns selecting templates
        patterns: Vec<String>,
    },

    /// Delete template outputs, keeping the templates
    Delete {
        /// Glob patterns selecting templates
        patterns: Vec<String>,
    },
}

/// Token actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TokensAction {
    /// List tokens with their expiry and origin
    List,

    /// Save tokens in the store for the current project
    Save {
        /// Tokens to save
        #[arg(value_name = "NAME:VALUE", value_parser = parse_token)]
        tokens: Vec<(String, String)>,
    },

    /// Delete tokens from the store
    Delete {
        /// Token names (all tokens when omitted)
        names: Vec<String>,
    },

    /// Show token metadata reported by the vault
    Lookup {
        /// Token names (all tokens when omitted)
        names: Vec<String>,
    },

    /// Renew renewable tokens
    Renew {
        /// Token names (all tokens when omitted)
        names: Vec<String>,
    },
}

/// Secret actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SecretsAction {
    /// Fetch and show secrets
    Show {
        /// Secret names (all secrets when omitted)
        names: Vec<String>,
    },
}

/// Store actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    /// Show the store content
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the store file path
    Source,

    /// Delete the store file
    Delete,

    /// Delete the store file and recreate an empty one
    Reset,
}

/// Configuration actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Show the resolved configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print where the configuration comes from
    Source,

    /// Show the defaults for this project
    Default {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Project actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ProjectsAction {
    /// List the projects recorded in the store
    List,

    /// Print the current project root
    Current,

    /// Remove the current project from the store
    Delete,
}

/// Audit actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum AuditAction {
    /// Run every check and print the issues found
    Report {
        /// Output as JSON for CI/CD integration
        #[arg(long)]
        json: bool,
    },

    /// Run every check and apply the available fixes
    Fix,
}
