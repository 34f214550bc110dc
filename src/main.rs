// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Takaro modules CLI - browse, export and track changes of Takaro modules

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use takaro_modules::commands::{self, Session};
use takaro_modules::config::{self, BuiltinSource};
use takaro_modules::types::ModuleSource;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "takaro-modules")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "TAKARO_MODULES_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Community modules directory override
    #[arg(long, global = true)]
    modules_dir: Option<PathBuf>,

    /// Read built-in modules from this feed file instead of the configured source
    #[arg(long, global = true, conflicts_with = "no_builtin")]
    builtin_feed: Option<PathBuf>,

    /// Skip built-in modules entirely
    #[arg(long, global = true)]
    no_builtin: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true, value_parser = clap::builder::FalseyValueParser::new())]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the merged module catalog
    List {
        /// Only community or built-in modules
        #[arg(long)]
        source: Option<ModuleSource>,

        /// Only modules in this category
        #[arg(long)]
        category: Option<String>,
    },

    /// Show one module in detail
    Show {
        /// Module name
        name: String,

        /// Version tag (defaults to latest)
        #[arg(long)]
        tag: Option<String>,
    },

    /// Search modules by name, description, commands, hooks or permissions
    Search {
        /// Search text
        query: String,

        /// Only community or built-in modules
        #[arg(long)]
        source: Option<ModuleSource>,
    },

    /// Export a module as JSON
    Export {
        /// Module name
        name: String,

        /// Output format (module, payload)
        #[arg(short, long, default_value = "module")]
        format: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch built-in modules from GitHub into a local feed file
    SyncBuiltins {
        /// Feed file to write
        #[arg(short, long, default_value = "builtin-modules.json")]
        output: PathBuf,
    },

    /// Build the changelog from git history
    Changelog {
        /// Repository to read history from
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Artifact output file (defaults to the configured path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print one module's changes instead of writing the artifact
        #[arg(long)]
        module: Option<String>,
    },

    /// Print effective configuration
    Config {
        /// Dotted configuration key
        key: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.modules_dir {
        config.modules_dir = dir;
    }
    if let Some(path) = cli.builtin_feed {
        config.builtin = BuiltinSource::Feed { path };
    } else if cli.no_builtin {
        config.builtin = BuiltinSource::None;
    }

    // Initialize logging
    let log_level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => config.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let session = Session::new(config, cli.json, !cli.no_color);

    // Execute command
    match cli.command {
        Commands::List { source, category } => {
            commands::list::run(&session, source, category).await
        }
        Commands::Show { name, tag } => {
            commands::show::run(&session, &name, tag.as_deref()).await
        }
        Commands::Search { query, source } => {
            commands::search::run(&session, &query, source).await
        }
        Commands::Export { name, format, output } => {
            commands::export::run(&session, &name, &format, output).await
        }
        Commands::SyncBuiltins { output } => {
            commands::sync::run(&session, &output).await
        }
        Commands::Changelog { repo, output, module } => {
            commands::changelog::run(&session, &repo, output, module.as_deref())
        }
        Commands::Config { key } => {
            commands::config::run(&session, key.as_deref())
        }
        Commands::Completions { shell } => {
            commands::completions::run(shell, &mut Cli::command())
        }
    }
}
