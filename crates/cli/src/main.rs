mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::CatalogArgs;
use output::{OutputFormat, print_error};

/// catsync - keep a template store in line with a chart repository
#[derive(Parser)]
#[command(name = "catsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Sync a catalog from a local chart repository
  Sync {
    /// Catalog name
    catalog: String,

    /// Chart repository directory containing index.yaml
    #[arg(long)]
    repo: PathBuf,

    #[command(flatten)]
    args: CatalogArgs,
  },

  /// Show what a sync would change, without writing anything
  Plan {
    /// Catalog name
    catalog: String,

    /// Chart repository directory containing index.yaml
    #[arg(long)]
    repo: PathBuf,

    #[command(flatten)]
    args: CatalogArgs,
  },

  /// Show the sync status of a catalog, or list all known catalogs
  Status {
    /// Catalog name
    catalog: Option<String>,
  },

  /// List the templates of a catalog
  Templates {
    /// Catalog name
    catalog: String,
  },
}

fn run(cli: Cli) -> Result<ExitCode> {
  match cli.command {
    Commands::Sync { catalog, repo, args } => cmd::cmd_sync(&catalog, &repo, &args, cli.output),
    Commands::Plan { catalog, repo, args } => {
      cmd::cmd_plan(&catalog, &repo, &args, cli.output, cli.verbose).map(|()| ExitCode::SUCCESS)
    }
    Commands::Status { catalog } => cmd::cmd_status(catalog.as_deref(), cli.output).map(|()| ExitCode::SUCCESS),
    Commands::Templates { catalog } => cmd::cmd_templates(&catalog, cli.output).map(|()| ExitCode::SUCCESS),
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match run(cli) {
    Ok(code) => code,
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}
