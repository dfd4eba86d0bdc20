use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use hive_rename::batch::read_query_file;
use hive_rename::parser::split_statements;
use hive_rename::{rename_queries, Config, QueryRenamer, RenameOptions};

#[derive(Parser)]
#[command(name = "hive-rename")]
#[command(author, version, about = "Rename tables and columns in Hive SQL queries")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rename every query file of the input directory
    Rename {
        /// Path to the JSON configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Input directory (defaults to input_path of the configuration)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory (defaults to output_path of the configuration)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show tokens, parse tree, scopes and renamed text of a query
    Inspect {
        /// Path to the JSON configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Query file; only its first statement is inspected
        #[arg(short, long)]
        query: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn inspect(config_path: &Path, query_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    let grammar = config.base_grammar()?;
    let mapping = config.mapping()?;

    let content = read_query_file(query_path)?;
    let statement = split_statements(&content)
        .into_iter()
        .next()
        .with_context(|| format!("no statement found in {}", query_path.display()))?;

    let mut renamer = QueryRenamer::with_settings(&grammar, &mapping, config.settings());
    let tree = renamer.parse(statement.trim())?.to_string();
    println!("Tokens:\n{}\n", renamer.tokens().join(" "));
    println!("Parse tree:\n{tree}\n");

    renamer.resolve_and_rename()?;
    if let Some(scopes) = renamer.scopes() {
        println!("Scopes:\n{scopes}");
    }
    println!("Renamed:\n{}", renamer.reconstruct()?);

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Rename {
            config,
            input,
            output,
            verbose,
        } => {
            init_logging(verbose);

            let report = rename_queries(RenameOptions {
                config_path: config,
                input_path: input,
                output_path: output,
            })?;

            println!(
                "Renamed {} statements in {} files",
                report.processed, report.files
            );
            if !report.is_success() {
                for failure in &report.failures {
                    eprintln!(
                        "{} (statement {}): {}",
                        failure.file.display(),
                        failure.statement,
                        failure.message
                    );
                }
                std::process::exit(1);
            }
        }
        Commands::Inspect { config, query } => {
            init_logging(false);
            inspect(&config, &query)?;
        }
    }

    Ok(())
}
