//! chartlift CLI
//!
//! Command-line interface for the chart enrichment pipeline: run the
//! stages individually or end to end, and manage the response cache.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use chartlift_pipeline::PipelineConfig;

mod commands;

#[derive(Parser)]
#[command(name = "chartlift")]
#[command(about = "Batch enrichment pipeline for music chart data", long_about = None)]
struct Cli {
    /// SQLite database path (overrides CHARTLIFT_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Common arguments for commands that run the enrichment stage.
#[derive(Args, Clone)]
struct EnrichArgs {
    /// Candidates per batch (default 500)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Concurrent fetches per batch (default 10)
    #[arg(long)]
    workers: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy the raw chart table into the clean working table
    Extract,

    /// Clean and normalize the working table in place
    Transform,

    /// Enrich tracks with Last.fm metadata, batch by batch
    Enrich {
        #[command(flatten)]
        enrich: EnrichArgs,
    },

    /// Validate enriched data and write a summary report
    Validate,

    /// Publish the validated data as the curated table
    Load,

    /// Run every stage in order
    Run {
        #[command(flatten)]
        enrich: EnrichArgs,
    },

    /// Manage cached API responses
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show entry count and total size
    Stats,

    /// Remove all cached responses
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the resolved configuration
    Show,

    /// Print the config file path
    Path,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // The config file path needs no configuration of its own.
    if let Commands::Config {
        action: ConfigAction::Path,
    } = cli.command
    {
        commands::config::print_config_path();
        return;
    }

    let cfg = match PipelineConfig::load_with_database(cli.db.clone()) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::error!("{}", e);
            eprintln!();
            eprintln!("Set CHARTLIFT_DB to the pipeline database path, pass --db,");
            eprintln!("or add it to the config file.");
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Extract => commands::stages::run_extract(&cfg),
        Commands::Transform => commands::stages::run_transform(&cfg),
        Commands::Enrich { enrich } => {
            let cfg = cfg.with_overrides(enrich.batch_size, enrich.workers);
            commands::enrich::run_enrich(&cfg);
        }
        Commands::Validate => commands::stages::run_validate(&cfg),
        Commands::Load => commands::stages::run_load(&cfg),
        Commands::Run { enrich } => {
            let cfg = cfg.with_overrides(enrich.batch_size, enrich.workers);
            commands::stages::run_all(&cfg);
        }
        Commands::Cache { action } => match action {
            CacheAction::Stats => commands::cache::run_stats(&cfg),
            CacheAction::Clear => commands::cache::run_clear(&cfg),
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::print_config(&cfg),
            ConfigAction::Path => unreachable!("handled above"),
        },
    }
}
