//! Sports Hub command line
//!
//! Each subcommand runs one service operation against the configured record
//! store and prints its result as JSON on stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use catalog_registry::BulkCatalogRows;
use sports_hub_service::{initialize_logging_with_config, load_configuration, HubService};

/// Catalog sync and feed operations for the sports hub
#[derive(Parser)]
#[command(name = "sports-hub")]
#[command(about = "Catalog synchronization and feed caching for the sports hub")]
struct Cli {
    /// Override the record store path
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the sports list from the provider
    SyncSports,
    /// Sync one sport's leagues, teams and players
    Sync {
        /// Sport id or name
        sport: String,
        /// Ignore the cooldown
        #[arg(long)]
        force: bool,
    },
    /// Interactive sync followed by the sport's catalog listing
    OpenSport {
        /// Sport id or name
        sport: String,
    },
    /// Build a user's feed
    Feed {
        user: String,
    },
    /// Replace the set of sports a user follows
    SelectSports {
        user: String,
        /// Sport ids or names
        #[arg(required = true)]
        sports: Vec<String>,
    },
    /// Replace a user's team, player and league follows within a sport
    Interests {
        user: String,
        /// Sport id or name
        sport: String,
        #[arg(long = "team")]
        teams: Vec<String>,
        #[arg(long = "player")]
        players: Vec<String>,
        #[arg(long = "league")]
        leagues: Vec<String>,
    },
    /// Reorder a user's followed sports
    Order {
        user: String,
        /// Sport ids or names, first shown first
        sports: Vec<String>,
    },
    /// Upsert catalog rows from a JSON file
    Import {
        file: PathBuf,
    },
    /// Recent sync history, newest first
    History {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Stored sync state of a sport
    State {
        /// Sport id or name
        sport: String,
    },
    /// Request a sport the catalog does not carry
    Request {
        user: String,
        name: String,
    },
    /// List sport requests
    Requests,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to encode output")?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_configuration()?;
    if let Some(path) = cli.store {
        config.store.path = path;
    }

    initialize_logging_with_config(&config.logging.level, &config.logging.format)?;
    info!("Sports Hub v{}", env!("CARGO_PKG_VERSION"));

    let service = HubService::from_config(&config)?;

    match cli.command {
        Commands::SyncSports => print_json(&service.sync_sports().await?),
        Commands::Sync { sport, force } => print_json(&service.sync_sport(&sport, force).await?),
        Commands::OpenSport { sport } => print_json(&service.open_sport(&sport).await?),
        Commands::Feed { user } => print_json(&service.feed(&user).await?),
        Commands::SelectSports { user, sports } => print_json(&service.select_sports(&user, &sports).await?),
        Commands::Interests { user, sport, teams, players, leagues } => {
            print_json(&service.set_interests(&user, &sport, &teams, &players, &leagues).await?)
        }
        Commands::Order { user, sports } => print_json(&service.set_sport_order(&user, &sports).await?),
        Commands::Import { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read import file: {:?}", file))?;
            let rows: BulkCatalogRows =
                serde_json::from_str(&raw).with_context(|| format!("Failed to parse import file: {:?}", file))?;
            print_json(&service.import(&rows).await?)
        }
        Commands::History { limit } => print_json(&serde_json::json!({ "history": service.history(limit).await? })),
        Commands::State { sport } => print_json(&service.sync_state(&sport).await?),
        Commands::Request { user, name } => print_json(&service.request_sport(&user, &name).await?),
        Commands::Requests => print_json(&serde_json::json!({ "requests": service.requests().await? })),
    }
}
