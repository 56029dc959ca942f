//! gphoto-cache - Google Photos albums from the command line
//!
//! Lists albums and album photos, keeping photos in a local cache between runs.

use anyhow::{anyhow, Context, Result};
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gphoto_cache::{Config, GooglePhotosApi, PhotoClient, RedbStore};

/// CLI command
#[derive(Debug)]
enum Command {
    /// List all albums
    Albums,
    /// List the photos of one album
    Photos { album_id: String },
    /// Show help
    Help,
}

fn print_help() {
    eprintln!(
        r#"gphoto-cache - Browse Google Photos albums with a local photo cache

USAGE:
    gphoto-cache albums
    gphoto-cache photos <album_id>
    gphoto-cache help

COMMANDS:
    albums  Print all albums as JSON
    photos  Print the photos of an album as JSON (served from cache while links are valid)
    help    Show this help message

ENVIRONMENT:
    GPHOTO_CLIENT_ID      OAuth client ID (required)
    GPHOTO_CLIENT_SECRET  OAuth client secret (required)
    GPHOTO_REFRESH_TOKEN  OAuth refresh token (required)
    GPHOTO_ACCESS_TOKEN   Access token to start with (optional)
    GPHOTO_DB_PATH        Photo cache file (default: <cache dir>/gphoto-cache/gphoto.db)
    GPHOTO_PAGE_SIZE      Photos requested per search page (default: 100)
    RUST_LOG              Log filter (trace, debug, info, warn, error)
"#
    );
}

fn parse_args(args: &[String]) -> Result<Command> {
    if args.len() < 2 {
        return Ok(Command::Help);
    }

    match args[1].as_str() {
        "albums" => Ok(Command::Albums),
        "photos" => {
            if args.len() < 3 {
                return Err(anyhow!("Usage: gphoto-cache photos <album_id>"));
            }
            Ok(Command::Photos {
                album_id: args[2].clone(),
            })
        }
        "help" | "--help" | "-h" => Ok(Command::Help),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            Ok(Command::Help)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Parse command
    let args: Vec<String> = env::args().collect();
    let command = match parse_args(&args) {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(1);
        }
    };

    let album_id = match command {
        Command::Help => {
            print_help();
            return Ok(());
        }
        Command::Albums => None,
        Command::Photos { album_id } => Some(album_id),
    };

    let config = Config::from_env()?;

    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create cache directory: {:?}", parent))?;
    }
    let store = RedbStore::open(&config.db_path)
        .with_context(|| format!("Failed to open photo cache: {:?}", config.db_path))?;
    let api = GooglePhotosApi::new()
        .context("Failed to create HTTP client")?
        .with_page_size(config.page_size);
    let client = PhotoClient::new(api, store, config.credentials);

    let output = match album_id {
        None => client
            .list_albums()
            .await
            .map_err(anyhow::Error::from)
            .and_then(|albums| Ok(serde_json::to_string_pretty(&albums)?)),
        Some(album_id) => {
            info!(album = %album_id, "Fetching album photos...");
            client
                .get_photos_by_album(&album_id)
                .await
                .map_err(anyhow::Error::from)
                .and_then(|photos| Ok(serde_json::to_string_pretty(&photos)?))
        }
    };

    // Close the cache before reporting the outcome
    if let Err(e) = client.close() {
        error!(error = %e, "Failed to close photo cache");
    }

    println!("{}", output?);
    Ok(())
}
