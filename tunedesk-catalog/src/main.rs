//! tunedesk-catalog - Track catalog service
//!
//! Serves the track library over HTTP and offers the same operations from the
//! command line: probing a file's duration, uploading a track, running the
//! duration correction sweep, listing the library and managing albums.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tunedesk_catalog::api::durations::CorrectionResponse;
use tunedesk_catalog::db::TrackQuery;
use tunedesk_catalog::decode::{AudioAsset, SymphoniaDecoder};
use tunedesk_catalog::duration::estimator::EstimateSummary;
use tunedesk_catalog::services::{TrackFilter, TrackView};
use tunedesk_catalog::storage::LocalObjectStore;
use tunedesk_catalog::{build_router, AppState};
use tunedesk_common::config::{self, TomlConfig};
use tunedesk_common::events::EventBus;

#[derive(Parser, Debug)]
#[command(name = "tunedesk-catalog")]
#[command(about = "Track catalog service for TuneDesk")]
#[command(version)]
struct Args {
    /// Root folder holding the database and the music bucket
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, env = "TUNEDESK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(short, long, env = "TUNEDESK_PORT")]
        port: Option<u16>,
    },
    /// Estimate the duration of a local audio file
    Probe { file: PathBuf },
    /// Upload a local audio file as a new track
    Upload {
        file: PathBuf,
        /// Owner of the new track
        #[arg(long)]
        uploader: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        genre: Option<String>,
        /// Id of an album owned by the uploader
        #[arg(long)]
        album: Option<String>,
    },
    /// List an uploader's albums, or create one
    Albums {
        #[arg(long)]
        uploader: String,
        /// Create an album with this title instead of listing
        #[arg(long)]
        create: Option<String>,
        #[arg(long, requires = "create")]
        year: Option<i32>,
    },
    /// Re-estimate tracks stuck at the placeholder duration
    Sweep,
    /// List tracks in the library
    List {
        #[arg(long)]
        uploader: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<TomlConfig> {
    match path {
        Some(path) => config::load_toml_config(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(config::load_default_toml_config()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = load_config(args.config.as_ref())?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "tunedesk_catalog={level},tunedesk_common={level}",
                    level = toml_config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tunedesk-catalog v{}", env!("CARGO_PKG_VERSION"));

    let root_folder = config::resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    let db_path = config::ensure_root_folder(&root_folder)
        .with_context(|| format!("Failed to initialize root folder {}", root_folder.display()))?;
    info!("Root folder: {}", root_folder.display());
    info!("Database: {}", db_path.display());

    let pool = tunedesk_common::db::init_database(&db_path).await?;

    let catalog = &toml_config.catalog;
    let objects = LocalObjectStore::new(root_folder.join(&catalog.bucket))
        .with_public_base_url(catalog.public_base_url.clone());
    objects.ensure_bucket()?;

    let event_bus = EventBus::new(100);
    let state = AppState::new(
        pool,
        Arc::new(objects),
        Arc::new(SymphoniaDecoder::new()),
        catalog,
        event_bus,
    );

    match args.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            let port = port.unwrap_or(catalog.port);
            let addr = format!("{}:{}", catalog.bind_address, port);
            let app = build_router(state);

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            info!("Listening on http://{}", addr);
            info!("Health check: http://{}/health", addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Command::Probe { file } => {
            let asset = AudioAsset::from_path(&file)
                .with_context(|| format!("Cannot read {}", file.display()))?;
            let report = state
                .estimator
                .estimate_with_report(&asset, catalog.upload_decode_timeout())
                .await;
            println!("{}", serde_json::to_string_pretty(&EstimateSummary::from(&report))?);
        }
        Command::Upload {
            file,
            uploader,
            title,
            genre,
            album,
        } => {
            let mut draft = state.uploads.prepare(&file).await?;
            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(genre) = genre {
                draft.genre = genre;
            }
            draft.album_id = album;

            let track = state.uploads.submit(&draft, &uploader).await?;
            println!("{}", serde_json::to_string_pretty(&TrackView::from(track))?);
        }
        Command::Sweep => {
            let report = state.sweep.run().await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&CorrectionResponse::from(report))?
            );
        }
        Command::Albums {
            uploader,
            create,
            year,
        } => match create {
            Some(title) => {
                let album = state.library.create_album(&uploader, &title, year).await?;
                println!("{}", serde_json::to_string_pretty(&album)?);
            }
            None => {
                for album in state.library.albums(&uploader).await? {
                    let year = album.year.map(|y| y.to_string()).unwrap_or_default();
                    println!("{}  {:>4}  {}", album.id, year, album.title);
                }
            }
        },
        Command::List { uploader, search } => {
            let query = TrackQuery {
                uploader_id: uploader,
                active_only: false,
            };
            let filter = TrackFilter {
                search,
                ..Default::default()
            };
            for track in state.library.list(&query, &filter).await? {
                let view = TrackView::from(track);
                println!(
                    "{}  {:>6}  {:<8}  {}",
                    view.track.id,
                    view.duration_display,
                    view.track.status.as_str(),
                    view.track.title
                );
            }
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
