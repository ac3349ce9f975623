use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use image::imageops::{self, FilterType};
use lumen::codec::ExrCompression;
use lumen::export::{ExportFormat, ExportRequest, Exporter, Projection, Resolution, Surface};
use lumen::scene::{SceneState, Snapshot};
use lumen::share::{AddressBar, StoreAddressBar};
use lumen::{open_store, util, Config, PixelBuffer, Studio, StudioOptions};

#[derive(Parser)]
#[command(name = "lumen")]
#[command(about = "Scene history, shared links and HDR environment export")]
struct Cli {
    /// Data directory (defaults to ~/.lumen)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a rendered panorama with the current scene settings
    Export {
        /// Equirectangular image to export (any format the image crate reads)
        panorama: PathBuf,
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Exr)]
        format: ExportFormat,
        #[arg(long, value_enum)]
        compression: Option<ExrCompression>,
        #[arg(long, value_enum)]
        resolution: Option<Resolution>,
        /// Reproject onto a SIZE x SIZE hemisphere disc (default from config)
        #[arg(long, value_name = "SIZE")]
        matcap: Option<Option<u32>>,
        #[arg(long)]
        prefix: Option<String>,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show the persisted history
    History,

    /// Step back in history
    Undo,

    /// Step forward in history
    Redo,

    /// Load a settings file as a new history entry
    Import { file: PathBuf },

    /// Print the shared-link query for the current scene
    Share,

    /// Apply a shared-link query
    Open { query: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir);

    // Initialize logging to file (<data_dir>/logs/lumen.log)
    fs::create_dir_all(util::logs_dir())?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let config = Config::load();

    match cli.command {
        Commands::Export {
            panorama,
            format,
            compression,
            resolution,
            matcap,
            prefix,
            out,
        } => {
            let mut studio = Studio::open(&config);
            studio.hydrate().await;
            let snapshot = Snapshot::capture(studio.scene());

            let resolution = resolution.unwrap_or(config.export.resolution);
            let surface = load_panorama(&panorama, resolution)?;

            let mut request = ExportRequest::new(format, Some(surface));
            request.compression = compression.unwrap_or(config.export.compression);
            request.resolution = Some(resolution);
            request.prefix = prefix.unwrap_or_else(|| config.export.prefix.clone());
            request.output_dir = out
                .or_else(|| config.export.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from("."));
            if let Some(size) = matcap {
                request.projection = Projection::Matcap {
                    size: size.unwrap_or(config.export.matcap_size),
                };
            }

            match Exporter::new().export(&request, &snapshot) {
                Ok(outcome) => {
                    eprintln!("{}", outcome.notification());
                    println!("{}", outcome.image_path.display());
                    println!("{}", outcome.settings_path.display());
                }
                Err(e) => {
                    tracing::error!(error = %e, "Export failed");
                    anyhow::bail!("{}", e.notification());
                }
            }
        }
        Commands::History => {
            let mut studio = Studio::open(&config);
            studio.hydrate().await;
            print_history(&studio);
        }
        Commands::Undo => {
            let mut studio = Studio::open(&config);
            studio.hydrate().await;
            if !studio.undo() {
                println!("Nothing to undo");
            }
            studio.shutdown().await;
            print_position(&studio);
        }
        Commands::Redo => {
            let mut studio = Studio::open(&config);
            studio.hydrate().await;
            if !studio.redo() {
                println!("Nothing to redo");
            }
            studio.shutdown().await;
            print_position(&studio);
        }
        Commands::Import { file } => {
            let bytes =
                fs::read(&file).with_context(|| format!("Cannot read {}", file.display()))?;
            let mut studio = Studio::open(&config);
            studio.hydrate().await;
            if let Err(notification) = studio.import_settings(&bytes) {
                anyhow::bail!("{}", notification);
            }
            studio.shutdown().await;
            print_position(&studio);
        }
        Commands::Share => {
            let mut studio = Studio::open(&config);
            studio.hydrate().await;
            println!("{}", studio.share_query()?);
        }
        Commands::Open { query } => {
            let store = open_store(util::database_path());
            let address_bar = Arc::new(StoreAddressBar::new(
                store.clone(),
                config.address_bar_key.clone(),
            ));
            address_bar.replace_query(&query).await?;

            let mut studio = Studio::new(
                SceneState::default(),
                store,
                address_bar,
                StudioOptions::from(&config),
            );
            studio.hydrate().await;
            studio.shutdown().await;
            print_history(&studio);
        }
    }

    Ok(())
}

/// Load an image and resample it to the panorama size of `resolution`
fn load_panorama(path: &Path, resolution: Resolution) -> Result<Surface> {
    let image = image::open(path)
        .with_context(|| format!("Cannot open panorama {}", path.display()))?
        .into_rgba32f();

    let (width, height) = resolution.dims();
    let image = if image.dimensions() == (width, height) {
        image
    } else {
        imageops::resize(&image, width, height, FilterType::Triangle)
    };

    let pixels = PixelBuffer::new(width, height, 4, image.into_raw())?;
    Ok(Surface::Float(pixels))
}

fn print_position(studio: &Studio) {
    let engine = studio.engine();
    println!("index: {}/{}", engine.index(), engine.entries().len());
}

fn print_history(studio: &Studio) {
    let engine = studio.engine();
    let scene = studio.scene();
    println!("entries: {}", engine.entries().len());
    println!("index: {}", engine.index());
    println!("lights: {}", scene.lights.len());
    for light in &scene.lights {
        let visible = if light.base.visible { "" } else { " (hidden)" };
        println!("  - {} [{}]{}", light.base.name, light.kind.label(), visible);
    }
    println!("cameras: {}", scene.cameras.len());
    println!("ibl rotation: {:.3}", scene.ibl_rotation);
}
