//! Docscan - replay recorded engine output through the recognition pipeline

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docscan_extract::{extract_plates, parse_back, parse_front};
use docscan_ocr::{
    missing_assets, DirAssetProvider, Frame, RecognitionEngine, RecognizeOptions, RecognizedText,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

mod colored_logger;
mod config;
mod replay;

use colored_logger::{init_component_logger, Component};
use config::{Config, DocumentKind};

#[derive(Parser)]
#[command(name = "docscan")]
#[command(about = "Text recognition and document field extraction")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recorded engine buffer through decoding and extraction
    Replay {
        /// JSON array holding one inference output
        #[arg(short, long)]
        buffer: PathBuf,

        /// Asset directory with models and dictionary
        #[arg(short, long)]
        assets: Option<PathBuf>,

        /// Cache directory for staged assets
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Image handed to the engine
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// What to extract from the recognized lines
        #[arg(short, long, value_enum)]
        document: Option<DocumentKind>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that all model and dictionary assets are present
    Check {
        /// Asset directory with models and dictionary
        #[arg(short, long)]
        assets: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Replay {
            buffer,
            assets,
            cache_dir,
            image,
            document,
            json,
        } => {
            init_component_logger(Component::Replay, cli.verbose)?;
            if let Some(dir) = assets {
                config.replay.assets_dir = Some(dir);
            }
            if let Some(dir) = cache_dir {
                config.replay.cache_dir = Some(dir);
            }
            if let Some(kind) = document {
                config.replay.document = kind;
            }
            cmd_replay(&config, &buffer, image.as_deref(), json)?;
        }
        Commands::Check { assets } => {
            init_component_logger(Component::Check, cli.verbose)?;
            let assets = assets
                .or_else(|| config.replay.assets_dir.clone())
                .context("No asset directory given (use --assets or [replay].assets_dir)")?;
            cmd_check(&config, &assets)?;
        }
    }

    Ok(())
}

fn cmd_replay(
    config: &Config,
    buffer_path: &Path,
    image_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let buffer = replay::load_buffer(buffer_path)?;
    info!("loaded {} values from {:?}", buffer.len(), buffer_path);

    let assets_dir = config
        .replay
        .assets_dir
        .clone()
        .context("No asset directory given (use --assets or [replay].assets_dir)")?;
    let provider = DirAssetProvider::new(assets_dir, config.resolve_cache_dir());

    let engine = RecognitionEngine::new(replay::factory(buffer))?;
    engine
        .initialize_with_config(&provider, &config.engine)
        .context("Failed to initialize recognition engine")?;

    let frame = match image_path {
        Some(path) => {
            let img = image::open(path).with_context(|| format!("Failed to open image {:?}", path))?;
            Frame::from_image(&img)
        }
        None => Frame::new(1, 1, vec![0; 4])?,
    };

    let results = engine
        .try_recognize(Some(&frame), RecognizeOptions::default())
        .context("Recognition failed")?;
    engine.release();

    print_results(config.replay.document, &results, json)
}

fn print_results(kind: DocumentKind, results: &[RecognizedText], json: bool) -> Result<()> {
    match kind {
        DocumentKind::Text => {
            if json {
                println!("{}", serde_json::to_string_pretty(results)?);
            } else {
                for r in results {
                    println!("{:.3}  {}", r.confidence, r.text);
                }
            }
        }
        DocumentKind::IdFront | DocumentKind::IdBack => {
            let record = if kind == DocumentKind::IdFront {
                parse_front(results)
            } else {
                parse_back(results)
            };
            if !record.is_valid() {
                warn!("identity card record is incomplete");
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("{}", record);
            }
        }
        DocumentKind::Plate => {
            let plates = extract_plates(results);
            if json {
                println!("{}", serde_json::to_string_pretty(&plates)?);
            } else if plates.is_empty() {
                println!("No plates found");
            } else {
                for plate in &plates {
                    println!("{}", plate);
                }
            }
        }
    }
    Ok(())
}

fn cmd_check(config: &Config, assets: &Path) -> Result<()> {
    let model_dir = assets.join(&config.engine.model_dir);
    let missing = missing_assets(&model_dir, &config.engine);

    for name in config.engine.asset_names() {
        let status = if missing.iter().any(|m| m == name) {
            "missing"
        } else {
            "ok"
        };
        println!("  {:<20} {}", name, status);
    }

    if missing.is_empty() {
        info!("all assets present in {:?}", model_dir);
        Ok(())
    } else {
        Err(anyhow::anyhow!("{} asset(s) missing in {:?}", missing.len(), model_dir))
    }
}
