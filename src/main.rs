//! # Media Picker - Main Entry Point
//!
//! Host headless della bridge: esegue una richiesta `getMedia` su file locali.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing` (su stderr)
//! - Caricamento configurazione e tabelle di localizzazione
//! - Discovery dei media nei path indicati, usati come selezione del picker
//! - Stampa della risposta JSON della bridge su stdout
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (path, vincoli, limiti, permessi)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose)
//! 3. Carica `BridgeConfig` e applica gli override da CLI
//! 4. Costruisce picker, autorizzazione e libreria headless
//! 5. Invia `getMedia` alla `MediaBridge` e attende che la richiesta termini
//!
//! ## Esempio di utilizzo:
//! ```bash
//! media-picker ~/Pictures/trip --width 1024 --height 1024 --quality 80 --max-photo-size 500000
//! ```

use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use media_picker_bridge::{
    file_manager::FileManager, localization::GALLERY_TABLE, progress::ProgressManager, AssetHandle, BridgeConfig, Localizer,
    CorrelationToken, FsMediaLibrary, JsonLineSink, MediaBridge, PermissionGate, PresetPicker,
    RequestCoordinator, StaticAuthorization, StringTables,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputTypeArg {
    FileUri,
    Base64,
}

#[derive(Parser)]
#[command(name = "media-picker")]
#[command(about = "Select photos and videos and export them under size and quality constraints")]
struct Args {
    /// Files or directories used as the picker selection, in order
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Bounding box width (0 = unconstrained)
    #[arg(long)]
    width: Option<u32>,

    /// Bounding box height (0 = unconstrained)
    #[arg(long)]
    height: Option<u32>,

    /// JPEG quality (0-100)
    #[arg(short, long)]
    quality: Option<u8>,

    /// Output encoding
    #[arg(short, long, value_enum)]
    output_type: Option<OutputTypeArg>,

    /// Maximum encoded photo size in bytes (0 = unbounded)
    #[arg(long)]
    max_photo_size: Option<u64>,

    /// Maximum video size in bytes (0 = unbounded)
    #[arg(long)]
    max_video_size: Option<u64>,

    /// Maximum number of selected items
    #[arg(short = 'n', long)]
    max_images: Option<u32>,

    /// Allow videos in the selection
    #[arg(long)]
    allow_video: bool,

    /// Simulate a denied media library permission
    #[arg(long)]
    deny_permission: bool,

    /// Configuration file (default: ~/.media-picker/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preferred language for messages
    #[arg(short, long)]
    locale: Option<String>,

    /// Number of parallel export workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Opzioni `getMedia` come le invierebbe un host
    fn picker_options(&self) -> Value {
        let mut options = Map::new();
        if let Some(width) = self.width {
            options.insert("width".into(), json!(width));
        }
        if let Some(height) = self.height {
            options.insert("height".into(), json!(height));
        }
        if let Some(quality) = self.quality {
            options.insert("quality".into(), json!(quality));
        }
        if let Some(output_type) = self.output_type {
            let value = match output_type {
                OutputTypeArg::FileUri => "FILE_URI",
                OutputTypeArg::Base64 => "BASE64",
            };
            options.insert("outputType".into(), json!(value));
        }
        if let Some(max_photo_size) = self.max_photo_size {
            options.insert("maxPhotoSize".into(), json!(max_photo_size));
        }
        if let Some(max_video_size) = self.max_video_size {
            options.insert("maxVideoSize".into(), json!(max_video_size));
        }
        if let Some(max_images) = self.max_images {
            options.insert("maximumImagesCount".into(), json!(max_images));
        }
        options.insert("allow_video".into(), json!(self.allow_video));
        Value::Object(options)
    }
}

/// Espande directory in file media, mantenendo l'ordine degli argomenti
fn collect_selection(paths: &[PathBuf]) -> Result<Vec<AssetHandle>> {
    let mut selection = Vec::new();

    for path in paths {
        if !path.exists() {
            return Err(anyhow::anyhow!("Path does not exist: {}", path.display()));
        }

        let files = if path.is_dir() {
            FileManager::find_media_files(path)?
        } else {
            vec![path.clone()]
        };

        for file in files {
            match FsMediaLibrary::handle_for(&file) {
                Some(handle) => selection.push(handle),
                None => warn!("Skipping unsupported file: {}", file.display()),
            }
        }
    }

    Ok(selection)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match args.config.clone().or_else(BridgeConfig::default_path) {
        Some(path) => BridgeConfig::from_file(&path).await?,
        None => BridgeConfig::default(),
    };
    if let Some(ref locale) = args.locale {
        config.locale = locale.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    config.validate()?;

    let mut strings = StringTables::with_defaults();
    if let Some(ref strings_path) = config.strings_path {
        let loaded = strings.load_file(strings_path).await?;
        info!("Loaded {} localized strings from {}", loaded, strings_path.display());
    }
    strings.set_preferred_language(&config.locale);

    let selection = collect_selection(&args.paths)?;
    info!("📂 {} media files in the selection", selection.len());

    let max_items = args.max_images.unwrap_or(config.default_max_images);
    if max_items > 0 && selection.len() > max_items as usize {
        let count = max_items.to_string();
        warn!("{}", strings.format("picker.selection.limit", GALLERY_TABLE, &[("count", count.as_str())]));
    }

    let authorization = if args.deny_permission {
        StaticAuthorization::denied()
    } else {
        StaticAuthorization::granted()
    };

    let coordinator = Arc::new(RequestCoordinator::new(
        config,
        Arc::new(PermissionGate::new(Arc::new(authorization))),
        Arc::new(PresetPicker::new(selection)),
        Arc::new(FsMediaLibrary::new()),
        Arc::new(JsonLineSink),
        Arc::new(strings),
    ));
    let bridge = MediaBridge::new(coordinator.clone());

    let spinner = ProgressManager::spinner("Exporting selected media...");
    bridge
        .execute("getMedia", &json!([args.picker_options()]), CorrelationToken::generate())
        .await;
    coordinator.wait_until_idle().await;
    spinner.finish_and_clear();

    Ok(())
}
