//! CLI entry point for biocapture
//!
//! Provides command-line access to the stores and the session engine:
//! - Listing camera profiles and collections
//! - Running the pre-session validator
//! - Simulating a complete capture session against a mock camera
//!
//! # Usage
//!
//! ```bash
//! biocapture profiles --camera "Canon EOS 5D Mark IV"
//! biocapture validate 1234567_20240101_3 --collection 3 --camera "Canon EOS 5D Mark IV"
//! biocapture simulate 1234567_20240101_3 --collection 3 --overwrite
//! ```

#[cfg(not(test))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{anyhow, bail, Context, Result};
use biocapture::catalog::{CollectionCatalog, ProfileCatalog};
use biocapture::config::{AppConfig, DEFAULT_CONFIG_PATH};
use biocapture::device::mock::MockDevice;
use biocapture::logging;
use biocapture::model::{Collection, SubjectIdentity};
use biocapture::session::{
    CaptureOutcome, CaptureSessionController, SessionActor, SessionFolderPolicy, SessionHandle,
    SessionNotice,
};
use biocapture::store::{JsonFileStore, ProfileStore};
use biocapture::validation::{SessionValidator, Validation};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "biocapture")]
#[command(about = "Tethered camera capture sessions for biometric collections", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored camera profiles
    Profiles {
        /// Only profiles for this camera model
        #[arg(long)]
        camera: Option<String>,
    },

    /// List stored collections
    Collections,

    /// Check a subject identity against a collection and camera
    Validate {
        /// <RID>_<DATE>_<COLLECTION NUMBER>
        identity: String,

        #[arg(long)]
        collection: String,

        /// Connected camera model
        #[arg(long)]
        camera: String,
    },

    /// Run a full session against the simulated camera
    Simulate {
        /// <RID>_<DATE>_<COLLECTION NUMBER>
        identity: String,

        #[arg(long)]
        collection: String,

        /// Reuse the latest session folder instead of starting a new one
        #[arg(long)]
        overwrite: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    logging::init_from_config(&config).map_err(|e| anyhow!(e))?;
    let store = JsonFileStore::from_config(&config.storage);

    match cli.command {
        Commands::Profiles { camera } => list_profiles(store, camera.as_deref()),
        Commands::Collections => list_collections(store),
        Commands::Validate {
            identity,
            collection,
            camera,
        } => validate(&config, store, &identity, &collection, &camera),
        Commands::Simulate {
            identity,
            collection,
            overwrite,
        } => simulate(&config, store, &identity, &collection, overwrite).await,
        Commands::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn list_profiles(store: JsonFileStore, camera: Option<&str>) -> Result<()> {
    let catalog = ProfileCatalog::open(store)?;
    let profiles = match camera {
        Some(model) => catalog.profiles_for_camera(model),
        None => catalog.profiles().iter().collect(),
    };
    if profiles.is_empty() {
        println!("No camera profiles");
    }
    for profile in profiles {
        println!(
            "{:<24} {:<28} f/{:<6} {:<8} {:<10} {}",
            profile.name,
            profile.camera,
            profile.fstop.as_deref().unwrap_or("-"),
            profile.exposure.as_deref().unwrap_or("-"),
            profile.iso.as_deref().unwrap_or("-"),
            profile.white_balance.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

fn list_collections(store: JsonFileStore) -> Result<()> {
    let catalog = CollectionCatalog::open(store)?;
    if catalog.collections().is_empty() {
        println!("No collections");
    }
    for collection in catalog.collections() {
        println!(
            "#{:<4} {:<24} {:>3} poses  {} / {}  camera: {}  -> {}",
            collection.collection_number,
            collection.name,
            collection.number_of_poses,
            collection.modality,
            collection.device_name,
            collection.camera,
            collection.saving_directory.display(),
        );
    }
    Ok(())
}

fn find_collection(store: &JsonFileStore, number: &str) -> Result<Collection> {
    let catalog = CollectionCatalog::open(store.clone())?;
    catalog
        .find(number)
        .cloned()
        .ok_or_else(|| anyhow!("No collection with number {}", number))
}

fn validate(
    config: &AppConfig,
    store: JsonFileStore,
    identity: &str,
    collection: &str,
    camera: &str,
) -> Result<()> {
    let collection = find_collection(&store, collection)?;
    let validator = SessionValidator::new(&config.session.easter_egg_token);
    match validator.validate_with_store(identity, &collection, camera, &store)? {
        Validation::Subject(subject) => {
            println!(
                "OK: {} may start collection #{} ({}) on {}",
                subject, collection.collection_number, collection.name, camera
            );
        }
        Validation::EasterEgg => println!("Reserved token entered, no session started"),
    }
    Ok(())
}

async fn simulate(
    config: &AppConfig,
    store: JsonFileStore,
    identity: &str,
    collection: &str,
    overwrite: bool,
) -> Result<()> {
    let collection = find_collection(&store, collection)?;
    let camera = Arc::new(
        MockDevice::new(&config.device.model_name)
            .with_image_delay(Duration::from_millis(config.device.image_delay_ms)),
    );

    let validator = SessionValidator::new(&config.session.easter_egg_token);
    let model = config.device.model_name.as_str();
    let subject = match validator.validate_with_store(identity, &collection, model, &store)? {
        Validation::Subject(subject) => subject,
        Validation::EasterEgg => {
            println!("Reserved token entered, no session started");
            return Ok(());
        }
    };

    let controller = CaptureSessionController::new(camera, store.load_profiles()?);
    let (handle, task) = SessionActor::spawn(controller, &config.session);

    let result = run_session(&handle, subject, collection, overwrite).await;

    handle.shutdown().await?;
    task.await?;
    result
}

async fn run_session(
    handle: &SessionHandle,
    subject: SubjectIdentity,
    collection: Collection,
    overwrite: bool,
) -> Result<()> {
    let mut notices = handle.subscribe();
    handle.set_live_view(true).await?;

    let plan = handle.configure(subject, collection).await?;
    let policy = if overwrite && plan.can_overwrite() {
        SessionFolderPolicy::OverwriteLatest
    } else {
        SessionFolderPolicy::NewSession
    };
    let report = handle.begin(policy).await?;
    if report.save_path_had_content {
        println!("Warning: {} already contains files", report.save_path.display());
    }
    println!(
        "Session {} -> {}",
        report.session_number,
        report.save_path.display()
    );

    loop {
        match handle.capture().await? {
            CaptureOutcome::SessionEnded => break,
            CaptureOutcome::Started { pose_index } => {
                let notice = tokio::time::timeout(Duration::from_secs(10), notices.recv())
                    .await
                    .with_context(|| format!("No image from camera for pose {}", pose_index))??;
                match notice {
                    SessionNotice::Captured(file) => {
                        println!("  [{}] {}", file.pose_index, file.path.display())
                    }
                    SessionNotice::CaptureFailed { message } => bail!(message),
                    SessionNotice::DeviceShutdown => bail!("Camera shut down during the session"),
                }
            }
        }
    }

    handle.set_live_view(false).await?;
    info!("Simulated session complete");
    Ok(())
}
