//! dog-upload CLI: pick a local file and push it through the upload pipeline.
//!
//! Storage settings come from `DOG_UPLOAD_S3_*` / `DOG_UPLOAD_PUBLIC_BASE_URL`,
//! pipeline settings from `DOG_UPLOAD__*`. `--dry-run` stores in memory.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dog_upload::{
    LogNotifier, MediaKind, MemoryStore, PathPicker, Platform, S3CompatibleStore, S3Config,
    UploadConfig, UploadController, UploadPipeline,
};

/// How long the completion notice may take before the process exits
const NOTICE_GRACE: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(name = "dog-upload", about = "Upload images and videos to remote storage")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload one image or video
    Upload {
        /// Kind of media: image or video
        #[arg(long, default_value = "image")]
        kind: MediaKind,
        /// Path or URI of the file to upload
        #[arg(long)]
        file: String,
        /// Target collection (defaults to the configured one for the kind)
        #[arg(long)]
        collection: Option<String>,
        /// How the file is read: web or native
        #[arg(long)]
        platform: Option<Platform>,
        /// Store in memory instead of the configured S3-compatible backend
        #[arg(long)]
        dry_run: bool,
        /// Override the base of public object URLs
        #[arg(long)]
        public_base_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            kind,
            file,
            collection,
            platform,
            dry_run,
            public_base_url,
        } => {
            let mut config = UploadConfig::from_env().context("invalid DOG_UPLOAD__ settings")?;
            if let Some(platform) = platform {
                config = config.with_platform(platform);
            }
            if let Some(collection) = collection {
                config = config.with_collection(kind, collection);
            }

            let pipeline = if dry_run {
                let base_url = public_base_url.unwrap_or_else(|| "memory://dry-run".to_string());
                UploadPipeline::new(MemoryStore::new(base_url), config.clone())
            } else {
                let mut s3 = S3Config::from_env().context("S3 storage is not configured")?;
                if let Some(base_url) = public_base_url {
                    s3.public_base_url = base_url;
                }
                UploadPipeline::new(S3CompatibleStore::new(s3).await, config.clone())
            };

            let pipeline = Arc::new(pipeline.with_notifier(LogNotifier));
            let controller = UploadController::new(
                PathPicker::new(file.clone()).with_platform(config.platform),
                pipeline.clone(),
            );

            if let Err(e) = controller.choose(kind).await {
                bail!("{} ({})", e.user_message(), e.detail());
            }
            if controller.selected().is_none() {
                bail!("{} is not a selectable {}", file, kind);
            }

            match controller.submit().await.into_result() {
                Some(Ok(receipt)) => {
                    println!("{}", serde_json::to_string_pretty(&receipt)?);
                    pipeline.wait_for_notifications(NOTICE_GRACE).await;
                }
                Some(Err(e)) => bail!("{} ({}: {})", e.user_message(), e.kind(), e.detail()),
                None => bail!("an upload is already in progress"),
            }
        }
    }

    Ok(())
}
