//! SiteReport uploader: submits a batch of site photos as one report.

mod config;
mod photos;
mod sink;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sitereport_protocol::{MetadataPatch, PhotoType};
use sitereport_storage::{EnvSession, PhotoStorage, SessionProvider, StaticSession, StorageClient};
use sitereport_upload::{SubmitRequest, UploadEvent, UploadManager, submit_report};
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use sink::ManifestSink;

#[derive(Parser)]
#[command(version, about = "Upload construction-site photos as a report", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.config/sitereport/config.json).
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Access token; falls back to SITEREPORT_ACCESS_TOKEN.
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress, upload and record photos as a report.
    Submit(SubmitArgs),
    /// Delete previously uploaded photos by public URL.
    Delete {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Print the effective configuration.
    Config {
        /// Also write it to the config file.
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args)]
struct SubmitArgs {
    /// Project the report belongs to.
    #[arg(long)]
    project: String,

    /// Storage folder of the submitting user.
    #[arg(long)]
    namespace: String,

    /// Photo type applied to every photo.
    #[arg(long, default_value = "during")]
    photo_type: PhotoType,

    #[arg(long)]
    comment: Option<String>,

    /// Customer feedback, kept only for `after` photos.
    #[arg(long)]
    feedback: Option<String>,

    /// Directory report manifests are written to.
    #[arg(long, value_name = "DIR", default_value = ".")]
    out: PathBuf,

    /// Photo files or directories of photos.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sitereport=debug")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Submit(args) => submit(cfg, cli.token, args).await,
        Command::Delete { urls } => {
            let client = storage_client(&cfg, cli.token)?;
            let removed = client.delete_photos(&urls).await?;
            println!("removed {removed} object(s)");
            Ok(())
        }
        Command::Config { save } => {
            println!("{}", serde_json::to_string_pretty(&cfg)?);
            if save {
                let path = match cli.config {
                    Some(p) => p,
                    None => config::default_config_path()?,
                };
                cfg.save_to(&path)?;
                tracing::info!(path = %path.display(), "configuration written");
            }
            Ok(())
        }
    }
}

fn storage_client(cfg: &AppConfig, token: Option<String>) -> anyhow::Result<StorageClient> {
    let session: Arc<dyn SessionProvider> = match token {
        Some(t) => Arc::new(StaticSession::new(t)),
        None => Arc::new(EnvSession),
    };
    StorageClient::new(cfg.storage.clone(), session).context("storage is not configured")
}

async fn submit(cfg: AppConfig, token: Option<String>, args: SubmitArgs) -> anyhow::Result<()> {
    let files = photos::collect_photos(&args.paths)?;
    if files.is_empty() {
        anyhow::bail!("no photos found");
    }

    let storage: Arc<dyn PhotoStorage> = Arc::new(storage_client(&cfg, token)?);
    let mut manager = UploadManager::new(cfg.upload.clone(), storage);

    let events = manager.take_events();
    let reporter = tokio::spawn(async move {
        let Some(mut events) = events else { return };
        while let Some(event) = events.recv().await {
            match event {
                UploadEvent::StatusChanged { id, status } => {
                    tracing::info!(photo = %id, %status, "status changed");
                }
                UploadEvent::Progress { id, progress } => {
                    tracing::debug!(photo = %id, progress, "upload progress");
                }
                UploadEvent::Added { .. } | UploadEvent::Removed { .. } => {}
            }
        }
    });

    let mut payloads = Vec::with_capacity(files.len());
    for path in &files {
        payloads.push(photos::read_photo(path).await?);
    }
    let outcome = manager.add_photos(payloads).await;
    if outcome.dropped > 0 {
        tracing::warn!(
            dropped = outcome.dropped,
            max = cfg.upload.max_photos,
            "too many photos, extra files skipped"
        );
    }

    for (id, path) in outcome.added.iter().zip(&files) {
        let mut patch = MetadataPatch::title(photos::default_title(path)).with_photo_type(args.photo_type);
        if let Some(comment) = &args.comment {
            patch = patch.with_comment(comment.clone());
        }
        if let Some(feedback) = &args.feedback {
            patch = patch.with_customer_feedback(feedback.clone());
        }
        manager.update_photo_data(*id, patch);
    }

    let sink = ManifestSink::new(&args.out);
    let request = SubmitRequest {
        project_id: args.project,
        user_namespace: args.namespace,
    };
    let result = submit_report(&manager, &sink, &request).await;

    for item in manager.items() {
        if let Some(error) = &item.error {
            eprintln!("{}: {error}", item.file_name);
        }
    }
    drop(manager);
    let _ = reporter.await;

    let report_id = result?;
    println!("report {report_id} saved to {}", sink.manifest_path(&report_id).display());
    Ok(())
}
