use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use image_uploader::{
    client::UploadClient,
    config::UploaderConfig,
    file::SelectedFile,
    widget::{UploadState, UploadWidget, View},
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "image-uploader")]
#[command(about = "Upload a file and get a link to it. Files live for 2 days.")]
struct CliArgs {
    /// The file to upload
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Upload endpoint (overrides IMAGE_UPLOADER_API_URL)
    #[arg(long)]
    endpoint: Option<String>,

    /// Base URL of stored files (overrides IMAGE_UPLOADER_STORAGE_URL)
    #[arg(long)]
    storage_url: Option<String>,

    /// Give up on the upload after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn build_config(args: &CliArgs) -> Result<UploaderConfig> {
    let mut config = UploaderConfig::from_env().context("Failed to load configuration")?;
    if let Some(endpoint) = &args.endpoint {
        config.upload_endpoint = endpoint.clone();
    }
    if let Some(storage_url) = &args.storage_url {
        config.storage_base_url = storage_url.clone();
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    config.validate()?;
    Ok(config)
}

fn print_view(view: &View) {
    match &view.picker.file_name {
        Some(name) => println!("[ {} ]", name),
        None => println!("[ Click to upload or drag and drop ]"),
    }
    if view.picker.oversize_warning {
        println!("  !! {}", view.picker.limit_hint());
    } else {
        println!("  {}", view.picker.limit_hint());
    }
    if view.submit_enabled {
        println!("  <Upload>");
    }
    if view.progress {
        println!("  Loading...");
    }
    if let Some(message) = &view.error_message {
        println!("  Upload failed: {}", message);
    }
    if let Some(link) = &view.result_link {
        println!("  Click here to see the file: {}", link);
    }
}

async fn run(args: CliArgs) -> Result<()> {
    let config = build_config(&args)?;
    let widget = Arc::new(UploadWidget::new(
        config.clone(),
        Arc::new(UploadClient::new(&config)),
    ));

    tokio::spawn({
        let widget = widget.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, cancelling upload");
                widget.teardown();
            }
        }
    });

    let file = SelectedFile::from_path(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    widget.select_files([file]);
    print_view(&widget.render());

    if widget.selected_file().is_none() {
        anyhow::bail!(widget
            .last_rejection()
            .unwrap_or_else(|| "File was not accepted".to_string()));
    }

    let state = widget.submit().await?;
    print_view(&widget.render());

    match state {
        UploadState::Done => {
            if let Some(receipt) = widget.receipt() {
                info!(id = %receipt.id, expires_at = %receipt.expires_at, "File stored");
            }
            Ok(())
        }
        _ => anyhow::bail!(widget
            .failure()
            .unwrap_or_else(|| "Upload did not complete".to_string())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image_uploader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Upload failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
