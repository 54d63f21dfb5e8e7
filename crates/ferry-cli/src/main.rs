//! Ferry CLI: push files through the upload engine from the command line.
//!
//! The storage policy comes from FERRY_* environment variables (see
//! `EngineConfig::from_env`). Ctrl-C while uploading counts as a client abort.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ferry_cli::{default_hooks, drain_failures, owner_for};
use ferry_core::telemetry::init_tracing;
use ferry_core::{EngineConfig, StaticSettings, StoredObject, UploadRequest};
use ferry_storage::create_handler;
use ferry_upload::{
    CredentialIssuer, FailureReporter, MemorySessionCache, UploadContext, UploadPipeline,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "ferry", about = "Ferry upload engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a local file through the configured storage policy
    Upload {
        /// Path to the file to upload
        file: PathBuf,
        /// Logical directory the file belongs to
        #[arg(long, default_value = "/")]
        virtual_path: String,
        /// Uploading user; omit for an anonymous upload
        #[arg(long)]
        owner_id: Option<u64>,
        /// Overwrite this existing backend path instead of generating one
        #[arg(long)]
        update_source: Option<String>,
    },
    /// Issue a credential for a direct-to-backend upload
    Token {
        /// Logical directory the future upload belongs to
        virtual_path: String,
        /// Declared size of the future upload in bytes
        #[arg(long)]
        size: u64,
        /// Requesting user; omit for anonymous
        #[arg(long)]
        owner_id: Option<u64>,
    },
}

#[derive(Serialize)]
struct UploadOutput<'a> {
    file_name: &'a str,
    size: u64,
    destination: &'a str,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = EngineConfig::from_env().context("Failed to load ferry configuration")?;
    let policy = Arc::new(config.policy.clone());
    let handler = create_handler(policy.clone())
        .await
        .context("Failed to create storage handler")?;

    match cli.command {
        Commands::Upload {
            file,
            virtual_path,
            owner_id,
            update_source,
        } => {
            let file_name = file
                .file_name()
                .and_then(|name| name.to_str())
                .map(str::to_string)
                .context("File path has no usable file name")?;
            let source = tokio::fs::File::open(&file)
                .await
                .with_context(|| format!("Failed to open {}", file.display()))?;
            let size = source.metadata().await?.len();

            let request_token = CancellationToken::new();
            let mut ctx = UploadContext::new(request_token.clone());
            if let Some(owner) = owner_for(owner_id, &policy) {
                ctx = ctx.with_owner(owner);
            }
            if let Some(source_name) = update_source {
                ctx = ctx.for_update(StoredObject {
                    id: 0,
                    name: file_name.clone(),
                    source_name,
                    size,
                });
            }

            let (reporter, failures) = FailureReporter::channel();
            let pipeline = UploadPipeline::new(handler)
                .with_hooks(default_hooks())
                .with_failure_reporter(reporter);

            let drain = tokio::spawn(drain_failures(failures));

            let interrupt = tokio::spawn({
                let request_token = request_token.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        request_token.cancel();
                    }
                }
            });

            let request = UploadRequest::new(Box::pin(source), size, file_name.clone(), virtual_path);
            let result = pipeline.upload(ctx, request).await;
            interrupt.abort();

            // The channel closes once the pipeline and any running watcher drop their senders.
            drop(pipeline);
            if let Err(e) = drain.await {
                tracing::warn!(error = %e, "Failure drain task ended abnormally");
            }

            let destination = result.context("Upload failed")?;
            print_json(&UploadOutput {
                file_name: &file_name,
                size,
                destination: destination.as_str(),
            })?;
        }
        Commands::Token {
            virtual_path,
            size,
            owner_id,
        } => {
            let issuer = CredentialIssuer::new(
                handler,
                Arc::new(StaticSettings::new(config.settings)),
                Arc::new(MemorySessionCache::new()),
            );
            let owner = owner_for(owner_id, &policy);

            let credential = issuer
                .issue(owner.as_ref(), &virtual_path, size)
                .await
                .context("Failed to issue upload credential")?;
            print_json(&credential)?;
        }
    }

    Ok(())
}
