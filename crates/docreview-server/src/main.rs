mod logging;
mod routes;

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use docreview_agent::build_oracle;
use docreview_core::{config::Config, Pipeline, RunUpdate};
use docreview_domains::get_profile;
use futures_util::StreamExt;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::logging::{BroadcastLayer, LogRing, LOG_RING_CAPACITY};

// ── AppState ──────────────────────────────────────────────────────────────

pub struct AppState {
    pub pipeline: Pipeline,
    pub log_tx: broadcast::Sender<String>,
    pub log_ring: LogRing,
    pub start_time: Instant,
}

// ── CLI ───────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "docreview-server", version, about = "Compliance review for corporate legal documents")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Review one .docx or .pdf file and print the report.
    Analyze {
        path: PathBuf,
        /// Print every update as a JSON line.
        #[arg(long)]
        json: bool,
    },
}

// ── main ──────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (log_tx, _log_rx) = broadcast::channel::<String>(256);
    let log_ring: LogRing = Arc::new(Mutex::new(VecDeque::with_capacity(LOG_RING_CAPACITY)));

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "docreview_server=info,docreview_core=info,docreview_agent=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(BroadcastLayer {
            tx: log_tx.clone(),
            ring: Arc::clone(&log_ring),
        })
        .init();

    let config = Config::from_env()?;
    let profile = get_profile(&config.profile)
        .with_context(|| format!("unknown PROFILE {:?}", config.profile))?;
    let oracle = build_oracle(&config)?;
    info!(
        profile = %profile.name,
        backend = oracle.name(),
        output_dir = %config.output_dir,
        "docreview configured"
    );
    let pipeline = Pipeline::new(oracle, profile, config.pipeline_settings());

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let state = Arc::new(AppState {
                pipeline,
                log_tx,
                log_ring,
                start_time: Instant::now(),
            });
            serve(&config, state).await
        }
        Command::Analyze { path, json } => analyze(&pipeline, &path, json).await,
    }
}

async fn serve(config: &Config, state: Arc<AppState>) -> anyhow::Result<()> {
    let max_upload_bytes = usize::try_from(config.max_upload_mb.saturating_mul(1024 * 1024))
        .unwrap_or(usize::MAX);
    let app = routes::router(state, max_upload_bytes);

    let addr = format!("{}:{}", config.web_bind, config.web_port);
    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn analyze(pipeline: &Pipeline, path: &Path, json: bool) -> anyhow::Result<()> {
    let mut updates = Box::pin(pipeline.analyze(path));
    while let Some(update) = updates.next().await {
        if json {
            println!("{}", update.to_json());
        } else {
            println!("{}", update.status());
        }
        match update {
            RunUpdate::Progress(_) => {}
            RunUpdate::Done {
                report,
                artifact_path,
            } => {
                if !json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                    println!("Report written to {}", artifact_path.display());
                }
            }
            RunUpdate::Failed { error } => bail!("{error}"),
        }
    }
    Ok(())
}
