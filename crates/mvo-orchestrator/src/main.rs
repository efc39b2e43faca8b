//! MV Orchestra CLI entry point: runs the full ten-phase pipeline for one
//! session against a single audio file.

use std::path::PathBuf;

use mvo_orchestrator::{Orchestrator, OrchestratorConfig};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("mvo=info".parse().unwrap()))
        .init();

    info!("starting mv orchestra");

    let mut args = std::env::args().skip(1);
    let audio_file = match args.next() {
        Some(path) => PathBuf::from(path),
        None => {
            error!("usage: mvo <audio-file> [session-id]");
            std::process::exit(1);
        }
    };
    let session_id = args.next().unwrap_or_else(|| "default".to_string());

    let config = OrchestratorConfig::from_env();
    info!(sessions_root = %config.sessions_root, "orchestrator config loaded");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_handle = tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let sessions_root = PathBuf::from(&config.sessions_root);
    let mut orchestrator = match Orchestrator::new(&sessions_root, &session_id, config, shutdown_rx) {
        Ok(o) => o,
        Err(e) => {
            error!("failed to initialize orchestrator: {e}");
            std::process::exit(1);
        }
    };

    let result = run_pipeline(&mut orchestrator, &audio_file).await;

    match result {
        Ok(()) => info!("pipeline complete"),
        Err(e) => {
            error!("pipeline failed: {e}");
            shutdown_handle.abort();
            std::process::exit(1);
        }
    }

    shutdown_handle.abort();
}

async fn run_pipeline(
    orchestrator: &mut Orchestrator,
    audio_file: &PathBuf,
) -> mvo_orchestrator::OrchestratorResult<()> {
    orchestrator.run_audio_analysis(audio_file)?;
    orchestrator.run_design_phases(1, 4).await?;

    let clips = orchestrator.run_clip_generation().await?;
    orchestrator.run_quality_gate(&clips).await?;
    orchestrator.run_video_editing(&clips).await?;
    orchestrator.run_effects_phase().await?;
    orchestrator.run_render(std::path::Path::new("render_props.json")).await?;

    let summary = orchestrator.session_summary();
    info!(summary = %summary, "session summary");

    Ok(())
}
