use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ai_video_pipeline::api;
use ai_video_pipeline::config::Config;
use ai_video_pipeline::init;
use ai_video_pipeline::pipeline::PipelineRunner;
use ai_video_pipeline::providers::Providers;
use ai_video_pipeline::server::{self, AppState};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ai_video_pipeline=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting AI video pipeline service...");

    let cfg = Config::from_env();

    init::ensure_directories(&cfg)
        .await
        .expect("Failed to prepare workspace directories");

    let ffmpeg_available = init::check_ffmpeg().await;
    if !ffmpeg_available {
        tracing::warn!("ffmpeg not found in PATH; assembly will produce demo output");
    }

    let client = api::build_client().expect("Failed to build HTTP client");
    let providers = Providers::from_config(&cfg, client, ffmpeg_available);
    let runner = Arc::new(PipelineRunner::new(providers, &cfg));

    let app = server::router(AppState { runner }, &cfg.workspace_dir);

    tracing::info!("Listening on {}", cfg.bind_addr);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
