use anyhow::Result;
use tokio::fs;

use crate::config::Config;

pub async fn ensure_directories(cfg: &Config) -> Result<()> {
    for dir in [&cfg.workspace_dir, &cfg.music_dir] {
        if !dir.exists() {
            fs::create_dir_all(dir).await?;
            tracing::info!("Created directory: {}", dir.display());
        }
    }
    Ok(())
}

pub async fn check_ffmpeg() -> bool {
    match tokio::process::Command::new("ffmpeg")
        .arg("-version")
        .output()
        .await
    {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}
