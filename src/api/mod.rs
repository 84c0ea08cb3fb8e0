pub mod beatoven;
pub mod elevenlabs;
pub mod openai;
pub mod pexels;
pub mod recraft;
pub mod youtube;

use std::time::Duration;

use anyhow::{Context, Result};

use crate::error::{ProviderError, ProviderResult};

const USER_AGENT: &str = concat!("ai-video-pipeline/", env!("CARGO_PKG_VERSION"));

/// One shared outbound client for all live adapters. Per-call timeouts are
/// tightened where a provider needs it.
pub fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(120))
        .connect_timeout(Duration::from_secs(30))
        .build()
        .context("failed to build reqwest client")
}

pub(crate) async fn check_status(
    service: &'static str,
    resp: reqwest::Response,
) -> ProviderResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ProviderError::from_status(service, status.as_u16(), &body))
}
