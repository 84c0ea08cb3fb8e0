use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::api::check_status;
use crate::artifact::{ScriptAnalysis, ThumbnailArtifact};
use crate::error::{ProviderError, ProviderResult};
use crate::providers::{RunContext, ThumbnailRenderer};

const SERVICE: &str = "recraft";
const GENERATE_URL: &str = "https://external.api.recraft.ai/v1/images/generations";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: String,
}

pub struct RecraftClient {
    client: Client,
    key: String,
}

impl RecraftClient {
    pub fn new(client: Client, key: String) -> Self {
        Self { client, key }
    }
}

#[async_trait]
impl ThumbnailRenderer for RecraftClient {
    async fn render(
        &self,
        ctx: &RunContext,
        analysis: &ScriptAnalysis,
    ) -> ProviderResult<ThumbnailArtifact> {
        let prompt = format!(
            "High-contrast YouTube thumbnail for \"{}\". {} Bold readable title text, dramatic lighting, 16:9 composition.",
            ctx.project_name, analysis.hook
        );

        let resp = self
            .client
            .post(GENERATE_URL)
            .bearer_auth(&self.key)
            .json(&json!({
                "prompt": prompt,
                "style": "digital_illustration",
                "size": "1280x720",
                "n": 1,
            }))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(SERVICE, e))?;
        let resp = check_status(SERVICE, resp).await?;
        let generated: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::malformed(SERVICE, e.to_string()))?;

        let url = generated
            .data
            .into_iter()
            .next()
            .map(|img| img.url)
            .ok_or_else(|| ProviderError::malformed(SERVICE, "no image in response"))?;

        Ok(ThumbnailArtifact { url, prompt })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_response_parses() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"data":[{"url":"https://img.recraft.ai/x.png"}]}"#).unwrap();
        assert_eq!(parsed.data[0].url, "https://img.recraft.ai/x.png");

        let empty: GenerateResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(empty.data.is_empty());
    }
}
