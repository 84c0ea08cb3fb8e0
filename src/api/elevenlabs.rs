use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::fs;

use crate::api::check_status;
use crate::artifact::VoiceoverArtifact;
use crate::assembly;
use crate::error::{ProviderError, ProviderResult};
use crate::providers::{RunContext, SpeechSynthesizer};

const SERVICE: &str = "elevenlabs";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Rough narration pace used when ffprobe cannot measure the rendered mp3.
pub(crate) fn estimate_speech_seconds(text: &str) -> f64 {
    let words = text.split_whitespace().count();
    (words as f64 / 2.6).max(1.0)
}

pub struct ElevenLabsClient {
    client: Client,
    key: String,
    default_voice_id: String,
    model_id: String,
}

impl ElevenLabsClient {
    pub fn new(client: Client, key: String, default_voice_id: String, model_id: String) -> Self {
        Self {
            client,
            key,
            default_voice_id,
            model_id,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, ctx: &RunContext) -> ProviderResult<VoiceoverArtifact> {
        let voice_id = ctx
            .voice_profile
            .as_deref()
            .unwrap_or(&self.default_voice_id);
        let url = format!(
            "https://api.elevenlabs.io/v1/text-to-speech/{}?output_format=mp3_44100_128",
            voice_id
        );

        let body = serde_json::json!({
            "text": ctx.script,
            "model_id": self.model_id,
        });

        let resp = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("xi-api-key", &self.key)
            .json(&body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(SERVICE, e))?;
        let resp = check_status(SERVICE, resp).await?;

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ProviderError::from_reqwest(SERVICE, e))?;

        fs::create_dir_all(&ctx.workspace)
            .await
            .map_err(|e| ProviderError::io(SERVICE, e))?;
        let out_path = ctx.file_path("voiceover.mp3");
        fs::write(&out_path, &bytes)
            .await
            .map_err(|e| ProviderError::io(SERVICE, e))?;

        let duration_secs = match assembly::ffprobe_duration_seconds(&out_path).await {
            Ok(secs) => secs,
            Err(_) => estimate_speech_seconds(&ctx.script),
        };

        Ok(VoiceoverArtifact {
            url: ctx.file_url("voiceover.mp3"),
            local_path: Some(out_path),
            duration_secs,
            voice_id: voice_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speech_estimate_scales_with_word_count() {
        let short = estimate_speech_seconds("just five words right here");
        let long = estimate_speech_seconds(&"word ".repeat(260));
        assert!(short < long);
        assert!((long - 100.0).abs() < 1.0);
        assert!(estimate_speech_seconds("") >= 1.0);
    }
}
