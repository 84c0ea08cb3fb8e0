use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::api::check_status;
use crate::artifact::{MusicTrack, ScriptAnalysis};
use crate::error::{ProviderError, ProviderResult};
use crate::providers::{MusicSelector, RunContext};

const SERVICE: &str = "beatoven";
const BASE_URL: &str = "https://public-api.beatoven.ai/api/v1";
const POLL_ATTEMPTS: usize = 12;
const POLL_INTERVAL: Duration = Duration::from_secs(3);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ComposeResponse {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct TaskResponse {
    status: String,
    #[serde(default)]
    meta: Option<TaskMeta>,
}

#[derive(Debug, Deserialize)]
struct TaskMeta {
    #[serde(default)]
    track_url: Option<String>,
}

pub struct BeatovenClient {
    client: Client,
    key: String,
}

impl BeatovenClient {
    pub fn new(client: Client, key: String) -> Self {
        Self { client, key }
    }

    async fn poll_task(&self, task_id: &str) -> ProviderResult<TaskResponse> {
        let resp = self
            .client
            .get(format!("{}/tasks/{}", BASE_URL, task_id))
            .bearer_auth(&self.key)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(SERVICE, e))?;
        let resp = check_status(SERVICE, resp).await?;
        resp.json()
            .await
            .map_err(|e| ProviderError::malformed(SERVICE, e.to_string()))
    }
}

#[async_trait]
impl MusicSelector for BeatovenClient {
    async fn select(
        &self,
        _ctx: &RunContext,
        analysis: &ScriptAnalysis,
    ) -> ProviderResult<MusicTrack> {
        let prompt = format!(
            "{} background track for a video about {}",
            analysis.tone,
            if analysis.topics.is_empty() {
                "technology".to_string()
            } else {
                analysis.topics.join(", ")
            }
        );

        let resp = self
            .client
            .post(format!("{}/tracks/compose", BASE_URL))
            .bearer_auth(&self.key)
            .json(&json!({
                "prompt": { "text": prompt },
                "format": "mp3",
                "looping": false,
            }))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(SERVICE, e))?;
        let resp = check_status(SERVICE, resp).await?;
        let compose: ComposeResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::malformed(SERVICE, e.to_string()))?;

        for _ in 0..POLL_ATTEMPTS {
            let task = self.poll_task(&compose.task_id).await?;
            match task.status.as_str() {
                "composed" => {
                    let url = task
                        .meta
                        .and_then(|m| m.track_url)
                        .ok_or_else(|| {
                            ProviderError::malformed(SERVICE, "composed task carried no track_url")
                        })?;
                    return Ok(MusicTrack {
                        title: format!("{} score", analysis.tone),
                        mood: analysis.tone.clone(),
                        url,
                        local_path: None,
                    });
                }
                "failed" => {
                    return Err(ProviderError::malformed(SERVICE, "composition failed"));
                }
                _ => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }

        Err(ProviderError::Timeout { service: SERVICE })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_response_parses_with_and_without_meta() {
        let pending: TaskResponse = serde_json::from_str(r#"{"status":"composing"}"#).unwrap();
        assert_eq!(pending.status, "composing");
        assert!(pending.meta.is_none());

        let done: TaskResponse = serde_json::from_str(
            r#"{"status":"composed","meta":{"track_url":"https://cdn.beatoven.ai/t.mp3"}}"#,
        )
        .unwrap();
        assert_eq!(
            done.meta.unwrap().track_url.as_deref(),
            Some("https://cdn.beatoven.ai/t.mp3")
        );
    }
}
