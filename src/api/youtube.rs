use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;

use crate::api::check_status;
use crate::artifact::VideoArtifact;
use crate::config::YoutubeCredentials;
use crate::error::{ProviderError, ProviderResult};
use crate::model::{SeoMetadata, UploadResult, parse_schedule};
use crate::providers::{RunContext, VideoPublisher};

const SERVICE: &str = "youtube";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/youtube/v3/videos";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct InsertResponse {
    id: String,
}

pub struct YoutubeClient {
    client: Client,
    creds: YoutubeCredentials,
}

impl YoutubeClient {
    pub fn new(client: Client, creds: YoutubeCredentials) -> Self {
        Self { client, creds }
    }

    async fn access_token(&self) -> ProviderResult<String> {
        let params = [
            ("client_id", self.creds.client_id.as_str()),
            ("client_secret", self.creds.client_secret.as_str()),
            ("refresh_token", self.creds.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let resp = self
            .client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(SERVICE, e))?;
        let resp = check_status(SERVICE, resp).await?;
        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::malformed(SERVICE, e.to_string()))?;
        Ok(token.access_token)
    }

    async fn video_bytes(&self, video: &VideoArtifact) -> ProviderResult<Vec<u8>> {
        if let Some(path) = &video.local_path {
            if path.exists() {
                return tokio::fs::read(path)
                    .await
                    .map_err(|e| ProviderError::io(SERVICE, e));
            }
        }
        let resp = self
            .client
            .get(&video.url)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(SERVICE, e))?;
        let resp = check_status(SERVICE, resp).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ProviderError::from_reqwest(SERVICE, e))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl VideoPublisher for YoutubeClient {
    async fn publish(
        &self,
        _ctx: &RunContext,
        video: &VideoArtifact,
        seo: &SeoMetadata,
        schedule_at: Option<&str>,
    ) -> ProviderResult<UploadResult> {
        let token = self.access_token().await?;
        let bytes = self.video_bytes(video).await?;

        // Scheduled uploads stay private until the platform flips them live
        // at publishAt.
        let status = match schedule_at {
            Some(ts) => {
                let publish_at = parse_schedule(ts)
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_else(|| ts.to_string());
                json!({ "privacyStatus": "private", "publishAt": publish_at })
            }
            None => json!({ "privacyStatus": "public" }),
        };

        let metadata = json!({
            "snippet": {
                "title": seo.title,
                "description": seo.description,
                "tags": seo.tags,
                "categoryId": "28",
            },
            "status": status,
        });

        let form = Form::new()
            .part(
                "metadata",
                Part::text(metadata.to_string())
                    .mime_str("application/json")
                    .map_err(|e| ProviderError::from_reqwest(SERVICE, e))?,
            )
            .part(
                "media",
                Part::bytes(bytes)
                    .file_name("final.mp4")
                    .mime_str("video/mp4")
                    .map_err(|e| ProviderError::from_reqwest(SERVICE, e))?,
            );

        let resp = self
            .client
            .post(UPLOAD_URL)
            .query(&[("uploadType", "multipart"), ("part", "snippet,status")])
            .bearer_auth(token)
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(SERVICE, e))?;
        let resp = check_status(SERVICE, resp).await?;
        let inserted: InsertResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::malformed(SERVICE, e.to_string()))?;

        Ok(match schedule_at {
            Some(ts) => UploadResult::Scheduled {
                scheduled_for: ts.to_string(),
            },
            None => UploadResult::Uploaded {
                url: format!("https://www.youtube.com/watch?v={}", inserted.id),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oauth_and_insert_payloads_parse() {
        let token: TokenResponse =
            serde_json::from_str(r#"{"access_token":"ya29.x","expires_in":3599}"#).unwrap();
        assert_eq!(token.access_token, "ya29.x");

        let inserted: InsertResponse =
            serde_json::from_str(r#"{"id":"abc123","kind":"youtube#video"}"#).unwrap();
        assert_eq!(inserted.id, "abc123");
    }
}
