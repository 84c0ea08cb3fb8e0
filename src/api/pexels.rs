use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::api::check_status;
use crate::artifact::{SceneBeat, ScriptAnalysis, StoryboardClip, StoryboardPlan};
use crate::error::{ProviderError, ProviderResult};
use crate::providers::{RunContext, VisualPlanner};

const SERVICE: &str = "pexels";
const SEARCH_URL: &str = "https://api.pexels.com/videos/search";
const MAX_SCENES: usize = 6;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct Video {
    #[serde(default)]
    video_files: Vec<VideoFile>,
}

#[derive(Debug, Deserialize)]
struct VideoFile {
    link: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    quality: Option<String>,
}

fn best_file(video: &Video) -> Option<&VideoFile> {
    video
        .video_files
        .iter()
        .find(|f| f.quality.as_deref() == Some("hd"))
        .or_else(|| video.video_files.iter().max_by_key(|f| f.width.unwrap_or(0)))
}

pub struct PexelsClient {
    client: Client,
    key: String,
}

impl PexelsClient {
    pub fn new(client: Client, key: String) -> Self {
        Self { client, key }
    }

    async fn search(&self, query: &str) -> ProviderResult<SearchResponse> {
        let resp = self
            .client
            .get(SEARCH_URL)
            .header("Authorization", &self.key)
            .query(&[
                ("query", query),
                ("per_page", "3"),
                ("orientation", "landscape"),
            ])
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
impl VisualPlanner for PexelsClient {
    async fn plan(
        &self,
        ctx: &RunContext,
        analysis: &ScriptAnalysis,
    ) -> ProviderResult<StoryboardPlan> {
        let mut beats: Vec<SceneBeat> = analysis.scenes.iter().take(MAX_SCENES).cloned().collect();
        if beats.is_empty() {
            let query = if analysis.topics.is_empty() {
                ctx.project_name.clone()
            } else {
                analysis.topics.join(" ")
            };
            beats.push(SceneBeat {
                query,
                caption: String::new(),
                seconds: 8.0,
            });
        }

        let mut clips = Vec::new();
        for beat in &beats {
            let found = self.search(&beat.query).await?;
            match found.videos.iter().find_map(best_file) {
                Some(file) => clips.push(StoryboardClip {
                    query: beat.query.clone(),
                    source_url: file.link.clone(),
                    seconds: beat.seconds,
                }),
                None => {
                    tracing::warn!(query = %beat.query, "no stock footage matched this beat");
                }
            }
        }

        if clips.is_empty() {
            return Err(ProviderError::malformed(
                SERVICE,
                "no footage matched the storyboard",
            ));
        }
        Ok(StoryboardPlan { clips })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_file_prefers_hd_then_width() {
        let video: Video = serde_json::from_str(
            r#"{"video_files":[
                {"link":"a","width":640,"quality":"sd"},
                {"link":"b","width":3840,"quality":"uhd"},
                {"link":"c","width":1920,"quality":"hd"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(best_file(&video).unwrap().link, "c");

        let no_hd: Video = serde_json::from_str(
            r#"{"video_files":[
                {"link":"a","width":640},
                {"link":"b","width":1280}
            ]}"#,
        )
        .unwrap();
        assert_eq!(best_file(&no_hd).unwrap().link, "b");
    }

    #[test]
    fn empty_search_response_parses() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"videos":[]}"#).unwrap();
        assert!(parsed.videos.is_empty());
    }
}
