use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::SeoMetadata;

/// One storyboard beat the visual planner should cover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneBeat {
    pub query: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default = "default_scene_seconds")]
    pub seconds: f64,
}

fn default_scene_seconds() -> f64 {
    6.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptAnalysis {
    pub tone: String,
    pub hook: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub scenes: Vec<SceneBeat>,
}

impl ScriptAnalysis {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).with_context(|| "Failed to parse script analysis JSON")
    }

    pub fn summary_line(&self) -> String {
        let topics = if self.topics.is_empty() {
            "general".to_string()
        } else {
            self.topics.join(", ")
        };
        format!("Tone: {}. Topics: {}.", self.tone, topics)
    }
}

pub fn seo_from_json(text: &str) -> Result<SeoMetadata> {
    serde_json::from_str(text).with_context(|| "Failed to parse SEO metadata JSON")
}

#[derive(Debug, Clone)]
pub struct VoiceoverArtifact {
    pub url: String,
    pub local_path: Option<PathBuf>,
    pub duration_secs: f64,
    pub voice_id: String,
}

#[derive(Debug, Clone)]
pub struct StoryboardClip {
    pub query: String,
    pub source_url: String,
    pub seconds: f64,
}

#[derive(Debug, Clone)]
pub struct StoryboardPlan {
    pub clips: Vec<StoryboardClip>,
}

#[derive(Debug, Clone)]
pub struct MusicTrack {
    pub title: String,
    pub mood: String,
    pub url: String,
    pub local_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SubtitleTrack {
    pub url: String,
    pub local_path: Option<PathBuf>,
    pub cue_count: usize,
    pub language: String,
}

#[derive(Debug, Clone)]
pub struct ThumbnailArtifact {
    pub url: String,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct VideoArtifact {
    pub url: String,
    pub local_path: Option<PathBuf>,
    pub duration_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_parses_with_defaults() {
        let analysis =
            ScriptAnalysis::from_json(r#"{"tone":"upbeat","hook":"Meet the pipeline."}"#).unwrap();
        assert_eq!(analysis.tone, "upbeat");
        assert!(analysis.topics.is_empty());
        assert!(analysis.scenes.is_empty());
    }

    #[test]
    fn scene_seconds_default_applies() {
        let analysis = ScriptAnalysis::from_json(
            r#"{"tone":"calm","hook":"h","scenes":[{"query":"city timelapse"}]}"#,
        )
        .unwrap();
        assert_eq!(analysis.scenes[0].seconds, 6.0);
    }

    #[test]
    fn seo_parse_rejects_garbage() {
        assert!(seo_from_json("not json").is_err());
        let seo = seo_from_json(r#"{"title":"T","description":"D","tags":["a","b"]}"#).unwrap();
        assert_eq!(seo.tags.len(), 2);
    }
}
