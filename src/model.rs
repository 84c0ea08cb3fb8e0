use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub const SCRIPT_MIN_CHARS: usize = 20;
pub const PROJECT_NAME_MIN_CHARS: usize = 3;
pub const PROJECT_NAME_MAX_CHARS: usize = 80;

/// Closed set of pipeline stages. Declaration order is execution order and
/// rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKey {
    ScriptAnalysis,
    Voiceover,
    Visuals,
    Music,
    SubtitleGeneration,
    Thumbnail,
    Seo,
    Assembly,
    Upload,
}

pub struct StageSpec {
    pub key: StageKey,
    pub title: &'static str,
    pub idle_summary: &'static str,
}

pub const STAGE_SPECS: [StageSpec; 9] = [
    StageSpec {
        key: StageKey::ScriptAnalysis,
        title: "Analyze script context",
        idle_summary: "Understand tone, topics, and hook to map the rest of the workflow.",
    },
    StageSpec {
        key: StageKey::Voiceover,
        title: "Synthesize AI voiceover",
        idle_summary: "Select a neural narrator and convert the script to studio audio.",
    },
    StageSpec {
        key: StageKey::Visuals,
        title: "Plan visual storyboard",
        idle_summary: "Match each beat with stock footage, b-roll, and motion graphics.",
    },
    StageSpec {
        key: StageKey::Music,
        title: "Select background music",
        idle_summary: "Generate or source a soundtrack aligned to pacing and mood.",
    },
    StageSpec {
        key: StageKey::SubtitleGeneration,
        title: "Generate subtitles",
        idle_summary: "Auto-caption the voiceover with multilingual support.",
    },
    StageSpec {
        key: StageKey::Thumbnail,
        title: "Craft thumbnail",
        idle_summary: "Design a high-CTR thumbnail prompt and render.",
    },
    StageSpec {
        key: StageKey::Seo,
        title: "Optimize SEO metadata",
        idle_summary: "Create a title, description, and tags ready for upload.",
    },
    StageSpec {
        key: StageKey::Assembly,
        title: "Assemble final video",
        idle_summary: "Timeline voiceover, visuals, captions, and audio bed.",
    },
    StageSpec {
        key: StageKey::Upload,
        title: "Upload to YouTube",
        idle_summary: "Publish immediately or schedule via the YouTube Data API.",
    },
];

impl StageKey {
    pub fn as_str(self) -> &'static str {
        match self {
            StageKey::ScriptAnalysis => "script_analysis",
            StageKey::Voiceover => "voiceover",
            StageKey::Visuals => "visuals",
            StageKey::Music => "music",
            StageKey::SubtitleGeneration => "subtitle_generation",
            StageKey::Thumbnail => "thumbnail",
            StageKey::Seo => "seo",
            StageKey::Assembly => "assembly",
            StageKey::Upload => "upload",
        }
    }

    pub fn position(self) -> usize {
        STAGE_SPECS
            .iter()
            .position(|spec| spec.key == self)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Idle,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStage {
    pub key: StageKey,
    pub title: String,
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineStage {
    pub fn idle(spec: &StageSpec) -> Self {
        Self {
            key: spec.key,
            title: spec.title.to_string(),
            status: StageStatus::Idle,
            summary: Some(spec.idle_summary.to_string()),
            error: None,
        }
    }
}

/// Inbound request body for `POST /api/pipeline`. Required string fields
/// default to empty so that missing keys surface as field-level validation
/// errors rather than a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRequest {
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
    #[serde(default)]
    pub auto_upload_enabled: bool,
    #[serde(default)]
    pub schedule_at: Option<String>,
}

pub type ValidationErrors = BTreeMap<String, Vec<String>>;

impl PipelineRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.script.trim().chars().count() < SCRIPT_MIN_CHARS {
            errors.entry("script".to_string()).or_default().push(
                "Script must include at least 20 characters.".to_string(),
            );
        }

        let name_chars = self.project_name.trim().chars().count();
        if name_chars < PROJECT_NAME_MIN_CHARS {
            errors.entry("projectName".to_string()).or_default().push(
                "Project name must include at least 3 characters.".to_string(),
            );
        } else if name_chars > PROJECT_NAME_MAX_CHARS {
            errors.entry("projectName".to_string()).or_default().push(
                "Project name must be 80 characters or fewer.".to_string(),
            );
        }

        // scheduleAt is only meaningful alongside auto-upload; otherwise it
        // is carried but ignored.
        if self.auto_upload_enabled {
            if let Some(ts) = &self.schedule_at {
                if parse_schedule(ts).is_none() {
                    errors.entry("scheduleAt".to_string()).or_default().push(
                        "Schedule timestamp is not a valid date-time.".to_string(),
                    );
                }
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Accepts RFC 3339 or the `datetime-local` shapes the form submits
/// (`YYYY-MM-DDTHH:MM` and `YYYY-MM-DDTHH:MM:SS`, assumed UTC).
pub fn parse_schedule(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voiceover_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitles_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Upload outcome as a tagged union over `status`, so an uploaded result
/// without a URL is unrepresentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadResult {
    Queued,
    Uploaded {
        url: String,
    },
    Scheduled {
        #[serde(rename = "scheduledFor")]
        scheduled_for: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub stages: Vec<PipelineStage>,
    pub assets: Assets,
    pub seo: SeoMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> PipelineRequest {
        PipelineRequest {
            script: "A".repeat(25),
            project_name: "Demo Project".to_string(),
            voice_profile: None,
            target_language: None,
            auto_upload_enabled: false,
            schedule_at: None,
        }
    }

    #[test]
    fn stage_specs_cover_all_keys_in_order() {
        assert_eq!(STAGE_SPECS.len(), 9);
        let keys: Vec<&str> = STAGE_SPECS.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "script_analysis",
                "voiceover",
                "visuals",
                "music",
                "subtitle_generation",
                "thumbnail",
                "seo",
                "assembly",
                "upload",
            ]
        );
        for (idx, spec) in STAGE_SPECS.iter().enumerate() {
            assert_eq!(spec.key.position(), idx);
        }
    }

    #[test]
    fn stage_key_serializes_snake_case() {
        let json = serde_json::to_string(&StageKey::SubtitleGeneration).unwrap();
        assert_eq!(json, "\"subtitle_generation\"");
        let back: StageKey = serde_json::from_str("\"script_analysis\"").unwrap();
        assert_eq!(back, StageKey::ScriptAnalysis);
    }

    #[test]
    fn validate_accepts_well_formed_request() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn validate_rejects_short_script() {
        let mut req = valid_request();
        req.script = "too short".to_string();
        let errors = req.validate().unwrap_err();
        assert_eq!(
            errors["script"],
            vec!["Script must include at least 20 characters.".to_string()]
        );
    }

    #[test]
    fn validate_rejects_project_name_bounds() {
        let mut req = valid_request();
        req.project_name = "ab".to_string();
        assert!(req.validate().unwrap_err().contains_key("projectName"));

        req.project_name = "x".repeat(81);
        assert!(req.validate().unwrap_err().contains_key("projectName"));

        req.project_name = "x".repeat(80);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn validate_checks_schedule_only_with_auto_upload() {
        let mut req = valid_request();
        req.schedule_at = Some("not a date".to_string());
        assert!(req.validate().is_ok());

        req.auto_upload_enabled = true;
        assert!(req.validate().unwrap_err().contains_key("scheduleAt"));

        req.schedule_at = Some("2025-01-01T10:00".to_string());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn parse_schedule_accepts_common_shapes() {
        assert!(parse_schedule("2025-01-01T10:00").is_some());
        assert!(parse_schedule("2025-01-01T10:00:30").is_some());
        assert!(parse_schedule("2025-01-01T10:00:00Z").is_some());
        assert!(parse_schedule("2025-01-01T10:00:00+02:00").is_some());
        assert!(parse_schedule("tomorrow").is_none());
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let req: PipelineRequest = serde_json::from_str("{}").unwrap();
        assert!(req.script.is_empty());
        assert!(req.project_name.is_empty());
        assert!(!req.auto_upload_enabled);
        let errors = req.validate().unwrap_err();
        assert!(errors.contains_key("script"));
        assert!(errors.contains_key("projectName"));
    }

    #[test]
    fn upload_result_wire_shapes() {
        let queued = serde_json::to_value(&UploadResult::Queued).unwrap();
        assert_eq!(queued, serde_json::json!({ "status": "queued" }));

        let uploaded = serde_json::to_value(&UploadResult::Uploaded {
            url: "https://www.youtube.com/watch?v=abc".to_string(),
        })
        .unwrap();
        assert_eq!(uploaded["status"], "uploaded");
        assert_eq!(uploaded["url"], "https://www.youtube.com/watch?v=abc");

        let scheduled = serde_json::to_value(&UploadResult::Scheduled {
            scheduled_for: "2025-01-01T10:00".to_string(),
        })
        .unwrap();
        assert_eq!(scheduled["status"], "scheduled");
        assert_eq!(scheduled["scheduledFor"], "2025-01-01T10:00");
    }

    #[test]
    fn response_round_trips_identically() {
        let response = PipelineResponse {
            stages: STAGE_SPECS.iter().map(PipelineStage::idle).collect(),
            assets: Assets {
                video_url: Some("https://example.com/final.mp4".to_string()),
                voiceover_url: None,
                subtitles_url: Some("https://example.com/subs.vtt".to_string()),
                thumbnail_url: None,
            },
            seo: SeoMetadata {
                title: "Demo".to_string(),
                description: "A demo run".to_string(),
                tags: vec!["ai".to_string(), "video".to_string()],
            },
            upload: Some(UploadResult::Scheduled {
                scheduled_for: "2025-01-01T10:00".to_string(),
            }),
        };

        let json = serde_json::to_string(&response).unwrap();
        let back: PipelineResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, response);
    }

    #[test]
    fn response_uses_camel_case_asset_fields() {
        let assets = Assets {
            video_url: Some("v".to_string()),
            voiceover_url: Some("a".to_string()),
            subtitles_url: Some("s".to_string()),
            thumbnail_url: Some("t".to_string()),
        };
        let value = serde_json::to_value(&assets).unwrap();
        assert_eq!(value["videoUrl"], "v");
        assert_eq!(value["voiceoverUrl"], "a");
        assert_eq!(value["subtitlesUrl"], "s");
        assert_eq!(value["thumbnailUrl"], "t");
    }
}
