//! Placeholder adapters used whenever a provider credential is missing.
//! They satisfy the same contracts as the live clients but return static
//! assets and never fail, so the whole pipeline stays exercisable without
//! any configuration.

use async_trait::async_trait;

use crate::artifact::{
    MusicTrack, SceneBeat, ScriptAnalysis, StoryboardClip, StoryboardPlan, SubtitleTrack,
    ThumbnailArtifact, VideoArtifact, VoiceoverArtifact,
};
use crate::error::ProviderResult;
use crate::model::{SeoMetadata, UploadResult};
use crate::providers::{
    AssemblyInput, Captioner, MusicSelector, RunContext, ScriptAnalyzer, SeoGenerator,
    SpeechSynthesizer, ThumbnailRenderer, VideoAssembler, VideoPublisher, VisualPlanner,
};
use crate::subtitle;

const SAMPLE_VOICEOVER: &str = "https://samplelib.com/lib/preview/mp3/sample-15s.mp3";
const SAMPLE_VOICEOVER_SECS: f64 = 15.0;
const SAMPLE_MUSIC: &str = "https://samplelib.com/lib/preview/mp3/sample-30s.mp3";
const SAMPLE_CAPTIONS: &str = "https://cdn.demo.aipipeline.dev/captions/sample.en.vtt";
const SAMPLE_VIDEO: &str =
    "https://storage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4";

const SAMPLE_FOOTAGE: [(&str, &str); 4] = [
    (
        "studio opening shot",
        "https://storage.googleapis.com/gtv-videos-bucket/sample/ForBiggerBlazes.mp4",
    ),
    (
        "technology b-roll",
        "https://storage.googleapis.com/gtv-videos-bucket/sample/ForBiggerEscapes.mp4",
    ),
    (
        "city timelapse",
        "https://storage.googleapis.com/gtv-videos-bucket/sample/ForBiggerFun.mp4",
    ),
    (
        "closing montage",
        "https://storage.googleapis.com/gtv-videos-bucket/sample/ForBiggerJoyrides.mp4",
    ),
];

fn first_sentence(script: &str) -> String {
    subtitle::split_sentences(script)
        .into_iter()
        .next()
        .unwrap_or_else(|| script.chars().take(80).collect())
}

pub struct DemoAnalyzer;

#[async_trait]
impl ScriptAnalyzer for DemoAnalyzer {
    async fn analyze(&self, ctx: &RunContext) -> ProviderResult<ScriptAnalysis> {
        let topics: Vec<String> = ctx
            .project_name
            .split_whitespace()
            .take(3)
            .map(|w| w.to_lowercase())
            .chain(["automation".to_string()])
            .collect();

        let scenes = SAMPLE_FOOTAGE
            .iter()
            .map(|(query, _)| SceneBeat {
                query: query.to_string(),
                caption: String::new(),
                seconds: 6.0,
            })
            .collect();

        Ok(ScriptAnalysis {
            tone: "confident".to_string(),
            hook: first_sentence(&ctx.script),
            topics,
            scenes,
        })
    }
}

pub struct DemoVoice;

#[async_trait]
impl SpeechSynthesizer for DemoVoice {
    async fn synthesize(&self, ctx: &RunContext) -> ProviderResult<VoiceoverArtifact> {
        Ok(VoiceoverArtifact {
            url: SAMPLE_VOICEOVER.to_string(),
            local_path: None,
            duration_secs: SAMPLE_VOICEOVER_SECS,
            voice_id: ctx
                .voice_profile
                .clone()
                .unwrap_or_else(|| "demo-narrator".to_string()),
        })
    }
}

pub struct DemoVisuals;

#[async_trait]
impl VisualPlanner for DemoVisuals {
    async fn plan(
        &self,
        _ctx: &RunContext,
        analysis: &ScriptAnalysis,
    ) -> ProviderResult<StoryboardPlan> {
        // Reuse the analysis beats where available so the storyboard reads
        // like it came from the script.
        let clips = SAMPLE_FOOTAGE
            .iter()
            .enumerate()
            .map(|(idx, (fallback_query, url))| StoryboardClip {
                query: analysis
                    .scenes
                    .get(idx)
                    .map(|beat| beat.query.clone())
                    .unwrap_or_else(|| fallback_query.to_string()),
                source_url: url.to_string(),
                seconds: analysis.scenes.get(idx).map(|b| b.seconds).unwrap_or(6.0),
            })
            .collect();

        Ok(StoryboardPlan { clips })
    }
}

pub struct DemoMusic;

#[async_trait]
impl MusicSelector for DemoMusic {
    async fn select(
        &self,
        _ctx: &RunContext,
        analysis: &ScriptAnalysis,
    ) -> ProviderResult<MusicTrack> {
        Ok(MusicTrack {
            title: "Inspire (Demo Bed)".to_string(),
            mood: analysis.tone.clone(),
            url: SAMPLE_MUSIC.to_string(),
            local_path: None,
        })
    }
}

pub struct DemoCaptioner;

#[async_trait]
impl Captioner for DemoCaptioner {
    async fn caption(
        &self,
        ctx: &RunContext,
        voiceover: &VoiceoverArtifact,
    ) -> ProviderResult<SubtitleTrack> {
        let language = ctx.language.clone().unwrap_or_else(|| "en-US".to_string());
        let (_, cue_count) =
            subtitle::build_webvtt(&ctx.script, voiceover.duration_secs, Some(&language));
        Ok(SubtitleTrack {
            url: SAMPLE_CAPTIONS.to_string(),
            local_path: None,
            cue_count,
            language,
        })
    }
}

pub struct DemoThumbnail;

#[async_trait]
impl ThumbnailRenderer for DemoThumbnail {
    async fn render(
        &self,
        ctx: &RunContext,
        analysis: &ScriptAnalysis,
    ) -> ProviderResult<ThumbnailArtifact> {
        Ok(ThumbnailArtifact {
            url: format!("https://picsum.photos/seed/{}/1280/720", ctx.slug),
            prompt: format!(
                "High-contrast YouTube thumbnail for \"{}\": {}",
                ctx.project_name, analysis.hook
            ),
        })
    }
}

pub struct DemoSeo;

#[async_trait]
impl SeoGenerator for DemoSeo {
    async fn generate(
        &self,
        ctx: &RunContext,
        analysis: &ScriptAnalysis,
    ) -> ProviderResult<SeoMetadata> {
        let mut tags = analysis.topics.clone();
        for staple in ["ai video", "automation", "tutorial"] {
            if !tags.iter().any(|t| t == staple) {
                tags.push(staple.to_string());
            }
        }

        Ok(SeoMetadata {
            title: format!("{}: From Script to Published Video", ctx.project_name),
            description: format!(
                "{} Generated end-to-end by the automation pipeline: voiceover, storyboard, music, subtitles, and upload-ready metadata.",
                analysis.hook
            ),
            tags,
        })
    }
}

pub struct DemoAssembler;

#[async_trait]
impl VideoAssembler for DemoAssembler {
    async fn assemble(
        &self,
        _ctx: &RunContext,
        input: &AssemblyInput<'_>,
    ) -> ProviderResult<VideoArtifact> {
        Ok(VideoArtifact {
            url: SAMPLE_VIDEO.to_string(),
            local_path: None,
            duration_secs: input.voiceover.duration_secs,
        })
    }
}

pub struct DemoPublisher;

fn demo_video_id(slug: &str) -> String {
    slug.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .chain(std::iter::repeat('x'))
        .take(11)
        .collect()
}

#[async_trait]
impl VideoPublisher for DemoPublisher {
    async fn publish(
        &self,
        ctx: &RunContext,
        _video: &VideoArtifact,
        _seo: &SeoMetadata,
        schedule_at: Option<&str>,
    ) -> ProviderResult<UploadResult> {
        Ok(match schedule_at {
            Some(ts) => UploadResult::Scheduled {
                scheduled_for: ts.to_string(),
            },
            None => UploadResult::Uploaded {
                url: format!("https://www.youtube.com/watch?v={}", demo_video_id(&ctx.slug)),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_video_id_is_eleven_chars() {
        assert_eq!(demo_video_id("demo-project-20250101").len(), 11);
        assert_eq!(demo_video_id("ab").len(), 11);
        assert!(demo_video_id("ab").ends_with("xxx"));
    }
}
