pub mod demo;
pub mod local;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::api::{
    beatoven::BeatovenClient, elevenlabs::ElevenLabsClient, openai::OpenAiClient,
    pexels::PexelsClient, recraft::RecraftClient, youtube::YoutubeClient,
};
use crate::artifact::{
    MusicTrack, ScriptAnalysis, StoryboardPlan, SubtitleTrack, ThumbnailArtifact, VideoArtifact,
    VoiceoverArtifact,
};
use crate::config::Config;
use crate::error::ProviderResult;
use crate::model::{PipelineRequest, SeoMetadata, UploadResult};

/// Per-run input shared by every adapter: the validated request fields plus
/// the run's workspace location and public URL prefix.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub project_name: String,
    pub script: String,
    pub voice_profile: Option<String>,
    pub language: Option<String>,
    pub slug: String,
    pub workspace: PathBuf,
    pub public_base: String,
}

pub fn slugify(name: &str) -> String {
    let mut out = String::new();
    let mut last_dash = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("project");
    }
    out
}

impl RunContext {
    pub fn new(req: &PipelineRequest, workspace_root: &Path, public_base: &str) -> Self {
        let slug = format!(
            "{}-{}",
            slugify(&req.project_name),
            Utc::now().format("%Y%m%d%H%M%S")
        );
        Self {
            project_name: req.project_name.trim().to_string(),
            script: req.script.trim().to_string(),
            voice_profile: req.voice_profile.clone(),
            language: req.target_language.clone(),
            slug: slug.clone(),
            workspace: workspace_root.join(slug),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.workspace.join(name)
    }

    pub fn file_url(&self, name: &str) -> String {
        format!("{}/files/{}/{}", self.public_base, self.slug, name)
    }
}

#[async_trait]
pub trait ScriptAnalyzer: Send + Sync {
    async fn analyze(&self, ctx: &RunContext) -> ProviderResult<ScriptAnalysis>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, ctx: &RunContext) -> ProviderResult<VoiceoverArtifact>;
}

#[async_trait]
pub trait VisualPlanner: Send + Sync {
    async fn plan(
        &self,
        ctx: &RunContext,
        analysis: &ScriptAnalysis,
    ) -> ProviderResult<StoryboardPlan>;
}

#[async_trait]
pub trait MusicSelector: Send + Sync {
    async fn select(
        &self,
        ctx: &RunContext,
        analysis: &ScriptAnalysis,
    ) -> ProviderResult<MusicTrack>;
}

#[async_trait]
pub trait Captioner: Send + Sync {
    async fn caption(
        &self,
        ctx: &RunContext,
        voiceover: &VoiceoverArtifact,
    ) -> ProviderResult<SubtitleTrack>;
}

#[async_trait]
pub trait ThumbnailRenderer: Send + Sync {
    async fn render(
        &self,
        ctx: &RunContext,
        analysis: &ScriptAnalysis,
    ) -> ProviderResult<ThumbnailArtifact>;
}

#[async_trait]
pub trait SeoGenerator: Send + Sync {
    async fn generate(
        &self,
        ctx: &RunContext,
        analysis: &ScriptAnalysis,
    ) -> ProviderResult<SeoMetadata>;
}

pub struct AssemblyInput<'a> {
    pub voiceover: &'a VoiceoverArtifact,
    pub storyboard: &'a StoryboardPlan,
    pub music: &'a MusicTrack,
    pub subtitles: &'a SubtitleTrack,
}

#[async_trait]
pub trait VideoAssembler: Send + Sync {
    async fn assemble(
        &self,
        ctx: &RunContext,
        input: &AssemblyInput<'_>,
    ) -> ProviderResult<VideoArtifact>;
}

#[async_trait]
pub trait VideoPublisher: Send + Sync {
    async fn publish(
        &self,
        ctx: &RunContext,
        video: &VideoArtifact,
        seo: &SeoMetadata,
        schedule_at: Option<&str>,
    ) -> ProviderResult<UploadResult>;
}

/// The full adapter bundle the orchestrator runs against. Each capability is
/// independently live or demo depending on configuration.
#[derive(Clone)]
pub struct Providers {
    pub analyzer: Arc<dyn ScriptAnalyzer>,
    pub voice: Arc<dyn SpeechSynthesizer>,
    pub visuals: Arc<dyn VisualPlanner>,
    pub music: Arc<dyn MusicSelector>,
    pub captioner: Arc<dyn Captioner>,
    pub thumbnail: Arc<dyn ThumbnailRenderer>,
    pub seo: Arc<dyn SeoGenerator>,
    pub assembler: Arc<dyn VideoAssembler>,
    pub publisher: Arc<dyn VideoPublisher>,
}

impl Providers {
    pub fn from_config(cfg: &Config, client: reqwest::Client, ffmpeg_available: bool) -> Self {
        let (analyzer, seo): (Arc<dyn ScriptAnalyzer>, Arc<dyn SeoGenerator>) =
            match &cfg.openai_key {
                Some(key) => {
                    let openai = Arc::new(OpenAiClient::new(
                        client.clone(),
                        key.clone(),
                        cfg.openai_model.clone(),
                    ));
                    let analyzer: Arc<dyn ScriptAnalyzer> = openai.clone();
                    let seo: Arc<dyn SeoGenerator> = openai;
                    (analyzer, seo)
                }
                None => {
                    tracing::info!("OPENAI_API_KEY not set; using demo analysis and SEO");
                    (Arc::new(demo::DemoAnalyzer), Arc::new(demo::DemoSeo))
                }
            };

        let voice: Arc<dyn SpeechSynthesizer> = match &cfg.elevenlabs_key {
            Some(key) => Arc::new(ElevenLabsClient::new(
                client.clone(),
                key.clone(),
                cfg.eleven_voice_id.clone(),
                cfg.eleven_model_id.clone(),
            )),
            None => {
                tracing::info!("ELEVENLABS_API_KEY not set; using demo voiceover");
                Arc::new(demo::DemoVoice)
            }
        };

        let visuals: Arc<dyn VisualPlanner> = match &cfg.pexels_key {
            Some(key) => Arc::new(PexelsClient::new(client.clone(), key.clone())),
            None => {
                tracing::info!("PEXELS_API_KEY not set; using demo storyboard footage");
                Arc::new(demo::DemoVisuals)
            }
        };

        let music: Arc<dyn MusicSelector> = match &cfg.beatoven_key {
            Some(key) => Arc::new(BeatovenClient::new(client.clone(), key.clone())),
            None if local::LocalMusicLibrary::has_audio(&cfg.music_dir) => {
                tracing::info!(
                    "BEATOVEN_API_KEY not set; picking music beds from {}",
                    cfg.music_dir.display()
                );
                Arc::new(local::LocalMusicLibrary::new(cfg.music_dir.clone()))
            }
            None => {
                tracing::info!("No music source configured; using demo soundtrack");
                Arc::new(demo::DemoMusic)
            }
        };

        // Captioning needs no credentials; it always runs against the local
        // cue generator.
        let captioner: Arc<dyn Captioner> = Arc::new(local::LocalCaptioner);

        let thumbnail: Arc<dyn ThumbnailRenderer> = match &cfg.recraft_key {
            Some(key) => Arc::new(RecraftClient::new(client.clone(), key.clone())),
            None => {
                tracing::info!("RECRAFT_API_KEY not set; using demo thumbnail");
                Arc::new(demo::DemoThumbnail)
            }
        };

        // Real assembly needs ffmpeg plus real media to cut; anything less
        // falls back to the demo deliverable.
        let media_live = cfg.elevenlabs_key.is_some() && cfg.pexels_key.is_some();
        let assembler: Arc<dyn VideoAssembler> = if ffmpeg_available && media_live {
            Arc::new(local::FfmpegAssembler::new(client.clone()))
        } else {
            if ffmpeg_available {
                tracing::info!("Voiceover or visuals in demo mode; assembly uses demo output");
            } else {
                tracing::info!("ffmpeg unavailable; assembly uses demo output");
            }
            Arc::new(demo::DemoAssembler)
        };

        let publisher: Arc<dyn VideoPublisher> = match &cfg.youtube {
            Some(creds) => Arc::new(YoutubeClient::new(client.clone(), creds.clone())),
            None => {
                tracing::info!("YouTube OAuth not configured; using demo publisher");
                Arc::new(demo::DemoPublisher)
            }
        };

        Self {
            analyzer,
            voice,
            visuals,
            music,
            captioner,
            thumbnail,
            seo,
            assembler,
            publisher,
        }
    }

    /// All-demo bundle: static placeholder assets, no credentials, no I/O.
    pub fn demo() -> Self {
        Self {
            analyzer: Arc::new(demo::DemoAnalyzer),
            voice: Arc::new(demo::DemoVoice),
            visuals: Arc::new(demo::DemoVisuals),
            music: Arc::new(demo::DemoMusic),
            captioner: Arc::new(demo::DemoCaptioner),
            thumbnail: Arc::new(demo::DemoThumbnail),
            seo: Arc::new(demo::DemoSeo),
            assembler: Arc::new(demo::DemoAssembler),
            publisher: Arc::new(demo::DemoPublisher),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_normalizes_names() {
        assert_eq!(slugify("Demo Project"), "demo-project");
        assert_eq!(slugify("  AI Tube: Episode #1!  "), "ai-tube-episode-1");
        assert_eq!(slugify("***"), "project");
    }

    #[test]
    fn run_context_builds_scoped_urls() {
        let req = PipelineRequest {
            script: "x".repeat(25),
            project_name: "Demo Project".to_string(),
            voice_profile: None,
            target_language: None,
            auto_upload_enabled: false,
            schedule_at: None,
        };
        let ctx = RunContext::new(&req, Path::new("/tmp/ws"), "http://localhost:8080/");
        assert!(ctx.slug.starts_with("demo-project-"));
        let url = ctx.file_url("voiceover.mp3");
        assert!(url.starts_with("http://localhost:8080/files/demo-project-"));
        assert!(url.ends_with("/voiceover.mp3"));
        assert!(ctx.file_path("final.mp4").starts_with("/tmp/ws"));
    }
}
