use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{ProviderError, ProviderResult};
use crate::model::{
    Assets, PipelineRequest, PipelineResponse, PipelineStage, STAGE_SPECS, SeoMetadata, StageKey,
    StageStatus, UploadResult,
};
use crate::providers::{AssemblyInput, Providers, RunContext};

/// Drives one request through the fixed stage order. Fail-fast: the first
/// failed stage ends the run and the response snapshots whatever was done,
/// with the remaining stages left idle.
pub struct PipelineRunner {
    providers: Providers,
    stage_timeout: Duration,
    workspace_root: PathBuf,
    public_base: String,
}

fn set_summary(stages: &mut [PipelineStage], key: StageKey, summary: String) {
    stages[key.position()].summary = Some(summary);
}

impl PipelineRunner {
    pub fn new(providers: Providers, cfg: &Config) -> Self {
        Self {
            providers,
            stage_timeout: Duration::from_secs(cfg.stage_timeout_secs),
            workspace_root: cfg.workspace_dir.clone(),
            public_base: cfg.public_base_url.clone(),
        }
    }

    async fn stage<T>(
        &self,
        stages: &mut [PipelineStage],
        key: StageKey,
        fut: impl Future<Output = ProviderResult<T>>,
    ) -> Option<T> {
        let idx = key.position();
        stages[idx].status = StageStatus::Running;
        info!(stage = key.as_str(), "stage started");

        let outcome = match tokio::time::timeout(self.stage_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                service: key.as_str(),
            }),
        };

        match outcome {
            Ok(value) => {
                stages[idx].status = StageStatus::Completed;
                info!(stage = key.as_str(), "stage completed");
                Some(value)
            }
            Err(err) => {
                warn!(stage = key.as_str(), "stage failed: {err}");
                stages[idx].status = StageStatus::Failed;
                stages[idx].summary = None;
                stages[idx].error = Some(err.to_string());
                None
            }
        }
    }

    pub async fn run(&self, req: &PipelineRequest) -> Result<PipelineResponse> {
        let ctx = RunContext::new(req, &self.workspace_root, &self.public_base);
        fs::create_dir_all(&ctx.workspace)
            .await
            .with_context(|| format!("failed to create run workspace {}", ctx.workspace.display()))?;
        info!(project = %ctx.project_name, slug = %ctx.slug, "pipeline run started");

        let mut stages: Vec<PipelineStage> = STAGE_SPECS.iter().map(PipelineStage::idle).collect();
        let mut assets = Assets::default();
        let mut seo = SeoMetadata::default();
        let mut upload = None;

        'run: {
            let Some(analysis) = self
                .stage(
                    &mut stages,
                    StageKey::ScriptAnalysis,
                    self.providers.analyzer.analyze(&ctx),
                )
                .await
            else {
                break 'run;
            };
            set_summary(&mut stages, StageKey::ScriptAnalysis, analysis.summary_line());

            let Some(voiceover) = self
                .stage(
                    &mut stages,
                    StageKey::Voiceover,
                    self.providers.voice.synthesize(&ctx),
                )
                .await
            else {
                break 'run;
            };
            set_summary(
                &mut stages,
                StageKey::Voiceover,
                format!(
                    "Narration rendered ({:.1}s) with voice {}.",
                    voiceover.duration_secs, voiceover.voice_id
                ),
            );
            assets.voiceover_url = Some(voiceover.url.clone());

            let Some(storyboard) = self
                .stage(
                    &mut stages,
                    StageKey::Visuals,
                    self.providers.visuals.plan(&ctx, &analysis),
                )
                .await
            else {
                break 'run;
            };
            set_summary(
                &mut stages,
                StageKey::Visuals,
                format!(
                    "{} clips matched to storyboard beats.",
                    storyboard.clips.len()
                ),
            );

            let Some(music) = self
                .stage(
                    &mut stages,
                    StageKey::Music,
                    self.providers.music.select(&ctx, &analysis),
                )
                .await
            else {
                break 'run;
            };
            set_summary(
                &mut stages,
                StageKey::Music,
                format!("Selected \"{}\" ({} mood).", music.title, music.mood),
            );

            let Some(subtitles) = self
                .stage(
                    &mut stages,
                    StageKey::SubtitleGeneration,
                    self.providers.captioner.caption(&ctx, &voiceover),
                )
                .await
            else {
                break 'run;
            };
            set_summary(
                &mut stages,
                StageKey::SubtitleGeneration,
                format!(
                    "{} cues generated ({}).",
                    subtitles.cue_count, subtitles.language
                ),
            );
            assets.subtitles_url = Some(subtitles.url.clone());

            let Some(thumbnail) = self
                .stage(
                    &mut stages,
                    StageKey::Thumbnail,
                    self.providers.thumbnail.render(&ctx, &analysis),
                )
                .await
            else {
                break 'run;
            };
            set_summary(
                &mut stages,
                StageKey::Thumbnail,
                "Thumbnail rendered at 1280x720.".to_string(),
            );
            assets.thumbnail_url = Some(thumbnail.url.clone());

            let Some(generated_seo) = self
                .stage(
                    &mut stages,
                    StageKey::Seo,
                    self.providers.seo.generate(&ctx, &analysis),
                )
                .await
            else {
                break 'run;
            };
            set_summary(
                &mut stages,
                StageKey::Seo,
                format!(
                    "Title, description, and {} tags prepared.",
                    generated_seo.tags.len()
                ),
            );
            seo = generated_seo;

            let assembly_input = AssemblyInput {
                voiceover: &voiceover,
                storyboard: &storyboard,
                music: &music,
                subtitles: &subtitles,
            };
            let Some(video) = self
                .stage(
                    &mut stages,
                    StageKey::Assembly,
                    self.providers.assembler.assemble(&ctx, &assembly_input),
                )
                .await
            else {
                break 'run;
            };
            set_summary(
                &mut stages,
                StageKey::Assembly,
                format!("Final cut assembled ({:.1}s).", video.duration_secs),
            );
            assets.video_url = Some(video.url.clone());

            if !req.auto_upload_enabled {
                // Artifacts are finalized but not published; the publisher is
                // never consulted.
                let queued = self
                    .stage(&mut stages, StageKey::Upload, async {
                        Ok::<_, ProviderError>(UploadResult::Queued)
                    })
                    .await;
                if queued.is_some() {
                    set_summary(
                        &mut stages,
                        StageKey::Upload,
                        "Upload queued - download and publish manually.".to_string(),
                    );
                    upload = Some(UploadResult::Queued);
                }
                break 'run;
            }

            let Some(result) = self
                .stage(
                    &mut stages,
                    StageKey::Upload,
                    self.providers.publisher.publish(
                        &ctx,
                        &video,
                        &seo,
                        req.schedule_at.as_deref(),
                    ),
                )
                .await
            else {
                break 'run;
            };
            let summary = match &result {
                UploadResult::Queued => "Upload queued - download and publish manually.".to_string(),
                UploadResult::Uploaded { url } => format!("Published to {}.", url),
                UploadResult::Scheduled { scheduled_for } => {
                    format!("Scheduled for {}.", scheduled_for)
                }
            };
            set_summary(&mut stages, StageKey::Upload, summary);
            upload = Some(result);
        }

        Ok(PipelineResponse {
            stages,
            assets,
            seo,
            upload,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::artifact::{ScriptAnalysis, VoiceoverArtifact};
    use crate::providers::{ScriptAnalyzer, SpeechSynthesizer};

    fn test_config(workspace: &Path) -> Config {
        Config {
            bind_addr: "127.0.0.1:0".to_string(),
            public_base_url: "http://localhost:8080".to_string(),
            workspace_dir: workspace.to_path_buf(),
            music_dir: workspace.join("music"),
            stage_timeout_secs: 5,
            openai_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            elevenlabs_key: None,
            eleven_voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            eleven_model_id: "eleven_multilingual_v2".to_string(),
            pexels_key: None,
            beatoven_key: None,
            recraft_key: None,
            youtube: None,
        }
    }

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

    #[tokio::test]
    async fn demo_run_completes_every_stage_and_queues_upload() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = PipelineRunner::new(Providers::demo(), &test_config(tmp.path()));

        let response = runner.run(&valid_request()).await.unwrap();

        assert_eq!(response.stages.len(), 9);
        for (stage, spec) in response.stages.iter().zip(STAGE_SPECS.iter()) {
            assert_eq!(stage.key, spec.key);
            assert_eq!(stage.status, StageStatus::Completed);
            assert!(stage.error.is_none());
        }
        assert!(!response.assets.video_url.clone().unwrap().is_empty());
        assert!(!response.seo.tags.is_empty());
        assert_eq!(response.upload, Some(UploadResult::Queued));
    }

    #[tokio::test]
    async fn schedule_without_auto_upload_still_queues() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = PipelineRunner::new(Providers::demo(), &test_config(tmp.path()));

        let mut req = valid_request();
        req.schedule_at = Some("2025-01-01T10:00".to_string());
        let response = runner.run(&req).await.unwrap();
        assert_eq!(response.upload, Some(UploadResult::Queued));
    }

    #[tokio::test]
    async fn auto_upload_publishes_immediately() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = PipelineRunner::new(Providers::demo(), &test_config(tmp.path()));

        let mut req = valid_request();
        req.auto_upload_enabled = true;
        let response = runner.run(&req).await.unwrap();

        match response.upload {
            Some(UploadResult::Uploaded { ref url }) => assert!(!url.is_empty()),
            other => panic!("expected uploaded result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn schedule_is_echoed_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = PipelineRunner::new(Providers::demo(), &test_config(tmp.path()));

        let mut req = valid_request();
        req.auto_upload_enabled = true;
        req.schedule_at = Some("2025-01-01T10:00".to_string());
        let response = runner.run(&req).await.unwrap();

        assert_eq!(
            response.upload,
            Some(UploadResult::Scheduled {
                scheduled_for: "2025-01-01T10:00".to_string()
            })
        );
    }

    struct FailingVoice;

    #[async_trait]
    impl SpeechSynthesizer for FailingVoice {
        async fn synthesize(&self, _ctx: &RunContext) -> ProviderResult<VoiceoverArtifact> {
            Err(ProviderError::malformed("elevenlabs", "synthetic failure"))
        }
    }

    #[tokio::test]
    async fn failed_stage_aborts_and_leaves_rest_idle() {
        let tmp = tempfile::tempdir().unwrap();
        let mut providers = Providers::demo();
        providers.voice = Arc::new(FailingVoice);
        let runner = PipelineRunner::new(providers, &test_config(tmp.path()));

        let response = runner.run(&valid_request()).await.unwrap();

        assert_eq!(response.stages[0].status, StageStatus::Completed);

        let failed = &response.stages[StageKey::Voiceover.position()];
        assert_eq!(failed.status, StageStatus::Failed);
        assert!(failed.error.as_deref().unwrap().contains("synthetic failure"));
        assert!(failed.summary.is_none());

        for stage in &response.stages[2..] {
            assert_eq!(stage.status, StageStatus::Idle);
        }
        assert!(response.assets.voiceover_url.is_none());
        assert!(response.upload.is_none());
        assert!(response.seo.title.is_empty());
    }

    struct SlowVoice;

    #[async_trait]
    impl SpeechSynthesizer for SlowVoice {
        async fn synthesize(&self, ctx: &RunContext) -> ProviderResult<VoiceoverArtifact> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(VoiceoverArtifact {
                url: "https://example.com/voiceover.mp3".to_string(),
                local_path: None,
                duration_secs: 10.0,
                voice_id: ctx.voice_profile.clone().unwrap_or_default(),
            })
        }
    }

    #[tokio::test]
    async fn stalled_provider_surfaces_as_stage_timeout() {
        let tmp = tempfile::tempdir().unwrap();
        let mut providers = Providers::demo();
        providers.voice = Arc::new(SlowVoice);
        let mut cfg = test_config(tmp.path());
        cfg.stage_timeout_secs = 1;
        let runner = PipelineRunner::new(providers, &cfg);

        let response = runner.run(&valid_request()).await.unwrap();

        let failed = &response.stages[StageKey::Voiceover.position()];
        assert_eq!(failed.status, StageStatus::Failed);
        assert!(failed.error.as_deref().unwrap().contains("timed out"));
    }

    struct CountingAnalyzer(Arc<AtomicUsize>);

    #[async_trait]
    impl ScriptAnalyzer for CountingAnalyzer {
        async fn analyze(&self, _ctx: &RunContext) -> ProviderResult<ScriptAnalysis> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(ScriptAnalysis {
                tone: "calm".to_string(),
                hook: "hook".to_string(),
                topics: vec![],
                scenes: vec![],
            })
        }
    }

    #[tokio::test]
    async fn every_run_invokes_the_analyzer_exactly_once() {
        let tmp = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut providers = Providers::demo();
        providers.analyzer = Arc::new(CountingAnalyzer(calls.clone()));
        let runner = PipelineRunner::new(providers, &test_config(tmp.path()));

        runner.run(&valid_request()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
