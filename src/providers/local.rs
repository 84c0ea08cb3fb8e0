//! Credential-less live adapters: music beds from a local library, subtitle
//! generation, and ffmpeg-based assembly.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use tokio::fs;
use walkdir::WalkDir;

use crate::api::check_status;
use crate::artifact::{MusicTrack, ScriptAnalysis, SubtitleTrack, VideoArtifact, VoiceoverArtifact};
use crate::assembly;
use crate::error::{ProviderError, ProviderResult};
use crate::providers::{AssemblyInput, Captioner, MusicSelector, RunContext, VideoAssembler};
use crate::subtitle;

const AUDIO_EXTENSIONS: [&str; 3] = ["mp3", "m4a", "wav"];
const MAX_STORYBOARD_CLIPS: usize = 6;

fn now_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn audio_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|ext| {
                    AUDIO_EXTENSIONS
                        .iter()
                        .any(|known| known.eq_ignore_ascii_case(ext))
                })
                .unwrap_or(false)
        })
        .collect()
}

/// Picks a background bed from a directory of audio files, the way a human
/// operator would drop tracks into `backgroundmusic/`.
pub struct LocalMusicLibrary {
    dir: PathBuf,
}

impl LocalMusicLibrary {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn has_audio(dir: &Path) -> bool {
        !audio_files(dir).is_empty()
    }
}

const MUSIC_SERVICE: &str = "music-library";

#[async_trait]
impl MusicSelector for LocalMusicLibrary {
    async fn select(
        &self,
        ctx: &RunContext,
        analysis: &ScriptAnalysis,
    ) -> ProviderResult<MusicTrack> {
        let songs = audio_files(&self.dir);
        if songs.is_empty() {
            return Err(ProviderError::malformed(
                MUSIC_SERVICE,
                format!("no audio files under {}", self.dir.display()),
            ));
        }

        let mut rng = rand::rngs::StdRng::seed_from_u64(now_seed());
        let song = &songs[rng.gen_range(0..songs.len())];

        let ext = song
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp3")
            .to_ascii_lowercase();
        let file_name = format!("music_bed.{}", ext);
        let dest = ctx.file_path(&file_name);

        fs::create_dir_all(&ctx.workspace)
            .await
            .map_err(|e| ProviderError::io(MUSIC_SERVICE, e))?;
        fs::copy(song, &dest)
            .await
            .map_err(|e| ProviderError::io(MUSIC_SERVICE, e))?;

        let title = song
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled")
            .to_string();

        Ok(MusicTrack {
            title,
            mood: analysis.tone.clone(),
            url: ctx.file_url(&file_name),
            local_path: Some(dest),
        })
    }
}

/// Generates a WebVTT track from the script, timed against the synthesized
/// narration. Needs no provider credentials.
pub struct LocalCaptioner;

const CAPTION_SERVICE: &str = "captioner";

#[async_trait]
impl Captioner for LocalCaptioner {
    async fn caption(
        &self,
        ctx: &RunContext,
        voiceover: &VoiceoverArtifact,
    ) -> ProviderResult<SubtitleTrack> {
        let language = ctx.language.clone().unwrap_or_else(|| "en-US".to_string());
        let (doc, cue_count) =
            subtitle::build_webvtt(&ctx.script, voiceover.duration_secs, Some(&language));

        fs::create_dir_all(&ctx.workspace)
            .await
            .map_err(|e| ProviderError::io(CAPTION_SERVICE, e))?;
        let dest = ctx.file_path("subtitles.vtt");
        fs::write(&dest, doc)
            .await
            .map_err(|e| ProviderError::io(CAPTION_SERVICE, e))?;

        Ok(SubtitleTrack {
            url: ctx.file_url("subtitles.vtt"),
            local_path: Some(dest),
            cue_count,
            language,
        })
    }
}

/// Cuts the final deliverable with ffmpeg: storyboard footage looped under
/// the narration, music bed mixed low, subtitles burned in.
pub struct FfmpegAssembler {
    client: reqwest::Client,
}

const ASSEMBLY_SERVICE: &str = "assembly";

impl FfmpegAssembler {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn download(&self, url: &str, dest: &Path) -> ProviderResult<()> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(ASSEMBLY_SERVICE, e))?;
        let resp = check_status(ASSEMBLY_SERVICE, resp).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ProviderError::from_reqwest(ASSEMBLY_SERVICE, e))?;
        fs::write(dest, &bytes)
            .await
            .map_err(|e| ProviderError::io(ASSEMBLY_SERVICE, e))?;
        Ok(())
    }

    async fn ensure_local(
        &self,
        remote_url: &str,
        local: Option<&Path>,
        fallback_name: &str,
        ctx: &RunContext,
    ) -> ProviderResult<PathBuf> {
        if let Some(path) = local {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
        }
        let dest = ctx.file_path(fallback_name);
        self.download(remote_url, &dest).await?;
        Ok(dest)
    }
}

#[async_trait]
impl VideoAssembler for FfmpegAssembler {
    async fn assemble(
        &self,
        ctx: &RunContext,
        input: &AssemblyInput<'_>,
    ) -> ProviderResult<VideoArtifact> {
        let clips_dir = ctx.file_path("clips");
        fs::create_dir_all(&clips_dir)
            .await
            .map_err(|e| ProviderError::io(ASSEMBLY_SERVICE, e))?;

        let voiceover = self
            .ensure_local(
                &input.voiceover.url,
                input.voiceover.local_path.as_deref(),
                "voiceover.mp3",
                ctx,
            )
            .await?;

        let mut downloaded = Vec::new();
        for (idx, clip) in input
            .storyboard
            .clips
            .iter()
            .take(MAX_STORYBOARD_CLIPS)
            .enumerate()
        {
            let dest = clips_dir.join(format!("scene_{}.mp4", idx + 1));
            match self.download(&clip.source_url, &dest).await {
                Ok(()) => downloaded.push(dest),
                Err(err) => {
                    tracing::warn!(query = %clip.query, "skipping storyboard clip: {err}");
                }
            }
        }
        if downloaded.is_empty() {
            return Err(ProviderError::malformed(
                ASSEMBLY_SERVICE,
                "storyboard produced no usable clips",
            ));
        }

        let list = assembly::write_concat_list(&clips_dir, &downloaded)
            .map_err(|e| ProviderError::io(ASSEMBLY_SERVICE, std::io::Error::other(e)))?;
        let visuals = ctx.file_path("visuals.mp4");
        let ok = assembly::concat_clips(list.path(), &visuals)
            .await
            .map_err(|e| ProviderError::io(ASSEMBLY_SERVICE, std::io::Error::other(e)))?;
        if !ok {
            return Err(ProviderError::malformed(
                ASSEMBLY_SERVICE,
                "ffmpeg failed to concatenate storyboard clips",
            ));
        }

        // A missing music bed downgrades to narration-only rather than
        // failing the whole cut.
        let music = match self
            .ensure_local(
                &input.music.url,
                input.music.local_path.as_deref(),
                "music_bed.mp3",
                ctx,
            )
            .await
        {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!("music bed unavailable, mixing narration only: {err}");
                None
            }
        };

        let subtitles = input
            .subtitles
            .local_path
            .as_deref()
            .filter(|p| p.exists())
            .map(Path::to_path_buf);

        let out = ctx.file_path("final.mp4");
        let ok = assembly::compose_final(
            &visuals,
            &voiceover,
            music.as_deref(),
            subtitles.as_deref(),
            input.voiceover.duration_secs,
            &out,
        )
        .await
        .map_err(|e| ProviderError::io(ASSEMBLY_SERVICE, std::io::Error::other(e)))?;
        if !ok {
            return Err(ProviderError::malformed(
                ASSEMBLY_SERVICE,
                "ffmpeg failed to compose the final cut",
            ));
        }

        let duration_secs = assembly::ffprobe_duration_seconds(&out)
            .await
            .unwrap_or(input.voiceover.duration_secs);

        Ok(VideoArtifact {
            url: ctx.file_url("final.mp4"),
            local_path: Some(out),
            duration_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_scan_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bed.mp3"), b"x").unwrap();
        std::fs::write(dir.path().join("README.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("loop.WAV"), b"x").unwrap();

        let files = audio_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(LocalMusicLibrary::has_audio(dir.path()));
    }

    #[test]
    fn missing_library_has_no_audio() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!LocalMusicLibrary::has_audio(&dir.path().join("nope")));
    }
}
