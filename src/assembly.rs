use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::process::Command;

const OUT_WIDTH: i32 = 1920;
const OUT_HEIGHT: i32 = 1080;

async fn run_cmd(args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Ok(());
    }

    let mut cmd = Command::new(&args[0]);
    if args.len() > 1 {
        cmd.args(&args[1..]);
    }

    let status = cmd.status().await.context("Command execution failed")?;
    if !status.success() {
        return Err(anyhow::anyhow!("Command failed: {:?}", args));
    }

    Ok(())
}

pub async fn ffprobe_duration_seconds(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .context("ffprobe duration failed")?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("ffprobe failed"));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let duration = text.parse::<f64>().unwrap_or(-1.0);
    if duration <= 0.1 {
        return Err(anyhow::anyhow!("Invalid duration"));
    }
    Ok(duration)
}

/// Write an ffmpeg concat demuxer list next to the clips it references.
pub fn write_concat_list(dir: &Path, clips: &[PathBuf]) -> Result<tempfile::NamedTempFile> {
    let mut body = String::new();
    for clip in clips {
        let name = clip
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("Clip path has no file name: {}", clip.display()))?;
        body.push_str(&format!("file '{}'\n", name));
    }

    let file = tempfile::Builder::new()
        .prefix("concat_")
        .suffix(".txt")
        .tempfile_in(dir)
        .context("Failed to create concat list")?;
    std::fs::write(file.path(), body).context("Failed to write concat list")?;
    Ok(file)
}

/// Concatenate storyboard clips into one normalized visual track.
pub async fn concat_clips(list_txt: &Path, out_mp4: &Path) -> Result<bool> {
    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list_txt.display().to_string(),
        "-vf".to_string(),
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:black,fps=30",
            w = OUT_WIDTH,
            h = OUT_HEIGHT
        ),
        "-an".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        out_mp4.display().to_string(),
    ];
    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}

fn audio_filter(has_music: bool) -> String {
    if has_music {
        "[1:a]volume=1.0[nar];[2:a]volume=0.12[bgm];[nar][bgm]amix=inputs=2:duration=first:dropout_transition=2[a]"
            .to_string()
    } else {
        "[1:a]volume=1.0[a]".to_string()
    }
}

fn subtitle_filter(subtitles: Option<&Path>) -> String {
    match subtitles {
        Some(path) => format!("[0:v]subtitles='{}'[v]", path.display()),
        None => "[0:v]null[v]".to_string(),
    }
}

/// Lay the narration (and optional music bed) over the visual track, burn
/// subtitles when present, and trim everything to the narration length.
pub async fn compose_final(
    visuals: &Path,
    voiceover: &Path,
    music: Option<&Path>,
    subtitles: Option<&Path>,
    duration_secs: f64,
    out_mp4: &Path,
) -> Result<bool> {
    let mut args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-stream_loop".to_string(),
        "-1".to_string(),
        "-i".to_string(),
        visuals.display().to_string(),
        "-i".to_string(),
        voiceover.display().to_string(),
    ];

    if let Some(bgm) = music {
        args.push("-i".to_string());
        args.push(bgm.display().to_string());
    }

    let filter = format!(
        "{};{}",
        subtitle_filter(subtitles),
        audio_filter(music.is_some())
    );

    args.extend([
        "-filter_complex".to_string(),
        filter,
        "-map".to_string(),
        "[v]".to_string(),
        "-map".to_string(),
        "[a]".to_string(),
        "-t".to_string(),
        format!("{:.3}", duration_secs),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "192k".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        out_mp4.display().to_string(),
    ]);

    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_list_references_file_names_only() {
        let dir = tempfile::tempdir().unwrap();
        let clips = vec![
            dir.path().join("scene_1.mp4"),
            dir.path().join("scene_2.mp4"),
        ];
        let list = write_concat_list(dir.path(), &clips).unwrap();
        let body = std::fs::read_to_string(list.path()).unwrap();
        assert_eq!(body, "file 'scene_1.mp4'\nfile 'scene_2.mp4'\n");
    }

    #[test]
    fn audio_filter_mixes_only_with_music() {
        assert!(audio_filter(true).contains("amix=inputs=2"));
        assert!(!audio_filter(false).contains("amix"));
    }

    #[test]
    fn subtitle_filter_burns_when_present() {
        let with = subtitle_filter(Some(Path::new("subs.vtt")));
        assert!(with.contains("subtitles='subs.vtt'"));
        assert_eq!(subtitle_filter(None), "[0:v]null[v]");
    }
}
