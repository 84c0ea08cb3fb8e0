use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct YoutubeCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// Process-wide configuration, read once at startup and passed explicitly
/// into the provider constructors. Missing credentials select the demo
/// adapter for that capability instead of failing.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub public_base_url: String,
    pub workspace_dir: PathBuf,
    pub music_dir: PathBuf,
    pub stage_timeout_secs: u64,
    pub openai_key: Option<String>,
    pub openai_model: String,
    pub elevenlabs_key: Option<String>,
    pub eleven_voice_id: String,
    pub eleven_model_id: String,
    pub pexels_key: Option<String>,
    pub beatoven_key: Option<String>,
    pub recraft_key: Option<String>,
    pub youtube: Option<YoutubeCredentials>,
}

fn default_voice_id() -> String {
    "21m00Tcm4TlvDq8ikWAM".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_public_base(bind_addr: &str) -> String {
    let host = bind_addr.replace("0.0.0.0", "localhost");
    format!("http://{}", host)
}

impl Config {
    pub fn from_env() -> Self {
        let bind_addr = env_opt("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let public_base_url = env_opt("PUBLIC_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| default_public_base(&bind_addr));

        let youtube = match (
            env_opt("YOUTUBE_CLIENT_ID"),
            env_opt("YOUTUBE_CLIENT_SECRET"),
            env_opt("YOUTUBE_REFRESH_TOKEN"),
        ) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => {
                Some(YoutubeCredentials {
                    client_id,
                    client_secret,
                    refresh_token,
                })
            }
            (None, None, None) => None,
            _ => {
                tracing::warn!(
                    "Incomplete YouTube OAuth configuration; upload will run in demo mode"
                );
                None
            }
        };

        Self {
            bind_addr,
            public_base_url,
            workspace_dir: env_opt("WORKSPACE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("var")),
            music_dir: env_opt("MUSIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("backgroundmusic")),
            stage_timeout_secs: env_opt("STAGE_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(45),
            openai_key: env_opt("OPENAI_API_KEY"),
            openai_model: env_opt("OPENAI_MODEL").unwrap_or_else(default_openai_model),
            elevenlabs_key: env_opt("ELEVENLABS_API_KEY"),
            eleven_voice_id: env_opt("ELEVEN_VOICE_ID").unwrap_or_else(default_voice_id),
            eleven_model_id: env_opt("ELEVEN_MODEL_ID").unwrap_or_else(default_model_id),
            pexels_key: env_opt("PEXELS_API_KEY"),
            beatoven_key: env_opt("BEATOVEN_API_KEY"),
            recraft_key: env_opt("RECRAFT_API_KEY"),
            youtube,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_base_replaces_wildcard_host() {
        assert_eq!(
            default_public_base("0.0.0.0:8080"),
            "http://localhost:8080"
        );
        assert_eq!(
            default_public_base("127.0.0.1:9000"),
            "http://127.0.0.1:9000"
        );
    }
}
