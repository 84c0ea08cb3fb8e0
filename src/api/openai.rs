use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::api::check_status;
use crate::artifact::{ScriptAnalysis, seo_from_json};
use crate::error::{ProviderError, ProviderResult};
use crate::model::SeoMetadata;
use crate::providers::{RunContext, ScriptAnalyzer, SeoGenerator};

const SERVICE: &str = "openai";
const RESPONSES_URL: &str = "https://api.openai.com/v1/responses";
const MAX_SCRIPT_CHARS: usize = 24_000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

fn trim_copy_utf8_safe(input: &str, max_bytes: usize) -> String {
    if input.len() <= max_bytes {
        return input.to_string();
    }

    let mut cut = max_bytes.min(input.len());
    while cut > 0 && !input.is_char_boundary(cut) {
        cut -= 1;
    }
    input[..cut].to_string()
}

fn extract_output_text(resp_json: &str) -> Option<String> {
    let root: serde_json::Value = serde_json::from_str(resp_json).ok()?;

    if let Some(err) = root.get("error") {
        if let Some(msg) = err.get("message").and_then(|v| v.as_str()) {
            tracing::warn!("OpenAI error message: {}", msg);
        }
        return None;
    }

    let output = root.get("output")?.as_array()?;
    for item in output {
        let Some(content) = item.get("content").and_then(|v| v.as_array()) else {
            continue;
        };
        for entry in content {
            let typ = entry.get("type").and_then(|v| v.as_str());
            let text = entry.get("text").and_then(|v| v.as_str());
            if typ == Some("output_text") {
                if let Some(text) = text {
                    return Some(text.to_string());
                }
            }
        }
    }

    None
}

pub struct OpenAiClient {
    client: Client,
    key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(client: Client, key: String, model: String) -> Self {
        Self { client, key, model }
    }

    async fn request_json(&self, system: &str, prompt: String) -> ProviderResult<String> {
        let body = json!({
            "model": self.model,
            "input": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt},
            ],
            "text": {"format": {"type": "json_object"}},
        });

        let resp = self
            .client
            .post(RESPONSES_URL)
            .bearer_auth(&self.key)
            .json(&body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(SERVICE, e))?;
        let resp = check_status(SERVICE, resp).await?;
        let raw = resp
            .text()
            .await
            .map_err(|e| ProviderError::from_reqwest(SERVICE, e))?;

        extract_output_text(&raw)
            .ok_or_else(|| ProviderError::malformed(SERVICE, "response carried no output_text"))
    }
}

#[async_trait]
impl ScriptAnalyzer for OpenAiClient {
    async fn analyze(&self, ctx: &RunContext) -> ProviderResult<ScriptAnalysis> {
        let script = trim_copy_utf8_safe(&ctx.script, MAX_SCRIPT_CHARS);
        let prompt = format!(
            "Project: {}\n\nSCRIPT:\n{}\n\nTASK:\n\
             - Describe the script's tone in one or two words.\n\
             - Quote or paraphrase its hook in one sentence.\n\
             - List 3-6 searchable topics.\n\
             - Break the script into 4-6 storyboard scenes. Each scene gets a stock-footage search query, a short caption, and a duration of 4-10 seconds.\n\
             - Return STRICT JSON with this shape ONLY:\n\
               {{\"tone\":\"...\",\"hook\":\"...\",\"topics\":[\"...\"],\"scenes\":[{{\"query\":\"...\",\"caption\":\"...\",\"seconds\":6}}]}}\n",
            ctx.project_name, script
        );

        let text = self
            .request_json(
                "You are a helpful assistant designed to output JSON.",
                prompt,
            )
            .await?;
        ScriptAnalysis::from_json(&text)
            .map_err(|e| ProviderError::malformed(SERVICE, e.to_string()))
    }
}

#[async_trait]
impl SeoGenerator for OpenAiClient {
    async fn generate(
        &self,
        ctx: &RunContext,
        analysis: &ScriptAnalysis,
    ) -> ProviderResult<SeoMetadata> {
        let script = trim_copy_utf8_safe(&ctx.script, MAX_SCRIPT_CHARS);
        let prompt = format!(
            "Project: {}\nTone: {}\nTopics: {}\n\nSCRIPT:\n{}\n\nTASK:\n\
             - Write an upload-ready YouTube title (under 90 characters), description (2-4 sentences), and 8-14 tags.\n\
             - Return STRICT JSON with this shape ONLY:\n\
               {{\"title\":\"...\",\"description\":\"...\",\"tags\":[\"...\"]}}\n",
            ctx.project_name,
            analysis.tone,
            analysis.topics.join(", "),
            script
        );

        let text = self
            .request_json(
                "You are a helpful assistant designed to output JSON.",
                prompt,
            )
            .await?;
        let seo =
            seo_from_json(&text).map_err(|e| ProviderError::malformed(SERVICE, e.to_string()))?;
        if seo.title.trim().is_empty() {
            return Err(ProviderError::malformed(SERVICE, "SEO title was empty"));
        }
        Ok(seo)
    }
}
