use crate::config::Config;
use crate::events::{Message, Source};
use crate::prompts::{self, NOT_FOUND};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Decoded provider reply for one turn
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<Source>,
}

/// The only error callers of an [`AnswerService`] ever see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("서비스 연결에 실패했습니다. 잠시 후 다시 시도해주세요.")]
pub struct ServiceUnavailable;

/// Answers one utterance given everything said before it.
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn answer(&self, history: &[Message], utterance: &str) -> Result<Answer, ServiceUnavailable>;
}

// --- Wire format (generateContent) ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub system_instruction: SystemInstruction,
    pub tools: Vec<Tool>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Default)]
pub struct Tool {
    pub google_search: GoogleSearch,
}

#[derive(Debug, Serialize, Default)]
pub struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: u32,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ResponsePart {
    pub text: Option<String>,
    #[serde(default)]
    pub thought: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize, Default)]
pub struct GroundingChunk {
    pub web: Option<WebChunk>,
}

#[derive(Debug, Deserialize, Default)]
pub struct WebChunk {
    pub title: Option<String>,
    pub uri: Option<String>,
}

/// Build the request for one turn: the prior messages verbatim, then the
/// wrapped question as the final user turn. Both the system instruction and
/// the wrapper name `site_url`.
pub fn build_request(site_url: &str, history: &[Message], utterance: &str) -> GenerateContentRequest {
    let mut contents: Vec<Content> = history
        .iter()
        .map(|msg| Content {
            role: msg.role.as_ref().to_string(),
            parts: vec![Part { text: msg.text.clone() }],
        })
        .collect();

    contents.push(Content {
        role: "user".to_string(),
        parts: vec![Part {
            text: prompts::wrap_question(site_url, utterance),
        }],
    });

    GenerateContentRequest {
        contents,
        system_instruction: SystemInstruction {
            parts: vec![Part {
                text: prompts::system_instruction(site_url),
            }],
        },
        tools: vec![Tool::default()],
        generation_config: GenerationConfig {
            thinking_config: ThinkingConfig { thinking_budget: 0 },
        },
    }
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, or `None` when there are none.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts
            .iter()
            .filter(|part| !part.thought)
            .filter_map(|part| part.text.as_deref())
            .collect();

        if text.trim().is_empty() { None } else { Some(text) }
    }

    /// Web citations of the first candidate. Chunks without a web reference
    /// are skipped.
    pub fn sources(&self) -> Vec<Source> {
        let Some(metadata) = self.candidates.first().and_then(|c| c.grounding_metadata.as_ref()) else {
            return Vec::new();
        };

        metadata
            .grounding_chunks
            .iter()
            .filter_map(|chunk| chunk.web.as_ref())
            .filter_map(|web| {
                let uri = web.uri.clone()?;
                let title = web.title.clone().unwrap_or_else(|| uri.clone());
                Some(Source { title, uri })
            })
            .collect()
    }

    pub fn into_answer(self) -> Answer {
        Answer {
            text: self.text().unwrap_or_else(|| NOT_FOUND.to_string()),
            sources: self.sources(),
        }
    }
}

/// Gemini client restricted to the configured site
#[derive(Clone)]
pub struct GeminiClient {
    config: Config,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn generate(&self, history: &[Message], utterance: &str) -> Result<Answer> {
        let api_key = self
            .config
            .get_api_key()
            .with_context(|| format!("No API key configured (set {} or api_key in config.toml)", self.config.api_key_env))?;

        let payload = build_request(&self.config.site_url, history, utterance);
        log::info!(
            "Sending generateContent request: model={} turns={}",
            self.config.model,
            payload.contents.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&payload)
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Gemini API error ({}): {}", status, error_text));
        }

        let body = response.text().await.context("Failed to read Gemini response body")?;
        let decoded: GenerateContentResponse =
            serde_json::from_str(&body).context("Failed to parse Gemini response")?;
        let answer = decoded.into_answer();
        log::debug!("Gemini answered with {} source(s)", answer.sources.len());

        Ok(answer)
    }
}

#[async_trait]
impl AnswerService for GeminiClient {
    async fn answer(&self, history: &[Message], utterance: &str) -> Result<Answer, ServiceUnavailable> {
        self.generate(history, utterance).await.map_err(|e| {
            log::error!("Gemini API Error: {:#}", e);
            ServiceUnavailable
        })
    }
}
