use crate::models::ExtractedData;
use serde::Deserialize;
use serde_json::json;
use std::env;
use tracing::warn;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Extracts structured insights (emotions, wins, struggles, energy level)
/// from journal text via a chat-completions endpoint. Without an API key, or
/// on any failure, entries fall back to a neutral result so journaling never
/// blocks on the analysis step.
#[derive(Clone)]
pub struct Analyzer {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl Analyzer {
    pub fn from_env() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: env::var("OPENAI_API_KEY").ok().filter(|key| !key.is_empty()),
            endpoint: env::var("ANALYSIS_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            model: env::var("ANALYSIS_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        }
    }

    pub async fn extract(&self, content: &str) -> ExtractedData {
        let Some(api_key) = self.api_key.as_deref() else {
            return fallback(None);
        };

        match self.request_extraction(api_key, content).await {
            Ok(data) => data,
            Err(err) => {
                warn!("journal analysis failed: {err}");
                fallback(Some(err))
            }
        }
    }

    async fn request_extraction(&self, api_key: &str, content: &str) -> Result<ExtractedData, String> {
        let body = json!({
            "model": self.model,
            "temperature": 0.3,
            "messages": [
                {
                    "role": "system",
                    "content": "Extract structured insights from journal entries. Return only valid JSON."
                },
                {
                    "role": "user",
                    "content": format!(
                        "Extract from this journal entry:\n\
                         - emotions: array of emotions (happy, anxious, motivated, tired, etc)\n\
                         - wins: array of positive things mentioned\n\
                         - struggles: array of challenges mentioned\n\
                         - energy_level: one of \"low\", \"medium\", \"high\"\n\n\
                         Journal entry: {content}\n\nReturn JSON only."
                    )
                }
            ]
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| err.to_string())?;

        if !response.status().is_success() {
            return Err(format!("analysis endpoint returned {}", response.status()));
        }

        let chat: ChatResponse = response.json().await.map_err(|err| err.to_string())?;
        let reply = chat
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or_else(|| "analysis reply had no choices".to_string())?;

        parse_extraction(reply).map_err(|err| err.to_string())
    }
}

/// Parses the model reply, tolerating a markdown code fence around the JSON.
pub fn parse_extraction(raw: &str) -> Result<ExtractedData, serde_json::Error> {
    let mut text = raw.trim();
    if let Some(stripped) = text.strip_prefix("```") {
        let inner = stripped.strip_prefix("json").unwrap_or(stripped);
        text = inner.split("```").next().unwrap_or(inner).trim();
    }
    serde_json::from_str(text)
}

fn fallback(error: Option<String>) -> ExtractedData {
    ExtractedData {
        emotions: Vec::new(),
        wins: Vec::new(),
        struggles: Vec::new(),
        energy_level: "medium".to_string(),
        error,
    }
}
