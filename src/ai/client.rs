//! Generative Language REST client.

use super::TextGenerator;
use crate::error::{Error, Result};
use crate::settings::AiSettings;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use std::env;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    agent: ureq::Agent,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }

    pub fn from_settings(settings: &AiSettings) -> Self {
        let api_key = resolve_api_key(
            env::var("GEMINI_API_KEY").ok(),
            settings.api_key.clone(),
            env::var("GOOGLE_API_KEY").ok(),
        );
        Self::new(
            settings.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT),
            settings.model.as_deref().unwrap_or(DEFAULT_MODEL),
            api_key,
        )
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, prompt: &str, response_schema: &Value) -> Result<String> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema,
            },
        });

        let mut request = self.agent.post(&self.url());
        if let Some(key) = &self.api_key {
            request = request.set("x-goog-api-key", key);
        }
        debug!("POST {} ({} byte prompt)", self.url(), prompt.len());

        let response: GenerateResponse = request.send_json(body)?.into_json()?;
        first_candidate_text(response)
    }
}

fn first_candidate_text(response: GenerateResponse) -> Result<String> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
        .filter(|t| !t.trim().is_empty())
        .ok_or(Error::EmptyResponse)
}

/// Pick the credential: `GEMINI_API_KEY`, then the settings file, then `GOOGLE_API_KEY`.
fn resolve_api_key(gemini: Option<String>, configured: Option<String>, google: Option<String>) -> Option<String> {
    let non_empty = |k: Option<String>| k.filter(|k| !k.trim().is_empty());
    if let Some(key) = non_empty(gemini) {
        return Some(key);
    }
    warn!("GEMINI_API_KEY is not set; falling back to configured credentials");
    let key = non_empty(configured).or_else(|| non_empty(google));
    if key.is_none() {
        warn!("no API key found; requests will be sent unauthenticated");
    }
    key
}
