//! Minimal generateContent client. Knows nothing about prompts or schemas;
//! callers hand it parts and an optional generation config and get back the
//! first candidate's text.

use crate::config::AiConfig;
use crate::error::AiError;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        let api_key = config.api_key.clone().ok_or(AiError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// One request, one response. No retry: a failure here is terminal for
    /// the caller's operation.
    pub async fn generate(
        &self,
        parts: Vec<Value>,
        system_instruction: Option<&str>,
        generation_config: Option<Value>,
    ) -> Result<String, AiError> {
        let mut body = json!({ "contents": [{ "parts": parts }] });
        if let Some(system) = system_instruction {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }
        if let Some(cfg) = generation_config {
            body["generationConfig"] = cfg;
        }

        let url = self.generate_url();
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AiError::Status(status));
        }

        let payload: Value = response.json().await?;
        let text = payload["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AiConfig;

    fn config(key: Option<&str>) -> AiConfig {
        AiConfig {
            base_url: "https://generativelanguage.googleapis.com/v1beta/".into(),
            model: "gemini-2.5-flash".into(),
            api_key: key.map(String::from),
            timeout_secs: 5,
            language: crate::ai::Language::En,
        }
    }

    #[test]
    fn test_missing_api_key() {
        let err = GeminiClient::new(&config(None)).unwrap_err();
        assert!(matches!(err, AiError::MissingApiKey));
    }

    #[test]
    fn test_generate_url_strips_trailing_slash() {
        let client = GeminiClient::new(&config(Some("k"))).unwrap();
        assert_eq!(
            client.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
