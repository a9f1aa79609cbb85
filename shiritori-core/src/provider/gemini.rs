//! Google Gemini provider implementation (`generateContent`)
//!
//! The API key travels in the `x-goog-api-key` header, never in the URL,
//! so transport errors that echo the URL cannot leak it.

use super::*;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

pub(crate) const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API client
pub struct GeminiProvider {
    client: Client,
    config: ProviderConfig,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = config.build_client(120)?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, model: &str) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(GEMINI_API_BASE)
            .trim_end_matches('/');
        format!("{}/{}:generateContent", base, model)
    }

    fn build_request(request: &CompletionRequest) -> GeminiRequest {
        let contents = request
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| GeminiContent {
                role: match m.role {
                    Role::Assistant => "model".to_string(),
                    _ => "user".to_string(),
                },
                parts: vec![Part { text: m.content.clone() }],
            })
            .collect();

        GeminiRequest {
            contents,
            system_instruction: request.system_prompt().map(|s| GeminiContent {
                role: "user".to_string(),
                parts: vec![Part { text: s.to_string() }],
            }),
            generation_config: Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            }),
        }
    }

    fn http_request(&self, model: &str, body: &GeminiRequest) -> RequestBuilder {
        let req = self
            .client
            .post(self.endpoint(model))
            .header(CONTENT_TYPE, "application/json")
            .json(body);

        match &self.config.api_key {
            Some(api_key) => req.header(API_KEY_HEADER, api_key),
            None => req,
        }
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        self.config.default_model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model().to_string());
        let body = Self::build_request(&request);

        let response = self
            .http_request(&model, &body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status {
                429 => ProviderError::RateLimited { retry_after: None },
                401 | 403 => ProviderError::AuthenticationFailed,
                404 => ProviderError::ModelNotFound(model),
                // Gemini reports a bad key as 400 INVALID_ARGUMENT
                400 if text.contains("API_KEY_INVALID") => ProviderError::AuthenticationFailed,
                _ => ProviderError::Api { status, message: text },
            });
        }

        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(parse_response(api_response, model))
    }
}

fn parse_response(api_response: GeminiResponse, model: String) -> CompletionResponse {
    let candidate = api_response.candidates.into_iter().next();

    let finish_reason = match candidate.as_ref().and_then(|c| c.finish_reason.as_deref()) {
        Some("STOP") => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY") | Some("RECITATION") | Some("BLOCKLIST") => FinishReason::ContentFilter,
        _ => FinishReason::Unknown,
    };

    let text = candidate
        .and_then(|c| c.content)
        .and_then(|c| c.parts)
        .map(|parts| {
            parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        });

    let usage = api_response
        .usage_metadata
        .map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        })
        .unwrap_or_default();

    CompletionResponse {
        model: api_response.model_version.unwrap_or(model),
        content: trimmed(text),
        finish_reason,
        usage,
    }
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
    #[serde(default)]
    total_token_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_request_conversion() {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("You play shiritori."),
            ChatMessage::user("りんご"),
            ChatMessage::assistant("ごりら"),
        ])
        .with_temperature(0.7)
        .with_max_tokens(20);

        let body = serde_json::to_value(GeminiProvider::build_request(&request)).unwrap();
        assert_eq!(body["contents"].as_array().unwrap().len(), 2);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][1]["parts"][0]["text"], "ごりら");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You play shiritori.");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 20);
    }

    #[test]
    fn test_api_key_sent_as_header() {
        let provider = GeminiProvider::new(ProviderConfig::gemini("SECRET-KEY-123")).unwrap();
        let request = CompletionRequest::new(vec![ChatMessage::user("りんご")]);
        let body = GeminiProvider::build_request(&request);

        let http = provider.http_request(DEFAULT_MODEL, &body).build().unwrap();
        assert_eq!(http.url().query(), None);
        assert!(!http.url().as_str().contains("SECRET-KEY-123"));
        assert_eq!(
            http.headers().get(API_KEY_HEADER).and_then(|v| v.to_str().ok()),
            Some("SECRET-KEY-123")
        );
    }

    #[test]
    fn test_network_error_does_not_leak_key() {
        // nothing listens on the discard port, so the request fails to connect
        let config = ProviderConfig::gemini("SECRET-KEY-123")
            .with_base_url("http://127.0.0.1:9/v1beta/models")
            .with_timeout(5);
        let provider = GeminiProvider::new(config).unwrap();

        let err = tokio_test::block_on(provider.prompt("りんご")).unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
        assert!(!err.to_string().contains("SECRET-KEY-123"));

        let err = err.into_error(provider.name());
        assert_eq!(err.kind(), ErrorKind::NetworkFailed);
        assert!(!err.to_string().contains("SECRET-KEY-123"));
        assert!(!format!("{:?}", err).contains("SECRET-KEY-123"));
    }

    #[test]
    fn test_endpoint() {
        let provider = GeminiProvider::new(ProviderConfig::gemini("key")).unwrap();
        assert_eq!(
            provider.endpoint("gemini-2.0-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_parse_response() {
        let raw = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "らっぱ\n"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 52, "candidatesTokenCount": 2, "totalTokenCount": 54},
            "modelVersion": "gemini-2.0-flash"
        }"#;
        let response = parse_response(serde_json::from_str(raw).unwrap(), "x".into());

        assert_eq!(response.content.as_deref(), Some("らっぱ"));
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.model, "gemini-2.0-flash");
        assert_eq!(response.usage.total_tokens, 54);
    }

    #[test]
    fn test_blocked_response_has_no_content() {
        let raw = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let response = parse_response(serde_json::from_str(raw).unwrap(), "gemini-2.0-flash".into());

        assert_eq!(response.content, None);
        assert_eq!(response.finish_reason, FinishReason::ContentFilter);
        assert_eq!(response.model, "gemini-2.0-flash");

        let empty = parse_response(serde_json::from_str("{}").unwrap(), "m".into());
        assert_eq!(empty.content, None);
    }
}
