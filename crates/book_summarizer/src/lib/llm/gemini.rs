use reqwest::Client;
use serde::Deserialize;

use crate::{Summarizer, SummaryResponse};

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("API key is missing")]
    MissingApiKey,
    #[error("No summary text in response")]
    EmptyResponse,
}

impl GeminiClient {
    const SYSTEM_PROMPT: &'static str = include_str!("./prompts/system_0.txt");

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            model: <Self as Summarizer>::SUMMARIZER_MODEL.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    #[tracing::instrument(skip(self, user_content), fields(model = %self.model))]
    pub async fn send_generate_request(
        &self,
        user_content: impl Into<String>,
    ) -> Result<GenerateContentResponse, GeminiError> {
        // an absent credential only surfaces once a request is attempted
        if self.api_key.trim().is_empty() {
            return Err(GeminiError::MissingApiKey);
        }

        let body = serde_json::json!({
            "systemInstruction": {
                "parts": [{ "text": Self::SYSTEM_PROMPT }]
            },
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": user_content.into() }]
                }
            ]
        });

        let resp = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let raw = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&raw)
                .map(|body| body.error.message)
                .unwrap_or(raw);
            return Err(GeminiError::Api { status, message });
        }

        Ok(resp.json::<GenerateContentResponse>().await?)
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ContentPart>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentPart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate with all of its parts joined together.
    pub fn text(&self) -> Option<String> {
        let text = self
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<String>();

        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl Summarizer for GeminiClient {
    const SUMMARIZER_MODEL: &'static str = "gemini-2.5-flash";
    type Error = GeminiError;

    async fn summarize(&self, title: &str) -> Result<SummaryResponse, Self::Error> {
        let response = self
            .send_generate_request(format!("Summarize the book \"{title}\"."))
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to summarize book"))?;

        let summary = response.text().ok_or(GeminiError::EmptyResponse)?;

        Ok(SummaryResponse { summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const GENERATE_PATH: &str = "/models/gemini-2.5-flash:generateContent";

    fn client(base_url: String) -> GeminiClient {
        GeminiClient::new("test-key").with_base_url(base_url)
    }

    #[tokio::test]
    async fn test_summarize_returns_candidate_text() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", GENERATE_PATH)
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::Regex("Dune".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{"text": "A desert planet, "}, {"text": "a spice, a prophecy..."}]
                    },
                    "finishReason": "STOP"
                }]
            }"#,
            )
            .create_async()
            .await;

        let resp = client(server.url()).summarize("Dune").await.unwrap();
        assert_eq!(resp.summary, "A desert planet, a spice, a prophecy...");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_uses_message_from_error_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", GENERATE_PATH)
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                "error": {
                    "code": 400,
                    "message": "API key not valid. Please pass a valid API key.",
                    "status": "INVALID_ARGUMENT"
                }
            }"#,
            )
            .create_async()
            .await;

        let err = client(server.url()).summarize("Dune").await.unwrap_err();
        match err {
            GeminiError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid. Please pass a valid API key.");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_falls_back_to_raw_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", GENERATE_PATH)
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let err = client(server.url()).summarize("Dune").await.unwrap_err();
        assert_eq!(err.to_string(), "API error: 503 - upstream unavailable");
    }

    #[tokio::test]
    async fn test_missing_api_key_never_hits_network() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", GENERATE_PATH)
            .expect(0)
            .create_async()
            .await;

        let err = GeminiClient::new("  ")
            .with_base_url(server.url())
            .summarize("Dune")
            .await
            .unwrap_err();

        assert!(matches!(err, GeminiError::MissingApiKey));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_response_without_candidates_is_empty_response() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", GENERATE_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        let err = client(server.url()).summarize("Dune").await.unwrap_err();
        assert!(matches!(err, GeminiError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_malformed_body_is_request_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", GENERATE_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("not json")
            .create_async()
            .await;

        let err = client(server.url()).summarize("Dune").await.unwrap_err();
        assert!(matches!(err, GeminiError::Request(_)));
    }

    #[tokio::test]
    async fn test_with_model_changes_request_path() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-pro:generateContent")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "ok"}]}}]}"#)
            .create_async()
            .await;

        let client = client(server.url()).with_model("gemini-2.5-pro");
        assert_eq!(client.model(), "gemini-2.5-pro");
        assert_eq!(client.summarize("Emma").await.unwrap().summary, "ok");
        mock.assert_async().await;
    }
}
