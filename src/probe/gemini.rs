use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;

use super::Credential;
use crate::ToolError;

/// Minimal Gemini REST client: model listing and one-shot generation
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
}

/// A model as reported by the listing endpoint
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|method| method == "generateContent")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<u16>,
    message: String,
    status: Option<String>,
}

impl GeminiClient {
    /// Build a client authorized with the credential
    pub fn new(credential: &Credential, base_url: &str) -> Result<Self, ToolError> {
        let mut api_key = HeaderValue::from_str(credential.expose())
            .map_err(|e| ToolError::ConfigurationFailure(format!("Invalid API key: {}", e)))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ToolError::ConfigurationFailure(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// List every model, following pagination
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ToolError> {
        let url = format!("{}/models", self.base_url);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(&url);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| ToolError::ModelListingFailure(e.to_string()))?;
            let body = read_body(response)
                .await
                .map_err(ToolError::ModelListingFailure)?;

            let page: ListModelsResponse = serde_json::from_str(&body).map_err(|e| {
                ToolError::ModelListingFailure(format!("Malformed model list: {}", e))
            })?;
            tracing::debug!("Model page with {} entries", page.models.len());
            models.extend(page.models);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(models)
    }

    /// Send one text prompt and return the concatenated response text
    pub async fn generate_content(&self, model: &str, prompt: &str) -> Result<String, ToolError> {
        let model_path = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        let url = format!("{}/{}:generateContent", self.base_url, model_path);
        let failure = |message: String| ToolError::GenerationFailure {
            model: model.to_string(),
            message,
        };

        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });

        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| failure(e.to_string()))?;
        let body = read_body(response).await.map_err(failure)?;

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| failure(format!("Malformed response: {}", e)))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty());

        match text {
            Some(text) => Ok(text),
            None => {
                let reason = parsed
                    .prompt_feedback
                    .and_then(|feedback| feedback.block_reason)
                    .map(|reason| format!("Prompt blocked: {}", reason))
                    .unwrap_or_else(|| "Response contained no text".to_string());
                Err(failure(reason))
            }
        }
    }
}

/// Read a response body, turning API error envelopes into a message
async fn read_body(response: reqwest::Response) -> Result<String, String> {
    let status = response.status();
    let body = response.text().await.map_err(|e| e.to_string())?;

    if status.is_success() {
        return Ok(body);
    }

    match serde_json::from_str::<ApiErrorEnvelope>(&body) {
        Ok(envelope) => {
            let code = envelope.error.code.unwrap_or(status.as_u16());
            match envelope.error.status {
                Some(kind) => Err(format!("{} {}: {}", code, kind, envelope.error.message)),
                None => Err(format!("{}: {}", code, envelope.error.message)),
            }
        }
        Err(_) => Err(format!("HTTP {}: {}", status, body.trim())),
    }
}
