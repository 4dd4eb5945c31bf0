use super::types::{GenerateContentRequest, GenerateContentResponse};
use crate::ai::ChunkStream;
use crate::media::resolver::error_chain;
use crate::{Error, Result};
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::{Client, Response};

/// Lightweight Gemini REST client for unary and SSE-streamed generation.
pub struct GeminiHttpClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiHttpClient {
    pub fn new_with_client(api_key: String, base_url: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn method_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.base_url,
            normalize_model_id(model),
            method
        )
    }

    async fn post(&self, url: &str, request: &GenerateContentRequest) -> Result<Response> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Gemini: {}", e);
                Error::Generation(format!(
                    "Failed to send request to Gemini: {}",
                    error_chain(&e)
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Gemini API error (status {}): {}", status, error_text);
            return Err(Error::Generation(format!(
                "Gemini API error (status {}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }

    /// Calls `generateContent` and returns the complete response.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.method_url(model, "generateContent");
        let response = self.post(&url, request).await?;

        let body = response.text().await.map_err(|e| {
            Error::Generation(format!("Failed to read Gemini response: {}", error_chain(&e)))
        })?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}\nBody: {}", e, body);
            Error::Generation(format!("Failed to parse Gemini response: {}", e))
        })
    }

    /// Calls `streamGenerateContent` with SSE framing and yields chunks in arrival order.
    pub async fn stream_generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<ChunkStream> {
        let url = format!("{}?alt=sse", self.method_url(model, "streamGenerateContent"));
        let response = self.post(&url, request).await?;

        let chunks = response
            .bytes_stream()
            .eventsource()
            .filter_map(|event| async move {
                match event {
                    Ok(event) if event.data.trim().is_empty() => None,
                    Ok(event) => Some(
                        serde_json::from_str::<GenerateContentResponse>(&event.data).map_err(
                            |e| {
                                tracing::error!(
                                    "Failed to parse Gemini stream chunk: {}\nData: {}",
                                    e,
                                    event.data
                                );
                                Error::Generation(format!(
                                    "Failed to parse Gemini stream chunk: {}",
                                    e
                                ))
                            },
                        ),
                    ),
                    Err(e) => Some(Err(Error::Generation(format!(
                        "Gemini stream error: {}",
                        e
                    )))),
                }
            });

        Ok(Box::pin(chunks))
    }
}

/// Bare model ID, accepting either `gemini-x` or `models/gemini-x`.
pub fn normalize_model_id(model: &str) -> &str {
    model.strip_prefix("models/").unwrap_or(model)
}
