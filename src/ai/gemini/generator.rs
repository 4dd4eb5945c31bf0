use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerationConfig, Part, ThinkingConfig, Tool,
};
use crate::ai::{DispatchMode, GenerationService, ModelConfig, ModelOutput};
use crate::models::{Role, Turn, TurnPart};
use crate::Result;
use async_trait::async_trait;

/// Dynamic thinking: the model picks its own reasoning budget.
const UNCONSTRAINED_THINKING_BUDGET: i32 = -1;

pub struct GeminiGenerator {
    http: GeminiHttpClient,
}

impl GeminiGenerator {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self::new_with_client(api_key, base_url, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, base_url: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, base_url, client),
        }
    }
}

fn to_part(part: &TurnPart) -> Part {
    match part {
        TurnPart::Text(text) => Part::text(text.clone()),
        TurnPart::InlineMedia(media) => Part::inline(media.mime_type.clone(), media.data.clone()),
    }
}

/// Map turns and config onto the Gemini wire request.
///
/// System turns become `systemInstruction`; the rest keep their order in `contents`.
pub fn build_request(turns: &[Turn], config: &ModelConfig) -> GenerateContentRequest {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();

    for turn in turns {
        let parts = turn.parts.iter().map(to_part);
        match turn.role {
            Role::System => system_parts.extend(parts),
            Role::User => contents.push(Content {
                role: Some("user".to_string()),
                parts: parts.collect(),
            }),
            Role::Model => contents.push(Content {
                role: Some("model".to_string()),
                parts: parts.collect(),
            }),
        }
    }

    GenerateContentRequest {
        system_instruction: (!system_parts.is_empty()).then(|| Content {
            role: None,
            parts: system_parts,
        }),
        contents,
        generation_config: GenerationConfig {
            response_modalities: config
                .modalities
                .iter()
                .map(|m| m.as_str().to_string())
                .collect(),
            thinking_config: config.use_thinking.then_some(ThinkingConfig {
                thinking_budget: UNCONSTRAINED_THINKING_BUDGET,
            }),
        },
        tools: if config.use_tools {
            vec![Tool::default()]
        } else {
            Vec::new()
        },
    }
}

#[async_trait]
impl GenerationService for GeminiGenerator {
    async fn generate(
        &self,
        turns: &[Turn],
        config: &ModelConfig,
        mode: DispatchMode,
    ) -> Result<ModelOutput> {
        let request = build_request(turns, config);

        tracing::debug!(
            "Dispatching {:?} request to Gemini model {} ({} turns, tools: {}, thinking: {})",
            mode,
            config.model,
            request.contents.len(),
            config.use_tools,
            config.use_thinking
        );

        match mode {
            DispatchMode::Streaming => Ok(ModelOutput::Stream(
                self.http
                    .stream_generate_content(&config.model, &request)
                    .await?,
            )),
            DispatchMode::Single => Ok(ModelOutput::Single(
                self.http.generate_content(&config.model, &request).await?,
            )),
        }
    }
}
