//! Generative model integration
//!
//! Defines the dispatch seam between the pipeline and the external multimodal
//! model, plus the Gemini REST implementation and a scripted mock.

pub mod gemini;
pub mod mock;

pub use gemini::types::GenerateContentResponse as ModelResponse;
pub use gemini::GeminiGenerator;
pub use mock::MockGenerationClient;

use crate::models::Turn;
use crate::Result;
use async_trait::async_trait;
use futures_util::Stream;
use serde::Serialize;
use std::pin::Pin;

/// Output kinds the model is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Text,
    Image,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "TEXT",
            Modality::Image => "IMAGE",
        }
    }
}

/// Whether a call returns a chunk sequence or one complete response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    Streaming,
    Single,
}

/// Per-call model selection and directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub model: String,
    pub modalities: Vec<Modality>,
    /// Adds the search tool directive.
    pub use_tools: bool,
    /// Adds an unconstrained reasoning budget.
    pub use_thinking: bool,
}

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ModelResponse>> + Send>>;

pub enum ModelOutput {
    Stream(ChunkStream),
    Single(ModelResponse),
}

impl ModelOutput {
    /// The dispatch mode this output shape belongs to.
    pub fn mode(&self) -> DispatchMode {
        match self {
            ModelOutput::Stream(_) => DispatchMode::Streaming,
            ModelOutput::Single(_) => DispatchMode::Single,
        }
    }
}

impl std::fmt::Debug for ModelOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelOutput::Stream(_) => f.write_str("ModelOutput::Stream(..)"),
            ModelOutput::Single(response) => {
                f.debug_tuple("ModelOutput::Single").field(response).finish()
            }
        }
    }
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(
        &self,
        turns: &[Turn],
        config: &ModelConfig,
        mode: DispatchMode,
    ) -> Result<ModelOutput>;
}
