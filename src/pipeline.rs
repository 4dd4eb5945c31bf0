//! Generation pipeline orchestration.
//!
//! Runs one request through validation, media resolution, assembly, model
//! dispatch, aggregation and materialization. Each call is independent; the
//! pipeline holds no per-request or per-session state.

use crate::ai::{GeminiGenerator, GenerationService, ModelConfig};
use crate::image::ImageMaterializer;
use crate::media::{MediaResolver, MediaSource};
use crate::models::{Config, GeneratedArtifact, GenerationRequest};
use crate::presets::{ModelClass, OutputPolicy, Preset, PresetKind};
use crate::{aggregate, assemble, Result};
use std::path::Path;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

/// Result of one successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub artifact: GeneratedArtifact,
    /// The caller's session id, echoed untouched.
    pub session_id: Option<String>,
}

pub struct Pipeline {
    generator: Box<dyn GenerationService>,
    media: Box<dyn MediaSource>,
    materializer: ImageMaterializer,
    chat_model: String,
    image_model: String,
}

/// Injectable service bundle used to construct [`Pipeline`] in tests/harnesses.
pub struct PipelineServices {
    pub generator: Box<dyn GenerationService>,
    pub media: Box<dyn MediaSource>,
    pub materializer: ImageMaterializer,
}

impl Pipeline {
    /// Build a pipeline from concrete service dependencies.
    pub fn with_services(
        services: PipelineServices,
        chat_model: String,
        image_model: String,
    ) -> Self {
        Self {
            generator: services.generator,
            media: services.media,
            materializer: services.materializer,
            chat_model,
            image_model,
        }
    }

    /// Construct the production pipeline from configuration.
    ///
    /// Creates the image output directory if it is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        // One connection pool for model calls and media fetches.
        let http_client = reqwest::Client::new();

        info!(
            "Model defaults: chat={}, image={}",
            config.chat_model, config.image_model
        );

        Ok(Self::with_services(
            PipelineServices {
                generator: Box::new(GeminiGenerator::new_with_client(
                    config.gemini_api_key.clone(),
                    config.gemini_base_url.clone(),
                    http_client.clone(),
                )),
                media: Box::new(MediaResolver::new_with_client(http_client)),
                materializer: ImageMaterializer::new(
                    Path::new(&config.output_dir),
                    &config.public_image_path,
                )?,
            },
            config.chat_model.clone(),
            config.image_model.clone(),
        ))
    }

    pub fn materializer(&self) -> &ImageMaterializer {
        &self.materializer
    }

    pub fn default_model(&self, preset: &Preset) -> &str {
        match preset.model_class {
            ModelClass::Text => &self.chat_model,
            ModelClass::Image => &self.image_model,
        }
    }

    /// Run `request` through `kind` with the preset's own output policy.
    pub async fn run(
        &self,
        kind: PresetKind,
        request: GenerationRequest,
    ) -> Result<PipelineOutcome> {
        let policy = kind.preset().output;
        self.run_with_policy(kind, request, policy).await
    }

    /// Run `request` through `kind`, materializing images per `policy`.
    pub async fn run_with_policy(
        &self,
        kind: PresetKind,
        request: GenerationRequest,
        policy: OutputPolicy,
    ) -> Result<PipelineOutcome> {
        let span = tracing::info_span!("pipeline", preset = %kind, request_id = %Uuid::new_v4());
        self.execute(kind.preset(), request, policy)
            .instrument(span)
            .await
    }

    async fn execute(
        &self,
        preset: Preset,
        request: GenerationRequest,
        policy: OutputPolicy,
    ) -> Result<PipelineOutcome> {
        preset.validate(&request)?;
        let request = preset.prepare(request, self.default_model(&preset));

        let media = match &request.media {
            Some(reference) => Some(self.media.resolve(reference).await?),
            None => None,
        };

        let turns = assemble::assemble(&request, media.as_ref());
        let config = ModelConfig {
            model: request.model_name.clone(),
            modalities: preset.modalities.to_vec(),
            use_tools: request.use_tools,
            use_thinking: request.use_thinking,
        };

        info!(
            "Dispatching to {} ({:?}, media: {})",
            config.model,
            preset.mode,
            media.is_some()
        );

        let output = self.generator.generate(&turns, &config, preset.mode).await?;
        let raw = aggregate::aggregate(output, preset.mode).await?;

        let mut images = Vec::with_capacity(raw.images.len());
        for image in raw.images {
            images.push(self.materializer.materialize(image, policy).await?);
        }

        if images.is_empty() && preset.modalities.len() > 1 {
            warn!("Model returned no image");
        }
        info!(
            "Generated {} chars of text and {} images",
            raw.text.len(),
            images.len()
        );

        Ok(PipelineOutcome {
            artifact: GeneratedArtifact {
                text: raw.text,
                deltas: raw.deltas,
                images,
            },
            session_id: request.session_id,
        })
    }
}
