use super::form::FormFields;
use super::{ApiError, AppState};
use crate::media::mime::extension_for_mime;
use crate::models::{GenerationRequest, ImageResult};
use crate::presets::{OutputPolicy, Preset, PresetKind};
use crate::Error;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{post, MethodRouter};
use axum::Json;
use serde::{Deserialize, Serialize};

const NO_IMAGE_GENERATED: &str = "No image generated";

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetInfo {
    name: &'static str,
    #[serde(flatten)]
    preset: Preset,
    default_model: String,
}

pub async fn list_presets(State(state): State<AppState>) -> Json<Vec<PresetInfo>> {
    let presets = PresetKind::ALL
        .iter()
        .map(|kind| {
            let preset = kind.preset();
            PresetInfo {
                name: kind.name(),
                preset,
                default_model: state.pipeline.default_model(&preset).to_string(),
            }
        })
        .collect();

    Json(presets)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    success: bool,
    text: String,
    chunks: Vec<String>,
    images: Vec<ImageResult>,
    total_images: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
}

pub async fn chat(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let multipart = multipart.map_err(|e| Error::Validation(e.body_text()))?;
    let mut fields = FormFields::read(multipart).await?;

    let request = GenerationRequest {
        model_name: fields.text("model").unwrap_or_default(),
        system_prompt: fields.text("systemPrompt"),
        message: fields.text("message").unwrap_or_default(),
        media: fields.media(),
        use_tools: fields.flag("useTools"),
        use_thinking: fields.flag("useThinking"),
        session_id: fields.text("sessionId"),
    };

    let outcome = state.pipeline.run(PresetKind::Chat, request).await?;
    let artifact = outcome.artifact;

    Ok(Json(ChatResponse {
        success: true,
        total_images: artifact.images.len(),
        text: artifact.text,
        chunks: artifact.deltas,
        images: artifact.images,
        session_id: outcome.session_id,
    }))
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageOutput {
    #[default]
    Inline,
    File,
}

#[derive(Debug, Deserialize)]
pub struct GenerateImageBody {
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    output: ImageOutput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponse {
    success: bool,
    text: String,
    images: Vec<ImageResult>,
    total_images: usize,
}

pub async fn generate_image(
    State(state): State<AppState>,
    body: Result<Json<GenerateImageBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|e| Error::Validation(e.body_text()))?;

    let policy = match body.output {
        ImageOutput::Inline => OutputPolicy::Inline,
        ImageOutput::File => OutputPolicy::File,
    };
    let request = GenerationRequest {
        model_name: body.model.unwrap_or_default(),
        message: body.prompt,
        ..Default::default()
    };

    let artifact = state
        .pipeline
        .run_with_policy(PresetKind::ImageGenerate, request, policy)
        .await?
        .artifact;

    if artifact.images.is_empty() {
        return Ok(Json(serde_json::json!({
            "success": false,
            "error": NO_IMAGE_GENERATED,
            "text": artifact.text,
        }))
        .into_response());
    }

    Ok(Json(GenerateImageResponse {
        success: true,
        total_images: artifact.images.len(),
        text: artifact.text,
        images: artifact.images,
    })
    .into_response())
}

/// POST route for one of the single-image transforms.
pub fn transform_route(kind: PresetKind) -> MethodRouter<AppState> {
    post(
        move |State(state): State<AppState>,
              multipart: Result<Multipart, MultipartRejection>| async move {
            transform(state, kind, multipart).await
        },
    )
}

async fn transform(
    state: AppState,
    kind: PresetKind,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    // A missing or malformed body is treated as "no image" so the preset's
    // own validation produces the error.
    let mut fields = match multipart {
        Ok(multipart) => FormFields::read(multipart).await?,
        Err(rejection) => {
            tracing::debug!("No multipart body for {}: {}", kind, rejection);
            FormFields::default()
        }
    };

    let request = GenerationRequest {
        model_name: fields.text("model").unwrap_or_default(),
        media: fields.media(),
        ..Default::default()
    };

    let artifact = state.pipeline.run(kind, request).await?.artifact;

    match artifact.images.into_iter().next() {
        Some(ImageResult::Buffer { bytes, mime_type }) => {
            let filename = format!(
                "{}_{}.{}",
                kind,
                chrono::Utc::now().timestamp_millis(),
                extension_for_mime(&mime_type)
            );
            Ok((
                [
                    (header::CONTENT_TYPE, mime_type),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("inline; filename=\"{}\"", filename),
                    ),
                ],
                bytes,
            )
                .into_response())
        }
        _ => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "success": false,
                "error": NO_IMAGE_GENERATED,
                "text": artifact.text,
            })),
        )
            .into_response()),
    }
}

pub async fn serve_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    match state.pipeline.materializer().load(&name).await? {
        Some((bytes, mime_type)) => {
            Ok(([(header::CONTENT_TYPE, mime_type)], bytes).into_response())
        }
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "success": false, "error": "Image not found" })),
        )
            .into_response()),
    }
}
