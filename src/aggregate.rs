//! Response aggregation
//!
//! Normalizes model output, streamed or not, into a [`GeneratedArtifact`].
//! Text is concatenated in arrival order and inline images are collected in
//! the order the model emitted them. Empty output is a valid artifact, not an
//! error.

use crate::ai::gemini::types::Part;
use crate::ai::{ChunkStream, DispatchMode, ModelOutput, ModelResponse};
use crate::models::{GeneratedArtifact, ImageResult};
use crate::{Error, Result};
use futures_util::StreamExt;

#[derive(Debug, Default)]
struct Accumulator {
    artifact: GeneratedArtifact,
}

impl Accumulator {
    /// Fold one response's parts in. Returns the text it contributed.
    fn absorb(&mut self, response: &ModelResponse) -> String {
        let mut delta = String::new();

        for part in response.parts() {
            match part {
                Part::Text {
                    thought: Some(true),
                    ..
                } => {
                    tracing::trace!("Skipping thought summary part");
                }
                Part::Text { text, .. } => delta.push_str(text),
                Part::InlineData { inline_data } => {
                    self.artifact.images.push(ImageResult::Inline {
                        data: inline_data.data.clone(),
                        mime_type: inline_data.mime_type.clone(),
                    });
                }
                Part::Other(_) => {
                    tracing::trace!("Skipping non-text, non-image part");
                }
            }
        }

        self.artifact.text.push_str(&delta);
        delta
    }

    fn finish(self) -> GeneratedArtifact {
        self.artifact
    }
}

/// Aggregate model output along the path the preset's dispatch mode selects.
///
/// Output whose shape does not match `mode` is rejected.
pub async fn aggregate(output: ModelOutput, mode: DispatchMode) -> Result<GeneratedArtifact> {
    match (mode, output) {
        (DispatchMode::Streaming, ModelOutput::Stream(stream)) => aggregate_stream(stream).await,
        (DispatchMode::Single, ModelOutput::Single(response)) => Ok(aggregate_response(&response)),
        (mode, output) => Err(Error::Generation(format!(
            "Model returned {:?} output for a {:?} call",
            output.mode(),
            mode
        ))),
    }
}

/// Pull chunks one at a time, in delivery order.
///
/// A failed chunk aborts aggregation; nothing partial is returned.
pub async fn aggregate_stream(mut stream: ChunkStream) -> Result<GeneratedArtifact> {
    let mut acc = Accumulator::default();
    let mut chunk_count = 0usize;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        chunk_count += 1;

        let delta = acc.absorb(&chunk);
        if delta.is_empty() {
            tracing::trace!("Chunk {} carried no text", chunk_count);
        } else {
            acc.artifact.deltas.push(delta);
        }
    }

    let artifact = acc.finish();
    tracing::debug!(
        "Aggregated {} chunks into {} chars of text and {} images",
        chunk_count,
        artifact.text.len(),
        artifact.images.len()
    );
    Ok(artifact)
}

/// Inspect a single complete response once.
pub fn aggregate_response(response: &ModelResponse) -> GeneratedArtifact {
    let mut acc = Accumulator::default();
    acc.absorb(response);
    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(t: &str) -> ModelResponse {
        ModelResponse::from_parts(vec![Part::text(t)])
    }

    fn image(data: &str) -> ModelResponse {
        ModelResponse::from_parts(vec![Part::inline("image/png", data)])
    }

    fn noop() -> ModelResponse {
        ModelResponse::default()
    }

    fn stream_of(chunks: Vec<Result<ModelResponse>>) -> ChunkStream {
        Box::pin(futures_util::stream::iter(chunks))
    }

    #[tokio::test]
    async fn test_stream_preserves_order_and_skips_noops() {
        let artifact = aggregate_stream(stream_of(vec![
            Ok(noop()),
            Ok(text("a")),
            Ok(noop()),
            Ok(image("X")),
            Ok(ModelResponse::from_parts(vec![])),
            Ok(text("b")),
            Ok(noop()),
        ]))
        .await
        .unwrap();

        assert_eq!(artifact.text, "ab");
        assert_eq!(artifact.deltas, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            artifact.images,
            vec![ImageResult::Inline {
                data: "X".to_string(),
                mime_type: "image/png".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_stream_keeps_image_order() {
        let artifact = aggregate_stream(stream_of(vec![
            Ok(image("first")),
            Ok(text("between")),
            Ok(image("second")),
        ]))
        .await
        .unwrap();

        let data: Vec<_> = artifact
            .images
            .iter()
            .map(|image| match image {
                ImageResult::Inline { data, .. } => data.as_str(),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(data, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_stream_error_aborts() {
        let err = aggregate_stream(stream_of(vec![
            Ok(text("partial")),
            Err(Error::Generation("connection reset".to_string())),
            Ok(text("never seen")),
        ]))
        .await
        .unwrap_err();

        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_empty_stream_is_empty_artifact() {
        let artifact = aggregate_stream(stream_of(vec![])).await.unwrap();
        assert!(artifact.is_empty());
    }

    #[test]
    fn test_single_response_accumulates_parts_in_order() {
        let response = ModelResponse::from_parts(vec![
            Part::text("Here "),
            Part::inline("image/jpeg", "J1"),
            Part::text("you go"),
            Part::inline("image/png", "P2"),
        ]);

        let artifact = aggregate_response(&response);

        assert_eq!(artifact.text, "Here you go");
        assert!(artifact.deltas.is_empty());
        assert_eq!(
            artifact.images,
            vec![
                ImageResult::Inline {
                    data: "J1".to_string(),
                    mime_type: "image/jpeg".to_string(),
                },
                ImageResult::Inline {
                    data: "P2".to_string(),
                    mime_type: "image/png".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_single_response_without_candidates_is_empty() {
        assert_eq!(aggregate_response(&noop()), GeneratedArtifact::default());
        assert_eq!(
            aggregate_response(&ModelResponse::from_parts(vec![])),
            GeneratedArtifact::default()
        );
    }

    #[test]
    fn test_thought_parts_are_not_visible_text() {
        let response = ModelResponse::from_parts(vec![
            Part::Text {
                text: "thinking...".to_string(),
                thought: Some(true),
            },
            Part::text("answer"),
        ]);

        assert_eq!(aggregate_response(&response).text, "answer");
    }

    #[tokio::test]
    async fn test_aggregate_follows_dispatch_mode() {
        let artifact = aggregate(ModelOutput::Single(text("single")), DispatchMode::Single)
            .await
            .unwrap();
        assert_eq!(artifact.text, "single");

        let artifact = aggregate(
            ModelOutput::Stream(stream_of(vec![Ok(text("s"))])),
            DispatchMode::Streaming,
        )
        .await
        .unwrap();
        assert_eq!(artifact.deltas, vec!["s".to_string()]);
    }

    #[tokio::test]
    async fn test_aggregate_rejects_output_of_the_wrong_shape() {
        let err = aggregate(ModelOutput::Single(text("single")), DispatchMode::Streaming)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
        assert!(err.to_string().contains("Single"));

        let err = aggregate(
            ModelOutput::Stream(stream_of(vec![Ok(text("s"))])),
            DispatchMode::Single,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }
}
