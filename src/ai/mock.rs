use super::gemini::types::Part;
use super::{DispatchMode, GenerationService, ModelConfig, ModelOutput, ModelResponse};
use crate::models::Turn;
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use std::sync::{Arc, Mutex};

/// A tiny valid 1x1 PNG.
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 pixel
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49,
    0x44, 0x41, // IDAT chunk
    0x54, 0x08, 0x99, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0xE2,
    0x25, 0x00, 0xBC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, // IEND chunk
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// One dispatched call as seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub turns: Vec<Turn>,
    pub config: ModelConfig,
    pub mode: DispatchMode,
}

/// Scripted generation client.
///
/// Streaming calls replay the scripted chunk list, single calls the scripted
/// response. Without a script, streaming yields one text chunk and single calls
/// return a text part followed by a tiny PNG.
pub struct MockGenerationClient {
    stream_chunks: Arc<Mutex<Option<Vec<ModelResponse>>>>,
    single_response: Arc<Mutex<Option<ModelResponse>>>,
    failure: Arc<Mutex<Option<String>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            stream_chunks: Arc::new(Mutex::new(None)),
            single_response: Arc::new(Mutex::new(None)),
            failure: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_stream_chunks(self, chunks: Vec<ModelResponse>) -> Self {
        *self.stream_chunks.lock().unwrap() = Some(chunks);
        self
    }

    pub fn with_response(self, response: ModelResponse) -> Self {
        *self.single_response.lock().unwrap() = Some(response);
        self
    }

    pub fn with_failure(self, message: &str) -> Self {
        *self.failure.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().unwrap().last().cloned()
    }

    /// A handle sharing this mock's recorded calls, for inspection after the
    /// mock itself has been boxed into a pipeline.
    pub fn handle(&self) -> Self {
        Self {
            stream_chunks: Arc::clone(&self.stream_chunks),
            single_response: Arc::clone(&self.single_response),
            failure: Arc::clone(&self.failure),
            calls: Arc::clone(&self.calls),
        }
    }

    fn default_image_response() -> ModelResponse {
        ModelResponse::from_parts(vec![
            Part::text("Here is your image."),
            Part::inline(
                "image/png",
                base64::engine::general_purpose::STANDARD.encode(TINY_PNG),
            ),
        ])
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGenerationClient {
    async fn generate(
        &self,
        turns: &[Turn],
        config: &ModelConfig,
        mode: DispatchMode,
    ) -> Result<ModelOutput> {
        self.calls.lock().unwrap().push(RecordedCall {
            turns: turns.to_vec(),
            config: config.clone(),
            mode,
        });

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(Error::Generation(message));
        }

        match mode {
            DispatchMode::Streaming => {
                let chunks = self.stream_chunks.lock().unwrap().clone().unwrap_or_else(|| {
                    vec![ModelResponse::from_parts(vec![Part::text("Mock response")])]
                });
                Ok(ModelOutput::Stream(Box::pin(futures_util::stream::iter(
                    chunks.into_iter().map(Ok),
                ))))
            }
            DispatchMode::Single => Ok(ModelOutput::Single(
                self.single_response
                    .lock()
                    .unwrap()
                    .clone()
                    .unwrap_or_else(Self::default_image_response),
            )),
        }
    }
}
