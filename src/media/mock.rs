use super::mime::effective_mime;
use super::MediaSource;
use crate::models::{InlineMedia, MediaReference};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory media source. Remote URLs resolve from a registered table.
pub struct MockMediaSource {
    remote: Arc<Mutex<HashMap<String, (Vec<u8>, String)>>>,
    resolve_count: Arc<Mutex<usize>>,
}

impl MockMediaSource {
    pub fn new() -> Self {
        Self {
            remote: Arc::new(Mutex::new(HashMap::new())),
            resolve_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_remote(self, url: &str, bytes: Vec<u8>, mime_type: &str) -> Self {
        self.remote
            .lock()
            .unwrap()
            .insert(url.to_string(), (bytes, mime_type.to_string()));
        self
    }

    pub fn get_resolve_count(&self) -> usize {
        *self.resolve_count.lock().unwrap()
    }
}

impl Default for MockMediaSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaSource for MockMediaSource {
    async fn resolve(&self, reference: &MediaReference) -> Result<InlineMedia> {
        *self.resolve_count.lock().unwrap() += 1;

        let (bytes, mime_type) = match reference {
            MediaReference::Inline {
                bytes,
                declared_mime_type,
            } => (
                bytes.clone(),
                effective_mime(declared_mime_type.as_deref(), bytes),
            ),
            MediaReference::Remote { url } => self
                .remote
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| {
                    Error::MediaFetch(format!("Failed to fetch {}: 404 Not Found", url))
                })?,
        };

        Ok(InlineMedia {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            mime_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_resolves_registered_urls() {
        let source = MockMediaSource::new().with_remote("https://x/a.png", vec![1, 2], "image/png");

        let media = source
            .resolve(&MediaReference::remote("https://x/a.png"))
            .await
            .unwrap();
        assert_eq!(media.mime_type, "image/png");
        assert_eq!(media.data, "AQI=");
        assert_eq!(source.get_resolve_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_unknown_url_fails() {
        let source = MockMediaSource::new();
        let err = source
            .resolve(&MediaReference::remote("https://x/missing.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MediaFetch(_)));
    }
}
