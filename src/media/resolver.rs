use super::mime::{effective_mime, essence, OCTET_STREAM};
use super::MediaSource;
use crate::models::{InlineMedia, MediaReference};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Url};

/// Resolves media references, fetching remote ones over HTTP.
pub struct MediaResolver {
    client: Client,
}

impl MediaResolver {
    pub fn new() -> Self {
        Self::new_with_client(Client::new())
    }

    pub fn new_with_client(client: Client) -> Self {
        Self { client }
    }

    fn encode(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    async fn fetch(&self, url: &str) -> Result<InlineMedia> {
        let parsed = Url::parse(url)
            .map_err(|e| Error::MediaFetch(format!("Invalid media URL '{}': {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::MediaFetch(format!(
                "Unsupported media URL scheme '{}' in {}",
                parsed.scheme(),
                url
            )));
        }

        tracing::debug!("Fetching remote media from {}", url);

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch media from {}: {}", url, e);
                Error::MediaFetch(format!("Failed to fetch {}: {}", url, error_chain(&e)))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Media fetch from {} returned status {}", url, status);
            return Err(Error::MediaFetch(format!(
                "Failed to fetch {}: {}",
                url, status
            )));
        }

        let mime_type = content_type_or_default(response.headers().get(CONTENT_TYPE));
        let bytes = response.bytes().await.map_err(|e| {
            Error::MediaFetch(format!(
                "Failed to read body from {}: {}",
                url,
                error_chain(&e)
            ))
        })?;

        tracing::debug!(
            "Fetched {} bytes of {} from {}",
            bytes.len(),
            mime_type,
            url
        );

        Ok(InlineMedia {
            data: Self::encode(&bytes),
            mime_type,
        })
    }
}

impl Default for MediaResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaSource for MediaResolver {
    async fn resolve(&self, reference: &MediaReference) -> Result<InlineMedia> {
        match reference {
            MediaReference::Inline {
                bytes,
                declared_mime_type,
            } => Ok(InlineMedia {
                data: Self::encode(bytes),
                mime_type: effective_mime(declared_mime_type.as_deref(), bytes),
            }),
            MediaReference::Remote { url } => self.fetch(url).await,
        }
    }
}

/// MIME type from a `Content-Type` header, defaulting to octet-stream.
pub(crate) fn content_type_or_default(header: Option<&HeaderValue>) -> String {
    header
        .and_then(|value| value.to_str().ok())
        .map(essence)
        .filter(|mime| !mime.is_empty())
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

/// Render an error with its source chain so transport causes stay visible.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn resolver() -> MediaResolver {
        MediaResolver::new()
    }

    #[tokio::test]
    async fn test_inline_reference_is_reencoded() {
        let media = resolver()
            .resolve(&MediaReference::inline(
                PNG_HEADER.to_vec(),
                Some("image/png".to_string()),
            ))
            .await
            .unwrap();

        assert_eq!(media.mime_type, "image/png");
        assert_eq!(media.data, MediaResolver::encode(&PNG_HEADER));
    }

    #[tokio::test]
    async fn test_inline_reference_without_mime_is_sniffed() {
        let media = resolver()
            .resolve(&MediaReference::inline(PNG_HEADER.to_vec(), None))
            .await
            .unwrap();
        assert_eq!(media.mime_type, "image/png");

        let media = resolver()
            .resolve(&MediaReference::inline(b"???".to_vec(), None))
            .await
            .unwrap();
        assert_eq!(media.mime_type, OCTET_STREAM);
    }

    #[tokio::test]
    async fn test_remote_reference_is_fetched() {
        let server = MockServer::start().await;
        let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

        Mock::given(method("GET"))
            .and(path("/photo.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(jpeg.clone(), "image/jpeg"))
            .expect(1)
            .mount(&server)
            .await;

        let media = resolver()
            .resolve(&MediaReference::remote(format!("{}/photo.jpg", server.uri())))
            .await
            .unwrap();

        assert_eq!(media.mime_type, "image/jpeg");
        assert_eq!(media.data, MediaResolver::encode(&jpeg));
    }

    #[tokio::test]
    async fn test_slow_remote_is_not_cut_off() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slow.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(std::time::Duration::from_millis(1500))
                    .set_body_raw(PNG_HEADER.to_vec(), "image/png"),
            )
            .mount(&server)
            .await;

        let media = resolver()
            .resolve(&MediaReference::remote(format!("{}/slow.png", server.uri())))
            .await
            .unwrap();
        assert_eq!(media.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_remote_not_found_reports_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = resolver()
            .resolve(&MediaReference::remote(format!("{}/missing.png", server.uri())))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MediaFetch(_)));
        assert!(err.to_string().contains("404 Not Found"));
    }

    #[tokio::test]
    async fn test_unreachable_host_reports_transport_error() {
        let err = resolver()
            .resolve(&MediaReference::remote("http://127.0.0.1:1/image.png"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MediaFetch(_)));
        assert!(err.to_string().contains("error sending request"));
    }

    #[tokio::test]
    async fn test_malformed_url_is_rejected() {
        let err = resolver()
            .resolve(&MediaReference::remote("not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MediaFetch(_)));
        assert!(err.to_string().contains("Invalid media URL"));

        let err = resolver()
            .resolve(&MediaReference::remote("ftp://example.com/a.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MediaFetch(_)));
    }

    #[test]
    fn test_content_type_defaults_to_octet_stream() {
        assert_eq!(content_type_or_default(None), OCTET_STREAM);
        assert_eq!(
            content_type_or_default(Some(&HeaderValue::from_static(""))),
            OCTET_STREAM
        );
        assert_eq!(
            content_type_or_default(Some(&HeaderValue::from_static("image/png; q=0.9"))),
            "image/png"
        );
    }
}
