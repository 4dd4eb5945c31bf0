//! Media source resolution
//!
//! Turns uploaded bytes or remote URLs into base64 inline media with a
//! non-empty MIME type, ready to embed in a model request.

pub mod mime;
pub mod mock;
pub mod resolver;

pub use mock::MockMediaSource;
pub use resolver::MediaResolver;

use crate::models::{InlineMedia, MediaReference};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn resolve(&self, reference: &MediaReference) -> Result<InlineMedia>;
}
