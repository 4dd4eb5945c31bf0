//! Data models and structures
//!
//! Defines the per-request values that flow through the generation pipeline
//! (media references, turns, artifacts) and the process configuration.

use serde::{Deserialize, Serialize};

/// An input image or file as supplied by the caller, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaReference {
    /// Bytes already held in memory, typically from a multipart upload.
    Inline {
        bytes: Vec<u8>,
        declared_mime_type: Option<String>,
    },
    /// A URL to fetch with a plain HTTP GET.
    Remote { url: String },
}

impl MediaReference {
    pub fn inline(bytes: Vec<u8>, declared_mime_type: Option<String>) -> Self {
        Self::Inline {
            bytes,
            declared_mime_type,
        }
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Self::Remote { url: url.into() }
    }
}

/// Media resolved into its transport form: base64 payload plus a non-empty MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineMedia {
    pub data: String,
    pub mime_type: String,
}

/// Everything one inbound call asks of the model.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub model_name: String,
    pub system_prompt: Option<String>,
    pub message: String,
    pub media: Option<MediaReference>,
    pub use_tools: bool,
    pub use_thinking: bool,
    /// Echoed back to the caller untouched. Nothing is stored under it.
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnPart {
    Text(String),
    InlineMedia(InlineMedia),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<TurnPart>,
}

/// One image in its final delivery form.
///
/// Which variant is produced is decided by the preset's output policy, never
/// by inspecting the value afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ImageResult {
    #[serde(rename_all = "camelCase")]
    Inline { data: String, mime_type: String },
    #[serde(rename_all = "camelCase")]
    File { url: String, mime_type: String },
    #[serde(skip_serializing)]
    Buffer { bytes: Vec<u8>, mime_type: String },
}

impl ImageResult {
    pub fn mime_type(&self) -> &str {
        match self {
            Self::Inline { mime_type, .. }
            | Self::File { mime_type, .. }
            | Self::Buffer { mime_type, .. } => mime_type,
        }
    }
}

/// Normalized output of one generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedArtifact {
    pub text: String,
    /// Text deltas in arrival order. Only populated on the streaming path.
    pub deltas: Vec<String>,
    pub images: Vec<ImageResult>,
}

impl GeneratedArtifact {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.images.is_empty()
    }
}

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub chat_model: String,
    pub image_model: String,
    pub output_dir: String,
    pub public_image_path: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        load_dotenv(dotenvy::dotenv())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            gemini_api_key: lookup("GEMINI_API_KEY")
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| crate::Error::Config("GEMINI_API_KEY not set".to_string()))?,
            gemini_base_url: var_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            chat_model: var_or("CHAT_MODEL", DEFAULT_CHAT_MODEL),
            image_model: var_or("IMAGE_MODEL", DEFAULT_IMAGE_MODEL),
            output_dir: var_or("OUTPUT_DIR", "public/images"),
            public_image_path: var_or("PUBLIC_IMAGE_PATH", "/images"),
            host: var_or("HOST", "0.0.0.0"),
            port: parse_var(&lookup, "PORT", 3000)?,
        })
    }
}

/// A missing `.env` is fine; one that exists but cannot be read is not.
fn load_dotenv<T>(result: dotenvy::Result<T>) -> crate::Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> crate::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| crate::Error::Config(format!("{} is not a valid number: {}", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert_eq!(config.chat_model, DEFAULT_CHAT_MODEL);
        assert_eq!(config.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.output_dir, "public/images");
        assert_eq!(config.public_image_path, "/images");
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_config_requires_api_key() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_config_rejects_bad_port() {
        let err = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "k"), ("PORT", "abc")]))
            .unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_missing_dotenv_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        load_dotenv(dotenvy::from_path(dir.path().join(".env"))).unwrap();
    }

    #[test]
    fn test_malformed_dotenv_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "GENMEDIA_TEST_BROKEN='unterminated\n").unwrap();

        let err = load_dotenv(dotenvy::from_path(&path)).unwrap_err();
        assert!(matches!(err, crate::Error::EnvVar(_)));
    }

    #[test]
    fn test_image_result_serialization() {
        let inline = ImageResult::Inline {
            data: "AAAA".to_string(),
            mime_type: "image/png".to_string(),
        };
        let json = serde_json::to_value(&inline).unwrap();
        assert_eq!(json, serde_json::json!({"data": "AAAA", "mimeType": "image/png"}));

        let file = ImageResult::File {
            url: "/images/generated_1.png".to_string(),
            mime_type: "image/png".to_string(),
        };
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"url": "/images/generated_1.png", "mimeType": "image/png"})
        );
    }

    #[test]
    fn test_empty_artifact() {
        assert!(GeneratedArtifact::default().is_empty());
    }
}
