//! Transform presets
//!
//! Each user-facing transform is a fixed configuration record over the same
//! pipeline: an optional literal prompt, an input contract, a dispatch mode and
//! an output policy.

use crate::ai::{DispatchMode, Modality};
use crate::models::GenerationRequest;
use crate::{prompts, Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetKind {
    Chat,
    ImageGenerate,
    Figurine,
    Hijab,
    Sdmtinggi,
    Hitam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputContract {
    TextPlusOptionalMedia,
    TextOnly,
    SingleRequiredMedia,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputPolicy {
    /// Leave images as base64 for a JSON body.
    Inline,
    /// Write images under the output directory and return their URL.
    File,
    /// Decode images to raw bytes for a binary body.
    Buffer,
}

/// Which configured default model a preset falls back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelClass {
    Text,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub kind: PresetKind,
    #[serde(skip)]
    pub fixed_prompt: Option<&'static str>,
    pub input: InputContract,
    pub mode: DispatchMode,
    pub output: OutputPolicy,
    pub modalities: &'static [Modality],
    pub model_class: ModelClass,
}

const TEXT_ONLY: &[Modality] = &[Modality::Text];
const TEXT_AND_IMAGE: &[Modality] = &[Modality::Text, Modality::Image];

const fn image_transform(kind: PresetKind, prompt: &'static str) -> Preset {
    Preset {
        kind,
        fixed_prompt: Some(prompt),
        input: InputContract::SingleRequiredMedia,
        mode: DispatchMode::Single,
        output: OutputPolicy::Buffer,
        modalities: TEXT_AND_IMAGE,
        model_class: ModelClass::Image,
    }
}

impl PresetKind {
    pub const ALL: [PresetKind; 6] = [
        PresetKind::Chat,
        PresetKind::ImageGenerate,
        PresetKind::Figurine,
        PresetKind::Hijab,
        PresetKind::Sdmtinggi,
        PresetKind::Hitam,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PresetKind::Chat => "chat",
            PresetKind::ImageGenerate => "image-generate",
            PresetKind::Figurine => "figurine",
            PresetKind::Hijab => "hijab",
            PresetKind::Sdmtinggi => "sdmtinggi",
            PresetKind::Hitam => "hitam",
        }
    }

    pub fn preset(&self) -> Preset {
        match self {
            PresetKind::Chat => Preset {
                kind: *self,
                fixed_prompt: None,
                input: InputContract::TextPlusOptionalMedia,
                mode: DispatchMode::Streaming,
                output: OutputPolicy::Inline,
                modalities: TEXT_ONLY,
                model_class: ModelClass::Text,
            },
            PresetKind::ImageGenerate => Preset {
                kind: *self,
                fixed_prompt: None,
                input: InputContract::TextOnly,
                mode: DispatchMode::Single,
                output: OutputPolicy::Inline,
                modalities: TEXT_AND_IMAGE,
                model_class: ModelClass::Image,
            },
            PresetKind::Figurine => image_transform(*self, prompts::FIGURINE),
            PresetKind::Hijab => image_transform(*self, prompts::HIJAB),
            PresetKind::Sdmtinggi => image_transform(*self, prompts::SDMTINGGI),
            PresetKind::Hitam => image_transform(*self, prompts::HITAM),
        }
    }
}

impl fmt::Display for PresetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PresetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PresetKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::Validation(format!("Unknown preset '{}'", s)))
    }
}

impl Preset {
    /// Check the request against the input contract.
    ///
    /// Runs before any media fetch or model call.
    pub fn validate(&self, request: &GenerationRequest) -> Result<()> {
        match self.input {
            InputContract::SingleRequiredMedia => {
                if request.media.is_none() {
                    return Err(Error::Validation(format!(
                        "An image is required for the {} transform",
                        self.kind
                    )));
                }
            }
            InputContract::TextOnly => {
                if request.message.trim().is_empty() {
                    return Err(Error::Validation("A prompt is required".to_string()));
                }
                if request.media.is_some() {
                    return Err(Error::Validation(format!(
                        "The {} preset does not accept media",
                        self.kind
                    )));
                }
            }
            InputContract::TextPlusOptionalMedia => {
                if request.message.trim().is_empty() {
                    return Err(Error::Validation("A message is required".to_string()));
                }
            }
        }
        Ok(())
    }

    /// Apply the fixed prompt and the fallback model to `request`.
    pub fn prepare(
        &self,
        mut request: GenerationRequest,
        default_model: &str,
    ) -> GenerationRequest {
        if let Some(prompt) = self.fixed_prompt {
            request.message = prompt.to_string();
        }
        if request.model_name.trim().is_empty() {
            request.model_name = default_model.to_string();
        }
        request
    }
}
