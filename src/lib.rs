//! Multimodal generation service - turns text and images into generated
//! text and images through an external generative model.
//!
//! Requests flow through media resolution, content assembly, model dispatch,
//! response aggregation and image materialization, specialized per endpoint by
//! a fixed preset.

pub mod aggregate;
pub mod ai;
pub mod assemble;
pub mod error;
pub mod image;
pub mod media;
pub mod models;
pub mod pipeline;
pub mod presets;
pub mod prompts;
pub mod server;

pub use error::{Error, Result};
