//! Output materialization
//!
//! Turns generated base64 image payloads into their delivery form: a file
//! under the public output directory, a raw byte buffer, or left inline.

pub mod materializer;

pub use materializer::ImageMaterializer;
