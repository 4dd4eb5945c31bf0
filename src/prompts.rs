//! Fixed instructions sent by the image-to-image presets.
//!
//! The text lives under `data/prompts/` and is treated as opaque: the pipeline
//! sends it verbatim as the user turn's text part.

pub const FIGURINE: &str = include_str!("../data/prompts/figurine.txt");
pub const HIJAB: &str = include_str!("../data/prompts/hijab.txt");
pub const SDMTINGGI: &str = include_str!("../data/prompts/sdmtinggi.txt");
pub const HITAM: &str = include_str!("../data/prompts/hitam.txt");
