//! Content assembly
//!
//! Builds the ordered turns for one model call. Pure: the same request and
//! resolved media always produce the same turns.

use crate::models::{GenerationRequest, InlineMedia, Role, Turn, TurnPart};

/// Assemble the turn sequence for `request`.
///
/// A non-empty system prompt becomes the leading turn. The final user turn
/// carries the message text first and the media part, if any, after it.
pub fn assemble(request: &GenerationRequest, media: Option<&InlineMedia>) -> Vec<Turn> {
    let mut turns = Vec::with_capacity(2);

    if let Some(system_prompt) = request
        .system_prompt
        .as_deref()
        .filter(|prompt| !prompt.trim().is_empty())
    {
        turns.push(Turn {
            role: Role::System,
            parts: vec![TurnPart::Text(system_prompt.to_string())],
        });
    }

    let mut parts = vec![TurnPart::Text(request.message.clone())];
    if let Some(media) = media {
        parts.push(TurnPart::InlineMedia(media.clone()));
    }

    turns.push(Turn {
        role: Role::User,
        parts,
    });

    turns
}
