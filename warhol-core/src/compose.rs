//! Prompt Composition
//!
//! Fragment order is fixed: style identity, character, user intent, exclusions.

use crate::profiles::{CharacterProfile, StyleProfile};

const SEPARATOR: &str = ". ";

/// Build the final prompt sent to a provider
pub fn compose_prompt(
    style: &StyleProfile,
    character: Option<&CharacterProfile>,
    prompt: &str,
) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(style.prompt_prefix.len() + 6);

    parts.push(style.description.clone());
    parts.extend(style.prompt_prefix.iter().cloned());

    if let Some(character) = character {
        parts.extend(character_fragments(character));
    }

    parts.push(prompt.to_string());

    if !style.negative_prompt.is_empty() {
        parts.push(format!("Avoid: {}", style.negative_prompt.join(", ")));
    }

    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

fn character_fragments(character: &CharacterProfile) -> Vec<String> {
    if !character.prompt.is_empty() {
        return vec![character.prompt.clone()];
    }

    let mut fragments = vec![character.description.clone()];
    if !character.traits.is_empty() {
        fragments.push(format!("Traits: {}", character.traits.join(", ")));
    }
    if !character.outfit.is_empty() {
        fragments.push(format!("Outfit: {}", character.outfit.join(", ")));
    }
    fragments
}
