//! Literal placeholder substitution for speaker names and line bodies.
use super::providers::IdentityProvider;

const PLAYER_TOKENS: [&str; 2] = ["[Player]", "{player}"];
const SUPPORTING_TOKENS: [&str; 2] = ["[Supporting Character]", "[Supporting]"];

/// Replaces every placeholder token with the identity provider's names.
///
/// Returns the input untouched when there is no provider or the text is empty.
pub fn resolve(text: &str, identity: Option<&dyn IdentityProvider>) -> String {
    let Some(identity) = identity else {
        return text.to_string();
    };
    if text.is_empty() || !contains_placeholder(text) {
        return text.to_string();
    }

    let player = identity.player_name();
    let supporting = identity.supporting_name();

    let mut resolved = text.to_string();
    for token in PLAYER_TOKENS {
        resolved = resolved.replace(token, &player);
    }
    for token in SUPPORTING_TOKENS {
        resolved = resolved.replace(token, &supporting);
    }
    resolved
}

pub fn contains_placeholder(text: &str) -> bool {
    PLAYER_TOKENS
        .iter()
        .chain(SUPPORTING_TOKENS.iter())
        .any(|token| text.contains(token))
}
