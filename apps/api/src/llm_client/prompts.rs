// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Instruction appended to every system prompt that expects structured output.
pub const JSON_ONLY_INSTRUCTION: &str = "Réponds UNIQUEMENT en JSON valide. \
    N'ajoute AUCUN texte avant ou après l'objet JSON. \
    N'utilise PAS de blocs de code markdown.";

/// Placeholder rendered for profile fields the player left empty.
pub const UNSPECIFIED: &str = "Non spécifié";

pub const PING_PROMPT: &str = "Test de connexion";

/// Fills `{key}` placeholders in a single pass. Substituted values are never
/// rescanned, so user text that looks like a placeholder stays literal.
/// Unknown `{...}` spans (JSON skeletons) are copied through untouched.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (close, *value))
        });
        match hit {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
