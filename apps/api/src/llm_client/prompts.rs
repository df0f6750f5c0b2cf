// Shared prompt constants and prompt-building utilities.
// Each feature that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to every prompt that rewrites user content.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Only use facts present in the provided resume or profile data. \
    Do NOT invent employers, dates, metrics, degrees, or technologies. \
    If a detail is missing, leave it out rather than guessing.";

/// Style rules shared by bullet-writing prompts.
pub const BULLET_STYLE: &str = "\
    Each bullet starts with a strong past-tense action verb, \
    fits on one or two printed lines, quantifies impact where the source supports it, \
    and never uses first-person pronouns.";

/// Builds a system prompt from a role statement plus the JSON-only rule.
pub fn json_system(role: &str) -> String {
    format!("{role} {JSON_ONLY}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_system_appends_rule() {
        let system = json_system("You are a resume editor.");
        assert!(system.starts_with("You are a resume editor."));
        assert!(system.contains("valid JSON only"));
    }
}
