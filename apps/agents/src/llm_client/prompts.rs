// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that asks for a single JSON object.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    Respond with one valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT include explanations or apologies.";

/// Appended to prompts whose answer is parsed for a single JSON object.
pub const SINGLE_OBJECT_INSTRUCTION: &str = "\
    Return exactly one JSON object. Do not include example objects, \
    alternative answers or commentary before or after it.";
