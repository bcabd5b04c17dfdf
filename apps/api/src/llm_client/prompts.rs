// Cross-cutting prompt fragments shared by more than one agent.
// Each agent defines its own task prompt in agents/prompts.rs; this file holds
// only the instructions that must stay identical across agents.

/// Instruction that enforces JSON-only output. Appended to every agent prompt
/// whose response feeds the structured extractor.
pub const JSON_ONLY_REMINDER: &str = "\
    Return ONLY valid JSON. No markdown, no code blocks, no text outside the \
    JSON object, no explanations or apologies.";

/// Mustache placeholders are a data contract with the renderer. Both the
/// analysis and the layout agent must leave them untouched.
pub const PRESERVE_MUSTACHE_INSTRUCTION: &str = "\
    PRESERVE ALL Mustache/Handlebars syntax EXACTLY: {{#section}} must remain \
    {{#section}}, {{variable}} must remain {{variable}}. Do NOT escape braces.";
