// Cross-cutting prompt fragments. Each feature keeps its own prompts.rs next to it
// and appends these where they apply.

/// Appended to every system prompt that expects a JSON answer.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps the model from inventing resume content the user never stated.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    CRITICAL: Only use information explicitly present in the input you are given. \
    Do NOT infer employers, dates, metrics, or technologies that were not stated. \
    If something is unclear, leave it out.";

/// Replaces `{name}` placeholders in a single pass over `template`. Inserted values are
/// never rescanned, so placeholder text inside a value stays literal.
pub fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let next = values
            .iter()
            .filter(|(key, _)| !key.is_empty())
            .filter_map(|&(key, value)| rest.find(key).map(|at| (at, key, value)))
            .min_by_key(|&(at, _, _)| at);
        let Some((at, key, value)) = next else {
            break;
        };
        out.push_str(&rest[..at]);
        out.push_str(value);
        rest = &rest[at + key.len()..];
    }
    out.push_str(rest);
    out
}
