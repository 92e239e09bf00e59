// Shared prompt fragments and prompt-building utilities.
// Each stage owns its own prompt text in agents/prompts.rs; this file holds
// only the cross-cutting pieces.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to every user prompt, naming the exact schema expected.
pub const SCHEMA_INSTRUCTION: &str =
    "Return a JSON object with this EXACT schema (no extra fields, nulls allowed where shown):";

/// Joins a stage's role description with the JSON-only rules.
pub fn system_prompt(role: &str) -> String {
    format!("{}\n\n{JSON_ONLY_SYSTEM}", role.trim_end())
}

/// Appends the expected output schema to a user prompt.
pub fn with_schema(prompt: &str, schema: &str) -> String {
    format!("{}\n\n{SCHEMA_INSTRUCTION}\n{}", prompt.trim_end(), schema.trim())
}

/// Fills `{name}` placeholders in a prompt template in a single pass.
/// Substituted values are never scanned again, and braces that do not
/// name a known variable are kept as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(var, _)| *var == name)
                .map(|(_, value)| (*value, close))
        });
        match hit {
            Some((value, close)) => {
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

/// Renders a list as indented bullet lines, or `fallback` when empty.
pub fn bullet_list<S: AsRef<str>>(items: &[S], fallback: &str) -> String {
    if items.is_empty() {
        return fallback.to_string();
    }
    items
        .iter()
        .map(|item| format!("  - {}", item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Joins a list with commas, or `fallback` when empty.
pub fn comma_list<S: AsRef<str>>(items: &[S], fallback: &str) -> String {
    if items.is_empty() {
        return fallback.to_string();
    }
    items
        .iter()
        .map(|item| item.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Truncates to at most `max_chars` characters, appending `...` when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_all_placeholders() {
        let out = render("Hi {name}, role {role}. Bye {name}.", &[("name", "Jane"), ("role", "DS")]);
        assert_eq!(out, "Hi Jane, role DS. Bye Jane.");
    }

    #[test]
    fn test_render_does_not_expand_substituted_values() {
        let out = render(
            "CV: {cv}\nJob: {job_title}",
            &[("cv", "Wrote {job_title} templates"), ("job_title", "Data Scientist")],
        );
        assert_eq!(out, "CV: Wrote {job_title} templates\nJob: Data Scientist");
    }

    #[test]
    fn test_render_keeps_unknown_braces() {
        let out = render("{ \"a\": {name} } {missing} {", &[("name", "Jane")]);
        assert_eq!(out, "{ \"a\": Jane } {missing} {");
    }

    #[test]
    fn test_system_prompt_appends_json_rules() {
        let out = system_prompt("You are a parser.\n");
        assert!(out.starts_with("You are a parser.\n\n"));
        assert!(out.ends_with(JSON_ONLY_SYSTEM));
    }

    #[test]
    fn test_with_schema() {
        let out = with_schema("Parse this.", " {\"a\": 1} ");
        assert_eq!(out, format!("Parse this.\n\n{SCHEMA_INSTRUCTION}\n{{\"a\": 1}}"));
    }

    #[test]
    fn test_bullet_list_and_fallback() {
        assert_eq!(bullet_list(&["a", "b"], "none"), "  - a\n  - b");
        assert_eq!(bullet_list::<&str>(&[], "none"), "none");
    }

    #[test]
    fn test_comma_list() {
        assert_eq!(comma_list(&["a".to_string(), "b".to_string()], "-"), "a, b");
        assert_eq!(comma_list::<String>(&[], "None"), "None");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("héllo world", 5), "héllo...");
        assert_eq!(truncate("short", 10), "short");
    }
}
