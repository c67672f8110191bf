//! Prompt construction and reply cleanup for suggestion and insight calls.

const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("bg", "Bulgarian"),
    ("ca", "Catalan"),
    ("cs", "Czech"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("en", "English"),
    ("es", "Spanish"),
    ("et", "Estonian"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("hr", "Croatian"),
    ("hu", "Hungarian"),
    ("id", "Indonesian"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("lt", "Lithuanian"),
    ("lv", "Latvian"),
    ("nb", "Norwegian Bokmål"),
    ("nl", "Dutch"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("pt_br", "Brazilian Portuguese"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sk", "Slovak"),
    ("sl", "Slovenian"),
    ("sv", "Swedish"),
    ("th", "Thai"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("vi", "Vietnamese"),
    ("zh_hans", "Simplified Chinese"),
    ("zh_hant", "Traditional Chinese"),
    ("zh", "Chinese"),
];

/// Human-readable language name for a Weblate language code, falling back to the code.
pub fn language_name(code: &str) -> String {
    let normalized = code.trim().to_lowercase().replace('-', "_");
    let lookup = |key: &str| {
        LANGUAGE_NAMES
            .iter()
            .find(|(c, _)| *c == key)
            .map(|(_, name)| name.to_string())
    };

    lookup(normalized.as_str())
        .or_else(|| normalized.split('_').next().and_then(lookup))
        .unwrap_or_else(|| code.to_string())
}

pub fn suggestion_system_prompt(
    source_language: &str,
    target_language: &str,
    domain_context: &str,
    insights: &str,
) -> String {
    let mut prompt = format!(
        "Translate the following from {} to {}, considering the following context: {}. \
         Do not chat, just translate.\n",
        language_name(source_language),
        language_name(target_language),
        domain_context
    );

    if !insights.trim().is_empty() {
        prompt.push_str("Insights from previous corrections:\n");
        prompt.push_str(insights.trim());
        prompt.push('\n');
    }

    prompt
}

/// User message: source strings one per line, plus the unit's disambiguation context.
pub fn suggestion_user_content(sources: &[String], unit_context: Option<&str>) -> String {
    let mut content = sources.join("\n");
    if let Some(ctx) = unit_context.filter(|c| !c.trim().is_empty()) {
        content.push_str(&format!("\n\n[Context for reference - DO NOT translate this part]\n{}", ctx.trim()));
    }
    content
}

pub const INSIGHT_SYSTEM_PROMPT: &str = "Analyze the differences between the prefill and the validated \
     translation, and provide insights to improve future translations. \
     Answer with a single short rule on one line.";

pub fn insight_user_content(original: &[String], prefill: &[String], validated: &[String]) -> String {
    format!(
        "Original Text: {}\nPrefilled Translation: {}\nValidated Translation: {}",
        original.join(" | "),
        prefill.join(" | "),
        validated.join(" | ")
    )
}

/// Strip labels and wrapping quotes the model sometimes adds around a translation.
pub fn clean_suggestion(reply: &str, source: &str) -> String {
    let mut text = reply.trim();

    for label in ["Translation:", "Traduction:"] {
        if let Some(rest) = text.strip_prefix(label) {
            text = rest.trim_start();
        }
    }

    let source_quoted = source.trim_start().starts_with('"');
    if !source_quoted && text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        text = &text[1..text.len() - 1];
    }

    text.trim().to_string()
}

/// Collapse a reply onto one line so the insight log stays newline-delimited.
pub fn one_line(reply: &str) -> String {
    reply
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
