//! Normalisation of raw model output.
use regex::Regex;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<extra_id_\d+>").expect("static placeholder pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static whitespace pattern"));
static REWRITE_ECHO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Текст:\s*").expect("static rewrite echo pattern"));
static TRANSLATION_ECHO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Text:\s*").expect("static translation echo pattern"));

/// Drop sentinel placeholders, collapse whitespace and strip a leading
/// `Текст:` the simplifier sometimes echoes.
pub fn clean_rewrite(raw: &str) -> String {
    let without_placeholders = PLACEHOLDER.replace_all(raw, "");
    let collapsed = collapse_whitespace(&without_placeholders);
    REWRITE_ECHO.replace(&collapsed, "").into_owned()
}

/// Strip a leading `Text:` echo from a translation.
pub fn clean_translation(raw: &str) -> String {
    TRANSLATION_ECHO.replace(raw.trim(), "").into_owned()
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}
