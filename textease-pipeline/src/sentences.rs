//! Sentence boundary detection.
//!
//! [`LocaleSentenceSplitter`] knows the abbreviations and quoting habits of a
//! language; [`RegexSentenceSplitter`] only splits on `.`, `!` or `?` followed
//! by whitespace. [`sentence_splitter_for`] picks the localized splitter when
//! rules exist for the language and degrades to the regex one otherwise.
//!
//! Both splitters are lossless up to whitespace: joining their output with
//! single spaces reproduces the input with whitespace runs collapsed.
use regex::Regex;
use std::sync::{Arc, LazyLock};

static REGEX_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("static boundary pattern"));

pub trait SentenceSplitter: Send + Sync {
    /// Split `text` into trimmed, non-empty sentences in original order.
    fn split(&self, text: &str) -> Vec<String>;

    /// Short identifier for logs.
    fn name(&self) -> &str;
}

/// Language-agnostic splitter: a boundary is `.`, `!` or `?` followed by whitespace.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexSentenceSplitter;

impl SentenceSplitter for RegexSentenceSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut start = 0;
        for m in REGEX_BOUNDARY.find_iter(text) {
            // The terminator is a single ASCII byte.
            push_trimmed(&mut sentences, &text[start..m.start() + 1]);
            start = m.end();
        }
        push_trimmed(&mut sentences, &text[start..]);
        sentences
    }

    fn name(&self) -> &str {
        "regex"
    }
}

/// Abbreviation and punctuation rules for one language.
#[derive(Debug, Clone, Copy)]
pub struct LocaleRules {
    pub code: &'static str,
    /// Lowercase, without the trailing period.
    pub abbreviations: &'static [&'static str],
    /// Abbreviations that often close a sentence ("и т.д."); a capitalised
    /// word after them starts a new one.
    pub terminal_abbreviations: &'static [&'static str],
    /// Single-letter words that are not initials when standing alone.
    pub single_letter_words: &'static [&'static str],
}

pub const RUSSIAN: LocaleRules = LocaleRules {
    code: "ru",
    abbreviations: &[
        "т.е", "т.д", "т.п", "т.к", "т.н", "и.о", "др", "пр", "см", "ср", "г", "гг", "в", "вв",
        "им", "ул", "пр-т", "пер", "д", "кв", "стр", "с", "рис", "табл", "гл", "ст", "п", "пп",
        "проф", "акад", "доц", "тыс", "млн", "млрд", "руб", "коп", "обл", "р", "напр", "англ",
        "лат", "греч", "франц", "нем", "ок", "прим", "ред", "изд", "чел", "мин", "сек", "ч",
    ],
    terminal_abbreviations: &["т.д", "т.п", "др", "пр", "гг", "вв", "тыс", "млн", "млрд", "руб", "коп"],
    single_letter_words: &["я"],
};

pub const ENGLISH: LocaleRules = LocaleRules {
    code: "en",
    abbreviations: &[
        "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "inc",
        "ltd", "co", "corp", "dept", "fig", "no", "vol", "approx", "jan", "feb", "mar", "apr",
        "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec", "u.s", "u.k",
    ],
    terminal_abbreviations: &["etc", "inc", "ltd", "co", "corp"],
    single_letter_words: &["i"],
};

impl LocaleRules {
    pub fn for_language(language: &str) -> Option<Self> {
        match language.trim().to_lowercase().as_str() {
            "ru" | "rus" | "russian" => Some(RUSSIAN),
            "en" | "eng" | "english" => Some(ENGLISH),
            _ => None,
        }
    }
}

/// Rule-based splitter for a specific language.
///
/// ```
/// use textease_pipeline::sentences::{LocaleSentenceSplitter, SentenceSplitter, RUSSIAN};
///
/// let splitter = LocaleSentenceSplitter::new(RUSSIAN);
/// let sentences = splitter.split("В 1837 г. умер А. С. Пушкин. Об этом знают все!");
/// assert_eq!(
///     sentences,
///     vec!["В 1837 г. умер А. С. Пушкин.", "Об этом знают все!"]
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LocaleSentenceSplitter {
    rules: LocaleRules,
}

impl LocaleSentenceSplitter {
    pub fn new(rules: LocaleRules) -> Self {
        Self { rules }
    }

    /// Whether the single period closing `preceding` belongs to an
    /// abbreviation or an initial, so `following` continues the sentence.
    fn period_continues(&self, preceding: &str, following: &str) -> bool {
        let mut words = preceding.split_whitespace().rev();
        let Some(token) = words.next().map(strip_leading_marks) else {
            return false;
        };
        if token.is_empty() {
            return false;
        }
        let lower = token.to_lowercase();

        if is_initial(token) {
            // "А. С. Пушкин" is a name; "сказал Я. Потом" is a pronoun.
            if !self.rules.single_letter_words.contains(&lower.as_str()) {
                return true;
            }
            let next = following.split_whitespace().next();
            return words.next().is_some_and(is_dotted_initial) || next.is_some_and(is_dotted_initial);
        }

        let known = self.rules.abbreviations.contains(&lower.as_str())
            // Dotted forms like "т.е" or "e.g" that are not in the list.
            || (lower.contains('.') && lower.split('.').all(|part| part.chars().count() <= 2));
        if !known {
            return false;
        }
        let capital_next = following.chars().next().is_some_and(char::is_uppercase);
        !(capital_next && self.rules.terminal_abbreviations.contains(&lower.as_str()))
    }
}

impl SentenceSplitter for LocaleSentenceSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut sentences = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < chars.len() {
            let (offset, c) = chars[i];

            if c == '\n' {
                let mut k = i + 1;
                while k < chars.len() && chars[k].1.is_whitespace() && chars[k].1 != '\n' {
                    k += 1;
                }
                if k < chars.len() && chars[k].1 == '\n' {
                    // Blank line: paragraph boundary.
                    push_trimmed(&mut sentences, &text[start..offset]);
                    start = offset;
                    i = k + 1;
                    continue;
                }
                i += 1;
                continue;
            }

            if !is_terminator(c) {
                i += 1;
                continue;
            }

            let mut j = i;
            while j < chars.len() && is_terminator(chars[j].1) {
                j += 1;
            }
            let single_period = j - i == 1 && c == '.';
            while j < chars.len() && is_closing(chars[j].1) {
                j += 1;
            }

            let at_end = j == chars.len();
            if !at_end && !chars[j].1.is_whitespace() {
                i = j;
                continue;
            }

            let mut k = j;
            while k < chars.len() && chars[k].1.is_whitespace() {
                k += 1;
            }
            // `!`, `?`, `…` and runs always close a sentence; a lone period
            // does unless it ends an abbreviation or an initial.
            let following = chars.get(k).map_or("", |&(o, _)| &text[o..]);
            let continues = single_period && self.period_continues(&text[start..offset], following);

            if continues {
                i = j;
            } else {
                let end = chars.get(j).map_or(text.len(), |&(o, _)| o);
                push_trimmed(&mut sentences, &text[start..end]);
                start = end;
                i = k;
            }
        }

        push_trimmed(&mut sentences, &text[start..]);
        sentences
    }

    fn name(&self) -> &str {
        self.rules.code
    }
}

/// Splitter for `language`, degrading to [`RegexSentenceSplitter`] when no
/// rules exist. Never fails; degradation is logged for diagnosis.
pub fn sentence_splitter_for(language: &str) -> Arc<dyn SentenceSplitter> {
    match LocaleRules::for_language(language) {
        Some(rules) => Arc::new(LocaleSentenceSplitter::new(rules)),
        None => {
            tracing::warn!(
                target: "textease::sentences",
                language,
                "no sentence rules for language; tokenization degraded to regex splitter"
            );
            Arc::new(RegexSentenceSplitter)
        }
    }
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…')
}

fn is_closing(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '»' | '”' | '’')
}

fn strip_leading_marks(word: &str) -> &str {
    word.trim_start_matches(|c: char| !c.is_alphanumeric())
}

/// A single capital letter, such as "А" in "А. С. Пушкин".
fn is_initial(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(first), None) if first.is_uppercase())
}

fn is_dotted_initial(word: &str) -> bool {
    strip_leading_marks(word)
        .strip_suffix('.')
        .is_some_and(is_initial)
}

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        out.push(piece.to_string());
    }
}
