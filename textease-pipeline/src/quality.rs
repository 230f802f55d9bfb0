//! Coarse quality signal for a rewrite: word counts and sentence-level BLEU
//! of the rewrite against the original.
//!
//! BLEU here follows the common `13a` tokenisation with exponential smoothing
//! and effective n-gram order, so short sentences still get credit. It
//! measures surface overlap only; a high score says little about whether
//! facts survived the rewrite.
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

const MAX_NGRAM_ORDER: usize = 4;
/// Scores strictly above this count as high preservation.
pub const HIGH_PRESERVATION_THRESHOLD: f64 = 50.0;

static TOKENIZE_13A: LazyLock<[(Regex, &'static str); 4]> = LazyLock::new(|| {
    [
        (
            Regex::new(r"([\{-~\[-`\x20-&\(-\+:-@/])").expect("static 13a symbol pattern"),
            " $1 ",
        ),
        (
            Regex::new(r"([^0-9])([\.,])").expect("static 13a period pattern"),
            "$1 $2 ",
        ),
        (
            Regex::new(r"([\.,])([^0-9])").expect("static 13a comma pattern"),
            " $1 $2",
        ),
        (
            Regex::new(r"([0-9])(-)").expect("static 13a dash pattern"),
            "$1 $2 ",
        ),
    ]
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityHint {
    HighPreservation,
    PartialDistortion,
}

impl QualityHint {
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_PRESERVATION_THRESHOLD {
            QualityHint::HighPreservation
        } else {
            QualityHint::PartialDistortion
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QualityHint::HighPreservation => "high preservation",
            QualityHint::PartialDistortion => "partial distortion",
        }
    }
}

impl fmt::Display for QualityHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub original_word_count: usize,
    pub rewritten_word_count: usize,
    /// BLEU in `[0, 100]`, rounded to two decimals.
    pub similarity_score: f64,
    pub hint: QualityHint,
}

/// Compare `rewritten` against `original`.
///
/// ```
/// use textease_pipeline::quality::{evaluate, QualityHint};
///
/// let report = evaluate("Кот спит на окне.", "Кот спит на окне.");
/// assert_eq!(report.similarity_score, 100.0);
/// assert_eq!(report.hint, QualityHint::HighPreservation);
/// assert_eq!(report.original_word_count, 4);
/// ```
pub fn evaluate(original: &str, rewritten: &str) -> QualityReport {
    let score = sentence_bleu(rewritten, original);
    let score = if score.is_finite() { score.clamp(0.0, 100.0) } else { 0.0 };
    QualityReport {
        original_word_count: original.split_whitespace().count(),
        rewritten_word_count: rewritten.split_whitespace().count(),
        similarity_score: (score * 100.0).round() / 100.0,
        hint: QualityHint::from_score(score),
    }
}

/// `13a` tokenisation: separate punctuation and symbols from words, keeping
/// decimal points and thousands separators inside numbers.
pub fn tokenize_13a(line: &str) -> Vec<String> {
    let mut line = line
        .replace("<skipped>", "")
        .replace("-\n", "")
        .replace('\n', " ");
    if line.contains('&') {
        line = line
            .replace("&quot;", "\"")
            .replace("&amp;", "&")
            .replace("&lt;", "<")
            .replace("&gt;", ">");
    }

    let mut padded = format!(" {line} ");
    for (pattern, replacement) in TOKENIZE_13A.iter() {
        padded = pattern.replace_all(&padded, *replacement).into_owned();
    }
    padded.split_whitespace().map(str::to_string).collect()
}

/// Smoothed sentence BLEU of `hypothesis` against a single `reference`.
pub fn sentence_bleu(hypothesis: &str, reference: &str) -> f64 {
    let hyp = tokenize_13a(hypothesis);
    let reference = tokenize_13a(reference);
    let hyp_ngrams = ngram_counts(&hyp);
    let ref_ngrams = ngram_counts(&reference);

    let mut correct = [0usize; MAX_NGRAM_ORDER];
    let mut total = [0usize; MAX_NGRAM_ORDER];
    for (ngram, count) in &hyp_ngrams {
        let n = ngram.len() - 1;
        total[n] += count;
        if let Some(ref_count) = ref_ngrams.get(ngram) {
            correct[n] += (*count).min(*ref_count);
        }
    }

    let sys_len = hyp.len();
    let ref_len = reference.len();
    let brevity_penalty = if sys_len >= ref_len {
        1.0
    } else if sys_len == 0 {
        0.0
    } else {
        (1.0 - ref_len as f64 / sys_len as f64).exp()
    };

    let mut precisions = [0.0f64; MAX_NGRAM_ORDER];
    let mut smooth = 1.0f64;
    let mut effective_order = MAX_NGRAM_ORDER;
    for n in 0..MAX_NGRAM_ORDER {
        if total[n] == 0 {
            break;
        }
        effective_order = n + 1;
        precisions[n] = if correct[n] == 0 {
            smooth *= 2.0;
            100.0 / (smooth * total[n] as f64)
        } else {
            100.0 * correct[n] as f64 / total[n] as f64
        };
    }

    let log_sum: f64 = precisions[..effective_order].iter().map(|p| safe_log(*p)).sum();
    brevity_penalty * (log_sum / effective_order as f64).exp()
}

fn safe_log(value: f64) -> f64 {
    if value == 0.0 {
        -9_999_999_999.0
    } else {
        value.ln()
    }
}

fn ngram_counts(tokens: &[String]) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    for n in 1..=MAX_NGRAM_ORDER {
        for window in tokens.windows(n) {
            *counts.entry(window).or_insert(0) += 1;
        }
    }
    counts
}
