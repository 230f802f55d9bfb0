//! User-facing message text.
use textease_common::TextEaseError;
use textease_pipeline::{QualityReport, Strength};

/// Longest original text shown as one message.
pub const SINGLE_MESSAGE_CHARS: usize = 4096 - 100;
/// Budget for each part when the original is shown in pieces.
pub const ORIGINAL_PART_CHARS: usize = 3500;
/// The claim list is cut after this many characters.
pub const CLAIM_LIST_CHARS: usize = 3500;
/// Rewrites with more words than this may have lost their tail.
pub const LONG_RESULT_WORDS: usize = 300;

pub fn received(chars: usize, from_document: bool) -> String {
    if from_document {
        format!("Document loaded ({chars} characters). Choose a simplification level:")
    } else {
        format!("Text received ({chars} characters). Choose a simplification level:")
    }
}

pub fn simplified(text: &str, strength: Strength, report: &QualityReport) -> String {
    let mut out = format!("Simplified text ({strength}):\n\n{text}\n\n{}", quality(report));
    if report.rewritten_word_count > LONG_RESULT_WORDS {
        out.push_str("\n\nWarning: the text is long and may have been partially truncated.");
    }
    out
}

pub fn quality(report: &QualityReport) -> String {
    format!(
        "Quality:\nLength: {} -> {} words\nMeaning preservation (BLEU): {}/100\n{}",
        report.original_word_count,
        report.rewritten_word_count,
        report.similarity_score,
        report.hint
    )
}

pub fn translation(text: &str) -> String {
    format!("Translation:\n\n{text}")
}

pub fn claim_list(claims: &[String]) -> String {
    let mut list = claims
        .iter()
        .enumerate()
        .map(|(i, claim)| format!("{}. {claim}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    if list.chars().count() > CLAIM_LIST_CHARS {
        list = list.chars().take(CLAIM_LIST_CHARS).collect();
        list.push_str("\n\n... (truncated)");
    }
    format!("Claims:\n\n{list}")
}

pub fn claim_detail(index: usize, claim: &str, strength: Strength, rewrite: &str) -> String {
    format!(
        "Claim {}:\n\n{claim}\n\nSimplified ({strength}):\n\n{rewrite}",
        index + 1
    )
}

pub fn original(parts: &[String]) -> Vec<String> {
    match parts {
        [single] => vec![format!("Original text:\n\n{single}")],
        _ => parts
            .iter()
            .enumerate()
            .map(|(i, part)| format!("Original text (part {}):\n\n{part}", i + 1))
            .collect(),
    }
}

pub fn back(chars: usize) -> String {
    format!("Back to your text ({chars} characters). Choose a simplification level:")
}

pub const NO_CLAIMS: &str = "Could not extract any claims from this text.";

pub fn failure(err: &TextEaseError) -> String {
    match err {
        TextEaseError::EmptyInput => "Nothing to work with. Send some text to get started.".to_string(),
        TextEaseError::NotFound(what) => format!("Not found: {what}."),
        TextEaseError::TooLong { len, max } => {
            format!("The text is too long ({len} characters, limit {max}). Please send a shorter one.")
        }
        TextEaseError::Transformation(message) => {
            format!("Processing failed: {message}. You can try again.")
        }
        TextEaseError::Timeout => "This took too long and was cancelled. You can try again.".to_string(),
        TextEaseError::Config(_) | TextEaseError::Other(_) => {
            format!("Something went wrong: {err}")
        }
    }
}
