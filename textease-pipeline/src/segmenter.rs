use crate::sentences::SentenceSplitter;
use std::sync::Arc;

/// Greedily pack `sentences` into space-joined chunks of at most `budget`
/// characters.
///
/// The joining space counts toward the budget. A sentence that alone exceeds
/// `budget` becomes its own chunk rather than being cut. Blank sentences are
/// skipped, so the result is empty only when every sentence was blank.
///
/// ```
/// use textease_pipeline::segmenter::accumulate_sentences_by_budget;
///
/// let chunks = accumulate_sentences_by_budget(["Один.", "Два.", "Очень длинное третье."], 10);
/// assert_eq!(chunks, vec!["Один. Два.", "Очень длинное третье."]);
/// ```
pub fn accumulate_sentences_by_budget<I, S>(sentences: I, budget: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in sentences {
        let sentence = sentence.as_ref().trim();
        if sentence.is_empty() {
            continue;
        }
        let len = sentence.chars().count();

        if current.is_empty() {
            current.push_str(sentence);
            current_len = len;
        } else if current_len + 1 + len <= budget {
            current.push(' ');
            current.push_str(sentence);
            current_len += 1 + len;
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(sentence);
            current_len = len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Splits text into sentence-respecting chunks under a character budget.
#[derive(Clone)]
pub struct Segmenter {
    splitter: Arc<dyn SentenceSplitter>,
}

impl Segmenter {
    pub fn new(splitter: Arc<dyn SentenceSplitter>) -> Self {
        Self { splitter }
    }

    pub fn splitter(&self) -> &Arc<dyn SentenceSplitter> {
        &self.splitter
    }

    /// Chunks of `text` in original order. Non-blank input yields at least
    /// one chunk; a budget of zero is treated as one character.
    pub fn segment(&self, text: &str, max_chars: usize) -> Vec<String> {
        let sentences = self.splitter.split(text);
        tracing::trace!(
            splitter = self.splitter.name(),
            sentences = sentences.len(),
            max_chars,
            "segmenting text"
        );
        accumulate_sentences_by_budget(sentences, max_chars.max(1))
    }
}

impl std::fmt::Debug for Segmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segmenter")
            .field("splitter", &self.splitter.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentences::{LocaleSentenceSplitter, RegexSentenceSplitter, RUSSIAN};

    fn normalize(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn russian() -> Segmenter {
        Segmenter::new(Arc::new(LocaleSentenceSplitter::new(RUSSIAN)))
    }

    const SAMPLE: &str = "Мороз и солнце; день чудесный!  Ещё ты дремлешь, друг прелестный?\n\
        Пора, красавица, проснись. Открой сомкнуты негой взоры. \
        Навстречу северной Авроры звездою севера явись!";

    #[test]
    fn chunks_rejoin_to_the_normalized_input() {
        for budget in [1, 10, 40, 80, 2000] {
            let chunks = russian().segment(SAMPLE, budget);
            assert!(!chunks.is_empty());
            assert_eq!(normalize(&chunks.join(" ")), normalize(SAMPLE), "budget {budget}");
        }
    }

    #[test]
    fn only_single_sentences_exceed_the_budget() {
        let segmenter = russian();
        let sentences = segmenter.splitter().split(SAMPLE);
        for budget in [10, 40, 80] {
            for chunk in segmenter.segment(SAMPLE, budget) {
                if chunk.chars().count() > budget {
                    assert!(sentences.contains(&chunk), "oversized chunk {chunk:?} is not one sentence");
                }
            }
        }
    }

    #[test]
    fn lowercase_text_respects_the_budget() {
        let text = "солнце встаёт на востоке и светит всем. ".repeat(120);
        let chunks = russian().segment(&text, 2000);
        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 2000));
        assert_eq!(normalize(&chunks.join(" ")), normalize(&text));
    }

    #[test]
    fn generous_budget_keeps_one_chunk() {
        let chunks = russian().segment("Первое. Второе. Третье.", 2000);
        assert_eq!(chunks, vec!["Первое. Второе. Третье."]);
    }

    #[test]
    fn join_space_counts_toward_budget() {
        // "ab." + " " + "cd." is seven characters.
        assert_eq!(accumulate_sentences_by_budget(["ab.", "cd."], 7), vec!["ab. cd."]);
        assert_eq!(accumulate_sentences_by_budget(["ab.", "cd."], 6), vec!["ab.", "cd."]);
    }

    #[test]
    fn budget_counts_characters_not_bytes() {
        let chunks = accumulate_sentences_by_budget(["Ёж.", "Ум."], 7);
        assert_eq!(chunks, vec!["Ёж. Ум."]);
    }

    #[test]
    fn blank_input_yields_no_chunks() {
        let segmenter = Segmenter::new(Arc::new(RegexSentenceSplitter));
        assert!(segmenter.segment("  \n ", 100).is_empty());
        assert!(accumulate_sentences_by_budget(["", "  "], 5).is_empty());
    }
}
