/// Splits raw text into the words shown one at a time.
///
/// Any run of whitespace separates words; leading and trailing whitespace is
/// dropped. Punctuation and case are kept exactly as written.
pub fn words(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_owned).collect()
}

/// Number of words `raw` would produce, without allocating them.
pub fn word_count(raw: &str) -> usize {
    raw.split_whitespace().count()
}

/// Result of applying a word ceiling to a piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncated {
    pub text: String,
    pub kept_words: usize,
    pub dropped_words: usize,
}

impl Truncated {
    pub fn was_truncated(&self) -> bool {
        self.dropped_words > 0
    }
}

/// Keeps the first `max_words` words of `raw`.
///
/// Text already within the limit comes back untouched. Otherwise the kept words
/// are rejoined with single spaces, so the original spacing and line breaks
/// between them are lost.
pub fn truncate_to_limit(raw: &str, max_words: usize) -> Truncated {
    let total = word_count(raw);
    if total <= max_words {
        return Truncated {
            text: raw.to_owned(),
            kept_words: total,
            dropped_words: 0,
        };
    }

    let text = raw
        .split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ");

    Truncated {
        text,
        kept_words: max_words,
        dropped_words: total - max_words,
    }
}
