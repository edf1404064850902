use crate::error::IndexError;
use crate::models::IndexPlan;
use regex::Regex;

/// Canonicalizes whitespace and dot runs in extracted text.
///
/// Steps run in a fixed order: whitespace first, because the dot-space step only
/// sees `". "` sequences once line breaks and tabs have become single spaces.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    spaces: Regex,
    dot_spaces: Regex,
    dots: Regex,
}

impl TextNormalizer {
    pub fn new() -> Result<Self, IndexError> {
        Ok(Self {
            spaces: Regex::new(r"\s+")?,
            dot_spaces: Regex::new(r"(\. )+")?,
            dots: Regex::new(r"\.+")?,
        })
    }

    pub fn normalize(&self, text: &str) -> String {
        let text = self.collapse_whitespace(text);
        let text = self.collapse_dot_spaces(&text);
        self.collapse_dots(&text)
    }

    fn collapse_whitespace(&self, text: &str) -> String {
        self.spaces.replace_all(text, " ").into_owned()
    }

    fn collapse_dot_spaces(&self, text: &str) -> String {
        self.dot_spaces.replace_all(text, ". ").into_owned()
    }

    fn collapse_dots(&self, text: &str) -> String {
        self.dots.replace_all(text, ".").into_owned()
    }
}

/// Splits normalized text on single spaces and packs whole words into chunks.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    size: usize,
}

impl Chunker {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    pub fn enabled(&self) -> bool {
        self.size > 1
    }

    pub fn plan(&self, normalized: String) -> IndexPlan {
        if self.enabled() {
            IndexPlan::Chunks(chunk_by_words(&normalized, self.size))
        } else {
            IndexPlan::Whole(normalized)
        }
    }
}

/// Words are appended to a buffer separated by one space. Once the buffer reaches
/// `size - 1` bytes it is emitted as a chunk. A word longer than that becomes an
/// oversized chunk of its own; words are never split.
pub fn chunk_by_words(text: &str, size: usize) -> Vec<String> {
    if size <= 1 {
        return vec![text.to_string()];
    }

    let threshold = size - 1;
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split(' ') {
        current.push_str(word);
        if current.len() >= threshold {
            chunks.push(std::mem::take(&mut current));
        } else {
            current.push(' ');
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::new().expect("normalizer patterns compile")
    }

    #[test]
    fn whitespace_and_dots_are_collapsed() {
        assert_eq!(normalizer().normalize("Hello   world..  .  foo"), "Hello world. foo");
        assert_eq!(normalizer().normalize("A  \t  lot\nof   spacing"), "A lot of spacing");
        assert_eq!(normalizer().normalize("end. . . next...."), "end. next.");
    }

    #[test]
    fn normalization_order_matters() {
        let n = normalizer();
        let input = "a .\n. b";

        let conforming = n.normalize(input);
        let reordered = {
            let text = n.collapse_dot_spaces(input);
            let text = n.collapse_dots(&text);
            n.collapse_whitespace(&text)
        };

        assert_eq!(conforming, "a . b");
        assert_eq!(reordered, "a . . b");
        assert_ne!(conforming, reordered);
    }

    /// Straightforward restatement of the accumulate/flush rule used as an oracle.
    fn reference_chunks(text: &str, size: usize) -> Vec<String> {
        let mut out = Vec::new();
        let mut buffer = String::new();
        for word in text.split(' ') {
            buffer = format!("{buffer}{word}");
            if buffer.len() >= size - 1 {
                out.push(buffer.clone());
                buffer = String::new();
            } else {
                buffer = format!("{buffer} ");
            }
        }
        if !buffer.is_empty() {
            out.push(buffer);
        }
        out
    }

    #[test]
    fn words_accumulate_until_threshold() {
        let chunks = chunk_by_words("alpha beta gamma delta", 10);
        assert_eq!(chunks, vec!["alpha beta", "gamma delta"]);
        assert_eq!(chunks, reference_chunks("alpha beta gamma delta", 10));
    }

    #[test]
    fn trailing_words_are_flushed() {
        let chunks = chunk_by_words("one two three four five", 12);
        assert_eq!(chunks, vec!["one two three", "four five "]);
        assert_eq!(chunks, reference_chunks("one two three four five", 12));
    }

    #[test]
    fn long_word_is_never_split() {
        let chunks = chunk_by_words("a supercalifragilistic b", 6);
        assert_eq!(chunks, vec!["a supercalifragilistic", "b "]);

        let alone = chunk_by_words("supercalifragilistic", 6);
        assert_eq!(alone, vec!["supercalifragilistic"]);
    }

    #[test]
    fn chunks_rejoin_to_the_input() {
        let text = "The quick brown fox jumps over the lazy dog. It was not amused by the fox.";
        for size in [2, 5, 16, 40, 200] {
            let chunks = chunk_by_words(text, size);
            assert_eq!(chunks, reference_chunks(text, size));
            assert_eq!(chunks.join(" ").trim_end(), text, "size {size}");
        }
    }

    #[test]
    fn small_sizes_disable_chunking() {
        for size in [0, 1] {
            let chunker = Chunker::new(size);
            assert!(!chunker.enabled());
            assert_eq!(
                chunker.plan("all of the text".to_string()),
                IndexPlan::Whole("all of the text".to_string())
            );
            assert_eq!(chunk_by_words("all of the text", size), vec!["all of the text"]);
        }
    }

    #[test]
    fn enabled_chunker_plans_numbered_chunks() {
        let plan = Chunker::new(10).plan("alpha beta gamma delta".to_string());
        assert_eq!(
            plan,
            IndexPlan::Chunks(vec!["alpha beta".to_string(), "gamma delta".to_string()])
        );
    }
}
