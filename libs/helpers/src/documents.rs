use std::collections::HashSet;

use rand::{seq::SliceRandom, Rng, RngCore};

/// A generated text document, made of lines of words
pub struct TestDocument {
    pub name: String,
    pub lines: Vec<Vec<String>>,
}

impl TestDocument {
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|words| words.join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn word_count(&self) -> usize {
        self.lines.iter().map(Vec::len).sum()
    }
}

/// Creates `size` distinct lower-case words of 2 to 10 letters
pub fn create_vocabulary(size: usize, rng: &mut dyn RngCore) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut vocabulary = Vec::with_capacity(size);

    while vocabulary.len() < size {
        let length = rng.gen_range(2..=10);
        let word: String = (0..length)
            .map(|_| rng.gen_range(b'a'..=b'z') as char)
            .collect();
        if seen.insert(word.clone()) {
            vocabulary.push(word);
        }
    }

    vocabulary
}

/// Draws a document with `line_count` lines of at most `max_words` words
pub fn create_document(
    name: String,
    vocabulary: &[String],
    line_count: usize,
    max_words: usize,
    rng: &mut dyn RngCore,
) -> TestDocument {
    let lines = (0..line_count)
        .map(|_| {
            let count = rng.gen_range(0..=max_words);
            (0..count)
                .filter_map(|_| vocabulary.choose(rng).cloned())
                .collect()
        })
        .collect();

    TestDocument { name, lines }
}
