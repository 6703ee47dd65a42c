//! Text handling shared by indexing and ranking: word splitting and
//! normalization, line-by-line reading of documents and the extension
//! allow-list

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::base::LineNumber;

/// Lower-cases ASCII letters, every other character is kept as is
pub fn normalize_word(word: &str) -> String {
    word.to_ascii_lowercase()
}

/// Word separators: ASCII whitespace, vertical tab included
pub fn is_separator(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r')
}

/// Splits a line into words. Only ASCII whitespace separates words: a
/// non-breaking space or an invalid UTF-8 sequence is part of a word.
pub fn words(line: &[u8]) -> impl Iterator<Item = &[u8]> {
    line.split(|&byte| is_separator(byte))
        .filter(|word| !word.is_empty())
}

/// Iterates over the raw lines of a document, numbered from 1
pub struct DocumentLines<R: BufRead> {
    reader: R,
    line_number: LineNumber,
}

impl DocumentLines<BufReader<File>> {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> DocumentLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
        }
    }
}

impl<R: BufRead> Iterator for DocumentLines<R> {
    type Item = std::io::Result<(LineNumber, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line) {
            Ok(0) => None,
            Ok(_) => {
                self.line_number += 1;
                Some(Ok((self.line_number, line)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Counts the whitespace-delimited words of a document
pub fn count_words(path: &Path) -> std::io::Result<u64> {
    let mut count = 0;
    for line in DocumentLines::open(path)? {
        let (_, line) = line?;
        count += words(&line).count() as u64;
    }
    Ok(count)
}

/// Checks the file extension against an allow-list (case-insensitive,
/// extensions are given without the leading dot)
pub fn has_allowed_extension(path: &Path, extensions: &[String]) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => extensions.iter().any(|allowed| {
            allowed
                .trim_start_matches('.')
                .eq_ignore_ascii_case(ext)
        }),
        None => false,
    }
}
