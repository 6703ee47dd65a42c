//! Per-depth character classes used to restrict which trie paths are loaded

use std::collections::HashSet;

use crate::base::Depth;

/// Allowed bytes for each position in a word.
///
/// Built from a vocabulary: the set at depth `d` holds the `d`-th byte of
/// every word long enough to have one. A trie path is kept when each of its
/// bytes belongs to the set of its depth, which is a superset of the
/// vocabulary itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LevelFilter {
    levels: Vec<HashSet<u8>>,
    permissive: bool,
}

impl LevelFilter {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut levels: Vec<HashSet<u8>> = Vec::new();
        for word in words {
            for (depth, &symbol) in word.as_ref().as_bytes().iter().enumerate() {
                if depth >= levels.len() {
                    levels.resize_with(depth + 1, HashSet::new);
                }
                levels[depth].insert(symbol);
            }
        }

        Self {
            levels,
            permissive: false,
        }
    }

    /// A filter allowing every byte at every depth (full load)
    pub fn permissive() -> Self {
        Self {
            levels: Vec::new(),
            permissive: true,
        }
    }

    #[inline]
    pub fn allows(&self, depth: Depth, symbol: u8) -> bool {
        self.permissive
            || self
                .levels
                .get(depth)
                .map_or(false, |level| level.contains(&symbol))
    }

    /// Number of constrained levels (0 for a permissive filter)
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, depth: Depth) -> Option<&HashSet<u8>> {
        self.levels.get(depth)
    }

    pub fn is_permissive(&self) -> bool {
        self.permissive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(symbols: &[u8]) -> HashSet<u8> {
        symbols.iter().copied().collect()
    }

    #[test]
    fn test_empty_input() {
        let filter = LevelFilter::from_words(Vec::<String>::new());
        assert_eq!(filter.depth(), 0);
        assert!(!filter.allows(0, b'a'));
    }

    #[test]
    fn test_single_word() {
        let filter = LevelFilter::from_words(["hello"]);
        assert_eq!(filter.depth(), 5);
        assert_eq!(filter.level(0), Some(&set(b"h")));
        assert_eq!(filter.level(2), Some(&set(b"l")));
        assert_eq!(filter.level(3), Some(&set(b"l")));
        assert_eq!(filter.level(4), Some(&set(b"o")));
        assert_eq!(filter.level(5), None);
    }

    #[test]
    fn test_different_lengths() {
        let filter = LevelFilter::from_words(["apple", "bat", "cat"]);
        assert_eq!(filter.level(0), Some(&set(b"abc")));
        assert_eq!(filter.level(1), Some(&set(b"pa")));
        assert_eq!(filter.level(2), Some(&set(b"pt")));
        assert_eq!(filter.level(3), Some(&set(b"l")));
        assert_eq!(filter.level(4), Some(&set(b"e")));

        assert!(filter.allows(1, b'a'));
        assert!(!filter.allows(1, b'b'));
        assert!(!filter.allows(5, b'e'));
    }

    #[test]
    fn test_special_characters() {
        let filter = LevelFilter::from_words(["!@#", "$%^", "&*("]);
        assert_eq!(filter.level(0), Some(&set(b"!$&")));
        assert_eq!(filter.level(1), Some(&set(b"@%*")));
        assert_eq!(filter.level(2), Some(&set(b"#^(")));
    }

    #[test]
    fn test_permissive() {
        let filter = LevelFilter::permissive();
        assert!(filter.is_permissive());
        assert!(filter.allows(0, b'z'));
        assert!(filter.allows(1000, 0xff));
    }
}
