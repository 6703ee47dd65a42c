use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub type DocId = u64;
pub type LineNumber = u64;
pub type DocIdSet = BTreeSet<DocId>;

/// Position of a character inside a word (0 for the first character)
pub type Depth = usize;

pub const TRIE_FILE: &str = "trie.bin";
pub const DIRECTORY_FILE: &str = "id_directory.bin";
pub const INFORMATION_CBOR: &str = "information.cbor";

/// Marks object that have a length
pub trait Len {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Posting = document ID + line number
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Posting {
    pub docid: DocId,
    pub line: LineNumber,
}

impl std::fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({},{})", self.docid, self.line)
    }
}
