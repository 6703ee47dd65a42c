//! Character trie holding the inverted index.
//!
//! Nodes live in an arena and are addressed by their [`NodeId`], which is
//! also their position in the arena. Two ids are reserved: [`ROOT`] for the
//! structural root and [`NOT_FOUND`] for the node every failed lookup points
//! to. Words are walked byte by byte, so a multi-byte character spans several
//! levels of the trie.
//!
//! Only the terminal node of an inserted word carries postings, that is a map
//! from document ID to the set of lines where the word occurs.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::base::{DocId, DocIdSet, Len, LineNumber, Posting};

pub mod filter;
pub mod format;

pub use filter::LevelFilter;

pub type NodeId = usize;

pub const ROOT: NodeId = 0;
pub const NOT_FOUND: NodeId = 1;

static NO_LINES: BTreeSet<LineNumber> = BTreeSet::new();

pub struct TrieNode {
    id: NodeId,
    symbol: u8,
    children: BTreeMap<u8, NodeId>,
    postings: BTreeMap<DocId, BTreeSet<LineNumber>>,
}

impl TrieNode {
    fn new(id: NodeId, symbol: u8) -> Self {
        Self {
            id,
            symbol,
            children: BTreeMap::new(),
            postings: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn symbol(&self) -> u8 {
        self.symbol
    }

    pub fn children(&self) -> impl Iterator<Item = (u8, NodeId)> + '_ {
        self.children.iter().map(|(&symbol, &id)| (symbol, id))
    }

    pub fn children_count(&self) -> usize {
        self.children.len()
    }

    pub fn postings(&self) -> &BTreeMap<DocId, BTreeSet<LineNumber>> {
        &self.postings
    }
}

pub struct Trie {
    nodes: Vec<TrieNode>,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    /// Creates an empty trie (just the root and the not-found sentinel)
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::new(ROOT, 0), TrieNode::new(NOT_FOUND, 0)],
        }
    }

    /// Allocates a new node below `parent`, or returns the existing child
    pub(crate) fn attach(&mut self, parent: NodeId, symbol: u8) -> NodeId {
        if let Some(&child) = self.nodes[parent].children.get(&symbol) {
            return child;
        }

        let id = self.nodes.len();
        self.nodes.push(TrieNode::new(id, symbol));
        self.nodes[parent].children.insert(symbol, id);
        id
    }

    pub(crate) fn node(&self, id: NodeId) -> &TrieNode {
        &self.nodes[id]
    }

    pub(crate) fn add_posting(&mut self, id: NodeId, docid: DocId, line: LineNumber) {
        debug_assert!(id != NOT_FOUND, "Postings cannot be attached to the sentinel");
        self.nodes[id]
            .postings
            .entry(docid)
            .or_default()
            .insert(line);
    }

    /// Adds the path of `word`, creating the missing nodes.
    ///
    /// Returns a cursor on the terminal node; no posting is attached.
    pub fn push(&mut self, word: &str) -> CursorMut<'_> {
        let mut current = ROOT;
        for &symbol in word.as_bytes() {
            current = self.attach(current, symbol);
        }
        CursorMut {
            trie: self,
            id: current,
        }
    }

    fn locate(&self, word: &str) -> NodeId {
        let mut current = ROOT;
        for symbol in word.as_bytes() {
            match self.nodes[current].children.get(symbol) {
                Some(&child) => current = child,
                None => return NOT_FOUND,
            }
        }
        current
    }

    /// Returns a cursor on the terminal node of `word`, or [`Trie::end`]
    pub fn search(&self, word: &str) -> Cursor<'_> {
        Cursor {
            trie: self,
            id: self.locate(word),
        }
    }

    /// Mutable lookup, `None` when the path of `word` does not exist
    pub fn search_mut(&mut self, word: &str) -> Option<CursorMut<'_>> {
        match self.locate(word) {
            NOT_FOUND => None,
            id => Some(CursorMut { trie: self, id }),
        }
    }

    /// The not-found cursor
    pub fn end(&self) -> Cursor<'_> {
        Cursor {
            trie: self,
            id: NOT_FOUND,
        }
    }
}

impl Len for Trie {
    /// Number of materialized nodes: the root is counted, the not-found
    /// sentinel is not
    fn len(&self) -> usize {
        self.nodes.len() - 1
    }
}

/// Read-only view on a trie node
#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    trie: &'a Trie,
    id: NodeId,
}

impl<'a> Cursor<'a> {
    fn node(&self) -> &'a TrieNode {
        &self.trie.nodes[self.id]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn is_found(&self) -> bool {
        self.id != NOT_FOUND
    }

    pub fn symbol(&self) -> u8 {
        self.node().symbol
    }

    /// Documents having at least one posting at this node
    pub fn doc_ids(&self) -> DocIdSet {
        self.node().postings.keys().copied().collect()
    }

    /// Lines of `docid` where the word occurs (empty if none)
    pub fn lines(&self, docid: DocId) -> &'a BTreeSet<LineNumber> {
        self.node().postings.get(&docid).unwrap_or(&NO_LINES)
    }

    /// Number of lines of `docid` where the word occurs
    pub fn count(&self, docid: DocId) -> usize {
        self.lines(docid).len()
    }

    pub fn is_empty(&self, docid: DocId) -> bool {
        self.lines(docid).is_empty()
    }

    pub fn postings(&self) -> impl Iterator<Item = Posting> + 'a {
        self.node().postings.iter().flat_map(|(&docid, lines)| {
            lines.iter().map(move |&line| Posting { docid, line })
        })
    }
}

impl PartialEq for Cursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Cursor<'_> {}

impl fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("id", &self.id)
            .field("symbol", &(self.symbol() as char))
            .finish()
    }
}

/// Cursor allowing postings to be attached to a node
pub struct CursorMut<'a> {
    trie: &'a mut Trie,
    id: NodeId,
}

impl CursorMut<'_> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn symbol(&self) -> u8 {
        self.trie.nodes[self.id].symbol
    }

    pub fn insert(&mut self, docid: DocId, line: LineNumber) {
        self.trie.add_posting(self.id, docid, line);
    }
}
