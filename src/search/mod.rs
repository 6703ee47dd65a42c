pub mod bm25;

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::analysis::{count_words, normalize_word};
use crate::base::{DocId, DocIdSet, LineNumber, DIRECTORY_FILE};
use crate::error::{Error, Result};
use crate::index::{IndexReader, WordIndex};
use crate::query::{extract_words, tokenize, Postfix};
use crate::trie::{Cursor, LevelFilter};
use bm25::{Bm25Parameters, Bm25Ranker};

pub type Score = f64;

/// A document and its score; documents are ordered by decreasing score,
/// then by increasing ID
#[derive(Clone, Copy, Debug)]
pub struct ScoredDocument {
    pub docid: DocId,
    pub score: Score,
}

impl std::fmt::Display for ScoredDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.docid, self.score)
    }
}

impl PartialEq for ScoredDocument {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredDocument {}

impl PartialOrd for ScoredDocument {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredDocument {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then(self.docid.cmp(&other.docid))
    }
}

/// A ranked document, with the lines where each query word occurs
#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
    pub docid: DocId,
    pub path: String,
    pub score: Score,
    /// Query words occurring in the document, with their sorted line numbers
    pub lines: Vec<(String, Vec<LineNumber>)>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchOutcome {
    /// Distinct query words, in order of appearance
    pub words: Vec<String>,
    pub found: Vec<String>,
    pub missing: Vec<String>,
    /// Matching documents by decreasing score
    pub results: Vec<SearchHit>,
}

impl SearchOutcome {
    /// Writes the outcome in the line protocol of the `search` command,
    /// terminated by an `end` line
    pub fn write_report<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for word in self.words.iter() {
            if self.missing.contains(word) {
                writeln!(writer, "{} not found", word)?;
            } else {
                writeln!(writer, "found {}", word)?;
            }
        }

        for hit in self.results.iter() {
            writeln!(writer, "filename: {}", hit.path)?;
            for (word, lines) in hit.lines.iter() {
                for line in lines {
                    writeln!(writer, "{} {}", word, line)?;
                }
            }
        }

        writeln!(writer, "end")
    }
}

/// Answers queries over an index folder.
///
/// The index is reloaded for every query, keeping only the trie paths that
/// can spell one of the query words.
pub struct Searcher {
    folder: PathBuf,
    ranker: Bm25Ranker,
}

impl Searcher {
    pub fn new(folder: &Path) -> Self {
        Self::with_parameters(folder, Bm25Parameters::default())
    }

    pub fn with_parameters(folder: &Path, parameters: Bm25Parameters) -> Self {
        Self {
            folder: folder.to_path_buf(),
            ranker: Bm25Ranker::new(parameters),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn search(&self, expression: &str) -> Result<SearchOutcome> {
        let tokens = tokenize(expression);
        let postfix = Postfix::compile(&tokens)?;
        debug!("Postfix expression: {}", postfix);

        let words = extract_words(&tokens);
        let filter = LevelFilter::from_words(words.iter().map(|word| normalize_word(word)));
        let index = IndexReader::open(&self.folder, &filter)?;

        let mut outcome = SearchOutcome::default();
        let mut operands: HashMap<String, DocIdSet> = HashMap::new();
        let mut cursors: Vec<(&str, Cursor<'_>)> = Vec::new();
        for word in words.iter() {
            if outcome.words.contains(word) {
                continue;
            }
            outcome.words.push(word.clone());

            let cursor = index.search_word(word);
            if cursor.is_found() {
                operands.insert(word.clone(), cursor.doc_ids());
                cursors.push((word.as_str(), cursor));
                outcome.found.push(word.clone());
            } else {
                warn!("{} not found", word);
                outcome.missing.push(word.clone());
            }
        }

        if outcome.found.is_empty() && !outcome.words.is_empty() {
            return Ok(outcome);
        }

        let matched = match postfix.evaluate(&operands) {
            Ok(matched) => matched,
            Err(e) => {
                return Err(Error::Query {
                    outcome: Box::new(outcome),
                    source: Box::new(e),
                })
            }
        };
        info!("{} documents match {}", matched.len(), expression.trim());

        let mut lengths: BTreeMap<DocId, u64> = BTreeMap::new();
        for &docid in matched.iter() {
            let path = self.resolve(&index, docid)?;
            let length = count_words(Path::new(path)).unwrap_or_else(|e| {
                warn!("Cannot count the words of {}: {}", path, e);
                0
            });
            lengths.insert(docid, length);
        }

        let frequencies: HashMap<String, BTreeMap<DocId, u64>> = cursors
            .iter()
            .map(|(word, cursor)| {
                let counts: BTreeMap<DocId, u64> = matched
                    .iter()
                    .map(|&docid| (docid, cursor.count(docid) as u64))
                    .filter(|(_, count)| *count > 0)
                    .collect();
                (word.to_string(), counts)
            })
            .collect();

        for scored in self.ranker.rank(&lengths, &frequencies) {
            let lines: Vec<(String, Vec<LineNumber>)> = cursors
                .iter()
                .filter(|(_, cursor)| !cursor.is_empty(scored.docid))
                .map(|(word, cursor)| {
                    let lines: Vec<LineNumber> =
                        cursor.lines(scored.docid).iter().copied().collect();
                    (word.to_string(), lines)
                })
                .collect();

            outcome.results.push(SearchHit {
                docid: scored.docid,
                path: self.resolve(&index, scored.docid)?.to_string(),
                score: scored.score,
                lines,
            });
        }

        Ok(outcome)
    }

    fn resolve<'a>(&self, index: &'a IndexReader, docid: DocId) -> Result<&'a str> {
        index.document_path(docid).ok_or_else(|| {
            Error::decode(
                self.folder.join(DIRECTORY_FILE),
                format!("no path for document {}", docid),
            )
        })
    }
}
