use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::PathBuf;

use log::info;
use rand::{rngs::StdRng, SeedableRng};
use temp_dir::TempDir;

use crate::documents::{create_document, create_vocabulary, TestDocument};
use trie_search::{
    base::{DocId, LineNumber},
    Indexer, IndexerOptions,
};

/// Postings of a word: document ID to the lines where it occurs
pub type ExpectedPostings = BTreeMap<DocId, BTreeSet<LineNumber>>;

/// A random corpus written in a temporary directory, together with its index
pub struct TestIndex {
    pub dir: TempDir,
    pub vocabulary: Vec<String>,
    pub documents: Vec<TestDocument>,
    pub postings: HashMap<String, ExpectedPostings>,
}

impl TestIndex {
    pub fn new(
        vocabulary_size: usize,
        document_count: usize,
        line_count: usize,
        max_words: usize,
        seed: Option<u64>,
    ) -> Self {
        let mut rng = if let Some(seed) = seed {
            StdRng::seed_from_u64(seed)
        } else {
            StdRng::from_entropy()
        };
        let vocabulary = create_vocabulary(vocabulary_size, &mut rng);
        let documents = (0..document_count)
            .map(|ix| {
                create_document(
                    format!("doc-{:05}.txt", ix),
                    &vocabulary,
                    line_count,
                    max_words,
                    &mut rng,
                )
            })
            .collect();

        Self::from_documents(vocabulary, documents)
    }

    /// Writes the documents and indexes them; the document at position `ix`
    /// gets the ID `ix + 1` (names must sort in the same order)
    pub fn from_documents(vocabulary: Vec<String>, documents: Vec<TestDocument>) -> Self {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let test_index = Self {
            dir,
            vocabulary,
            documents,
            postings: HashMap::new(),
        };
        fs::create_dir_all(test_index.docs_path()).expect("Could not create the corpus folder");

        let mut postings: HashMap<String, ExpectedPostings> = HashMap::new();
        for (ix, document) in test_index.documents.iter().enumerate() {
            fs::write(test_index.docs_path().join(&document.name), document.text())
                .expect("Could not write a document");

            let docid = ix as DocId + 1;
            for (line_ix, words) in document.lines.iter().enumerate() {
                for word in words {
                    postings
                        .entry(word.to_lowercase())
                        .or_default()
                        .entry(docid)
                        .or_default()
                        .insert(line_ix as LineNumber + 1);
                }
            }
        }

        let mut indexer = Indexer::new(&test_index.index_path(), &IndexerOptions::default());
        let count = indexer
            .index_directory(&test_index.docs_path())
            .expect("Error while indexing the corpus");
        indexer.build().expect("Error while building the index");
        info!(
            "Indexed {} documents in {}",
            count,
            test_index.index_path().display()
        );

        Self {
            postings,
            ..test_index
        }
    }

    pub fn docs_path(&self) -> PathBuf {
        self.dir.path().join("docs")
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.path().join("index")
    }
}
