use std::fs;
use std::path::{Path, PathBuf};

use derivative::Derivative;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::{has_allowed_extension, normalize_word, words, DocumentLines};
use crate::base::{DocId, Len, LineNumber, DIRECTORY_FILE, INFORMATION_CBOR, TRIE_FILE};
use crate::error::{Error, Result};
use crate::index::{DocumentDirectory, IndexInformation, WordIndex};
use crate::trie::{CursorMut, Trie};

const DEFAULT_PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})";

fn pb_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(DEFAULT_PROGRESS_TEMPLATE)
        .progress_chars("=> ")
}

fn default_extensions() -> Vec<String> {
    ["txt", "md", "rs", "c", "h", "cpp", "hpp"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

#[derive(Derivative, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
pub struct IndexerOptions {
    /// Extensions (without the dot) of the files to index
    #[derivative(Default(value = "default_extensions()"))]
    pub extensions: Vec<String>,

    /// Words of this length (in bytes) or longer are not indexed
    #[derivative(Default(value = "32"))]
    pub max_word_length: usize,
}

/// The indexer consumes documents and builds the trie and the document
/// directory, which are written to disk once by [`Indexer::build`]
pub struct Indexer {
    folder: PathBuf,
    options: IndexerOptions,
    trie: Trie,
    directory: DocumentDirectory,
    last_docid: DocId,
    built: bool,
    /// Set when a directory walk failed; the index is then not written on drop
    failed: bool,
}

impl Indexer {
    pub fn new(folder: &Path, options: &IndexerOptions) -> Indexer {
        Indexer {
            folder: folder.to_path_buf(),
            options: options.clone(),
            trie: Trie::new(),
            directory: DocumentDirectory::new(),
            last_docid: 0,
            built: false,
            failed: false,
        }
    }

    pub fn options(&self) -> &IndexerOptions {
        &self.options
    }

    /// Adds the (normalized) word to the trie without any posting
    pub fn add_word(&mut self, word: &str) -> CursorMut<'_> {
        assert!(!self.built, "Index cannot be changed since it has been built");
        self.trie.push(&normalize_word(word))
    }

    /// Records that `word` occurs at `line` of document `docid`
    pub fn insert(&mut self, word: &str, docid: DocId, line: LineNumber) {
        self.add_word(word).insert(docid, line);
    }

    /// Indexes one document and returns its ID.
    ///
    /// The document is fully read before anything is added, so that a read
    /// error leaves the index untouched. The word length limit applies to
    /// the raw bytes; invalid UTF-8 is replaced afterwards.
    pub fn index_document(&mut self, path: &Path) -> Result<DocId> {
        let document_error = |source| Error::Document {
            path: path.to_path_buf(),
            source,
        };

        let mut occurrences: Vec<(String, LineNumber)> = Vec::new();
        for line in DocumentLines::open(path).map_err(document_error)? {
            let (line_number, line) = line.map_err(document_error)?;
            for word in words(&line) {
                if word.len() >= self.options.max_word_length {
                    continue;
                }
                let word = String::from_utf8_lossy(word);
                occurrences.push((normalize_word(&word), line_number));
            }
        }

        self.last_docid += 1;
        let docid = self.last_docid;
        self.directory
            .insert(docid, path.to_string_lossy().into_owned());

        for (word, line_number) in occurrences.iter() {
            self.insert(word, docid, *line_number);
        }

        debug!(
            "Indexed {} as document {} ({} words)",
            path.display(),
            docid,
            occurrences.len()
        );
        Ok(docid)
    }

    /// Indexes every file below `root` whose extension is allowed.
    ///
    /// Files are visited in path order, so that document IDs do not depend
    /// on the file system. Unreadable documents are skipped. When the walk
    /// fails, the indexer no longer writes the index on drop.
    pub fn index_directory(&mut self, root: &Path) -> Result<usize> {
        let result = self.index_tree(root);
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn index_tree(&mut self, root: &Path) -> Result<usize> {
        if !root.is_dir() {
            return Err(Error::NotADirectory(root.to_path_buf()));
        }

        let mut documents = Vec::new();
        collect_documents(root, &self.options.extensions, &mut documents)?;
        info!(
            "Indexing {} documents from {}",
            documents.len(),
            root.display()
        );

        let progress = ProgressBar::new(documents.len() as u64);
        progress.set_style(pb_style());

        let mut indexed = 0;
        for path in documents.iter() {
            match self.index_document(path) {
                Ok(_) => indexed += 1,
                Err(e @ Error::Document { .. }) => warn!("Skipping document: {}", e),
                Err(e) => return Err(e),
            }
            progress.inc(1);
        }
        progress.finish();

        Ok(indexed)
    }

    // Writes the trie, the document directory and the index information
    pub fn build(&mut self) -> Result<()> {
        if self.built {
            info!("Index in {} already built", self.folder.display());
            return Ok(());
        }
        self.built = true;

        fs::create_dir_all(&self.folder).map_err(|e| Error::storage(&self.folder, e))?;

        self.trie.save(&self.folder.join(TRIE_FILE))?;
        self.directory.save(&self.folder.join(DIRECTORY_FILE))?;

        let information = IndexInformation {
            options: self.options.clone(),
            documents: self.directory.len() as u64,
            nodes: self.trie.len() as u64,
        };
        information.save(&self.folder.join(INFORMATION_CBOR))?;

        info!(
            "Index built in {} ({} documents, {} nodes)",
            self.folder.display(),
            information.documents,
            information.nodes
        );
        Ok(())
    }
}

impl WordIndex for Indexer {
    fn trie(&self) -> &Trie {
        &self.trie
    }

    fn directory(&self) -> &DocumentDirectory {
        &self.directory
    }
}

impl Drop for Indexer {
    fn drop(&mut self) {
        if self.built {
            return;
        }
        if self.failed {
            warn!(
                "Indexing failed, the index in {} is left untouched",
                self.folder.display()
            );
        } else if let Err(e) = self.build() {
            error!("Could not save the index: {}", e);
        }
    }
}

fn collect_documents(dir: &Path, extensions: &[String], documents: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() && !path.is_symlink() {
            if let Err(e) = collect_documents(&path, extensions, documents) {
                warn!("Skipping directory {}: {}", path.display(), e);
            }
        } else if path.is_file() && has_allowed_extension(&path, extensions) {
            documents.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexReader;
    use crate::trie::LevelFilter;
    use temp_dir::TempDir;

    #[test]
    fn test_default_options() {
        let options = IndexerOptions::default();
        assert_eq!(options.max_word_length, 32);
        assert!(options.extensions.contains(&"txt".to_string()));
    }

    #[test]
    fn test_add_and_search_words() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let mut indexer = Indexer::new(dir.path(), &IndexerOptions::default());

        for word in ["Apple", "banana", "X-Ray"] {
            indexer.add_word(word);
        }
        assert_eq!(indexer.search_word("apple").symbol(), b'e');
        assert_eq!(indexer.search_word("APPLE").symbol(), b'e');
        assert_eq!(indexer.search_word("x-ray").symbol(), b'y');
        assert_eq!(indexer.search_word("cherry"), indexer.end());
    }

    #[test]
    fn test_index_document() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let path = dir.path().join("file1.txt");
        let long_word = "x".repeat(32);
        fs::write(
            &path,
            format!("This is a test file.\nAnother LINE, this {}\n\nthis", long_word),
        )
        .unwrap();

        let mut indexer = Indexer::new(&dir.path().join("index"), &IndexerOptions::default());
        let docid = indexer.index_document(&path).unwrap();
        assert_eq!(docid, 1);
        assert_eq!(indexer.document_path(1), Some(&*path.to_string_lossy()));

        let this = indexer.search_word("this");
        assert_eq!(this.lines(1).iter().copied().collect::<Vec<_>>(), vec![1, 2, 4]);
        assert_eq!(indexer.search_word("file.").count(1), 1);
        assert_eq!(indexer.search_word("line,").count(1), 1);
        assert!(!indexer.search_word(&long_word).is_found());

        let missing = indexer.index_document(&dir.path().join("missing.txt"));
        assert!(matches!(missing, Err(Error::Document { .. })));
        assert_eq!(indexer.index_document(&path).unwrap(), 2);
    }

    #[test]
    fn test_index_directory() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let docs = dir.path().join("docs");
        fs::create_dir_all(docs.join("nested")).unwrap();
        fs::write(docs.join("b.txt"), "Yet another test file.\nWith some more lines.").unwrap();
        fs::write(docs.join("a.txt"), "This is a test file.\nAnother line.").unwrap();
        fs::write(docs.join("nested/c.md"), "nested test").unwrap();
        fs::write(docs.join("ignored.bin"), "test").unwrap();

        let folder = dir.path().join("index");
        let mut indexer = Indexer::new(&folder, &IndexerOptions::default());
        assert_eq!(indexer.index_directory(&docs).unwrap(), 3);
        assert!(indexer.document_path(1).unwrap().ends_with("a.txt"));
        assert!(indexer.document_path(2).unwrap().ends_with("b.txt"));
        assert!(indexer.document_path(3).unwrap().ends_with("c.md"));
        assert_eq!(indexer.search_word("test").doc_ids().len(), 3);
        indexer.build().unwrap();

        let reader = IndexReader::open(&folder, &LevelFilter::from_words(["test"])).unwrap();
        assert_eq!(reader.information().documents, 3);
        assert_eq!(reader.search_word("test").doc_ids().len(), 3);
        assert!(!reader.search_word("file.").is_found());
    }

    #[test]
    fn test_invalid_directory() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let mut indexer = Indexer::new(dir.path(), &IndexerOptions::default());
        let result = indexer.index_directory(&dir.path().join("invalid_dir"));
        assert!(matches!(result, Err(Error::NotADirectory(_))));
    }

    #[test]
    fn test_raw_word_length() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let path = dir.path().join("latin1.txt");
        let mut content = vec![0xe9; 30];
        content.extend_from_slice(b" caf\xc2\xa0bar ");
        content.extend_from_slice(&[b'z'; 32]);
        fs::write(&path, content).unwrap();

        let mut indexer = Indexer::new(&dir.path().join("index"), &IndexerOptions::default());
        indexer.index_document(&path).unwrap();

        // 30 bytes on disk, 90 bytes once each byte is replaced by U+FFFD
        assert_eq!(indexer.search_word(&"\u{fffd}".repeat(30)).count(1), 1);
        // A non-breaking space does not split words
        assert_eq!(indexer.search_word("caf\u{a0}bar").count(1), 1);
        assert!(!indexer.search_word("bar").is_found());
        assert!(!indexer.search_word(&"z".repeat(32)).is_found());
    }

    #[test]
    fn test_failed_run_keeps_index() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let docs = dir.path().join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("a.txt"), "rust is fast").unwrap();
        fs::write(docs.join("b.txt"), "rust is safe").unwrap();

        let folder = dir.path().join("index");
        {
            let mut indexer = Indexer::new(&folder, &IndexerOptions::default());
            assert_eq!(indexer.index_directory(&docs).unwrap(), 2);
        }

        {
            let mut indexer = Indexer::new(&folder, &IndexerOptions::default());
            let result = indexer.index_directory(&dir.path().join("dosc"));
            assert!(matches!(result, Err(Error::NotADirectory(_))));
        }

        let reader = IndexReader::open_all(&folder).unwrap();
        assert_eq!(reader.information().documents, 2);
        assert_eq!(reader.search_word("rust").doc_ids().len(), 2);
    }

    #[test]
    fn test_saved_on_drop() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        {
            let mut indexer = Indexer::new(dir.path(), &IndexerOptions::default());
            indexer.insert("dropped", 1, 5);
        }
        let reader = IndexReader::open_all(dir.path()).unwrap();
        assert_eq!(reader.search_word("dropped").count(1), 1);
    }
}
