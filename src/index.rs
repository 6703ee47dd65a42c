//! Read side of an index folder: the document directory, the index
//! information and the read-only [`IndexReader`]

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::info;
use serde::{Deserialize, Serialize};

use crate::analysis::normalize_word;
use crate::base::{DocId, Len, DIRECTORY_FILE, INFORMATION_CBOR, TRIE_FILE};
use crate::builder::IndexerOptions;
use crate::error::{Error, Result};
use crate::trie::{Cursor, LevelFilter, Trie};

/// Maps document IDs to document paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentDirectory {
    paths: BTreeMap<DocId, String>,
}

impl DocumentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, docid: DocId, path: String) {
        self.paths.insert(docid, path);
    }

    pub fn get(&self, docid: DocId) -> Option<&str> {
        self.paths.get(&docid).map(String::as_str)
    }

    /// Writes `count` followed by `(docid, path length, path bytes)` entries
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u64::<BigEndian>(self.paths.len() as u64)?;
        for (&docid, path) in self.paths.iter() {
            writer.write_u64::<BigEndian>(docid)?;
            writer.write_u64::<BigEndian>(path.len() as u64)?;
            writer.write_all(path.as_bytes())?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let mut directory = Self::new();

        let count = reader.read_u64::<BigEndian>()?;
        for _ in 0..count {
            let docid = reader.read_u64::<BigEndian>()?;
            let length = reader.read_u64::<BigEndian>()?;

            let mut bytes = Vec::new();
            reader.by_ref().take(length).read_to_end(&mut bytes)?;
            if (bytes.len() as u64) < length {
                return Err(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("path of document {} is truncated", docid),
                ));
            }

            let path = String::from_utf8(bytes).map_err(|_| {
                std::io::Error::new(
                    ErrorKind::InvalidData,
                    format!("path of document {} is not valid UTF-8", docid),
                )
            })?;
            directory.insert(docid, path);
        }

        if reader.read(&mut [0u8; 1])? != 0 {
            return Err(std::io::Error::new(
                ErrorKind::InvalidData,
                "trailing bytes after the last entry",
            ));
        }

        Ok(directory)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::storage(path, e))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)
            .and_then(|_| writer.flush())
            .map_err(|e| Error::storage(path, e))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::storage(path, e))?;
        Self::read_from(&mut BufReader::new(file)).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof | ErrorKind::InvalidData => {
                Error::decode(path, e.to_string())
            }
            _ => Error::storage(path, e),
        })
    }
}

impl Len for DocumentDirectory {
    fn len(&self) -> usize {
        self.paths.len()
    }
}

/// Global information on an index folder
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IndexInformation {
    /// Options used to build the index
    pub options: IndexerOptions,

    /// Number of indexed documents
    pub documents: u64,

    /// Number of trie nodes (root included)
    pub nodes: u64,
}

impl IndexInformation {
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::storage(path, e))?;
        let mut writer = BufWriter::new(file);
        ciborium::ser::into_writer(self, &mut writer)
            .map_err(|e| Error::Metadata(format!("{:?}", e)))?;
        writer.flush().map_err(|e| Error::storage(path, e))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::storage(path, e))?;
        ciborium::de::from_reader(BufReader::new(file))
            .map_err(|e| Error::decode(path, format!("{:?}", e)))
    }
}

/// Word lookups shared by the write-mode and read-mode indices
pub trait WordIndex {
    fn trie(&self) -> &Trie;

    fn directory(&self) -> &DocumentDirectory;

    /// Looks up a word (normalized first)
    fn search_word(&self, word: &str) -> Cursor<'_> {
        self.trie().search(&normalize_word(word))
    }

    fn document_path(&self, docid: DocId) -> Option<&str> {
        self.directory().get(docid)
    }

    /// The cursor returned for missing words
    fn end(&self) -> Cursor<'_> {
        self.trie().end()
    }
}

/// Read-only index, restricted to the trie paths accepted by a filter
pub struct IndexReader {
    folder: PathBuf,
    trie: Trie,
    directory: DocumentDirectory,
    information: IndexInformation,
}

impl IndexReader {
    /// Loads the index stored in `folder`.
    ///
    /// The trie is loaded through `filter`, the document directory is
    /// always loaded in full.
    pub fn open(folder: &Path, filter: &LevelFilter) -> Result<Self> {
        let trie = Trie::load(&folder.join(TRIE_FILE), filter)?;
        let directory = DocumentDirectory::load(&folder.join(DIRECTORY_FILE))?;
        let information = IndexInformation::load(&folder.join(INFORMATION_CBOR))?;

        info!(
            "Loaded {}/{} trie nodes and {} documents from {}",
            trie.len(),
            information.nodes,
            directory.len(),
            folder.display()
        );

        Ok(Self {
            folder: folder.to_path_buf(),
            trie,
            directory,
            information,
        })
    }

    /// Loads the whole index
    pub fn open_all(folder: &Path) -> Result<Self> {
        Self::open(folder, &LevelFilter::permissive())
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn information(&self) -> &IndexInformation {
        &self.information
    }
}

impl WordIndex for IndexReader {
    fn trie(&self) -> &Trie {
        &self.trie
    }

    fn directory(&self) -> &DocumentDirectory {
        &self.directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use temp_dir::TempDir;

    fn sample_directory() -> DocumentDirectory {
        let mut directory = DocumentDirectory::new();
        directory.insert(1, "one".to_string());
        directory.insert(2, "/home/user/documents/notes.txt".to_string());
        directory.insert(42, "answer/héllo.md".to_string());
        directory
    }

    #[test]
    fn test_directory_round_trip() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let path = dir.path().join(DIRECTORY_FILE);

        let directory = sample_directory();
        directory.save(&path).unwrap();
        let loaded = DocumentDirectory::load(&path).unwrap();

        assert_eq!(loaded, directory);
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.get(42), Some("answer/héllo.md"));
        assert_eq!(loaded.get(3), None);
    }

    #[test]
    fn test_empty_directory() {
        let mut bytes = Vec::new();
        DocumentDirectory::new().write_to(&mut bytes).unwrap();
        assert_eq!(bytes, vec![0; 8]);

        let loaded = DocumentDirectory::read_from(&mut bytes.as_slice()).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_truncated_directory() {
        let mut bytes = Vec::new();
        sample_directory().write_to(&mut bytes).unwrap();

        for cut in [4, 12, bytes.len() - 2] {
            let err = DocumentDirectory::read_from(&mut &bytes[..cut])
                .err()
                .expect("should fail");
            assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
        }

        bytes.push(7);
        let err = DocumentDirectory::read_from(&mut bytes.as_slice())
            .err()
            .expect("should fail");
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_missing_index() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let result = IndexReader::open_all(dir.path());
        assert!(matches!(result, Err(Error::Storage { .. })));
    }
}
