//! Binary layout of a persisted trie.
//!
//! The file is a sequence of node records written in one global level-order
//! (breadth-first) walk starting at the root. A record is a fixed-size
//! header
//!
//! ```text
//! symbol: u8 | children_count: u64 | postings_group_count: u64 | postings_byte_size: u64
//! ```
//!
//! followed by `postings_group_count` groups
//!
//! ```text
//! group_size: u64 | document_id: u64 | line_number: u64 × group_size
//! ```
//!
//! All integers are big-endian. `postings_byte_size` is the byte length of
//! the groups, so that a reader can skip them without decoding.
//!
//! The reader replays the very same walk: when a record is dequeued, the
//! records of all its children are read *consecutively* from the stream.
//! This only works because the writer uses a single FIFO for the whole tree,
//! hence changing the traversal order breaks every existing file.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, info};

use super::{LevelFilter, NodeId, Trie, TrieNode, ROOT};
use crate::base::{Depth, DocId, Len, LineNumber};
use crate::error::{Error, Result};

const U64_SIZE: u64 = std::mem::size_of::<u64>() as u64;

/// Fixed-size header of a node record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHeader {
    pub symbol: u8,
    pub children_count: u64,
    pub postings_group_count: u64,
    pub postings_byte_size: u64,
}

impl NodeHeader {
    pub const SIZE: u64 = 1 + 3 * U64_SIZE;

    fn of(node: &TrieNode) -> Self {
        let postings_byte_size = node
            .postings()
            .values()
            .map(|lines| (2 + lines.len() as u64) * U64_SIZE)
            .sum();

        Self {
            symbol: node.symbol(),
            children_count: node.children_count() as u64,
            postings_group_count: node.postings().len() as u64,
            postings_byte_size,
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u8(self.symbol)?;
        writer.write_u64::<BigEndian>(self.children_count)?;
        writer.write_u64::<BigEndian>(self.postings_group_count)?;
        writer.write_u64::<BigEndian>(self.postings_byte_size)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            symbol: reader.read_u8()?,
            children_count: reader.read_u64::<BigEndian>()?,
            postings_group_count: reader.read_u64::<BigEndian>()?,
            postings_byte_size: reader.read_u64::<BigEndian>()?,
        })
    }
}

fn invalid_data(message: String) -> std::io::Error {
    std::io::Error::new(ErrorKind::InvalidData, message)
}

fn write_node<W: Write>(node: &TrieNode, writer: &mut W) -> std::io::Result<()> {
    NodeHeader::of(node).write_to(writer)?;

    for (&docid, lines) in node.postings() {
        writer.write_u64::<BigEndian>(lines.len() as u64)?;
        writer.write_u64::<BigEndian>(docid)?;
        for &line in lines {
            writer.write_u64::<BigEndian>(line)?;
        }
    }
    Ok(())
}

/// Writes the whole trie in level order
pub fn write_trie<W: Write>(trie: &Trie, writer: &mut W) -> std::io::Result<()> {
    let mut queue: VecDeque<NodeId> = VecDeque::new();
    queue.push_back(ROOT);

    while let Some(id) = queue.pop_front() {
        let node = trie.node(id);
        write_node(node, writer)?;

        for (_, child) in node.children() {
            queue.push_back(child);
        }
    }

    Ok(())
}

/// A record whose children still have to be read from the stream
struct PendingRecord {
    /// Number of characters on the path to the node (0 for the root)
    depth: Depth,
    header: NodeHeader,
    /// The live node if it was materialized
    node: Option<NodeId>,
}

fn read_postings<R: Read>(
    reader: &mut R,
    trie: &mut Trie,
    id: NodeId,
    header: &NodeHeader,
) -> std::io::Result<()> {
    let mut consumed: u64 = 0;

    for _ in 0..header.postings_group_count {
        let group_size = reader.read_u64::<BigEndian>()?;
        let docid: DocId = reader.read_u64::<BigEndian>()?;

        consumed = group_size
            .checked_add(2)
            .and_then(|words| words.checked_mul(U64_SIZE))
            .and_then(|bytes| bytes.checked_add(consumed))
            .filter(|&total| total <= header.postings_byte_size)
            .ok_or_else(|| {
                invalid_data(format!(
                    "postings of node '{}' exceed their declared size ({} bytes)",
                    header.symbol as char, header.postings_byte_size
                ))
            })?;

        for _ in 0..group_size {
            let line: LineNumber = reader.read_u64::<BigEndian>()?;
            trie.add_posting(id, docid, line);
        }
    }

    if consumed != header.postings_byte_size {
        return Err(invalid_data(format!(
            "postings of node '{}' use {} bytes, {} declared",
            header.symbol as char, consumed, header.postings_byte_size
        )));
    }
    Ok(())
}

fn skip_postings<R: Read + Seek>(
    reader: &mut BufReader<R>,
    header: &NodeHeader,
) -> std::io::Result<()> {
    let offset = i64::try_from(header.postings_byte_size).map_err(|_| {
        invalid_data(format!(
            "postings size {} is out of range",
            header.postings_byte_size
        ))
    })?;
    reader.seek_relative(offset)
}

/// Reads a trie, materializing only the paths accepted by `filter`.
///
/// Records that are not materialized are still walked (their postings are
/// skipped with a forward seek) since their children come later in the
/// stream.
pub fn read_trie<R: Read + Seek>(
    reader: &mut BufReader<R>,
    filter: &LevelFilter,
) -> std::io::Result<Trie> {
    let length = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;

    let mut trie = Trie::new();
    let mut queue: VecDeque<PendingRecord> = VecDeque::new();

    let root_header = NodeHeader::read_from(reader)?;
    read_postings(reader, &mut trie, ROOT, &root_header)?;
    queue.push_back(PendingRecord {
        depth: 0,
        header: root_header,
        node: Some(ROOT),
    });

    let mut skipped: usize = 0;
    while let Some(record) = queue.pop_front() {
        for _ in 0..record.header.children_count {
            let header = NodeHeader::read_from(reader)?;

            let node = match record.node {
                Some(parent) if filter.allows(record.depth, header.symbol) => {
                    let known = trie.len();
                    let child = trie.attach(parent, header.symbol);
                    if trie.len() == known {
                        return Err(invalid_data(format!(
                            "duplicate child '{}' at depth {}",
                            header.symbol as char, record.depth
                        )));
                    }
                    read_postings(reader, &mut trie, child, &header)?;
                    Some(child)
                }
                _ => {
                    skip_postings(reader, &header)?;
                    skipped += 1;
                    None
                }
            };

            queue.push_back(PendingRecord {
                depth: record.depth + 1,
                header,
                node,
            });
        }
    }

    let position = reader.stream_position()?;
    if position > length {
        return Err(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("trie ends at byte {} but the file has {}", position, length),
        ));
    }
    if position < length {
        return Err(invalid_data(format!(
            "{} trailing bytes after the last node",
            length - position
        )));
    }

    debug!(
        "Read {} nodes, skipped {} ({} bytes)",
        trie.len(),
        skipped,
        length
    );
    Ok(trie)
}

impl Trie {
    /// Serializes the trie into `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::storage(path, e))?;
        let mut writer = BufWriter::new(file);

        write_trie(self, &mut writer)
            .and_then(|_| writer.flush())
            .map_err(|e| Error::storage(path, e))?;

        info!("Saved trie with {} nodes to {}", self.len(), path.display());
        Ok(())
    }

    /// Loads the paths of a persisted trie accepted by `filter`
    pub fn load(path: &Path, filter: &LevelFilter) -> Result<Trie> {
        let file = File::open(path).map_err(|e| Error::storage(path, e))?;
        let mut reader = BufReader::new(file);

        read_trie(&mut reader, filter).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof | ErrorKind::InvalidData => {
                Error::decode(path, e.to_string())
            }
            _ => Error::storage(path, e),
        })
    }
}
