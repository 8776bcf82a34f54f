//! In-memory partial index and the block files it flushes.
//!
//! A block is three files tagged with its number: a bincode lexicon stream
//! (`u64` record count, then `(term, len)` records in term order) and two
//! streams of fixed 4-byte little-endian `u32` (docIDs and frequencies),
//! concatenated per term in lexicon order.

use crate::error::{IndexError, Result};
use crate::index::{DocId, Posting};
use crate::persist::IndexPaths;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::mem::size_of;

/// Sequence number of a flushed block. Numbers start at 1 and follow docID order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockNumber(pub u32);

impl BlockNumber {
    pub fn first() -> Self { BlockNumber(1) }
    pub fn next(self) -> Self { BlockNumber(self.0 + 1) }
    pub fn get(self) -> u32 { self.0 }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Serialize, Deserialize)]
struct BlockTermRecord {
    term: String,
    len: u32,
}

const POSTING_BYTES: usize = size_of::<Posting>();
const SLOT_BYTES: usize = size_of::<String>() + size_of::<Vec<Posting>>() + 2 * size_of::<usize>();

/// Partial inverted index for the documents since the last flush.
///
/// Terms map to slots in an append-only arena of posting vectors. Callers
/// must insert documents in increasing docID order.
#[derive(Default)]
pub struct IndexBuilder {
    slots: HashMap<String, usize>,
    postings: Vec<Vec<Posting>>,
    bytes: usize,
    documents: u32,
}

impl IndexBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, doc_id: DocId, terms: &[String]) {
        for term in terms {
            let slot = match self.slots.get(term.as_str()) {
                Some(&slot) => slot,
                None => {
                    let slot = self.postings.len();
                    self.slots.insert(term.clone(), slot);
                    self.postings.push(Vec::new());
                    self.bytes += term.len() + SLOT_BYTES;
                    slot
                }
            };
            let list = &mut self.postings[slot];
            match list.last_mut() {
                Some(last) if last.doc_id == doc_id => last.frequency += 1,
                _ => {
                    list.push(Posting::new(doc_id, 1));
                    self.bytes += POSTING_BYTES;
                }
            }
        }
        self.documents += 1;
    }

    /// Approximate heap bytes held by the partial index.
    pub fn memory_usage(&self) -> usize { self.bytes }
    pub fn is_empty(&self) -> bool { self.documents == 0 }
    pub fn documents(&self) -> u32 { self.documents }

    /// Posting list of `term` as currently accumulated.
    pub fn postings(&self, term: &str) -> Option<&[Posting]> {
        self.slots.get(term).map(|&slot| self.postings[slot].as_slice())
    }

    /// Write the sorted block tagged `block`, clear all state and return the next block number.
    pub fn flush(&mut self, paths: &IndexPaths, block: BlockNumber) -> Result<BlockNumber> {
        create_dir_all(paths.blocks_dir())?;
        let mut terms: Vec<(&String, usize)> = self.slots.iter().map(|(t, &s)| (t, s)).collect();
        terms.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let mut lexicon = BufWriter::new(File::create(paths.block_lexicon(block.get()))?);
        let mut doc_ids = BufWriter::new(File::create(paths.block_doc_ids(block.get()))?);
        let mut freqs = BufWriter::new(File::create(paths.block_freqs(block.get()))?);

        bincode::serialize_into(&mut lexicon, &(terms.len() as u64))?;
        let mut postings_written = 0u64;
        for (term, slot) in terms {
            let list = &mut self.postings[slot];
            if !list.windows(2).all(|w| w[0].doc_id < w[1].doc_id) {
                list.sort_by_key(|p| p.doc_id);
            }
            bincode::serialize_into(&mut lexicon, &BlockTermRecord { term: term.clone(), len: list.len() as u32 })?;
            for p in list.iter() {
                doc_ids.write_u32::<LittleEndian>(p.doc_id)?;
                freqs.write_u32::<LittleEndian>(p.frequency)?;
            }
            postings_written += list.len() as u64;
        }
        lexicon.flush()?;
        doc_ids.flush()?;
        freqs.flush()?;

        tracing::info!(block = block.get(), documents = self.documents, terms = self.slots.len(), postings = postings_written, "block flushed");
        self.clear();
        Ok(block.next())
    }

    pub fn clear(&mut self) {
        self.slots = HashMap::new();
        self.postings = Vec::new();
        self.bytes = 0;
        self.documents = 0;
    }
}

/// Sequential reader over one flushed block, term by term.
pub struct BlockReader {
    block: BlockNumber,
    lexicon: BufReader<File>,
    doc_ids: BufReader<File>,
    freqs: BufReader<File>,
    remaining: u64,
    current: Option<BlockTermRecord>,
}

impl BlockReader {
    pub fn open(paths: &IndexPaths, block: BlockNumber) -> Result<Self> {
        let mut lexicon = BufReader::new(File::open(paths.block_lexicon(block.get()))?);
        let remaining: u64 = bincode::deserialize_from(&mut lexicon)?;
        let mut reader = Self {
            block,
            lexicon,
            doc_ids: BufReader::new(File::open(paths.block_doc_ids(block.get()))?),
            freqs: BufReader::new(File::open(paths.block_freqs(block.get()))?),
            remaining,
            current: None,
        };
        reader.advance()?;
        Ok(reader)
    }

    pub fn block(&self) -> BlockNumber { self.block }

    /// Current term, or `None` once the block is exhausted.
    pub fn term(&self) -> Option<&str> { self.current.as_ref().map(|r| r.term.as_str()) }

    /// Append the current term's postings to `out` and move to the next term.
    pub fn take_postings(&mut self, out: &mut Vec<Posting>) -> Result<()> {
        let len = match &self.current {
            Some(record) => record.len,
            None => return Err(IndexError::Corrupt(format!("block {} read past its last term", self.block))),
        };
        out.reserve(len as usize);
        for _ in 0..len {
            let doc_id = self.doc_ids.read_u32::<LittleEndian>()?;
            let frequency = self.freqs.read_u32::<LittleEndian>()?;
            out.push(Posting { doc_id, frequency });
        }
        self.advance()
    }

    fn advance(&mut self) -> Result<()> {
        if self.remaining == 0 {
            self.current = None;
            return Ok(());
        }
        self.remaining -= 1;
        self.current = Some(bincode::deserialize_from(&mut self.lexicon)?);
        Ok(())
    }
}
