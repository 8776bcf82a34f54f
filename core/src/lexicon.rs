//! Global lexicon file.
//!
//! One record per term, in term order, all integers little endian:
//! `[u32 term_len][term][u64 offset_doc_ids][u64 offset_freqs][u64 offset_skips]
//! [u32 skip_blocks][u32 posting_list_length][u32 max_term_frequency][f32 term_upper_bound]`.

use crate::codec::{decode_f32, encode_f32, CountingWriter};
use crate::error::{IndexError, Result};
use crate::index::TermEntry;
use crate::persist::IndexPaths;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;

pub struct LexiconWriter {
    out: CountingWriter<BufWriter<File>>,
    records: u32,
}

impl LexiconWriter {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self { out: CountingWriter::new(BufWriter::new(File::create(path)?)), records: 0 })
    }

    /// Append a record and return its byte offset in the file.
    pub fn write(&mut self, term: &str, entry: &TermEntry) -> Result<u64> {
        let offset = self.out.position();
        self.out.write_u32::<LittleEndian>(term.len() as u32)?;
        self.out.write_all(term.as_bytes())?;
        self.out.write_u64::<LittleEndian>(entry.offset_doc_ids)?;
        self.out.write_u64::<LittleEndian>(entry.offset_freqs)?;
        self.out.write_u64::<LittleEndian>(entry.offset_skips)?;
        self.out.write_u32::<LittleEndian>(entry.skip_blocks)?;
        self.out.write_u32::<LittleEndian>(entry.posting_list_length)?;
        self.out.write_u32::<LittleEndian>(entry.max_term_frequency)?;
        encode_f32(entry.term_upper_bound, &mut self.out)?;
        self.records += 1;
        Ok(offset)
    }

    /// Flush and return the number of records written.
    pub fn finish(mut self) -> Result<u32> {
        self.out.flush()?;
        Ok(self.records)
    }
}

/// Read-only term → metadata map, loaded once per query session.
#[derive(Debug, Default)]
pub struct Lexicon {
    terms: BTreeMap<String, TermEntry>,
}

impl Lexicon {
    pub fn load(paths: &IndexPaths) -> Result<Self> {
        Self::load_from(&paths.lexicon())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut buf = Vec::new();
        File::open(path)?.read_to_end(&mut buf)?;
        let total = buf.len() as u64;
        let mut input = Cursor::new(buf);
        let mut terms = BTreeMap::new();
        while input.position() < total {
            let len = input.read_u32::<LittleEndian>()? as usize;
            if len as u64 > total - input.position() {
                return Err(IndexError::Corrupt("lexicon term runs past the end of the file".into()));
            }
            let mut raw = vec![0u8; len];
            input.read_exact(&mut raw)?;
            let term = String::from_utf8(raw).map_err(|_| IndexError::Corrupt("lexicon term is not UTF-8".into()))?;
            let entry = TermEntry {
                offset_doc_ids: input.read_u64::<LittleEndian>()?,
                offset_freqs: input.read_u64::<LittleEndian>()?,
                offset_skips: input.read_u64::<LittleEndian>()?,
                skip_blocks: input.read_u32::<LittleEndian>()?,
                posting_list_length: input.read_u32::<LittleEndian>()?,
                max_term_frequency: input.read_u32::<LittleEndian>()?,
                term_upper_bound: decode_f32(&mut input)?,
            };
            terms.insert(term, entry);
        }
        tracing::debug!(terms = terms.len(), "lexicon loaded");
        Ok(Self { terms })
    }

    pub fn get(&self, term: &str) -> Option<&TermEntry> { self.terms.get(term) }
    pub fn len(&self) -> usize { self.terms.len() }
    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    /// Terms in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TermEntry)> {
        self.terms.iter().map(|(t, e)| (t.as_str(), e))
    }
}
