//! docID → (external identifier, length) table.
//!
//! Records are `[u32 doc_id][u32 doc_len][u32 doc_no_len][doc_no]`, little
//! endian, docIDs 1..=N in order.

use crate::error::{IndexError, Result};
use crate::index::{CollectionStatistics, DocId, DocInfo};
use crate::persist::IndexPaths;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Read, Write};

/// Appends document rows while the collection is parsed and keeps the
/// running collection statistics.
pub struct DocumentIndexWriter {
    out: BufWriter<File>,
    stats: CollectionStatistics,
}

impl DocumentIndexWriter {
    pub fn create(paths: &IndexPaths) -> Result<Self> {
        fs::create_dir_all(&paths.root)?;
        Ok(Self { out: BufWriter::new(File::create(paths.doc_index())?), stats: CollectionStatistics::default() })
    }

    /// Assign the next docID to `doc_no` and record its length.
    pub fn append(&mut self, doc_no: &str, doc_len: u32) -> Result<DocId> {
        let doc_id = self.stats.documents + 1;
        self.out.write_u32::<LittleEndian>(doc_id)?;
        self.out.write_u32::<LittleEndian>(doc_len)?;
        self.out.write_u32::<LittleEndian>(doc_no.len() as u32)?;
        self.out.write_all(doc_no.as_bytes())?;
        self.stats.add_document(doc_len);
        Ok(doc_id)
    }

    pub fn statistics(&self) -> &CollectionStatistics { &self.stats }

    pub fn finish(mut self) -> Result<CollectionStatistics> {
        self.out.flush()?;
        Ok(self.stats)
    }
}

/// Read-only document index, loaded once per query session.
#[derive(Debug, Default)]
pub struct DocumentIndex {
    docs: Vec<DocInfo>,
}

impl DocumentIndex {
    pub fn load(paths: &IndexPaths) -> Result<Self> {
        let mut buf = Vec::new();
        File::open(paths.doc_index())?.read_to_end(&mut buf)?;
        let total = buf.len() as u64;
        let mut input = Cursor::new(buf);
        let mut docs = Vec::new();
        while input.position() < total {
            let doc_id = input.read_u32::<LittleEndian>()?;
            if doc_id as usize != docs.len() + 1 {
                return Err(IndexError::Corrupt(format!("document index expected docID {}, found {doc_id}", docs.len() + 1)));
            }
            let doc_len = input.read_u32::<LittleEndian>()?;
            let len = input.read_u32::<LittleEndian>()? as usize;
            if len as u64 > total - input.position() {
                return Err(IndexError::Corrupt(format!("document {doc_id} identifier runs past the end of the document index")));
            }
            let mut raw = vec![0u8; len];
            input.read_exact(&mut raw)?;
            let doc_no = String::from_utf8(raw)
                .map_err(|_| IndexError::Corrupt(format!("document {doc_id} has a non UTF-8 identifier")))?;
            docs.push(DocInfo { doc_no, doc_len });
        }
        tracing::debug!(documents = docs.len(), "document index loaded");
        Ok(Self { docs })
    }

    pub fn get(&self, doc_id: DocId) -> Option<&DocInfo> {
        (doc_id as usize).checked_sub(1).and_then(|i| self.docs.get(i))
    }

    /// Length of `doc_id`; 0 for an unknown docID.
    #[inline]
    pub fn doc_len(&self, doc_id: DocId) -> u32 {
        self.get(doc_id).map(|d| d.doc_len).unwrap_or(0)
    }

    pub fn len(&self) -> usize { self.docs.len() }
    pub fn is_empty(&self) -> bool { self.docs.is_empty() }
}
