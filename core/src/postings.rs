//! Global posting files and the cursor that walks them.
//!
//! Each term owns one contiguous region in `doc_ids.bin` and one in
//! `freqs.bin`, encoded with the index [`Compression`]. Lists longer than the
//! skip threshold are cut into chunks of `ceil(sqrt(n))` postings and get one
//! fixed 24-byte entry per chunk in `skips.bin`:
//! `[u32 max_doc_id][u64 doc_ids_offset][u64 freqs_offset][u32 block_len]`,
//! offsets absolute in their files. The docID delta chain is continuous
//! across chunks, so a jump into chunk `i` restarts the chain from the
//! `max_doc_id` of chunk `i - 1`.

use crate::codec::{Compression, CountingWriter};
use crate::error::{IndexError, Result};
use crate::index::{DocId, Posting, TermEntry};
use crate::persist::IndexPaths;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};

pub const SKIP_ENTRY_BYTES: u64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipEntry {
    pub max_doc_id: DocId,
    pub doc_ids_offset: u64,
    pub freqs_offset: u64,
    pub len: u32,
}

impl SkipEntry {
    fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_u32::<LittleEndian>(self.max_doc_id)?;
        out.write_u64::<LittleEndian>(self.doc_ids_offset)?;
        out.write_u64::<LittleEndian>(self.freqs_offset)?;
        out.write_u32::<LittleEndian>(self.len)
    }

    fn read_from<R: Read>(input: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            max_doc_id: input.read_u32::<LittleEndian>()?,
            doc_ids_offset: input.read_u64::<LittleEndian>()?,
            freqs_offset: input.read_u64::<LittleEndian>()?,
            len: input.read_u32::<LittleEndian>()?,
        })
    }
}

/// Postings per skip chunk for a list of `n` postings.
pub fn skip_stride(n: usize) -> usize {
    ((n as f64).sqrt().ceil() as usize).max(1)
}

/// Appends encoded posting lists to the three global posting files.
pub struct PostingFileWriter {
    codec: Compression,
    skip_threshold: usize,
    doc_ids: CountingWriter<BufWriter<File>>,
    freqs: CountingWriter<BufWriter<File>>,
    skips: CountingWriter<BufWriter<File>>,
}

impl PostingFileWriter {
    pub fn create(paths: &IndexPaths, codec: Compression, skip_threshold: usize) -> Result<Self> {
        let open = |p: std::path::PathBuf| -> Result<_> { Ok(CountingWriter::new(BufWriter::new(File::create(p)?))) };
        Ok(Self {
            codec,
            skip_threshold,
            doc_ids: open(paths.doc_ids())?,
            freqs: open(paths.freqs())?,
            skips: open(paths.skips())?,
        })
    }

    /// Encode one docID-sorted list. The returned entry carries a zero upper bound.
    pub fn write_list(&mut self, postings: &[Posting]) -> Result<TermEntry> {
        let mut entry = TermEntry {
            offset_doc_ids: self.doc_ids.position(),
            offset_freqs: self.freqs.position(),
            offset_skips: self.skips.position(),
            skip_blocks: 0,
            posting_list_length: postings.len() as u32,
            max_term_frequency: postings.iter().map(|p| p.frequency).max().unwrap_or(0),
            term_upper_bound: 0.0,
        };
        let stride = if postings.len() > self.skip_threshold { skip_stride(postings.len()) } else { postings.len().max(1) };
        let mut prev = 0;
        for chunk in postings.chunks(stride) {
            let skip = SkipEntry {
                max_doc_id: chunk[chunk.len() - 1].doc_id,
                doc_ids_offset: self.doc_ids.position(),
                freqs_offset: self.freqs.position(),
                len: chunk.len() as u32,
            };
            for p in chunk {
                self.codec.encode_doc_id(prev, p.doc_id, &mut self.doc_ids)?;
                self.codec.encode_u32(p.frequency, &mut self.freqs)?;
                prev = p.doc_id;
            }
            if postings.len() > self.skip_threshold {
                skip.write_to(&mut self.skips)?;
                entry.skip_blocks += 1;
            }
        }
        Ok(entry)
    }

    pub fn finish(mut self) -> Result<()> {
        self.doc_ids.flush()?;
        self.freqs.flush()?;
        self.skips.flush()?;
        Ok(())
    }
}

/// Cursor over one term's postings, decoded lazily from its own file handles.
///
/// After [`PostingList::open`] the cursor sits on the first posting; it is
/// exhausted once it moves past the last one. Dropping it closes the files.
pub struct PostingList {
    term: String,
    codec: Compression,
    doc_ids: BufReader<File>,
    freqs: BufReader<File>,
    skips: Vec<SkipEntry>,
    block_starts: Vec<u32>,
    len: u32,
    position: u32,
    block: usize,
    prev_doc: DocId,
    current: Option<Posting>,
}

impl PostingList {
    pub fn open(paths: &IndexPaths, codec: Compression, term: &str, entry: &TermEntry) -> Result<Self> {
        let doc_file = File::open(paths.doc_ids())?;
        let freq_file = File::open(paths.freqs())?;
        let doc_file_len = doc_file.metadata()?.len();
        let freq_file_len = freq_file.metadata()?.len();
        if entry.posting_list_length > 0 && (entry.offset_doc_ids >= doc_file_len || entry.offset_freqs >= freq_file_len) {
            return Err(IndexError::Corrupt(format!("posting offsets of '{term}' lie past the end of the posting files")));
        }

        let skips = if entry.has_skips() {
            read_skips(paths, term, entry, doc_file_len, freq_file_len)?
        } else {
            Vec::new()
        };
        let mut block_starts = Vec::with_capacity(skips.len());
        let mut start = 0u32;
        for skip in &skips {
            block_starts.push(start);
            start += skip.len;
        }

        let mut doc_ids = BufReader::new(doc_file);
        let mut freqs = BufReader::new(freq_file);
        doc_ids.seek(SeekFrom::Start(entry.offset_doc_ids))?;
        freqs.seek(SeekFrom::Start(entry.offset_freqs))?;

        let mut list = Self {
            term: term.to_string(),
            codec,
            doc_ids,
            freqs,
            skips,
            block_starts,
            len: entry.posting_list_length,
            position: 0,
            block: 0,
            prev_doc: 0,
            current: None,
        };
        if list.len > 0 {
            list.decode_current()?;
        }
        Ok(list)
    }

    pub fn term(&self) -> &str { &self.term }
    pub fn len(&self) -> u32 { self.len }
    pub fn is_empty(&self) -> bool { self.len == 0 }
    pub fn has_skips(&self) -> bool { !self.skips.is_empty() }
    pub fn is_exhausted(&self) -> bool { self.current.is_none() }
    pub fn current(&self) -> Option<Posting> { self.current }

    /// DocID of the current posting. Panics on an exhausted cursor.
    #[inline]
    pub fn doc_id(&self) -> DocId {
        match self.current {
            Some(p) => p.doc_id,
            None => panic!("doc_id() on exhausted posting list '{}'", self.term),
        }
    }

    /// Frequency of the current posting. Panics on an exhausted cursor.
    #[inline]
    pub fn frequency(&self) -> u32 {
        match self.current {
            Some(p) => p.frequency,
            None => panic!("frequency() on exhausted posting list '{}'", self.term),
        }
    }

    pub fn next(&mut self) -> Result<Option<Posting>> {
        if self.current.is_none() {
            return Ok(None);
        }
        self.position += 1;
        if self.position >= self.len {
            self.current = None;
            return Ok(None);
        }
        self.decode_current()?;
        Ok(self.current)
    }

    /// Move to the first posting with docID >= `target`.
    pub fn next_geq(&mut self, target: DocId) -> Result<Option<Posting>> {
        match self.current {
            None => return Ok(None),
            Some(p) if p.doc_id >= target => return Ok(self.current),
            Some(_) => {}
        }
        if !self.skips.is_empty() {
            let mut block = self.block;
            while block < self.skips.len() && self.skips[block].max_doc_id < target {
                block += 1;
            }
            if block == self.skips.len() {
                self.position = self.len;
                self.current = None;
                return Ok(None);
            }
            if block > self.block {
                self.jump_to_block(block)?;
            }
        }
        while let Some(p) = self.current {
            if p.doc_id >= target {
                break;
            }
            self.next()?;
        }
        Ok(self.current)
    }

    /// Remaining postings from the current one to the end of the list.
    pub fn read_to_end(&mut self) -> Result<Vec<Posting>> {
        let mut out = Vec::with_capacity((self.len - self.position.min(self.len)) as usize);
        while let Some(p) = self.current {
            out.push(p);
            self.next()?;
        }
        Ok(out)
    }

    fn jump_to_block(&mut self, block: usize) -> Result<()> {
        let skip = self.skips[block];
        self.doc_ids.seek(SeekFrom::Start(skip.doc_ids_offset))?;
        self.freqs.seek(SeekFrom::Start(skip.freqs_offset))?;
        self.prev_doc = if block == 0 { 0 } else { self.skips[block - 1].max_doc_id };
        self.block = block;
        self.position = self.block_starts[block];
        self.decode_current()
    }

    fn decode_current(&mut self) -> Result<()> {
        let doc_id = self.codec.decode_doc_id(self.prev_doc, &mut self.doc_ids)?;
        let frequency = self.codec.decode_u32(&mut self.freqs)?;
        self.prev_doc = doc_id;
        self.current = Some(Posting { doc_id, frequency });
        while self.block + 1 < self.block_starts.len() && self.position >= self.block_starts[self.block + 1] {
            self.block += 1;
        }
        Ok(())
    }
}

fn read_skips(paths: &IndexPaths, term: &str, entry: &TermEntry, doc_file_len: u64, freq_file_len: u64) -> Result<Vec<SkipEntry>> {
    let corrupt = |reason: String| IndexError::CorruptSkipBlock { term: term.to_string(), reason };
    let mut file = File::open(paths.skips())?;
    let skip_file_len = file.metadata()?.len();
    let needed = entry.offset_skips + entry.skip_blocks as u64 * SKIP_ENTRY_BYTES;
    if needed > skip_file_len {
        return Err(corrupt(format!("{} entries at offset {} run past the skip file ({skip_file_len} bytes)", entry.skip_blocks, entry.offset_skips)));
    }
    file.seek(SeekFrom::Start(entry.offset_skips))?;
    let mut input = BufReader::new(file);
    let mut skips = Vec::with_capacity(entry.skip_blocks as usize);
    for _ in 0..entry.skip_blocks {
        skips.push(SkipEntry::read_from(&mut input)?);
    }

    let first = skips[0];
    if first.doc_ids_offset != entry.offset_doc_ids || first.freqs_offset != entry.offset_freqs {
        return Err(corrupt("first chunk does not start at the term's posting offsets".into()));
    }
    let mut total = 0u64;
    for (i, skip) in skips.iter().enumerate() {
        if skip.len == 0 {
            return Err(corrupt(format!("chunk {i} is empty")));
        }
        if skip.doc_ids_offset >= doc_file_len || skip.freqs_offset >= freq_file_len {
            return Err(corrupt(format!("chunk {i} points past the end of the posting files")));
        }
        if i > 0 {
            let prev = skips[i - 1];
            if skip.max_doc_id <= prev.max_doc_id {
                return Err(corrupt(format!("chunk {i} max docID {} is not above {}", skip.max_doc_id, prev.max_doc_id)));
            }
            if skip.doc_ids_offset <= prev.doc_ids_offset || skip.freqs_offset <= prev.freqs_offset {
                return Err(corrupt(format!("chunk {i} offsets go backwards")));
            }
        }
        total += skip.len as u64;
    }
    if total != entry.posting_list_length as u64 {
        return Err(corrupt(format!("chunks hold {total} postings, lexicon says {}", entry.posting_list_length)));
    }
    Ok(skips)
}
