use serde::{Deserialize, Serialize};

pub type DocId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub frequency: u32,
}

impl Posting {
    pub fn new(doc_id: DocId, frequency: u32) -> Self { Self { doc_id, frequency } }
}

/// Lexicon record: where a term's postings live and how much a single posting can score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TermEntry {
    pub offset_doc_ids: u64,
    pub offset_freqs: u64,
    pub offset_skips: u64,
    /// Number of skip entries; 0 when the list has no skip block.
    pub skip_blocks: u32,
    pub posting_list_length: u32,
    pub max_term_frequency: u32,
    pub term_upper_bound: f32,
}

impl TermEntry {
    pub fn has_skips(&self) -> bool { self.skip_blocks > 0 }
}

/// Document index row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocInfo {
    pub doc_no: String,
    pub doc_len: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionStatistics {
    pub documents: u32,
    pub avg_doc_len: f64,
    /// Vocabulary size of the merged lexicon.
    pub terms: u32,
    pub postings: u64,
    pub blocks: u32,
}

impl CollectionStatistics {
    /// Fold one more document length into the running average.
    pub fn add_document(&mut self, doc_len: u32) {
        let n = self.documents as f64;
        self.avg_doc_len = self.avg_doc_len * n / (n + 1.0) + doc_len as f64 / (n + 1.0);
        self.documents += 1;
    }
}
