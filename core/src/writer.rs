use crate::builder::{BlockNumber, IndexBuilder};
use crate::config::IndexConfig;
use crate::doc_index::DocumentIndexWriter;
use crate::error::{IndexError, Result};
use crate::index::{CollectionStatistics, DocId};
use crate::lexicon::LexiconWriter;
use crate::merger::{compute_upper_bounds, merge_blocks};
use crate::persist::{load_meta, load_statistics, save_meta, save_statistics, IndexPaths, MetaFile};
use crate::postings::PostingFileWriter;
use crate::tokenizer::{Parser, Tokenizer};
use std::time::Instant;

const PROGRESS_EVERY: u32 = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildSummary {
    pub documents: u32,
    /// Documents that produced no terms and got no docID.
    pub skipped: u32,
    pub blocks: u32,
    pub terms: u32,
    pub postings: u64,
}

/// Single-pass index construction: parse, append to the document index,
/// flush blocks under the memory budget, then merge and bound.
pub struct IndexWriter {
    paths: IndexPaths,
    config: IndexConfig,
    parser: Box<dyn Parser>,
    builder: IndexBuilder,
    doc_index: DocumentIndexWriter,
    next_block: BlockNumber,
    skipped: u32,
    started: Instant,
}

impl IndexWriter {
    /// Start a fresh index in `paths`, removing whatever a previous build left there.
    pub fn create(paths: IndexPaths, config: IndexConfig) -> Result<Self> {
        let parser = Box::new(Tokenizer::new(config.stem_and_stop));
        Self::with_parser(paths, config, parser)
    }

    pub fn with_parser(paths: IndexPaths, config: IndexConfig, parser: Box<dyn Parser>) -> Result<Self> {
        paths.clear()?;
        let doc_index = DocumentIndexWriter::create(&paths)?;
        tracing::info!(root = %paths.root.display(), compression = ?config.compression, stem_and_stop = config.stem_and_stop, memory_budget = config.memory_budget, "index build started");
        Ok(Self {
            paths,
            config,
            parser,
            builder: IndexBuilder::new(),
            doc_index,
            next_block: BlockNumber::first(),
            skipped: 0,
            started: Instant::now(),
        })
    }

    /// Parse and index one document. Returns `None` when the document has no
    /// terms left after parsing; it is skipped without using a docID.
    pub fn add_document(&mut self, doc_no: &str, text: &str) -> Result<Option<DocId>> {
        let terms = self.parser.parse(text);
        self.add_terms(doc_no, &terms)
    }

    /// Index an already parsed document.
    pub fn add_terms(&mut self, doc_no: &str, terms: &[String]) -> Result<Option<DocId>> {
        if terms.is_empty() {
            self.skipped += 1;
            tracing::debug!(doc_no, "document has no terms, skipped");
            return Ok(None);
        }
        let doc_id = self.doc_index.append(doc_no, terms.len() as u32)?;
        self.builder.insert(doc_id, terms);
        if self.builder.memory_usage() >= self.config.memory_budget {
            self.next_block = self.builder.flush(&self.paths, self.next_block)?;
        }
        if doc_id % PROGRESS_EVERY == 0 {
            tracing::info!(documents = doc_id, elapsed_s = self.started.elapsed().as_secs(), "indexing progress");
        }
        Ok(Some(doc_id))
    }

    pub fn documents(&self) -> u32 { self.doc_index.statistics().documents }

    /// Flush the last block, persist statistics and metadata, merge the
    /// blocks, compute upper bounds and delete the blocks.
    pub fn finish(mut self) -> Result<BuildSummary> {
        if !self.builder.is_empty() {
            self.next_block = self.builder.flush(&self.paths, self.next_block)?;
        }
        let blocks = self.next_block.get() - 1;
        let mut stats = self.doc_index.finish()?;
        stats.blocks = blocks;
        save_statistics(&self.paths, &stats)?;
        save_meta(&self.paths, &MetaFile::now(self.config.clone()))?;
        tracing::info!(documents = stats.documents, skipped = self.skipped, blocks, avg_doc_len = stats.avg_doc_len, "parsing finished");

        let mut summary = if blocks == 0 {
            write_empty_index(&self.paths, &self.config)?;
            BuildSummary::default()
        } else {
            merge_and_bound(&self.paths, &self.config, &mut stats)?
        };
        summary.skipped = self.skipped;
        tracing::info!(documents = summary.documents, terms = summary.terms, postings = summary.postings, elapsed_s = self.started.elapsed().as_secs(), "index build complete");
        Ok(summary)
    }
}

/// Run the merge and upper bound pass again from the blocks a failed build left behind.
pub fn rebuild_from_blocks(paths: &IndexPaths) -> Result<BuildSummary> {
    let meta = load_meta(paths)?;
    let mut stats = load_statistics(paths)?;
    if stats.blocks == 0 || !paths.blocks_dir().exists() {
        return Err(IndexError::MissingBlocks(paths.blocks_dir().display().to_string()));
    }
    merge_and_bound(paths, &meta.config, &mut stats)
}

fn merge_and_bound(paths: &IndexPaths, config: &IndexConfig, stats: &mut CollectionStatistics) -> Result<BuildSummary> {
    let merged = merge_blocks(paths, config, stats.blocks)?;
    stats.terms = merged.terms;
    stats.postings = merged.postings;
    save_statistics(paths, stats)?;
    // bounds are computed against the statistics exactly as queries will load them
    let persisted = load_statistics(paths)?;
    compute_upper_bounds(paths, config, &persisted)?;
    paths.remove_blocks()?;
    Ok(BuildSummary { documents: stats.documents, skipped: 0, blocks: stats.blocks, terms: merged.terms, postings: merged.postings })
}

fn write_empty_index(paths: &IndexPaths, config: &IndexConfig) -> Result<()> {
    PostingFileWriter::create(paths, config.compression, config.skip_threshold)?.finish()?;
    LexiconWriter::create(&paths.lexicon())?.finish()?;
    Ok(())
}
