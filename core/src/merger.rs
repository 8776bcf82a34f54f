//! k-way merge of flushed blocks into the global index, followed by the
//! term upper bound pass.

use crate::builder::{BlockNumber, BlockReader};
use crate::config::IndexConfig;
use crate::doc_index::DocumentIndex;
use crate::error::{IndexError, Result};
use crate::index::{CollectionStatistics, Posting, TermEntry};
use crate::lexicon::{Lexicon, LexiconWriter};
use crate::persist::IndexPaths;
use crate::postings::{PostingFileWriter, PostingList};
use crate::scoring::{round_up_f32, TermScorer};
use rayon::prelude::*;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeSummary {
    pub terms: u32,
    pub postings: u64,
}

/// Merge blocks `1..=blocks` into the global posting files and lexicon.
///
/// Every term gets a placeholder upper bound of 0; run
/// [`compute_upper_bounds`] once the document index is final. A failure
/// leaves the blocks untouched, so the merge can simply be run again.
pub fn merge_blocks(paths: &IndexPaths, config: &IndexConfig, blocks: u32) -> Result<MergeSummary> {
    if blocks == 0 {
        return Err(IndexError::MissingBlocks(paths.blocks_dir().display().to_string()));
    }
    let start = Instant::now();
    let mut readers = (1..=blocks)
        .map(|b| BlockReader::open(paths, BlockNumber(b)))
        .collect::<Result<Vec<_>>>()?;

    // (term, block, reader index): equal terms pop in block order, which is docID order
    let mut heap: BinaryHeap<Reverse<(String, BlockNumber, usize)>> = BinaryHeap::with_capacity(readers.len());
    for (idx, reader) in readers.iter().enumerate() {
        if let Some(term) = reader.term() {
            heap.push(Reverse((term.to_string(), reader.block(), idx)));
        }
    }

    let mut postings = PostingFileWriter::create(paths, config.compression, config.skip_threshold)?;
    let mut lexicon = LexiconWriter::create(&paths.lexicon())?;
    let mut merged: Vec<Posting> = Vec::new();
    let mut contributors: Vec<usize> = Vec::with_capacity(readers.len());
    let mut summary = MergeSummary::default();

    while let Some(Reverse((term, _, idx))) = heap.pop() {
        contributors.clear();
        contributors.push(idx);
        while let Some(Reverse((next, _, _))) = heap.peek() {
            if *next != term {
                break;
            }
            if let Some(Reverse((_, _, idx))) = heap.pop() {
                contributors.push(idx);
            }
        }

        merged.clear();
        for &idx in &contributors {
            let reader = &mut readers[idx];
            let boundary = merged.last().map(|p| p.doc_id);
            let first_new = merged.len();
            reader.take_postings(&mut merged)?;
            if let (Some(last), Some(first)) = (boundary, merged.get(first_new)) {
                if first.doc_id <= last {
                    return Err(IndexError::Corrupt(format!(
                        "block {} starts term '{term}' at docID {} after docID {last}",
                        reader.block(),
                        first.doc_id
                    )));
                }
            }
            if let Some(next) = reader.term() {
                heap.push(Reverse((next.to_string(), reader.block(), idx)));
            }
        }

        let entry = postings.write_list(&merged)?;
        lexicon.write(&term, &entry)?;
        summary.terms += 1;
        summary.postings += merged.len() as u64;
    }

    postings.finish()?;
    lexicon.finish()?;
    tracing::info!(blocks, terms = summary.terms, postings = summary.postings, elapsed_ms = start.elapsed().as_millis() as u64, "blocks merged");
    Ok(summary)
}

/// Replace every placeholder bound in the lexicon with the largest score any
/// single posting of the term reaches under `config.scoring`.
///
/// Terms are scored in parallel; each worker opens its own cursor and the
/// lexicon is rewritten sequentially afterwards.
pub fn compute_upper_bounds(paths: &IndexPaths, config: &IndexConfig, stats: &CollectionStatistics) -> Result<()> {
    let start = Instant::now();
    let lexicon = Lexicon::load(paths)?;
    let docs = DocumentIndex::load(paths)?;
    let entries: Vec<(&str, &TermEntry)> = lexicon.iter().collect();

    let bounds = entries
        .par_iter()
        .map(|(term, entry)| term_upper_bound(paths, config, stats, &docs, term, entry))
        .collect::<Result<Vec<f32>>>()?;

    let tmp = paths.root.join("lexicon.bin.tmp");
    let mut writer = LexiconWriter::create(&tmp)?;
    for ((term, entry), bound) in entries.iter().zip(bounds) {
        writer.write(term, &TermEntry { term_upper_bound: bound, ..**entry })?;
    }
    writer.finish()?;
    fs::rename(&tmp, paths.lexicon())?;

    tracing::info!(terms = entries.len(), scoring = %config.scoring, elapsed_ms = start.elapsed().as_millis() as u64, "term upper bounds computed");
    Ok(())
}

fn term_upper_bound(
    paths: &IndexPaths,
    config: &IndexConfig,
    stats: &CollectionStatistics,
    docs: &DocumentIndex,
    term: &str,
    entry: &TermEntry,
) -> Result<f32> {
    let scorer = TermScorer::new(config.scoring, stats, entry.posting_list_length);
    let mut cursor = PostingList::open(paths, config.compression, term, entry)?;
    let mut max = 0.0f64;
    while let Some(p) = cursor.current() {
        max = max.max(scorer.score(p.frequency, docs.doc_len(p.doc_id)));
        cursor.next()?;
    }
    Ok(round_up_f32(max))
}
