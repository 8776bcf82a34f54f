use crate::config::IndexConfig;
use crate::doc_index::DocumentIndex;
use crate::error::Result;
use crate::index::{CollectionStatistics, DocId};
use crate::lexicon::Lexicon;
use crate::maxscore::{evaluate, QueryMode, QueryTerm};
use crate::persist::{load_meta, load_statistics, IndexPaths};
use crate::postings::PostingList;
use crate::scoring::{Scoring, TermScorer};
use crate::tokenizer::{Parser, Tokenizer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

pub const DEFAULT_K: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Falls back to the scoring the index was built with.
    pub scoring: Option<Scoring>,
    pub mode: QueryMode,
    pub k: usize,
}

impl Default for SearchOptions {
    fn default() -> Self { Self { scoring: None, mode: QueryMode::Disjunctive, k: DEFAULT_K } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub doc_no: String,
    pub score: f64,
}

/// Read side of an index: lexicon and document index held in memory, posting
/// lists opened per query.
pub struct Searcher {
    paths: IndexPaths,
    config: IndexConfig,
    stats: CollectionStatistics,
    lexicon: Lexicon,
    docs: DocumentIndex,
    tokenizer: Tokenizer,
}

impl Searcher {
    pub fn open(paths: IndexPaths) -> Result<Self> {
        let meta = load_meta(&paths)?;
        let stats = load_statistics(&paths)?;
        let lexicon = Lexicon::load(&paths)?;
        let docs = DocumentIndex::load(&paths)?;
        tracing::info!(root = %paths.root.display(), documents = stats.documents, terms = lexicon.len(), scoring = %meta.config.scoring, "index opened");
        let tokenizer = Tokenizer::new(meta.config.stem_and_stop);
        Ok(Self { paths, config: meta.config, stats, lexicon, docs, tokenizer })
    }

    pub fn config(&self) -> &IndexConfig { &self.config }
    pub fn statistics(&self) -> &CollectionStatistics { &self.stats }
    pub fn lexicon(&self) -> &Lexicon { &self.lexicon }
    pub fn doc_index(&self) -> &DocumentIndex { &self.docs }

    /// Parse `text` the way documents were parsed at build time and run it.
    pub fn search(&self, text: &str, opts: &SearchOptions) -> Result<Vec<SearchHit>> {
        let terms = self.tokenizer.parse(text);
        self.search_terms(&terms, opts)
    }

    /// Run a query given as already parsed terms. Repeated terms count once
    /// and terms missing from the lexicon are dropped, in either mode.
    pub fn search_terms(&self, terms: &[String], opts: &SearchOptions) -> Result<Vec<SearchHit>> {
        let start = Instant::now();
        let scoring = opts.scoring.unwrap_or(self.config.scoring);
        let mut seen = HashSet::new();
        let mut query = Vec::new();
        for term in terms {
            if !seen.insert(term.as_str()) {
                continue;
            }
            let Some(entry) = self.lexicon.get(term) else { continue };
            let scorer = TermScorer::new(scoring, &self.stats, entry.posting_list_length);
            // stored bounds hold only for the scoring they were computed with
            let upper_bound = if scoring == self.config.scoring {
                entry.term_upper_bound as f64
            } else {
                scoring.upper_bound_from_max_tf(entry.max_term_frequency, scorer.idf())
            };
            let cursor = PostingList::open(&self.paths, self.config.compression, term, entry)?;
            query.push(QueryTerm { cursor, scorer, upper_bound });
        }
        if query.is_empty() {
            tracing::debug!(terms = terms.len(), "no query term in lexicon");
            return Ok(Vec::new());
        }

        let matched = query.len();
        let ranked = evaluate(query, &self.docs, opts.mode, opts.k)?;
        let hits = ranked
            .into_iter()
            .map(|d| SearchHit {
                doc_id: d.doc_id,
                doc_no: self.docs.get(d.doc_id).map(|info| info.doc_no.clone()).unwrap_or_default(),
                score: d.score,
            })
            .collect::<Vec<_>>();
        tracing::debug!(terms = matched, mode = %opts.mode, %scoring, k = opts.k, hits = hits.len(), elapsed_us = start.elapsed().as_micros() as u64, "query evaluated");
        Ok(hits)
    }
}
