#![allow(dead_code)]

use searchcore::lexicon::Lexicon;
use searchcore::postings::PostingList;
use searchcore::scoring::TermScorer;
use searchcore::topk::{ScoredDoc, TopK};
use searchcore::{BuildSummary, IndexConfig, IndexPaths, IndexWriter, Posting, Scoring, Searcher};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

pub fn word(i: u64) -> String { format!("w{i}") }

/// Documents over a skewed vocabulary of `vocab` words: low word numbers are
/// far more frequent than high ones.
pub fn corpus(seed: u64, docs: usize, vocab: u64) -> Vec<(String, String)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..docs)
        .map(|i| {
            let len = rng.random_range(3..33usize);
            let text = (0..len)
                .map(|_| {
                    let a = rng.random_range(0..vocab);
                    let b = rng.random_range(0..vocab);
                    word(a * b / vocab)
                })
                .collect::<Vec<_>>()
                .join(" ");
            (format!("DOC-{i:05}"), text)
        })
        .collect()
}

/// Word numbers for generated documents: mostly a handful of frequent
/// words, the rest spread over a longer tail.
pub fn word_number() -> impl Strategy<Value = u64> {
    prop_oneof![3 => 0u64..6, 1 => 0u64..80]
}

/// Small collections of non-empty documents, as `(doc_no, text)`.
pub fn corpus_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(prop::collection::vec(word_number(), 1..25), 1..120).prop_map(|docs| {
        docs.into_iter()
            .enumerate()
            .map(|(i, words)| {
                let text = words.into_iter().map(word).collect::<Vec<_>>().join(" ");
                (format!("DOC-{i:05}"), text)
            })
            .collect()
    })
}

/// Plain config: no stemming so `w12` stays `w12`.
pub fn config() -> IndexConfig {
    IndexConfig { stem_and_stop: false, ..IndexConfig::default() }
}

pub fn build(dir: &Path, docs: &[(String, String)], config: IndexConfig) -> BuildSummary {
    let mut writer = IndexWriter::create(IndexPaths::new(dir), config).unwrap();
    for (doc_no, text) in docs {
        writer.add_document(doc_no, text).unwrap();
    }
    writer.finish().unwrap()
}

pub fn all_postings(paths: &IndexPaths, searcher: &Searcher) -> BTreeMap<String, Vec<Posting>> {
    searcher
        .lexicon()
        .iter()
        .map(|(term, entry)| {
            let mut list = PostingList::open(paths, searcher.config().compression, term, entry).unwrap();
            (term.to_string(), list.read_to_end().unwrap())
        })
        .collect()
}

/// Exhaustive disjunctive top-K: score every document, summing term
/// contributions in the same order the evaluator does.
pub fn brute_force(paths: &IndexPaths, searcher: &Searcher, terms: &[&str], scoring: Scoring, k: usize) -> Vec<ScoredDoc> {
    let lexicon: &Lexicon = searcher.lexicon();
    let stats = searcher.statistics();
    let docs = searcher.doc_index();
    let mut seen = HashSet::new();
    let mut query = Vec::new();
    for &term in terms {
        if !seen.insert(term) {
            continue;
        }
        let Some(entry) = lexicon.get(term) else { continue };
        let scorer = TermScorer::new(scoring, stats, entry.posting_list_length);
        let bound = if scoring == searcher.config().scoring {
            entry.term_upper_bound as f64
        } else {
            scoring.upper_bound_from_max_tf(entry.max_term_frequency, scorer.idf())
        };
        let mut list = PostingList::open(paths, searcher.config().compression, term, entry).unwrap();
        let postings: BTreeMap<u32, u32> = list.read_to_end().unwrap().into_iter().map(|p| (p.doc_id, p.frequency)).collect();
        query.push((bound, scorer, postings));
    }
    query.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    let mut top = TopK::new(k);
    for doc_id in 1..=docs.len() as u32 {
        let mut score = 0.0;
        let mut matched = false;
        for (_, scorer, postings) in query.iter().rev() {
            if let Some(&tf) = postings.get(&doc_id) {
                score += scorer.score(tf, docs.doc_len(doc_id));
                matched = true;
            }
        }
        if matched {
            top.insert(doc_id, score);
        }
    }
    top.into_sorted_vec()
}

pub fn assert_same_ranking(got: &[ScoredDoc], want: &[ScoredDoc]) {
    let got_ids: Vec<u32> = got.iter().map(|d| d.doc_id).collect();
    let want_ids: Vec<u32> = want.iter().map(|d| d.doc_id).collect();
    assert_eq!(got_ids, want_ids);
    for (g, w) in got.iter().zip(want) {
        assert!((g.score - w.score).abs() < 1e-9, "doc {}: {} vs {}", g.doc_id, g.score, w.score);
    }
}
