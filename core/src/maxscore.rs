//! Document-at-a-time top-K evaluation.
//!
//! Disjunctive queries use MaxScore: terms are ordered by upper bound, the
//! low-bound prefix whose summed bounds stay below the current threshold is
//! non-essential, candidates come only from essential cursors, and a
//! candidate is abandoned as soon as its score plus the remaining bounds can
//! no longer reach the threshold. Conjunctive queries drive the shortest list
//! and advance the others with `next_geq`.

use crate::doc_index::DocumentIndex;
use crate::error::Result;
use crate::postings::PostingList;
use crate::scoring::TermScorer;
use crate::topk::{ScoredDoc, TopK};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    #[default]
    Disjunctive,
    Conjunctive,
}

impl FromStr for QueryMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disjunctive" | "or" => Ok(QueryMode::Disjunctive),
            "conjunctive" | "and" => Ok(QueryMode::Conjunctive),
            other => Err(format!("unknown query mode '{other}', expected disjunctive or conjunctive")),
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QueryMode::Disjunctive => "disjunctive",
            QueryMode::Conjunctive => "conjunctive",
        })
    }
}

/// One query term ready for evaluation.
pub struct QueryTerm {
    pub cursor: PostingList,
    pub scorer: TermScorer,
    /// No single posting of this term scores above this.
    pub upper_bound: f64,
}

impl QueryTerm {
    #[inline]
    fn score_current(&self, docs: &DocumentIndex) -> f64 {
        let doc_id = self.cursor.doc_id();
        self.scorer.score(self.cursor.frequency(), docs.doc_len(doc_id))
    }
}

pub fn evaluate(terms: Vec<QueryTerm>, docs: &DocumentIndex, mode: QueryMode, k: usize) -> Result<Vec<ScoredDoc>> {
    if terms.is_empty() || k == 0 {
        return Ok(Vec::new());
    }
    match mode {
        QueryMode::Disjunctive => disjunctive(terms, docs, k),
        QueryMode::Conjunctive => conjunctive(terms, docs, k),
    }
}

pub fn disjunctive(mut terms: Vec<QueryTerm>, docs: &DocumentIndex, k: usize) -> Result<Vec<ScoredDoc>> {
    terms.sort_by(|a, b| a.upper_bound.partial_cmp(&b.upper_bound).unwrap_or(Ordering::Equal));
    // prefix[i]: summed bounds of terms 0..=i
    let prefix: Vec<f64> = terms
        .iter()
        .scan(0.0, |acc, t| {
            *acc += t.upper_bound;
            Some(*acc)
        })
        .collect();

    let mut top = TopK::new(k);
    let mut candidates = 0u64;
    let mut abandoned = 0u64;
    loop {
        let threshold = top.threshold();
        let first_essential = prefix.iter().position(|&p| p >= threshold).unwrap_or(terms.len());
        let candidate = terms[first_essential..]
            .iter()
            .filter_map(|t| t.cursor.current())
            .map(|p| p.doc_id)
            .min();
        let Some(candidate) = candidate else { break };
        candidates += 1;

        let mut score = 0.0;
        for i in (0..terms.len()).rev() {
            if i < first_essential {
                if score + prefix[i] < threshold {
                    abandoned += 1;
                    break;
                }
                terms[i].cursor.next_geq(candidate)?;
            }
            let term = &mut terms[i];
            if term.cursor.current().map(|p| p.doc_id) == Some(candidate) {
                score += term.score_current(docs);
                term.cursor.next()?;
            }
        }
        top.insert(candidate, score);
    }

    tracing::debug!(terms = terms.len(), candidates, abandoned, threshold = top.threshold(), "maxscore finished");
    Ok(top.into_sorted_vec())
}

pub fn conjunctive(mut terms: Vec<QueryTerm>, docs: &DocumentIndex, k: usize) -> Result<Vec<ScoredDoc>> {
    let driver = terms
        .iter()
        .enumerate()
        .min_by_key(|(_, t)| t.cursor.len())
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut top = TopK::new(k);
    let mut candidates = 0u64;
    'driver: while !terms[driver].cursor.is_exhausted() {
        let candidate = terms[driver].cursor.doc_id();
        let mut score = terms[driver].score_current(docs);
        terms[driver].cursor.next()?;
        candidates += 1;

        for i in 0..terms.len() {
            if i == driver {
                continue;
            }
            match terms[i].cursor.next_geq(candidate)? {
                Some(p) if p.doc_id == candidate => score += terms[i].score_current(docs),
                Some(_) => continue 'driver,
                None => break 'driver,
            }
        }
        top.insert(candidate, score);
    }

    tracing::debug!(terms = terms.len(), driver = terms[driver].cursor.term(), candidates, "conjunctive finished");
    Ok(top.into_sorted_vec())
}
