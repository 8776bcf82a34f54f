use crate::index::CollectionStatistics;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const BM25_K1: f64 = 1.6;
pub const BM25_B: f64 = 0.75;

/// The two closed-form scoring functions, each carrying its own parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Scoring {
    Bm25 { k1: f64, b: f64 },
    TfIdf,
}

impl Default for Scoring {
    fn default() -> Self { Scoring::Bm25 { k1: BM25_K1, b: BM25_B } }
}

impl Scoring {
    /// Contribution of one posting. `avg_doc_len` must be positive.
    #[inline]
    pub fn score(&self, tf: u32, doc_len: u32, idf: f64, avg_doc_len: f64) -> f64 {
        let tf = tf as f64;
        match *self {
            Scoring::Bm25 { k1, b } => {
                let norm = k1 * ((1.0 - b) + b * (doc_len as f64 / avg_doc_len));
                tf * idf / (norm + tf)
            }
            Scoring::TfIdf => (1.0 + tf.ln()) * idf,
        }
    }

    /// Bound on any posting with frequency at most `max_tf`, valid for every
    /// document length (BM25 is largest for an empty document).
    pub fn upper_bound_from_max_tf(&self, max_tf: u32, idf: f64) -> f64 {
        match *self {
            Scoring::Bm25 { k1, b } => {
                let tf = max_tf as f64;
                tf * idf / (k1 * (1.0 - b) + tf)
            }
            Scoring::TfIdf => (1.0 + (max_tf.max(1) as f64).ln()) * idf,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scoring::Bm25 { .. } => "bm25",
            Scoring::TfIdf => "tfidf",
        }
    }
}

impl fmt::Display for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for Scoring {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bm25" => Ok(Scoring::default()),
            "tfidf" | "tf-idf" => Ok(Scoring::TfIdf),
            other => Err(format!("unknown scoring function '{other}', expected bm25 or tfidf")),
        }
    }
}

/// `ln(N / df)`.
pub fn idf(documents: u32, df: u32) -> f64 {
    (documents as f64 / df.max(1) as f64).ln()
}

/// Per-query scorer for one term: idf and average length are fixed up front.
#[derive(Debug, Clone, Copy)]
pub struct TermScorer {
    scoring: Scoring,
    idf: f64,
    avg_doc_len: f64,
}

impl TermScorer {
    pub fn new(scoring: Scoring, stats: &CollectionStatistics, df: u32) -> Self {
        let avg_doc_len = if stats.avg_doc_len > 0.0 { stats.avg_doc_len } else { 1.0 };
        Self { scoring, idf: idf(stats.documents, df), avg_doc_len }
    }

    #[inline]
    pub fn score(&self, tf: u32, doc_len: u32) -> f64 {
        self.scoring.score(tf, doc_len, self.idf, self.avg_doc_len)
    }

    pub fn idf(&self) -> f64 { self.idf }
}

/// Narrow to f32 without ever going below `value`.
pub fn round_up_f32(value: f64) -> f32 {
    let narrowed = value as f32;
    if narrowed as f64 >= value || narrowed.is_nan() || narrowed == f32::INFINITY {
        return narrowed;
    }
    if narrowed == 0.0 {
        f32::from_bits(1)
    } else if narrowed > 0.0 {
        f32::from_bits(narrowed.to_bits() + 1)
    } else {
        f32::from_bits(narrowed.to_bits() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(documents: u32, avg_doc_len: f64) -> CollectionStatistics {
        CollectionStatistics { documents, avg_doc_len, ..Default::default() }
    }

    #[test]
    fn bm25_prefers_short_documents_with_more_hits() {
        // three documents of lengths 10, 20, 15; "x" in doc 1 (tf 2) and doc 3 (tf 1)
        let scorer = TermScorer::new(Scoring::default(), &stats(3, 15.0), 2);
        let doc1 = scorer.score(2, 10);
        let doc3 = scorer.score(1, 15);
        let idf = (3.0f64 / 2.0).ln();
        let expected1 = 2.0 * idf / (1.6 * (0.25 + 0.75 * (10.0 / 15.0)) + 2.0);
        let expected3 = idf / (1.6 + 1.0);
        assert!((doc1 - expected1).abs() < 1e-12);
        assert!((doc3 - expected3).abs() < 1e-12);
        assert!(doc1 > doc3);
    }

    #[test]
    fn tfidf_is_log_scaled() {
        let scorer = TermScorer::new(Scoring::TfIdf, &stats(100, 5.0), 10);
        let expected = (1.0 + 4f64.ln()) * 10f64.ln();
        assert!((scorer.score(4, 999) - expected).abs() < 1e-12);
        assert!((scorer.score(1, 1) - 10f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn max_tf_bound_covers_any_length() {
        let scoring = Scoring::default();
        let idf = idf(1000, 7);
        let bound = scoring.upper_bound_from_max_tf(5, idf);
        for tf in 1..=5 {
            for len in [0, 1, 3, 50, 10_000] {
                assert!(scoring.score(tf, len, idf, 12.5) <= bound);
            }
        }
    }

    #[test]
    fn rounding_up_never_undershoots() {
        for v in [0.1f64, 1.0 / 3.0, 2.718281828459045, 1e-40, 0.0, 12345.678901234] {
            assert!(round_up_f32(v) as f64 >= v);
        }
    }

    #[test]
    fn parses_scoring_names() {
        assert_eq!("BM25".parse::<Scoring>().unwrap(), Scoring::default());
        assert_eq!("tfidf".parse::<Scoring>().unwrap(), Scoring::TfIdf);
        assert!("cosine".parse::<Scoring>().is_err());
    }
}
