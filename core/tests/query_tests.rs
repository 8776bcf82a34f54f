mod common;

use common::{assert_same_ranking, brute_force, build, config, corpus, corpus_strategy, word, word_number};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use searchcore::postings::PostingList;
use searchcore::scoring::{idf, TermScorer};
use searchcore::topk::{ScoredDoc, TopK};
use searchcore::{IndexConfig, IndexPaths, IndexWriter, QueryMode, Scoring, SearchOptions, Searcher};
use std::collections::BTreeMap;

fn to_scored(hits: &[searchcore::SearchHit]) -> Vec<ScoredDoc> {
    hits.iter().map(|h| ScoredDoc { doc_id: h.doc_id, score: h.score }).collect()
}

fn random_queries(seed: u64, count: usize, vocab: u64) -> Vec<Vec<String>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let len = rng.random_range(1..6usize);
            // mostly frequent words, sometimes rare or unknown ones
            (0..len)
                .map(|_| word(rng.random_range(0..vocab / 4) * rng.random_range(0..4) + rng.random_range(0..3)))
                .collect()
        })
        .collect()
}

fn disjunctive_matches_brute_force(index_scoring: Scoring, query_scoring: Scoring) {
    let dir = tempfile::tempdir().unwrap();
    let docs = corpus(21, 2_000, 300);
    build(dir.path(), &docs, IndexConfig { scoring: index_scoring, skip_threshold: 40, memory_budget: 64 * 1024, ..config() });
    let paths = IndexPaths::new(dir.path());
    let searcher = Searcher::open(paths.clone()).unwrap();

    for (n, query) in random_queries(99, 60, 300).iter().enumerate() {
        let refs: Vec<&str> = query.iter().map(String::as_str).collect();
        for k in [1, 3, 10, 50] {
            let opts = SearchOptions { scoring: Some(query_scoring), mode: QueryMode::Disjunctive, k };
            let got = searcher.search_terms(query, &opts).unwrap();
            let want = brute_force(&paths, &searcher, &refs, query_scoring, k);
            assert!(got.len() <= k);
            assert_same_ranking(&to_scored(&got), &want);
            for hit in &got {
                assert_eq!(hit.doc_no, format!("DOC-{:05}", hit.doc_id - 1), "query {n}");
            }
        }
    }
}

#[test]
fn maxscore_matches_exhaustive_bm25() {
    disjunctive_matches_brute_force(Scoring::default(), Scoring::default());
}

#[test]
fn maxscore_matches_exhaustive_tfidf() {
    disjunctive_matches_brute_force(Scoring::TfIdf, Scoring::TfIdf);
}

#[test]
fn maxscore_matches_exhaustive_when_query_scoring_differs_from_index() {
    disjunctive_matches_brute_force(Scoring::default(), Scoring::TfIdf);
    disjunctive_matches_brute_force(Scoring::TfIdf, Scoring::Bm25 { k1: 1.2, b: 0.5 });
}

fn scoring_strategy() -> impl Strategy<Value = Scoring> {
    prop_oneof![Just(Scoring::default()), Just(Scoring::TfIdf), Just(Scoring::Bm25 { k1: 1.2, b: 0.5 })]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn maxscore_equals_exhaustive_for_any_collection(
        docs in corpus_strategy(),
        query in prop::collection::vec(word_number(), 1..6),
        k in 1usize..15,
        index_scoring in scoring_strategy(),
        query_scoring in scoring_strategy(),
        skip_threshold in 2usize..40,
    ) {
        let dir = tempfile::tempdir().unwrap();
        build(dir.path(), &docs, IndexConfig { scoring: index_scoring, skip_threshold, ..config() });
        let paths = IndexPaths::new(dir.path());
        let searcher = Searcher::open(paths.clone()).unwrap();

        let terms: Vec<String> = query.into_iter().map(word).collect();
        let refs: Vec<&str> = terms.iter().map(String::as_str).collect();
        let opts = SearchOptions { scoring: Some(query_scoring), mode: QueryMode::Disjunctive, k };
        let got = searcher.search_terms(&terms, &opts).unwrap();
        let want = brute_force(&paths, &searcher, &refs, query_scoring, k);
        prop_assert!(got.len() <= k);
        assert_same_ranking(&to_scored(&got), &want);
    }
}

#[test]
fn conjunctive_returns_only_documents_with_every_term() {
    let dir = tempfile::tempdir().unwrap();
    build(dir.path(), &corpus(4, 1_200, 80), IndexConfig { skip_threshold: 20, ..config() });
    let paths = IndexPaths::new(dir.path());
    let searcher = Searcher::open(paths.clone()).unwrap();
    let stats = searcher.statistics();

    for query in [vec!["w0", "w1"], vec!["w2", "w0", "w5"], vec!["w3"], vec!["w1", "w10"]] {
        let mut lists = Vec::new();
        for term in &query {
            let entry = searcher.lexicon().get(term).unwrap();
            let mut cursor = PostingList::open(&paths, searcher.config().compression, term, entry).unwrap();
            let postings: BTreeMap<u32, u32> = cursor.read_to_end().unwrap().into_iter().map(|p| (p.doc_id, p.frequency)).collect();
            lists.push((TermScorer::new(Scoring::default(), stats, entry.posting_list_length), postings));
        }
        // the evaluator sums the driver first, then the others in query order
        let driver = (0..lists.len()).min_by_key(|&i| lists[i].1.len()).unwrap();
        let mut top = TopK::new(20);
        for (&doc_id, _) in &lists[driver].1 {
            if lists.iter().all(|(_, l)| l.contains_key(&doc_id)) {
                let len = searcher.doc_index().doc_len(doc_id);
                let mut score = lists[driver].0.score(lists[driver].1[&doc_id], len);
                for (i, (scorer, l)) in lists.iter().enumerate() {
                    if i != driver {
                        score += scorer.score(l[&doc_id], len);
                    }
                }
                top.insert(doc_id, score);
            }
        }
        let want = top.into_sorted_vec();

        let terms: Vec<String> = query.iter().map(|t| t.to_string()).collect();
        let opts = SearchOptions { mode: QueryMode::Conjunctive, k: 20, ..Default::default() };
        let got = searcher.search_terms(&terms, &opts).unwrap();
        assert_same_ranking(&to_scored(&got), &want);
        for hit in &got {
            assert!(lists.iter().all(|(_, l)| l.contains_key(&hit.doc_id)));
        }
    }
}

#[test]
fn shorter_document_with_higher_frequency_ranks_first() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = IndexWriter::create(IndexPaths::new(dir.path()), config()).unwrap();
    let doc = |x: usize, len: usize, tag: &str| -> Vec<String> {
        let mut terms = vec!["x".to_string(); x];
        terms.extend((x..len).map(|i| format!("{tag}{i}")));
        terms
    };
    writer.add_terms("one", &doc(2, 10, "a")).unwrap();
    writer.add_terms("two", &doc(0, 20, "b")).unwrap();
    writer.add_terms("three", &doc(1, 15, "c")).unwrap();
    writer.finish().unwrap();

    let searcher = Searcher::open(IndexPaths::new(dir.path())).unwrap();
    assert_eq!(searcher.statistics().avg_doc_len, 15.0);
    let hits = searcher.search_terms(&["x".to_string()], &SearchOptions::default()).unwrap();
    let ids: Vec<u32> = hits.iter().map(|h| h.doc_id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(hits[0].doc_no, "one");

    let w = idf(3, 2);
    let expect_one = 2.0 * w / (1.6 * (0.25 + 0.75 * 10.0 / 15.0) + 2.0);
    let expect_three = w / (1.6 * (0.25 + 0.75) + 1.0);
    assert!((hits[0].score - expect_one).abs() < 1e-12);
    assert!((hits[1].score - expect_three).abs() < 1e-12);
}

#[test]
fn document_holding_both_rare_terms_wins_with_k_one() {
    let dir = tempfile::tempdir().unwrap();
    let docs: Vec<(String, String)> = [
        ("d1", "alpha beta gamma"),
        ("d2", "gamma delta"),
        ("d3", "delta epsilon gamma"),
        ("d4", "epsilon zeta"),
    ]
    .iter()
    .map(|(a, b)| (a.to_string(), b.to_string()))
    .collect();
    build(dir.path(), &docs, config());
    let searcher = Searcher::open(IndexPaths::new(dir.path())).unwrap();

    let opts = SearchOptions { k: 1, ..Default::default() };
    let hits = searcher.search("alpha beta", &opts).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].doc_no, "d1");

    let stats = searcher.statistics();
    let single = |term: &str| searcher.search(term, &opts).unwrap()[0].score;
    let scorer = TermScorer::new(Scoring::default(), stats, 1);
    assert!((single("alpha") - scorer.score(1, 3)).abs() < 1e-12);
    assert!((hits[0].score - (single("alpha") + single("beta"))).abs() < 1e-12);
}

#[test]
fn empty_unknown_and_repeated_queries() {
    let dir = tempfile::tempdir().unwrap();
    build(dir.path(), &corpus(8, 200, 50), config());
    let searcher = Searcher::open(IndexPaths::new(dir.path())).unwrap();
    let opts = SearchOptions::default();

    assert!(searcher.search("", &opts).unwrap().is_empty());
    assert!(searcher.search("nosuchterm another", &opts).unwrap().is_empty());
    assert!(searcher.search("w1", &SearchOptions { k: 0, ..opts }).unwrap().is_empty());

    let once = searcher.search("w1 w2", &opts).unwrap();
    let repeated = searcher.search("w1 w2 w1 w1 nosuchterm", &opts).unwrap();
    assert_eq!(once, repeated);
    assert!(!once.is_empty());

    let and = SearchOptions { mode: QueryMode::Conjunctive, ..opts };
    // unknown terms are dropped before evaluation, in either mode
    assert_eq!(searcher.search("w1 nosuchterm", &and).unwrap(), searcher.search("w1", &and).unwrap());
}

#[test]
fn results_are_ordered_and_capped() {
    let dir = tempfile::tempdir().unwrap();
    build(dir.path(), &corpus(2, 500, 40), config());
    let searcher = Searcher::open(IndexPaths::new(dir.path())).unwrap();
    let hits = searcher.search("w0 w3 w7", &SearchOptions { k: 25, ..Default::default() }).unwrap();
    assert_eq!(hits.len(), 25);
    for pair in hits.windows(2) {
        assert!(pair[0].score > pair[1].score || (pair[0].score == pair[1].score && pair[0].doc_id < pair[1].doc_id));
    }
}
