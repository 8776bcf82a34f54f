use searchcore::tokenizer::{tokenize, Parser, Tokenizer};

#[test]
fn it_normalizes_and_stems() {
    let words = tokenize("Running Runners RUN! The ﬁne menu.");
    // Stemming to "run" should appear
    assert!(words.contains(&"run".to_string()));
    // NFKC folds the "ﬁ" ligature
    assert!(words.contains(&"fine".to_string()));
}

#[test]
fn it_filters_stopwords() {
    let words = tokenize("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
}

#[test]
fn all_stopwords_yield_no_terms() {
    assert!(tokenize("the and of to").is_empty());
    assert!(!Tokenizer::new(false).parse("the and of to").is_empty());
}
