//! Disk-resident inverted index with block-based construction and
//! MaxScore top-K retrieval.

pub mod builder;
pub mod codec;
pub mod config;
pub mod doc_index;
pub mod error;
pub mod index;
pub mod lexicon;
pub mod maxscore;
pub mod merger;
pub mod persist;
pub mod postings;
pub mod scoring;
pub mod searcher;
pub mod tokenizer;
pub mod topk;
pub mod writer;

pub use codec::Compression;
pub use config::IndexConfig;
pub use error::{IndexError, Result};
pub use index::{CollectionStatistics, DocId, DocInfo, Posting, TermEntry};
pub use maxscore::QueryMode;
pub use persist::IndexPaths;
pub use scoring::Scoring;
pub use searcher::{SearchHit, SearchOptions, Searcher};
pub use tokenizer::{Parser, Tokenizer};
pub use writer::{rebuild_from_blocks, BuildSummary, IndexWriter};
