use thiserror::Error;

/// Errors raised while building or querying an index.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A skip block that points outside its posting list or is out of order.
    #[error("Corrupt skip block for term '{term}': {reason}")]
    CorruptSkipBlock { term: String, reason: String },

    #[error("Corrupt index: {0}")]
    Corrupt(String),

    #[error("No blocks to merge in {0}")]
    MissingBlocks(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;

impl IndexError {
    /// True for faults in the index files themselves rather than in the environment.
    pub fn is_integrity_fault(&self) -> bool {
        matches!(self, IndexError::CorruptSkipBlock { .. } | IndexError::Corrupt(_))
    }
}
