use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("sentence has {words} words, more than the limit of {limit}")]
    SentenceTooLong { words: usize, limit: usize },

    #[error("min_null_count {min} exceeds max_null_count {max}")]
    NullRange { min: usize, max: usize },

    #[error("unknown cost model '{0}' (expected 'vdal' or 'corpus')")]
    UnknownCostModel(String),
}
