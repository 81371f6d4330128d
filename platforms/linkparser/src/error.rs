use std::convert::Infallible;
use std::path::PathBuf;

use lg_parser::LexiconError;
use lg_solver::SearchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("wrong number of arguments ({0} for 0, 1, 2 or 4)")]
    Arity(usize),

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("invalid value for option '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("invalid cost model '{0}': expected 'vdal' or 'corpus'")]
    CostModel(String),

    #[error("malformed options: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("no dictionary for language '{0}'")]
    UnknownLanguage(String),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Lexicon(#[from] LexiconError),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("sentence has no linkages")]
pub struct NoLinkagesError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkageError {
    #[error("illegal constituent tree mode {0}: expected 1, 2 or 3")]
    Argument(String),

    #[error("constituent tree mode must be an integer, not '{0}'")]
    Type(String),

    #[error("no sublinkage {index}: linkage has {count}")]
    Sublinkage { index: usize, count: usize },
}

impl From<Infallible> for LinkageError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("the dictionary this sentence was created from has been dropped")]
    DictionaryDropped,

    #[error(transparent)]
    Search(#[from] SearchError),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dictionary(#[from] DictionaryError),

    #[error(transparent)]
    NoLinkages(#[from] NoLinkagesError),

    #[error(transparent)]
    Linkage(#[from] LinkageError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl From<Infallible> for Error {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

impl From<LexiconError> for Error {
    fn from(err: LexiconError) -> Self {
        Error::Dictionary(DictionaryError::Lexicon(err))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
