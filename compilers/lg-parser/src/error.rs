use lg_protocol::ConnectorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("{file}, line {line}: {message}")]
    Syntax {
        file: &'static str,
        line: usize,
        message: String,
    },

    #[error("unknown macro <{0}>")]
    UnknownMacro(String),

    #[error("macro <{0}> expands into itself")]
    RecursiveMacro(String),

    #[error("entry '{word}' expands to more than {limit} disjuncts")]
    TooManyDisjuncts { word: String, limit: usize },

    #[error("the dictionary defines no {0}")]
    MissingWall(&'static str),

    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error("invalid lexicon snapshot: {0}")]
    Snapshot(String),
}
