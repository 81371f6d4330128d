//! Link-grammar sentence parsing.
//!
//! A [`Dictionary`] tokenizes and parses text into a [`Sentence`]; each of its
//! [`Linkage`]s is one way the words link together, ranked by cost.
//!
//! ```no_run
//! use linkparser::{Dictionary, LinkageAccessors};
//!
//! let dict = Dictionary::new()?;
//! let sentence = dict.parse("The cat runs.")?;
//! println!("{}", sentence.diagram()?);
//! assert_eq!(sentence.subject(false)?.as_deref(), Some("cat"));
//! # Ok::<(), linkparser::Error>(())
//! ```

pub mod accessors;
pub mod constituents;
pub mod deprecation;
pub mod dictionary;
pub mod error;
pub mod link_types;
pub mod linkage;
pub mod options;
mod render;
pub mod sentence;

pub use accessors::LinkageAccessors;
pub use constituents::{CTree, ConstituentMode};
pub use deprecation::DeprecationTracker;
pub use dictionary::{Dictionary, SharedValidator, DEFAULT_LANGUAGE};
pub use error::{ConfigError, DictionaryError, Error, LinkageError, NoLinkagesError, ParseError, Result};
pub use link_types::describe_link_type;
pub use linkage::{Link, Linkage, LinkageReport};
pub use options::{DisplayFlags, OptionsPatch, ParseOptions, OPTION_KEYS};
pub use sentence::Sentence;

pub use lg_solver::{CostModel, LinkageValidator, Validation, ValidationInput};
