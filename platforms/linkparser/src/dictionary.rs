use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use lg_parser::{Lexicon, LexiconSources};
use lg_protocol::Dictionary as _;
use lg_solver::LinkageValidator;
use log::info;

use crate::deprecation::DeprecationTracker;
use crate::error::{ConfigError, DictionaryError, Result};
use crate::options::{OptionsPatch, ParseOptions};
use crate::sentence::Sentence;

pub const DEFAULT_LANGUAGE: &str = "en";

struct Embedded {
    language: &'static str,
    dictionary: &'static str,
    knowledge: &'static str,
    constraints: &'static str,
    affixes: &'static str,
}

static EMBEDDED: &[Embedded] = &[Embedded {
    language: "en",
    dictionary: include_str!("../data/en/dict"),
    knowledge: include_str!("../data/en/knowledge"),
    constraints: include_str!("../data/en/constraints"),
    affixes: include_str!("../data/en/affix"),
}];

pub(crate) struct DictionaryInner {
    pub(crate) lexicon: Lexicon,
    pub(crate) options: ParseOptions,
    pub(crate) deprecations: Arc<DeprecationTracker>,
    /// Replaces the domain validator built from the lexicon.
    pub(crate) validator: Option<SharedValidator>,
}

pub type SharedValidator = Arc<dyn LinkageValidator + Send + Sync>;

/// A loaded grammar plus the default options sentences parse with.
///
/// Cloning is cheap; clones share the lexicon. Sentences keep only a weak
/// reference, so a dictionary must outlive the parses made through it.
#[derive(Clone)]
pub struct Dictionary {
    pub(crate) inner: Arc<DictionaryInner>,
}

impl Dictionary {
    /// The default language with default options.
    pub fn new() -> Result<Self> {
        Self::with_language(DEFAULT_LANGUAGE)
    }

    pub fn with_language(language: &str) -> Result<Self> {
        Self::with_language_and_options(language, ParseOptions::default())
    }

    pub fn with_language_and_options(language: &str, options: ParseOptions) -> Result<Self> {
        let embedded = EMBEDDED
            .iter()
            .find(|e| e.language == language)
            .ok_or_else(|| DictionaryError::UnknownLanguage(language.to_string()))?;
        let lexicon = Lexicon::from_sources(
            embedded.language,
            LexiconSources {
                dictionary: embedded.dictionary,
                knowledge: embedded.knowledge,
                constraints: embedded.constraints,
                affixes: embedded.affixes,
            },
        )?;
        Ok(Self::from_lexicon(lexicon, options))
    }

    /// Loads a grammar from its four files. The language is named after the
    /// directory holding the dictionary file.
    pub fn from_files(
        dictionary: impl AsRef<Path>,
        knowledge: impl AsRef<Path>,
        constraints: impl AsRef<Path>,
        affixes: impl AsRef<Path>,
    ) -> Result<Self> {
        let read = |path: &Path| {
            fs::read_to_string(path).map_err(|source| DictionaryError::Io { path: path.to_path_buf(), source })
        };
        let dictionary = dictionary.as_ref();
        let dict_text = read(dictionary)?;
        let knowledge_text = read(knowledge.as_ref())?;
        let constraints_text = read(constraints.as_ref())?;
        let affix_text = read(affixes.as_ref())?;

        let language = dictionary
            .parent()
            .and_then(|dir| dir.file_name())
            .and_then(|name| name.to_str())
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string();
        let lexicon = Lexicon::from_sources(
            &language,
            LexiconSources {
                dictionary: &dict_text,
                knowledge: &knowledge_text,
                constraints: &constraints_text,
                affixes: &affix_text,
            },
        )?;
        Ok(Self::from_lexicon(lexicon, ParseOptions::default()))
    }

    /// Constructor taking loosely typed arguments: nothing, a language, a
    /// language and a JSON object of options, or four file paths.
    pub fn from_args(args: &[&str]) -> Result<Self> {
        match args {
            [] => Self::new(),
            [language] => Self::with_language(language),
            [language, options] => {
                let patch = OptionsPatch::from_json(options)?;
                Self::with_language_and_options(language, ParseOptions::default().merge(patch))
            }
            [dictionary, knowledge, constraints, affixes] => {
                Self::from_files(dictionary, knowledge, constraints, affixes)
            }
            other => Err(ConfigError::Arity(other.len()).into()),
        }
    }

    pub fn from_lexicon(lexicon: Lexicon, options: ParseOptions) -> Self {
        info!(language = lexicon.language(), entries = lexicon.len(); "Dictionary ready");
        Self {
            inner: Arc::new(DictionaryInner {
                lexicon,
                options,
                deprecations: Arc::new(DeprecationTracker::new()),
                validator: None,
            }),
        }
    }

    /// Post-processes every linkage with `validator` instead of the domain rules.
    pub fn with_validator(self, validator: SharedValidator) -> Self {
        let inner = match Arc::try_unwrap(self.inner) {
            Ok(mut inner) => {
                inner.validator = Some(validator);
                inner
            }
            Err(shared) => DictionaryInner {
                lexicon: shared.lexicon.clone(),
                options: shared.options.clone(),
                deprecations: Arc::clone(&shared.deprecations),
                validator: Some(validator),
            },
        };
        Self { inner: Arc::new(inner) }
    }

    /// Restores a dictionary from [`Dictionary::snapshot`] bytes.
    pub fn from_snapshot(bytes: &[u8], options: ParseOptions) -> Result<Self> {
        let lexicon = Lexicon::from_bytes(bytes)?;
        Ok(Self::from_lexicon(lexicon, options))
    }

    pub fn snapshot(&self) -> Result<Vec<u8>> {
        Ok(self.inner.lexicon.to_bytes()?)
    }

    pub fn language(&self) -> &str {
        self.inner.lexicon.language()
    }

    /// Highest disjunct cost in the grammar.
    pub fn max_cost(&self) -> u32 {
        self.inner.lexicon.max_cost()
    }

    pub fn options(&self) -> &ParseOptions {
        &self.inner.options
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.inner.lexicon
    }

    pub fn deprecations(&self) -> &DeprecationTracker {
        &self.inner.deprecations
    }

    /// Tokenizes and parses `text` with the dictionary's options.
    pub fn parse(&self, text: &str) -> Result<Sentence> {
        let mut sentence = Sentence::new(text, self);
        sentence.parse()?;
        Ok(sentence)
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dictionary")
            .field("language", &self.language())
            .field("entries", &self.inner.lexicon.len())
            .field("max_cost", &self.max_cost())
            .finish()
    }
}
