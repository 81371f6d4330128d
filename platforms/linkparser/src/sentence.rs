use std::fmt;
use std::sync::{Arc, Weak};

use lg_parser::token::Token;
use lg_parser::Tokenizer;
use lg_protocol::Dictionary as _;
use lg_solver::{SolveOutcome, Solver};
use log::{debug, info, warn};

use crate::accessors::LinkageAccessors;
use crate::dictionary::{Dictionary, DictionaryInner};
use crate::error::{NoLinkagesError, ParseError, Result};
use crate::linkage::{Linkage, LinkageContext};
use crate::options::{OptionsPatch, ParseOptions};

/// A tokenized sentence and the linkages of its last parse.
pub struct Sentence {
    text: String,
    tokens: Vec<Token>,
    dictionary: Weak<DictionaryInner>,
    options: ParseOptions,
    linkages: Vec<Linkage>,
    parsed: bool,
    null_count: usize,
    num_found: u64,
    num_valid: usize,
    num_post_processed: usize,
}

impl Sentence {
    /// Tokenizes `text` against `dictionary`. Nothing is parsed yet.
    pub fn new(text: &str, dictionary: &Dictionary) -> Self {
        let options = dictionary.options().clone();
        let tokens = Tokenizer::new(&dictionary.inner.lexicon).with_spell_guess(options.spell_guess).tokenize(text);
        Self {
            text: text.to_string(),
            tokens,
            dictionary: Arc::downgrade(&dictionary.inner),
            options,
            linkages: Vec::new(),
            parsed: false,
            null_count: 0,
            num_found: 0,
            num_valid: 0,
            num_post_processed: 0,
        }
    }

    /// Parses with the dictionary's options; returns the number of linkages found.
    pub fn parse(&mut self) -> Result<usize> {
        let options = self.dictionary()?.options.clone();
        self.parse_with_options(options)
    }

    /// Parses with the dictionary's options overridden by `patch`.
    pub fn parse_with(&mut self, patch: impl Into<OptionsPatch>) -> Result<usize> {
        let options = self.dictionary()?.options.merge(patch);
        self.parse_with_options(options)
    }

    pub fn parse_with_options(&mut self, mut options: ParseOptions) -> Result<usize> {
        let dictionary = self.dictionary()?;
        if options.echo_on {
            info!(sentence = self.text.as_str(); "Parsing");
        }

        options.reset_resources();
        let mut solver = Solver::new(&dictionary.lexicon);
        if let Some(validator) = &dictionary.validator {
            solver = solver.with_validator(Box::new(Arc::clone(validator)));
        }
        let mut outcome = solver.solve(&self.tokens, &options.to_search_options()).map_err(ParseError::from)?;
        options.record_resources(outcome.timer_expired, outcome.memory_exhausted);

        if options.panic_mode && outcome.linkages.is_empty() && options.resources_exhausted() {
            if options.verbosity >= 1 {
                warn!(sentence = self.text.as_str(); "No complete linkage; retrying in panic mode");
            }
            let relaxed = options.panic_options(self.tokens.len());
            outcome = solver.solve(&self.tokens, &relaxed.to_search_options()).map_err(ParseError::from)?;
            options.record_resources(outcome.timer_expired, outcome.memory_exhausted);
        }

        self.attach(outcome, options, &dictionary);
        if self.options.batch_mode && (self.linkages.is_empty() || self.null_count > 0) {
            warn!(sentence = self.text.as_str(), nulls = self.null_count; "No complete linkage");
        }
        Ok(self.num_found as usize)
    }

    fn dictionary(&self) -> Result<Arc<DictionaryInner>> {
        Ok(self.dictionary.upgrade().ok_or(ParseError::DictionaryDropped)?)
    }

    fn attach(&mut self, outcome: SolveOutcome, options: ParseOptions, dictionary: &DictionaryInner) {
        let context = Arc::new(LinkageContext {
            texts: self.tokens.iter().map(|t| t.text.clone()).collect(),
            rules: dictionary.lexicon.knowledge().constituent_rules.clone(),
            options: options.clone(),
            deprecations: Arc::clone(&dictionary.deprecations),
        });
        let keep_bad = options.display_bad();
        self.linkages = outcome
            .linkages
            .into_iter()
            .filter(|raw| keep_bad || raw.is_valid())
            .map(|raw| Linkage::new(raw, Arc::clone(&context)))
            .collect();

        self.null_count = outcome.null_count;
        self.num_found = outcome.num_found;
        self.num_valid = outcome.num_valid;
        self.num_post_processed = outcome.num_post_processed;
        self.options = options;
        self.parsed = true;
        debug!(linkages = self.linkages.len(), nulls = self.null_count; "Linkages attached");
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Lookup forms of the tokenized words, walls included.
    pub fn words(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.form.as_str()).collect()
    }

    /// The word at `index`; negative indexes count from the end.
    pub fn word(&self, index: isize) -> Option<&str> {
        let len = self.tokens.len() as isize;
        let index = if index < 0 { len + index } else { index };
        if !(0..len).contains(&index) {
            return None;
        }
        Some(self.tokens[index as usize].form.as_str())
    }

    pub fn length(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    /// Options of the last parse, carrying its resource flags.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn null_count(&self) -> usize {
        self.null_count
    }

    pub fn num_linkages_found(&self) -> u64 {
        self.num_found
    }

    pub fn num_valid_linkages(&self) -> usize {
        self.num_valid
    }

    pub fn num_linkages_post_processed(&self) -> usize {
        self.num_post_processed
    }

    pub fn linkages(&self) -> &[Linkage] {
        &self.linkages
    }

    pub fn linkage(&self, index: usize) -> Option<&Linkage> {
        self.linkages.get(index)
    }

    pub fn linkage_mut(&mut self, index: usize) -> Option<&mut Linkage> {
        self.linkages.get_mut(index)
    }

    /// 1 if linkage `index` breaks a rule, else 0.
    pub fn num_violations(&self, index: usize) -> Option<usize> {
        self.linkages.get(index).map(|l| usize::from(l.violation_name().is_some()))
    }

    pub fn disjunct_cost(&self, index: usize) -> Option<u32> {
        self.linkages.get(index).map(Linkage::disjunct_cost)
    }
}

impl LinkageAccessors for Sentence {
    fn with_linkage<R>(&self, f: impl FnOnce(&Linkage) -> R) -> Result<R, NoLinkagesError> {
        self.linkages.first().map(f).ok_or(NoLinkagesError)
    }

    fn with_linkage_mut<R>(&mut self, f: impl FnOnce(&mut Linkage) -> R) -> Result<R, NoLinkagesError> {
        self.linkages.first_mut().map(f).ok_or(NoLinkagesError)
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.words().join(" "))
    }
}

impl fmt::Debug for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parsed {
            write!(f, "#<Sentence {:?}/{} linkages/{} nulls>", self.to_string(), self.linkages.len(), self.null_count)
        } else {
            write!(f, "#<Sentence {:?} (unparsed)>", self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_unparsed_sentence() {
        let dict = Dictionary::new().unwrap();
        let sentence = Sentence::new("The cat runs.", &dict);
        assert!(!sentence.is_parsed());
        assert_eq!(sentence.length(), 6);
        assert_eq!(sentence.word(0), Some("LEFT-WALL"));
        assert_eq!(sentence.word(-1), Some("RIGHT-WALL"));
        assert_eq!(sentence.word(-2), Some("."));
        assert_eq!(sentence.word(6), None);
        assert_eq!(sentence.word(-7), None);
        assert_eq!(sentence.to_string(), "LEFT-WALL the cat runs . RIGHT-WALL");
        assert!(format!("{:?}", sentence).ends_with("(unparsed)>"));
        assert!(matches!(sentence.num_links(), Err(NoLinkagesError)));
    }

    #[test]
    fn test_parse_attaches_linkages() {
        let dict = Dictionary::new().unwrap();
        let mut sentence = Sentence::new("The cat runs.", &dict);
        let found = sentence.parse().unwrap();
        assert_eq!(found, 1);
        assert!(sentence.is_parsed());
        assert_eq!(sentence.null_count(), 0);
        assert_eq!(sentence.num_valid_linkages(), 1);
        assert_eq!(sentence.num_violations(0), Some(0));
        assert_eq!(format!("{:?}", sentence), r#"#<Sentence "LEFT-WALL the cat runs . RIGHT-WALL"/1 linkages/0 nulls>"#);

        // Re-parsing replaces the linkages
        assert_eq!(sentence.parse_with(OptionsPatch { linkage_limit: Some(1), ..OptionsPatch::default() }).unwrap(), 1);
        assert_eq!(sentence.linkages().len(), 1);
        assert_eq!(sentence.options().linkage_limit, 1);
    }

    #[test]
    fn test_dropped_dictionary() {
        let dict = Dictionary::new().unwrap();
        let mut sentence = Sentence::new("The cat runs.", &dict);
        drop(dict);
        assert!(matches!(sentence.parse(), Err(Error::Parse(ParseError::DictionaryDropped))));
    }

    #[test]
    fn test_sentence_too_long() {
        let dict = Dictionary::new().unwrap();
        let mut sentence = Sentence::new("The cat runs.", &dict);
        let result = sentence.parse_with(OptionsPatch { max_sentence_length: Some(2), ..OptionsPatch::default() });
        assert!(matches!(result, Err(Error::Parse(ParseError::Search(_)))));
    }
}
