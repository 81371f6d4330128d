use alloc::string::String;
use alloc::vec::Vec;

use crate::connector::label_matches;
use crate::model::{AffixTable, ContainsOneRule, Knowledge, LexEntry};

/// Spelling of the entry used for words the lexicon does not know.
pub const UNKNOWN_WORD: &str = "UNKNOWN-WORD";
pub const LEFT_WALL: &str = "LEFT-WALL";
pub const RIGHT_WALL: &str = "RIGHT-WALL";

/// The service the tokenizer and the solver consult: word forms in, candidate
/// entries out, plus the language-level tables.
pub trait Dictionary {
    fn language(&self) -> &str;

    /// Every entry whose spelling, minus subscript, equals `form`.
    fn lookup(&self, form: &str) -> Vec<&LexEntry>;

    fn knowledge(&self) -> &Knowledge;

    fn constraints(&self) -> &[ContainsOneRule];

    fn affixes(&self) -> &AffixTable;

    /// Highest disjunct cost present in the lexicon.
    fn max_cost(&self) -> u32;

    fn unknown_word(&self) -> Option<&LexEntry> {
        self.lookup(UNKNOWN_WORD).into_iter().next()
    }

    fn is_conjunction(&self, form: &str) -> bool {
        self.knowledge().conjunctions.iter().any(|c| c == form)
    }

    fn is_known(&self, form: &str) -> bool {
        !self.lookup(form).is_empty() || self.is_conjunction(form)
    }

    fn is_unlimited(&self, label: &str) -> bool {
        self.knowledge().unlimited.iter().any(|pattern| label_matches(pattern, label))
    }

    /// Known spellings close to an unknown form, best first.
    fn guess_spelling(&self, _form: &str) -> Vec<String> {
        Vec::new()
    }
}
