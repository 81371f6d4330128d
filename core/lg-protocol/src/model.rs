use alloc::string::String;
use alloc::vec::Vec;
use rkyv::{Archive, Deserialize, Serialize};

use crate::disjunct::Disjunct;
use crate::ids::EntryId;

/// A dictionary spelling such as `flag.n` together with its expanded disjuncts.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct LexEntry {
    pub id: EntryId,
    pub word: String,
    pub disjuncts: Vec<Disjunct>,
    /// Corpus-derived score used by the corpus cost model.
    pub corpus_cost: Option<f32>,
}

impl LexEntry {
    /// The spelling without its `.x` subscript.
    pub fn base(&self) -> &str {
        split_subscript(&self.word).0
    }

    pub fn subscript(&self) -> Option<&str> {
        split_subscript(&self.word).1
    }
}

/// `flag.n` -> (`flag`, Some(`n`)); `.` and `...` carry no subscript.
pub fn split_subscript(word: &str) -> (&str, Option<&str>) {
    match word.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < word.len() => {
            let sub = &word[dot + 1..];
            if sub.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                (&word[..dot], Some(sub))
            } else {
                (word, None)
            }
        }
        _ => (word, None),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
#[repr(u8)]
pub enum Side {
    Left = 0,
    Right = 1,
}

/// A link type that opens a named domain (`W` opens `m`).
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct DomainStarter {
    pub label: String,
    pub domain: String,
}

/// The words hanging off one side of a matching link form a phrase (`S left NP`).
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct ConstituentRule {
    pub label: String,
    pub side: Side,
    pub phrase: String,
}

/// A domain containing a `trigger` link must also contain one of `required`.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct ContainsOneRule {
    pub name: String,
    pub trigger: String,
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct Knowledge {
    pub domain_starters: Vec<DomainStarter>,
    pub constituent_rules: Vec<ConstituentRule>,
    pub conjunctions: Vec<String>,
    /// Connector labels exempt from the short-length limit.
    pub unlimited: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct AffixTable {
    pub left_punctuation: Vec<String>,
    pub right_punctuation: Vec<String>,
    /// Contractions and possessives split off a known stem (`n't`, `'s`).
    pub suffixes: Vec<String>,
}

/// Everything a loaded dictionary knows, in a form that can be archived as one blob.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct LexiconData {
    pub version: u32,
    pub language: String,
    pub entries: Vec<LexEntry>,
    pub knowledge: Knowledge,
    pub constraints: Vec<ContainsOneRule>,
    pub affixes: AffixTable,
}
