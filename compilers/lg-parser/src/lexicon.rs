use std::collections::HashMap;

use lg_protocol::{
    AffixTable, ContainsOneRule, Dictionary, EntryId, Knowledge, LexEntry, LexiconData, LEFT_WALL, RIGHT_WALL,
};
use log::{debug, info};
use nom::{
    branch::alt,
    bytes::complete::{take_till1, take_while1},
    character::complete::{char, multispace0},
    multi::many1,
    sequence::{delimited, terminated, tuple},
    IResult,
};
use rkyv::AlignedVec;

use crate::error::LexiconError;
use crate::expression::{self, Expr};
use crate::tables;

/// Snapshot layout version; bumped whenever `LexiconData` changes shape.
pub const SNAPSHOT_VERSION: u32 = 1;

/// The four text sources a dictionary is read from.
#[derive(Debug, Clone, Copy)]
pub struct LexiconSources<'a> {
    pub dictionary: &'a str,
    pub knowledge: &'a str,
    pub constraints: &'a str,
    pub affixes: &'a str,
}

fn word_token(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_till1(|c: char| c == '"'), char('"')),
        take_while1(|c: char| !c.is_whitespace() && c != ':' && c != ';' && c != '"'),
    ))(input)
}

/// `word word2.n "quoted": expression ;`
fn statement(input: &str) -> IResult<&str, (Vec<&str>, Expr)> {
    let (input, (words, _, expr, _)) = tuple((
        many1(terminated(word_token, multispace0)),
        char(':'),
        delimited(multispace0, expression::expression, multispace0),
        char(';'),
    ))(input)?;
    Ok((input, (words, expr)))
}

fn strip_comments(text: &str) -> String {
    text.lines()
        .map(|line| match line.find('%') {
            Some(at) if !line[..at].ends_with('"') => &line[..at],
            _ => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn line_of(text: &str, rest: &str) -> usize {
    let offset = text.len() - rest.len();
    text[..offset].matches('\n').count() + 1
}

/// Parses the dictionary file into `(words, formula)` statements, expanding nothing yet.
pub fn parse_statements(text: &str) -> Result<Vec<(Vec<String>, Expr)>, LexiconError> {
    let cleaned = strip_comments(text);
    let mut input = cleaned.as_str();
    let mut statements = Vec::new();

    loop {
        // 1. Skip whitespace
        let (next_input, _) = multispace0::<&str, nom::error::Error<&str>>(input)
            .map_err(|_| LexiconError::Syntax { file: "dictionary", line: line_of(&cleaned, input), message: "unreadable input".into() })?;
        input = next_input;
        if input.is_empty() {
            break;
        }

        // 2. One statement up to its ';'
        match statement(input) {
            Ok((next_input, (words, expr))) => {
                statements.push((words.into_iter().map(str::to_string).collect(), expr));
                input = next_input;
            }
            Err(_) => {
                let near: String = input.chars().take(24).collect();
                return Err(LexiconError::Syntax {
                    file: "dictionary",
                    line: line_of(&cleaned, input),
                    message: format!("cannot parse entry near '{}'", near.trim()),
                });
            }
        }
    }

    Ok(statements)
}

/// An in-memory dictionary: expanded entries indexed by their unsubscripted spelling.
#[derive(Debug, Clone)]
pub struct Lexicon {
    data: LexiconData,
    index: HashMap<String, Vec<usize>>,
    max_cost: u32,
}

impl Lexicon {
    pub fn from_sources(language: &str, sources: LexiconSources<'_>) -> Result<Self, LexiconError> {
        let statements = parse_statements(sources.dictionary)?;
        let knowledge = tables::parse_knowledge(sources.knowledge)?;
        let constraints = tables::parse_constraints(sources.constraints)?;
        let affixes = tables::parse_affixes(sources.affixes)?;

        // 1. Macros first, so entries may use them regardless of file order
        let mut macros = HashMap::new();
        for (words, expr) in &statements {
            for word in words {
                if let Some(name) = word.strip_prefix('<').and_then(|w| w.strip_suffix('>')) {
                    macros.insert(name.to_string(), expr.clone());
                }
            }
        }

        // 2. Expand every plain word
        let mut entries = Vec::new();
        for (words, expr) in &statements {
            for word in words.iter().filter(|w| !w.starts_with('<')) {
                let disjuncts = expression::expand(word, expr, &macros)?;
                entries.push(LexEntry {
                    id: EntryId(entries.len() as u32),
                    word: word.clone(),
                    disjuncts,
                    corpus_cost: knowledge.corpus_costs.get(word.as_str()).copied(),
                });
            }
        }

        info!(language = language, entries = entries.len(), macros = macros.len(); "Loaded lexicon");

        Self::from_data(LexiconData {
            version: SNAPSHOT_VERSION,
            language: language.to_string(),
            entries,
            knowledge: knowledge.knowledge,
            constraints,
            affixes,
        })
    }

    pub fn from_data(data: LexiconData) -> Result<Self, LexiconError> {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        let mut max_cost = 0;
        for (i, entry) in data.entries.iter().enumerate() {
            index.entry(entry.base().to_string()).or_default().push(i);
            max_cost = entry.disjuncts.iter().map(|d| d.cost).fold(max_cost, u32::max);
        }

        for wall in [LEFT_WALL, RIGHT_WALL] {
            if !index.contains_key(wall) {
                return Err(LexiconError::MissingWall(wall));
            }
        }

        Ok(Self { data, index, max_cost })
    }

    pub fn data(&self) -> &LexiconData {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.entries.is_empty()
    }

    /// Archives the lexicon into a validated zero-copy blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>, LexiconError> {
        let bytes = rkyv::to_bytes::<_, 4096>(&self.data).map_err(|err| LexiconError::Snapshot(format!("{:?}", err)))?;
        Ok(bytes.to_vec())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LexiconError> {
        // Archived roots must be aligned; callers hand us arbitrary slices
        let mut aligned = AlignedVec::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);

        let data: LexiconData =
            rkyv::from_bytes(&aligned).map_err(|err| LexiconError::Snapshot(format!("{:?}", err)))?;
        if data.version != SNAPSHOT_VERSION {
            return Err(LexiconError::Snapshot(format!(
                "snapshot version {} is not {}",
                data.version, SNAPSHOT_VERSION
            )));
        }
        debug!(entries = data.entries.len(); "Restored lexicon snapshot");
        Self::from_data(data)
    }
}

impl Dictionary for Lexicon {
    fn language(&self) -> &str {
        &self.data.language
    }

    fn lookup(&self, form: &str) -> Vec<&LexEntry> {
        self.index
            .get(form)
            .map(|ids| ids.iter().map(|&i| &self.data.entries[i]).collect())
            .unwrap_or_default()
    }

    fn knowledge(&self) -> &Knowledge {
        &self.data.knowledge
    }

    fn constraints(&self) -> &[ContainsOneRule] {
        &self.data.constraints
    }

    fn affixes(&self) -> &AffixTable {
        &self.data.affixes
    }

    fn max_cost(&self) -> u32 {
        self.max_cost
    }

    /// Known alphabetic forms one edit away, in alphabetical order.
    fn guess_spelling(&self, form: &str) -> Vec<String> {
        let target = form.to_lowercase();
        let mut guesses: Vec<String> = self
            .index
            .keys()
            .filter(|k| k.chars().all(|c| c.is_alphabetic()) && within_one_edit(&target, k))
            .cloned()
            .collect();
        guesses.sort();
        guesses
    }
}

fn within_one_edit(a: &str, b: &str) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a == b {
        return false;
    }
    match a.len() as isize - b.len() as isize {
        0 => {
            let diffs: Vec<usize> = (0..a.len()).filter(|&i| a[i] != b[i]).collect();
            match diffs.as_slice() {
                [_] => true,
                // adjacent transposition
                [i, j] => *j == i + 1 && a[*i] == b[*j] && a[*j] == b[*i],
                _ => false,
            }
        }
        1 => one_insertion(&b, &a),
        -1 => one_insertion(&a, &b),
        _ => false,
    }
}

/// True if `long` is `short` with exactly one extra character.
fn one_insertion(short: &[char], long: &[char]) -> bool {
    let skip = short.iter().zip(long).position(|(s, l)| s != l).unwrap_or(short.len());
    short[skip..] == long[skip + 1..]
}
