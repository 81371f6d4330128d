use lg_parser::token::{Token, TokenKind};
use lg_protocol::{Connector, Dictionary, Disjunct, EntryId, LexEntry};

/// A connector as the search sees it: the connector plus its length limit, if any.
#[derive(Debug, Clone)]
pub struct End {
    pub connector: Connector,
    pub limit: Option<usize>,
}

impl End {
    pub fn reaches(&self, distance: usize) -> bool {
        self.limit.map_or(true, |limit| distance <= limit)
    }
}

/// One admissible (entry, disjunct) pairing for a word.
#[derive(Debug, Clone)]
pub struct Choice {
    pub entry: EntryId,
    /// Inflected spelling shown in linkages, e.g. `flag.n`.
    pub form: String,
    pub disjunct: Disjunct,
    /// Left connectors, farthest first.
    pub left: Vec<End>,
    /// Right connectors, farthest first.
    pub right: Vec<End>,
    pub corpus_cost: Option<f32>,
}

/// A word position and everything it may do.
#[derive(Debug, Clone)]
pub struct Slot {
    /// Index of the word in the full sentence.
    pub position: usize,
    pub choices: Vec<Choice>,
    pub conjunction: bool,
}

/// Limits shared by every slot of one parse.
#[derive(Debug, Clone, Copy)]
pub struct SlotLimits {
    pub max_disjunct_cost: u32,
    pub short_length: usize,
    pub all_short_connectors: bool,
}

pub fn build_slots<D: Dictionary + ?Sized>(dict: &D, tokens: &[Token], limits: SlotLimits) -> Vec<Slot> {
    tokens
        .iter()
        .enumerate()
        .map(|(position, token)| {
            let entries: Vec<&LexEntry> = match token.kind {
                TokenKind::Unknown => dict.unknown_word().into_iter().collect(),
                _ => dict.lookup(&token.form),
            };

            let mut choices = Vec::new();
            for entry in entries {
                let form = display_form(token, entry);
                for disjunct in entry.disjuncts.iter().filter(|d| d.cost <= limits.max_disjunct_cost) {
                    let end = |c: &Connector| End {
                        connector: c.clone(),
                        limit: if limits.all_short_connectors || !dict.is_unlimited(&c.label()) {
                            Some(limits.short_length)
                        } else {
                            None
                        },
                    };
                    choices.push(Choice {
                        entry: entry.id,
                        form: form.clone(),
                        disjunct: disjunct.clone(),
                        left: disjunct.left.iter().map(end).collect(),
                        right: disjunct.right.iter().rev().map(end).collect(),
                        corpus_cost: entry.corpus_cost,
                    });
                }
            }

            Slot { position, choices, conjunction: dict.is_conjunction(&token.form) }
        })
        .collect()
}

/// `flag.n` for known words, `blorgle[?].n` for words linked through the unknown-word entry.
fn display_form(token: &Token, entry: &LexEntry) -> String {
    match token.kind {
        TokenKind::Unknown => match entry.subscript() {
            Some(sub) => format!("{}[?].{}", token.text, sub),
            None => format!("{}[?]", token.text),
        },
        _ => entry.word.clone(),
    }
}
