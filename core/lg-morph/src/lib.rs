#![cfg_attr(not(test), no_std)]

extern crate alloc;

use alloc::vec::Vec;

use lg_protocol::AffixTable;

/// A byte range of a whitespace unit that should become one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub start: usize,
    pub end: usize,
    /// The lexicon recognised this piece as written.
    pub known: bool,
}

impl Piece {
    pub fn text<'a>(&self, unit: &'a str) -> &'a str {
        &unit[self.start..self.end]
    }
}

/// Splits a whitespace-delimited unit into words.
///
/// Known units are kept whole. Otherwise leading punctuation, trailing punctuation and
/// contraction suffixes are peeled off recursively; whatever cannot be resolved is kept
/// as a single unknown piece.
pub fn split_unit<F>(unit: &str, affixes: &AffixTable, is_known: F) -> Vec<Piece>
where
    F: Fn(&str) -> bool,
{
    let mut pieces = Vec::new();
    split_range(unit, 0, unit.len(), affixes, &is_known, &mut pieces);
    pieces
}

fn split_range<F>(unit: &str, start: usize, end: usize, affixes: &AffixTable, is_known: &F, out: &mut Vec<Piece>)
where
    F: Fn(&str) -> bool,
{
    let piece = &unit[start..end];
    if piece.is_empty() {
        return;
    }
    if is_known(piece) {
        out.push(Piece { start, end, known: true });
        return;
    }

    // 1. Leading punctuation: "(the" -> "(" "the"
    if let Some(p) = longest(&affixes.left_punctuation, |p| piece.len() > p.len() && piece.starts_with(p)) {
        let cut = start + p.len();
        out.push(Piece { start, end: cut, known: is_known(p) });
        split_range(unit, cut, end, affixes, is_known, out);
        return;
    }

    // 2. Trailing punctuation: "runs." -> "runs" "."
    if let Some(p) = longest(&affixes.right_punctuation, |p| piece.len() > p.len() && piece.ends_with(p)) {
        let cut = end - p.len();
        split_range(unit, start, cut, affixes, is_known, out);
        out.push(Piece { start: cut, end, known: is_known(p) });
        return;
    }

    // 3. Contractions and possessives, only onto a known stem
    if let Some(s) = longest(&affixes.suffixes, |s| {
        piece.len() > s.len() && piece.ends_with(s) && is_known(&piece[..piece.len() - s.len()])
    }) {
        let cut = end - s.len();
        out.push(Piece { start, end: cut, known: true });
        out.push(Piece { start: cut, end, known: is_known(s) });
        return;
    }

    out.push(Piece { start, end, known: false });
}

fn longest<'t, P>(table: &'t [alloc::string::String], accept: P) -> Option<&'t str>
where
    P: Fn(&str) -> bool,
{
    table
        .iter()
        .map(|s| s.as_str())
        .filter(|s| !s.is_empty() && accept(s))
        .max_by_key(|s| s.len())
}
