//! Memoised counting of linkages over word ranges, and extraction of the i-th one.
//!
//! A subproblem is a word range `(lw, rw)` together with the unsatisfied right
//! connectors of `lw` (`le`) and the unsatisfied left connectors of `rw` (`re`).
//! Connector lists are stored farthest-first, so the head of a list is the link
//! that spans the widest, and everything after it must link strictly inside.

use std::collections::HashMap;
use std::mem::size_of;

use log::trace;

use crate::budget::Budget;
use crate::candidates::{End, Slot};

pub type Count = u64;

/// A position inside one connector list of one choice of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    pub word: u32,
    pub choice: u32,
    pub pos: u32,
    /// Points into the right-hand list when set, the left-hand list otherwise.
    pub right: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    lw: i32,
    rw: i32,
    le: Option<Cursor>,
    re: Option<Cursor>,
    nulls: u32,
}

/// One way of decomposing a subproblem: a word's choice, the links it makes,
/// and the independent subproblems left over.
#[derive(Debug, Clone)]
struct Term {
    choice: Option<(usize, u32)>,
    links: Vec<(Cursor, Cursor)>,
    factors: Vec<Key>,
}

impl Term {
    fn leaf() -> Self {
        Self { choice: None, links: Vec::new(), factors: Vec::new() }
    }
}

/// A complete assignment read back from the table.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    /// Chosen disjunct per slot; `None` for null words.
    pub choices: Vec<Option<u32>>,
    /// Linked connector pairs, left end first.
    pub links: Vec<(Cursor, Cursor)>,
}

pub struct Search<'a> {
    slots: &'a [Slot],
    budget: &'a Budget,
    islands_ok: bool,
    memo: HashMap<Key, Count>,
}

impl<'a> Search<'a> {
    pub fn new(slots: &'a [Slot], budget: &'a Budget, islands_ok: bool) -> Self {
        Self { slots, budget, islands_ok, memo: HashMap::new() }
    }

    pub fn end(&self, cursor: Cursor) -> &'a End {
        let choice = &self.slots[cursor.word as usize].choices[cursor.choice as usize];
        let list = if cursor.right { &choice.right } else { &choice.left };
        &list[cursor.pos as usize]
    }

    fn head(&self, word: usize, choice: u32, right: bool) -> Option<Cursor> {
        let c = &self.slots[word].choices[choice as usize];
        let list = if right { &c.right } else { &c.left };
        (!list.is_empty()).then_some(Cursor { word: word as u32, choice, pos: 0, right })
    }

    fn next(&self, cursor: Cursor) -> Option<Cursor> {
        let c = &self.slots[cursor.word as usize].choices[cursor.choice as usize];
        let len = if cursor.right { c.right.len() } else { c.left.len() };
        let pos = cursor.pos + 1;
        ((pos as usize) < len).then_some(Cursor { pos, ..cursor })
    }

    fn links(&self, left: Cursor, right: Cursor) -> bool {
        let distance = (right.word - left.word) as usize;
        let (l, r) = (self.end(left), self.end(right));
        l.connector.links_to(&r.connector) && l.reaches(distance) && r.reaches(distance)
    }

    /// The four ways a matched pair can continue, depending on which ends are multi.
    fn variants(&self, left: Cursor, right: Cursor) -> Vec<(Option<Cursor>, Option<Cursor>)> {
        let left_multi = self.end(left).connector.is_multi();
        let right_multi = self.end(right).connector.is_multi();
        let mut out = vec![(self.next(left), self.next(right))];
        if left_multi {
            out.push((Some(left), self.next(right)));
        }
        if right_multi {
            out.push((self.next(left), Some(right)));
        }
        if left_multi && right_multi {
            out.push((Some(left), Some(right)));
        }
        out
    }

    fn top_terms(&self, nulls: u32) -> Vec<Term> {
        let n = self.slots.len() as i32;
        if self.islands_ok {
            let whole = Key { lw: -1, rw: n, le: None, re: None, nulls: nulls + 1 };
            return vec![Term { choice: None, links: Vec::new(), factors: vec![whole] }];
        }
        if self.slots.is_empty() {
            return Vec::new();
        }
        (0..self.slots[0].choices.len() as u32)
            .filter(|&c| self.slots[0].choices[c as usize].left.is_empty())
            .map(|c| Term {
                choice: Some((0, c)),
                links: Vec::new(),
                factors: vec![Key { lw: 0, rw: n, le: self.head(0, c, true), re: None, nulls }],
            })
            .collect()
    }

    fn terms(&self, key: &Key) -> Vec<Term> {
        let Key { lw, rw, le, re, nulls } = *key;

        if rw == lw + 1 {
            return if le.is_none() && re.is_none() && nulls == 0 { vec![Term::leaf()] } else { Vec::new() };
        }

        if le.is_none() && re.is_none() {
            if !self.islands_ok && lw != -1 {
                // Nothing may link in here: every word between is null
                return if nulls as i32 == rw - lw - 1 { vec![Term::leaf()] } else { Vec::new() };
            }
            if nulls == 0 {
                return Vec::new();
            }
            // Word lw+1 is either null or starts a new island
            let w = (lw + 1) as usize;
            let mut terms = vec![Term {
                choice: None,
                links: Vec::new(),
                factors: vec![Key { lw: w as i32, rw, le: None, re: None, nulls: nulls - 1 }],
            }];
            for (c, choice) in self.slots[w].choices.iter().enumerate() {
                if choice.left.is_empty() && !choice.right.is_empty() {
                    let c = c as u32;
                    terms.push(Term {
                        choice: Some((w, c)),
                        links: Vec::new(),
                        factors: vec![Key { lw: w as i32, rw, le: self.head(w, c, true), re: None, nulls: nulls - 1 }],
                    });
                }
            }
            return terms;
        }

        let mut terms = Vec::new();
        for w in (lw + 1)..rw {
            let wu = w as usize;
            for c in 0..self.slots[wu].choices.len() as u32 {
                let dl = self.head(wu, c, false);
                let dr = self.head(wu, c, true);

                let left_pair = match (le, dl) {
                    (Some(a), Some(b)) if self.links(a, b) => Some((a, b)),
                    _ => None,
                };
                let right_pair = match (dr, re) {
                    (Some(a), Some(b)) if self.links(a, b) => Some((a, b)),
                    _ => None,
                };
                if left_pair.is_none() && right_pair.is_none() {
                    continue;
                }

                for lcost in 0..=nulls {
                    let rcost = nulls - lcost;
                    let lefts: Vec<Key> = left_pair
                        .map(|(a, b)| {
                            self.variants(a, b)
                                .into_iter()
                                .map(|(x, y)| Key { lw, rw: w, le: x, re: y, nulls: lcost })
                                .collect()
                        })
                        .unwrap_or_default();
                    let rights: Vec<Key> = right_pair
                        .map(|(a, b)| {
                            self.variants(a, b)
                                .into_iter()
                                .map(|(x, y)| Key { lw: w, rw, le: x, re: y, nulls: rcost })
                                .collect()
                        })
                        .unwrap_or_default();

                    // Linked on both sides
                    if let (Some(lp), Some(rp)) = (left_pair, right_pair) {
                        for l in &lefts {
                            for r in &rights {
                                terms.push(Term { choice: Some((wu, c)), links: vec![lp, rp], factors: vec![*l, *r] });
                            }
                        }
                    }
                    // Linked to lw only; the right connectors of w stay open
                    if let Some(lp) = left_pair {
                        let rest = Key { lw: w, rw, le: dr, re, nulls: rcost };
                        for l in &lefts {
                            terms.push(Term { choice: Some((wu, c)), links: vec![lp], factors: vec![*l, rest] });
                        }
                    }
                    // Linked to rw only; allowed when lw has nothing pending
                    if let (None, Some(rp)) = (le, right_pair) {
                        let rest = Key { lw, rw: w, le: None, re: dl, nulls: lcost };
                        for r in &rights {
                            terms.push(Term { choice: Some((wu, c)), links: vec![rp], factors: vec![rest, *r] });
                        }
                    }
                }
            }
        }
        terms
    }

    fn count(&mut self, key: Key) -> Count {
        if let Some(&count) = self.memo.get(&key) {
            return count;
        }
        if !self.budget.tick() {
            return 0;
        }

        let terms = self.terms(&key);
        let mut total: Count = 0;
        for term in &terms {
            total = total.saturating_add(self.product(term));
        }

        // Stored even when truncated, so extraction sees the same numbers
        self.budget.charge(size_of::<(Key, Count)>() * 2);
        self.memo.insert(key, total);
        total
    }

    fn product(&mut self, term: &Term) -> Count {
        let mut product: Count = 1;
        for factor in &term.factors {
            if product == 0 {
                break;
            }
            product = product.saturating_mul(self.count(*factor));
        }
        product
    }

    /// Number of linkages with exactly `nulls` null words.
    pub fn count_linkages(&mut self, nulls: u32) -> Count {
        let terms = self.top_terms(nulls);
        let total = terms.iter().fold(0, |acc: Count, term| acc.saturating_add(self.product(term)));
        trace!(nulls = nulls, total = total, table = self.memo.len(); "Counted linkages");
        total
    }

    /// Reads back linkage number `index` (in discovery order) with `nulls` null words.
    pub fn extract(&mut self, nulls: u32, index: Count) -> Option<Assignment> {
        let mut out = Assignment { choices: vec![None; self.slots.len()], links: Vec::new() };
        let terms = self.top_terms(nulls);
        if self.pick(terms, index, &mut out) {
            Some(out)
        } else {
            None
        }
    }

    fn pick(&mut self, terms: Vec<Term>, mut index: Count, out: &mut Assignment) -> bool {
        for term in terms {
            let counts: Vec<Count> = term.factors.iter().map(|f| self.count(*f)).collect();
            let product = counts.iter().fold(1 as Count, |acc, c| acc.saturating_mul(*c));
            if index >= product {
                index -= product;
                continue;
            }

            if let Some((word, choice)) = term.choice {
                out.choices[word] = Some(choice);
            }
            out.links.extend(term.links.iter().copied());

            // Mixed-radix split of the index, last factor least significant
            let mut subs = vec![0; counts.len()];
            for i in (0..counts.len()).rev() {
                subs[i] = index % counts[i];
                index /= counts[i];
            }
            for (factor, sub) in term.factors.iter().zip(subs) {
                let terms = self.terms(factor);
                if !self.pick(terms, sub, out) {
                    return false;
                }
            }
            return true;
        }
        false
    }

    pub fn table_size(&self) -> usize {
        self.memo.len()
    }
}
