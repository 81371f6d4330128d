//! Linkages for sentences joined by a coordinating conjunction.
//!
//! For a conjunction at `c`, a left conjunct `[s, c)` and a right conjunct
//! `(c, e]`, the sentence is parsed twice: once without `[c, e]` and once
//! without `[s, c]`. Two readings combine when they agree on everything
//! outside the conjuncts and hook their conjunct to the same outside words.

use std::collections::HashMap;
use std::ops::Range;

use log::debug;

use crate::candidates::Slot;
use crate::linkage::{ChosenDisjunct, RawLink};

/// Links and chosen disjuncts of a parse, in full-sentence positions.
#[derive(Debug, Clone)]
pub struct Reading {
    pub links: Vec<RawLink>,
    pub chosen: Vec<Option<ChosenDisjunct>>,
}

/// A matched pair of readings, left conjunct first.
#[derive(Debug, Clone)]
pub struct Conjoined {
    pub left: Reading,
    pub right: Reading,
    pub chosen: Vec<Option<ChosenDisjunct>>,
    pub conjunction: usize,
    pub and_cost: usize,
}

type Signature<'a> = Vec<(usize, usize, &'a str)>;

/// Links with no end inside `span`.
fn outside<'a>(links: &'a [RawLink], span: &Range<usize>) -> Signature<'a> {
    let mut sig: Signature<'a> = links
        .iter()
        .filter(|l| !span.contains(&l.left) && !span.contains(&l.right))
        .map(|l| (l.left, l.right, l.label.as_str()))
        .collect();
    sig.sort();
    sig
}

/// Links with exactly one end inside `span`, as (outside word, label, outside is left).
fn boundary<'a>(links: &'a [RawLink], span: &Range<usize>) -> Vec<(usize, &'a str, bool)> {
    let mut sig: Vec<_> = links
        .iter()
        .filter(|l| span.contains(&l.left) != span.contains(&l.right))
        .map(|l| {
            if span.contains(&l.right) {
                (l.left, l.label.as_str(), true)
            } else {
                (l.right, l.label.as_str(), false)
            }
        })
        .collect();
    sig.sort();
    sig
}

fn without(slots: &[Slot], cut: Range<usize>) -> Vec<Slot> {
    slots.iter().filter(|s| !cut.contains(&s.position)).cloned().collect()
}

/// Pairs up readings of the reduced sentences. `parse` runs a zero-null parse of
/// a reduced slot list; at most `limit` combinations are returned.
pub fn conjoin<F>(slots: &[Slot], limit: usize, mut parse: F) -> Vec<Conjoined>
where
    F: FnMut(&[Slot]) -> Vec<Reading>,
{
    let n = slots.len();
    let mut found = Vec::new();
    if n < 4 {
        return found;
    }

    for c in 2..n - 2 {
        if !slots[c].conjunction {
            continue;
        }

        let mut lefts: HashMap<usize, Vec<Reading>> = HashMap::new();
        let mut rights: HashMap<usize, Vec<Reading>> = HashMap::new();

        for e in c + 1..n - 1 {
            let left_readings = lefts.entry(e).or_insert_with(|| parse(&without(slots, c..e + 1)));
            if left_readings.is_empty() {
                continue;
            }
            let left_readings = left_readings.clone();

            for s in 1..c {
                let right_readings = rights.entry(s).or_insert_with(|| parse(&without(slots, s..c + 1)));
                let left_span = s..c;
                let right_span = c + 1..e + 1;
                let right_signatures: Vec<_> = right_readings
                    .iter()
                    .map(|b| (boundary(&b.links, &right_span), outside(&b.links, &right_span)))
                    .collect();

                for a in &left_readings {
                    let a_boundary = boundary(&a.links, &left_span);
                    if a_boundary.is_empty() {
                        continue;
                    }
                    let a_outside = outside(&a.links, &left_span);

                    for (b, (b_boundary, b_outside)) in right_readings.iter().zip(&right_signatures) {
                        if *b_boundary != a_boundary || *b_outside != a_outside {
                            continue;
                        }

                        let chosen = (0..n)
                            .map(|w| {
                                if w == c {
                                    None
                                } else if right_span.contains(&w) {
                                    b.chosen[w].clone()
                                } else {
                                    a.chosen[w].clone()
                                }
                            })
                            .collect();

                        debug!(conjunction = c, left_start = s, right_end = e; "Conjuncts matched");
                        found.push(Conjoined {
                            left: a.clone(),
                            right: b.clone(),
                            chosen,
                            conjunction: c,
                            and_cost: left_span.len().abs_diff(right_span.len()),
                        });
                        if found.len() >= limit {
                            return found;
                        }
                    }
                }
            }
        }
    }
    found
}
