use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use rkyv::{Archive, Deserialize, Serialize};

use crate::connector::Connector;
use crate::ids::DisjunctId;

/// One way a word can take part in a linkage.
///
/// Both connector lists are kept in sentence order: `left` starts with the connector
/// reaching farthest to the left, `right` starts with the one reaching the nearest
/// word on the right.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct Disjunct {
    pub id: DisjunctId,
    pub left: Vec<Connector>,
    pub right: Vec<Connector>,
    pub cost: u32,
}

impl Disjunct {
    pub fn new(id: DisjunctId, left: Vec<Connector>, right: Vec<Connector>, cost: u32) -> Self {
        Self { id, left, right, cost }
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.left.iter().chain(self.right.iter())
    }
}

impl fmt::Display for Disjunct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for connector in self.connectors() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}", connector)?;
            first = false;
        }
        Ok(())
    }
}

/// Renders `cost` followed by the connector list, the way the lexicon would print it.
pub fn describe(disjunct: &Disjunct) -> String {
    use alloc::format;
    if disjunct.cost == 0 {
        format!("{}", disjunct)
    } else {
        format!("[{}] {}", disjunct.cost, disjunct)
    }
}
