use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::SearchError;

/// How candidate linkages are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CostModel {
    /// Unused words, then disjunct cost, then and-cost, then link length.
    #[default]
    Vdal,
    /// Like `Vdal`, but the corpus score of the chosen entries replaces the disjunct cost.
    Corpus,
}

impl CostModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostModel::Vdal => "vdal",
            CostModel::Corpus => "corpus",
        }
    }

    pub fn compare(&self, a: &LinkageCost, b: &LinkageCost) -> Ordering {
        let middle = match self {
            CostModel::Vdal => a.disjunct_cost.cmp(&b.disjunct_cost),
            CostModel::Corpus => a.corpus_cost.total_cmp(&b.corpus_cost),
        };
        a.unused_word_cost
            .cmp(&b.unused_word_cost)
            .then(middle)
            .then(a.and_cost.cmp(&b.and_cost))
            .then(a.link_cost.cmp(&b.link_cost))
    }
}

impl FromStr for CostModel {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vdal" => Ok(CostModel::Vdal),
            "corpus" => Ok(CostModel::Corpus),
            _ => Err(SearchError::UnknownCostModel(s.to_string())),
        }
    }
}

impl fmt::Display for CostModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The cost vector of one linkage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinkageCost {
    /// Number of null words.
    pub unused_word_cost: usize,
    pub disjunct_cost: u32,
    /// Length difference between conjuncts.
    pub and_cost: usize,
    /// Sum over links of `length - 1`.
    pub link_cost: usize,
    pub corpus_cost: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cost(unused: usize, disjunct: u32, and: usize, link: usize, corpus: f32) -> LinkageCost {
        LinkageCost { unused_word_cost: unused, disjunct_cost: disjunct, and_cost: and, link_cost: link, corpus_cost: corpus }
    }

    #[test]
    fn test_vdal_order() {
        let model = CostModel::Vdal;
        assert_eq!(model.compare(&cost(0, 5, 0, 9, 0.0), &cost(1, 0, 0, 0, 0.0)), Ordering::Less);
        assert_eq!(model.compare(&cost(0, 1, 3, 0, 0.0), &cost(0, 2, 0, 0, 0.0)), Ordering::Less);
        assert_eq!(model.compare(&cost(0, 1, 0, 4, 0.0), &cost(0, 1, 0, 2, 0.0)), Ordering::Greater);
    }

    #[test]
    fn test_corpus_order_uses_scores() {
        let a = cost(0, 3, 0, 0, 0.5);
        let b = cost(0, 1, 0, 0, 2.0);
        assert_eq!(CostModel::Vdal.compare(&a, &b), Ordering::Greater);
        assert_eq!(CostModel::Corpus.compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("VDAL".parse::<CostModel>(), Ok(CostModel::Vdal));
        assert_eq!("corpus".parse::<CostModel>(), Ok(CostModel::Corpus));
        assert_eq!(
            "bogus".parse::<CostModel>(),
            Err(SearchError::UnknownCostModel("bogus".to_string()))
        );
        assert_eq!(CostModel::default().to_string(), "vdal");
    }
}
