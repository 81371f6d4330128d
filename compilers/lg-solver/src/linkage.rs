use lg_protocol::{Connector, Disjunct, EntryId};

use crate::cost::LinkageCost;

/// One link between two words of the full sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLink {
    pub left: usize,
    pub right: usize,
    /// Label of the link itself, e.g. `Ds` for `D+` meeting `Ds-`.
    pub label: String,
    pub left_connector: Connector,
    pub right_connector: Connector,
}

impl RawLink {
    pub fn length(&self) -> usize {
        self.right - self.left
    }

    pub fn crosses(&self, other: &RawLink) -> bool {
        (self.left < other.left && other.left < self.right && self.right < other.right)
            || (other.left < self.left && self.left < other.right && other.right < self.right)
    }

    fn same_as(&self, other: &RawLink) -> bool {
        self.left == other.left && self.right == other.right && self.label == other.label
    }
}

/// Sort order of links: left word ascending, then the longer link first.
pub fn sort_links(links: &mut [RawLink]) {
    links.sort_by(|a, b| a.left.cmp(&b.left).then(b.right.cmp(&a.right)).then(a.label.cmp(&b.label)));
}

/// The disjunct a word was linked through.
#[derive(Debug, Clone, PartialEq)]
pub struct ChosenDisjunct {
    pub entry: EntryId,
    pub form: String,
    pub disjunct: Disjunct,
    pub corpus_cost: Option<f32>,
}

/// The links of one reading of a linkage, with their post-processing results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sublinkage {
    pub links: Vec<RawLink>,
    /// Domain names per link, parallel to `links`.
    pub domains: Vec<Vec<String>>,
    pub violation: Option<String>,
}

impl Sublinkage {
    pub fn new(mut links: Vec<RawLink>) -> Self {
        sort_links(&mut links);
        let domains = vec![Vec::new(); links.len()];
        Self { links, domains, violation: None }
    }

    /// Every link of every sublinkage, duplicates dropped, with the domains of its first occurrence.
    pub fn union(parts: &[Sublinkage]) -> Sublinkage {
        let mut links: Vec<RawLink> = Vec::new();
        let mut domains: Vec<Vec<String>> = Vec::new();
        for part in parts {
            for (link, names) in part.links.iter().zip(&part.domains) {
                if !links.iter().any(|l| l.same_as(link)) {
                    links.push(link.clone());
                    domains.push(names.clone());
                }
            }
        }

        let mut order: Vec<usize> = (0..links.len()).collect();
        order.sort_by(|&a, &b| {
            let (a, b) = (&links[a], &links[b]);
            a.left.cmp(&b.left).then(b.right.cmp(&a.right)).then(a.label.cmp(&b.label))
        });

        Sublinkage {
            links: order.iter().map(|&i| links[i].clone()).collect(),
            domains: order.iter().map(|&i| domains[i].clone()).collect(),
            violation: parts.iter().find_map(|p| p.violation.clone()),
        }
    }
}

/// A linkage as produced by the solver, before it is wrapped for callers.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLinkage {
    /// Display forms: `flag.n`, `blorgle[?].n`, `[gravel]` for a null word.
    pub words: Vec<String>,
    pub chosen: Vec<Option<ChosenDisjunct>>,
    pub sublinkages: Vec<Sublinkage>,
    pub cost: LinkageCost,
    /// False when an earlier linkage has the same links through different disjuncts.
    pub canonical: bool,
}

impl RawLinkage {
    pub fn violation(&self) -> Option<&str> {
        self.sublinkages.iter().find_map(|s| s.violation.as_deref())
    }

    pub fn is_valid(&self) -> bool {
        self.violation().is_none()
    }

    /// A link shared between sublinkages ends up in different domains.
    pub fn has_inconsistent_domains(&self) -> bool {
        for (i, a) in self.sublinkages.iter().enumerate() {
            for b in &self.sublinkages[i + 1..] {
                for (link, names) in a.links.iter().zip(&a.domains) {
                    let other = b.links.iter().position(|l| l.same_as(link));
                    if let Some(j) = other {
                        if &b.domains[j] != names {
                            return true;
                        }
                    }
                }
            }
        }
        false
    }

    pub(crate) fn same_links(&self, other: &RawLinkage) -> bool {
        self.sublinkages.len() == other.sublinkages.len()
            && self.sublinkages.iter().zip(&other.sublinkages).all(|(a, b)| {
                a.links.len() == b.links.len() && a.links.iter().zip(&b.links).all(|(x, y)| x.same_as(y))
            })
    }

    pub(crate) fn same_choices(&self, other: &RawLinkage) -> bool {
        self.chosen.len() == other.chosen.len()
            && self.chosen.iter().zip(&other.chosen).all(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => a.entry == b.entry && a.disjunct.id == b.disjunct.id,
                (None, None) => true,
                _ => false,
            })
    }
}
