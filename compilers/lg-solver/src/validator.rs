//! Post-processing of extracted linkages: domains, contains-one rules,
//! planarity and connectivity.

use std::sync::Arc;

use lg_protocol::{label_matches, ContainsOneRule, Dictionary, DomainStarter};

use crate::graph::LinkGraph;
use crate::linkage::{ChosenDisjunct, RawLink};

/// What a validator gets to look at: one sublinkage of one sentence.
pub struct ValidationInput<'a> {
    pub words: &'a [String],
    /// Disjunct used by each word, `None` for null words.
    pub chosen: &'a [Option<ChosenDisjunct>],
    pub links: &'a [RawLink],
    pub islands_ok: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    /// Domain names per link, parallel to the input links.
    pub domains: Vec<Vec<String>>,
    /// Name of the first rule the sublinkage breaks.
    pub violation: Option<String>,
}

pub trait LinkageValidator {
    fn validate(&self, input: &ValidationInput<'_>) -> Validation;
}

impl<V: LinkageValidator + ?Sized> LinkageValidator for Arc<V> {
    fn validate(&self, input: &ValidationInput<'_>) -> Validation {
        (**self).validate(input)
    }
}

/// Default validator, driven by the dictionary's domain starters and contains-one rules.
#[derive(Debug, Clone, Default)]
pub struct DomainValidator {
    starters: Vec<DomainStarter>,
    rules: Vec<ContainsOneRule>,
}

impl DomainValidator {
    pub fn new(starters: Vec<DomainStarter>, rules: Vec<ContainsOneRule>) -> Self {
        Self { starters, rules }
    }

    pub fn from_dictionary<D: Dictionary + ?Sized>(dict: &D) -> Self {
        Self::new(dict.knowledge().domain_starters.clone(), dict.constraints().to_vec())
    }

    /// Each starter link opens a domain holding itself and every link reachable
    /// from its right word without passing through its left word.
    fn domains(&self, graph: &LinkGraph, links: &[RawLink]) -> Vec<(String, Vec<usize>)> {
        let mut domains = Vec::new();
        for (i, link) in links.iter().enumerate() {
            let Some(starter) = self.starters.iter().find(|s| label_matches(&s.label, &link.label)) else {
                continue;
            };
            let (_, mut members) = graph.reach(link.right, Some(link.left), |_| false);
            if !members.contains(&i) {
                members.push(i);
                members.sort_unstable();
            }
            domains.push((starter.domain.clone(), members));
        }
        domains
    }
}

impl LinkageValidator for DomainValidator {
    fn validate(&self, input: &ValidationInput<'_>) -> Validation {
        let links = input.links;
        let graph = LinkGraph::from_links(input.words.len(), links.iter().map(|l| (l.left, l.right)));

        let domains = self.domains(&graph, links);
        let mut per_link = vec![Vec::new(); links.len()];
        for (name, members) in &domains {
            for &m in members {
                per_link[m].push(name.clone());
            }
        }

        let crossing = links.iter().enumerate().any(|(i, a)| links[i + 1..].iter().any(|b| a.crosses(b)));
        let violation = if crossing {
            Some("Links cross".to_string())
        } else if !input.islands_ok && !graph.is_connected() {
            Some("Disconnected".to_string())
        } else {
            self.rules.iter().find_map(|rule| {
                let broken = domains.iter().any(|(_, members)| {
                    let has = |pattern: &str| members.iter().any(|&m| label_matches(pattern, &links[m].label));
                    has(&rule.trigger) && !rule.required.iter().any(|r| has(r))
                });
                broken.then(|| rule.name.clone())
            })
        };

        Validation { domains: per_link, violation }
    }
}
