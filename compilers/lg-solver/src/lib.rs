pub mod budget;
pub mod candidates;
pub mod conjunction;
pub mod cost;
pub mod error;
pub mod graph;
pub mod linkage;
pub mod search;
pub mod validator;

pub use cost::{CostModel, LinkageCost};
pub use error::SearchError;
pub use graph::LinkGraph;
pub use linkage::{ChosenDisjunct, RawLink, RawLinkage, Sublinkage};
pub use validator::{DomainValidator, LinkageValidator, Validation, ValidationInput};

use std::time::Duration;

use lg_parser::token::Token;
use lg_protocol::{link_label, Dictionary};
use log::{debug, info, trace};

use crate::budget::Budget;
use crate::candidates::{build_slots, Slot, SlotLimits};
use crate::conjunction::{conjoin, Reading};
use crate::search::{Assignment, Count, Search};

/// Everything the search needs to know about one parse.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub linkage_limit: usize,
    pub disjunct_cost: u32,
    pub min_null_count: usize,
    pub max_null_count: usize,
    /// Null counts are examined this many at a time.
    pub null_block: usize,
    pub islands_ok: bool,
    pub short_length: usize,
    pub all_short_connectors: bool,
    pub allow_null: bool,
    pub max_memory: Option<usize>,
    pub max_parse_time: Option<Duration>,
    /// Limit on words between the walls.
    pub max_sentence_length: Option<usize>,
    pub cost_model: CostModel,
    pub verbosity: u8,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            linkage_limit: 10000,
            disjunct_cost: 2,
            min_null_count: 0,
            max_null_count: usize::MAX,
            null_block: 1,
            islands_ok: false,
            short_length: 16,
            all_short_connectors: false,
            allow_null: true,
            max_memory: None,
            max_parse_time: None,
            max_sentence_length: None,
            cost_model: CostModel::Vdal,
            verbosity: 1,
        }
    }
}

/// Result of one parse.
#[derive(Debug, Clone, Default)]
pub struct SolveOutcome {
    /// Valid linkages first, each group ranked by the cost model.
    pub linkages: Vec<RawLinkage>,
    pub null_count: usize,
    pub num_found: Count,
    pub num_post_processed: usize,
    pub num_valid: usize,
    pub timer_expired: bool,
    pub memory_exhausted: bool,
}

pub struct Solver<'d, D: Dictionary + ?Sized> {
    dict: &'d D,
    validator: Box<dyn LinkageValidator + 'd>,
}

impl<'d, D: Dictionary + ?Sized> Solver<'d, D> {
    pub fn new(dict: &'d D) -> Self {
        Self { dict, validator: Box::new(DomainValidator::from_dictionary(dict)) }
    }

    pub fn with_validator(mut self, validator: Box<dyn LinkageValidator + 'd>) -> Self {
        self.validator = validator;
        self
    }

    pub fn solve(&self, tokens: &[Token], options: &SearchOptions) -> Result<SolveOutcome, SearchError> {
        let words = tokens.iter().filter(|t| !t.is_wall()).count();
        if let Some(limit) = options.max_sentence_length {
            if words > limit {
                return Err(SearchError::SentenceTooLong { words, limit });
            }
        }
        if options.min_null_count > options.max_null_count {
            return Err(SearchError::NullRange { min: options.min_null_count, max: options.max_null_count });
        }

        let (min_nulls, max_nulls) = if options.allow_null {
            (options.min_null_count.min(words), options.max_null_count.min(words))
        } else {
            (0, 0)
        };

        let limits = SlotLimits {
            max_disjunct_cost: options.disjunct_cost,
            short_length: options.short_length,
            all_short_connectors: options.all_short_connectors,
        };
        let slots = build_slots(self.dict, tokens, limits);
        let budget = Budget::new(options.max_parse_time, options.max_memory);
        let mut search = Search::new(&slots, &budget, options.islands_ok);

        let mut outcome = SolveOutcome::default();
        let mut chosen_nulls = None;
        let mut conjoined = Vec::new();
        let block = options.null_block.max(1);

        let mut start = min_nulls;
        'blocks: while start <= max_nulls {
            let end = (start + block - 1).min(max_nulls);
            for nulls in start..=end {
                let count = search.count_linkages(nulls as u32);
                if nulls == 0 && !budget.exhausted() {
                    conjoined = conjoin(&slots, options.linkage_limit, |reduced| {
                        self.readings(reduced, &budget, options, tokens.len())
                    });
                }
                if options.verbosity >= 2 {
                    debug!(nulls = nulls, count = count, conjoined = conjoined.len(); "Null count examined");
                }
                if count > 0 || !conjoined.is_empty() {
                    chosen_nulls = Some(nulls);
                    outcome.num_found = count.saturating_add(conjoined.len() as Count);
                    break 'blocks;
                }
                if budget.exhausted() {
                    break 'blocks;
                }
            }
            start = end + 1;
        }

        if let Some(nulls) = chosen_nulls {
            let count = outcome.num_found - conjoined.len() as Count;
            let mut linkages = Vec::new();
            for index in sample(count, options.linkage_limit) {
                if let Some(assignment) = search.extract(nulls as u32, index) {
                    let (links, chosen) = assemble(&search, &slots, &assignment, tokens.len());
                    linkages.push(self.finish(tokens, vec![links], chosen, None, nulls, 0, options));
                }
            }
            for pair in conjoined {
                let sublinkages = vec![pair.left.links, pair.right.links];
                let raw = self.finish(tokens, sublinkages, pair.chosen, Some(pair.conjunction), 0, pair.and_cost, options);
                linkages.push(raw);
            }

            outcome.null_count = nulls;
            outcome.num_post_processed = linkages.len();
            outcome.linkages = rank(dedupe(linkages), options.cost_model);
            outcome.num_valid = outcome.linkages.iter().filter(|l| l.is_valid()).count();
        }

        outcome.timer_expired = budget.timer_expired();
        outcome.memory_exhausted = budget.memory_exhausted();

        if options.verbosity >= 1 {
            info!(
                found = outcome.num_found,
                valid = outcome.num_valid,
                nulls = outcome.null_count,
                table = search.table_size(),
                exhausted = budget.exhausted();
                "Parse finished"
            );
        }
        Ok(outcome)
    }

    /// Zero-null parses of a reduced sentence.
    fn readings(&self, slots: &[Slot], budget: &Budget, options: &SearchOptions, n: usize) -> Vec<Reading> {
        let mut search = Search::new(slots, budget, options.islands_ok);
        let count = search.count_linkages(0);
        let mut readings = Vec::new();
        for index in sample(count, options.linkage_limit) {
            if let Some(assignment) = search.extract(0, index) {
                let (links, chosen) = assemble(&search, slots, &assignment, n);
                readings.push(Reading { links, chosen });
            }
        }
        readings
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        tokens: &[Token],
        links: Vec<Vec<RawLink>>,
        chosen: Vec<Option<ChosenDisjunct>>,
        conjunction: Option<usize>,
        nulls: usize,
        and_cost: usize,
        options: &SearchOptions,
    ) -> RawLinkage {
        let words: Vec<String> = tokens
            .iter()
            .zip(&chosen)
            .enumerate()
            .map(|(i, (token, choice))| match choice {
                Some(c) => c.form.clone(),
                None if Some(i) == conjunction => token.text.clone(),
                None => format!("[{}]", token.text),
            })
            .collect();

        let sublinkages: Vec<Sublinkage> = links
            .into_iter()
            .map(|links| {
                let mut sub = Sublinkage::new(links);
                let validation = self.validator.validate(&ValidationInput {
                    words: &words,
                    chosen: &chosen,
                    links: &sub.links,
                    islands_ok: options.islands_ok,
                });
                sub.domains = validation.domains;
                sub.violation = validation.violation;
                sub
            })
            .collect();

        let union = Sublinkage::union(&sublinkages);
        let disjunct_cost = chosen.iter().flatten().map(|c| c.disjunct.cost).sum();
        let corpus_cost = chosen
            .iter()
            .flatten()
            .map(|c| c.corpus_cost.unwrap_or(c.disjunct.cost as f32))
            .sum();
        let cost = LinkageCost {
            unused_word_cost: nulls,
            disjunct_cost,
            and_cost,
            link_cost: union.links.iter().map(|l| l.length() - 1).sum(),
            corpus_cost,
        };

        trace!(words = tokens.len(), links = union.links.len(); "Linkage assembled");
        RawLinkage { words, chosen, sublinkages, cost, canonical: true }
    }
}

/// Indices to extract: all of them, or an even spread when there are more than `limit`.
fn sample(count: Count, limit: usize) -> impl Iterator<Item = Count> {
    let limit = limit as Count;
    let take = count.min(limit);
    (0..take).map(move |i| if count <= limit { i } else { ((i as u128 * count as u128) / limit as u128) as Count })
}

/// Reads an assignment back as links and chosen disjuncts in full-sentence positions.
fn assemble(
    search: &Search<'_>,
    slots: &[Slot],
    assignment: &Assignment,
    n: usize,
) -> (Vec<RawLink>, Vec<Option<ChosenDisjunct>>) {
    let links = assignment
        .links
        .iter()
        .map(|(l, r)| {
            let left_connector = search.end(*l).connector.clone();
            let right_connector = search.end(*r).connector.clone();
            RawLink {
                left: slots[l.word as usize].position,
                right: slots[r.word as usize].position,
                label: link_label(&left_connector, &right_connector),
                left_connector,
                right_connector,
            }
        })
        .collect();

    let mut chosen = vec![None; n];
    for (slot, choice) in slots.iter().zip(&assignment.choices) {
        if let Some(c) = choice {
            let choice = &slot.choices[*c as usize];
            chosen[slot.position] = Some(ChosenDisjunct {
                entry: choice.entry,
                form: choice.form.clone(),
                disjunct: choice.disjunct.clone(),
                corpus_cost: choice.corpus_cost,
            });
        }
    }
    (links, chosen)
}

/// Drops repeats and marks linkages whose links an earlier one already has.
fn dedupe(linkages: Vec<RawLinkage>) -> Vec<RawLinkage> {
    let mut kept: Vec<RawLinkage> = Vec::with_capacity(linkages.len());
    for mut linkage in linkages {
        let mut duplicate = false;
        for earlier in &kept {
            if earlier.same_links(&linkage) {
                if earlier.same_choices(&linkage) {
                    duplicate = true;
                    break;
                }
                linkage.canonical = false;
            }
        }
        if !duplicate {
            kept.push(linkage);
        }
    }
    kept
}

/// Valid before invalid, then by cost; the sort is stable so ties keep discovery order.
fn rank(mut linkages: Vec<RawLinkage>, model: CostModel) -> Vec<RawLinkage> {
    linkages.sort_by(|a, b| b.is_valid().cmp(&a.is_valid()).then(model.compare(&a.cost, &b.cost)));
    linkages
}

#[cfg(test)]
mod tests {
    use super::*;
    use lg_parser::{Lexicon, LexiconSources, Tokenizer};

    const DICT: &str = r#"
        LEFT-WALL: (Wd+ or Wi+) & {Xp+ or RW+};
        RIGHT-WALL: RW-;
        ".": Xp- & RW+;
        the: D+;
        a: Ds+;
        cat.n dog.n ball.n hill.n curb.n: (Wd- & Ds- & {@A-} & Ss+) or (O- & Ds- & {@A-}) or (J- & Ds- & {@A-});
        runs.v: Ss- & {@MV+};
        rolled.v: S- & {@MV+};
        bumped.v: S- & O+ & {@MV+};
        chased.v: Ss- & O+;
        down: MVp- & J+;
        big.a: A+ or [Pa-];
    "#;

    fn lexicon() -> Lexicon {
        Lexicon::from_sources(
            "en",
            LexiconSources {
                dictionary: DICT,
                knowledge: "DOMAIN W m\nCONJUNCTION and\nUNLIMITED Xp Wd RW\n",
                constraints: "",
                affixes: "RPUNC .\n",
            },
        )
        .unwrap()
    }

    fn solve(text: &str, options: &SearchOptions) -> SolveOutcome {
        let lex = lexicon();
        let tokens = Tokenizer::new(&lex).tokenize(text);
        let outcome = Solver::new(&lex).solve(&tokens, options).unwrap();
        outcome
    }

    fn labels(sub: &Sublinkage) -> Vec<&str> {
        sub.links.iter().map(|l| l.label.as_str()).collect()
    }

    #[test]
    fn test_simple_sentence() {
        let outcome = solve("The cat runs.", &SearchOptions::default());
        assert_eq!(outcome.null_count, 0);
        assert_eq!(outcome.linkages.len(), 1);

        let linkage = &outcome.linkages[0];
        assert_eq!(linkage.words, vec!["LEFT-WALL", "the", "cat.n", "runs.v", ".", "RIGHT-WALL"]);
        assert_eq!(labels(&linkage.sublinkages[0]), vec!["Xp", "Wd", "Ds", "Ss", "RW"]);
        assert!(linkage.is_valid());

        // Wd, Ds and Ss sit in the wall's domain
        let marked: Vec<bool> = linkage.sublinkages[0].domains.iter().map(|d| !d.is_empty()).collect();
        assert_eq!(marked, vec![false, true, true, true, false]);
        assert_eq!(linkage.cost.link_cost, 4);
    }

    #[test]
    fn test_every_link_points_right() {
        let outcome = solve("The big dog chased a cat.", &SearchOptions::default());
        assert!(!outcome.linkages.is_empty());
        for linkage in &outcome.linkages {
            for link in &linkage.sublinkages[0].links {
                assert!(link.left < link.right);
            }
        }
    }

    #[test]
    fn test_null_word() {
        // 1. "zorp" is unknown and there is no unknown-word entry
        let outcome = solve("The zorp cat runs.", &SearchOptions::default());
        assert_eq!(outcome.null_count, 1);
        assert_eq!(outcome.linkages[0].words[2], "[zorp]");
        assert_eq!(outcome.linkages[0].cost.unused_word_cost, 1);

        // 2. Nulls not allowed
        let strict = SearchOptions { allow_null: false, ..SearchOptions::default() };
        let outcome = solve("The zorp cat runs.", &strict);
        assert!(outcome.linkages.is_empty());
        assert_eq!(outcome.num_found, 0);
    }

    #[test]
    fn test_null_block_finds_same_minimum() {
        let blocky = SearchOptions { null_block: 3, ..SearchOptions::default() };
        let outcome = solve("The zorp cat runs.", &blocky);
        assert_eq!(outcome.null_count, 1);
    }

    #[test]
    fn test_conjunction_sublinkages() {
        let outcome = solve("The ball rolled down the hill and bumped the curb.", &SearchOptions::default());
        assert_eq!(outcome.null_count, 0);
        assert_eq!(outcome.linkages.len(), 1);

        let linkage = &outcome.linkages[0];
        assert_eq!(linkage.sublinkages.len(), 2);
        assert_eq!(linkage.words[7], "and");
        assert_eq!(linkage.cost.and_cost, 1);
        assert!(linkage.chosen[7].is_none());

        let subject_links: Vec<(usize, usize)> = linkage
            .sublinkages
            .iter()
            .map(|s| s.links.iter().find(|l| l.label == "Ss").map(|l| (l.left, l.right)).unwrap())
            .collect();
        assert_eq!(subject_links, vec![(2, 3), (2, 8)]);
    }

    #[test]
    fn test_sentence_length_limit() {
        let lex = lexicon();
        let tokens = Tokenizer::new(&lex).tokenize("The cat runs.");
        let options = SearchOptions { max_sentence_length: Some(2), ..SearchOptions::default() };
        let err = Solver::new(&lex).solve(&tokens, &options).unwrap_err();
        assert_eq!(err, SearchError::SentenceTooLong { words: 4, limit: 2 });
    }

    #[test]
    fn test_custom_validator() {
        struct RejectAll;
        impl LinkageValidator for RejectAll {
            fn validate(&self, input: &ValidationInput<'_>) -> Validation {
                Validation { domains: vec![Vec::new(); input.links.len()], violation: Some("nope".to_string()) }
            }
        }

        let lex = lexicon();
        let tokens = Tokenizer::new(&lex).tokenize("The cat runs.");
        let solver = Solver::new(&lex).with_validator(Box::new(RejectAll));
        let outcome = solver.solve(&tokens, &SearchOptions::default()).unwrap();
        assert_eq!(outcome.num_valid, 0);
        assert_eq!(outcome.linkages[0].violation(), Some("nope"));
    }

    #[test]
    fn test_memory_budget_truncates() {
        let options = SearchOptions { max_memory: Some(1), ..SearchOptions::default() };
        let outcome = solve("The cat runs.", &options);
        assert!(outcome.memory_exhausted);
    }

    #[test]
    fn test_sample_spreads_indices() {
        assert_eq!(sample(3, 10).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(sample(10, 2).collect::<Vec<_>>(), vec![0, 5]);
    }

    proptest::proptest! {
        #[test]
        fn prop_sample_is_increasing_and_bounded(count in 0u64..100_000, limit in 1usize..500) {
            let picked: Vec<Count> = sample(count, limit).collect();
            proptest::prop_assert_eq!(picked.len() as u64, count.min(limit as u64));
            proptest::prop_assert!(picked.windows(2).all(|w| w[0] < w[1]));
            proptest::prop_assert!(picked.iter().all(|&i| i < count));
        }
    }
}
