use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use lg_protocol::disjunct::describe;
use lg_protocol::ConstituentRule;
use lg_solver::{RawLink, RawLinkage, Sublinkage};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::constituents::{self, ConstituentMode, CTree};
use crate::deprecation::DeprecationTracker;
use crate::error::LinkageError;
use crate::link_types::describe_link_type;
use crate::options::ParseOptions;
use crate::render;

static VERB_LEFT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(O([DFNTX]?)|P|BI|K|LI|MV|Q)[a-z\*]*").unwrap());
static VERB_RIGHT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(SI|S|AF)[a-z\*]*").unwrap());
static SUBSCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.[\p{Alphabetic}\-]+$").unwrap());
static NOUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*)\.n(?:-\w)?$").unwrap());
static VERB_FORM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.v(?:-\w)?$").unwrap());

/// State shared by every linkage of one parse.
pub(crate) struct LinkageContext {
    /// Spelling of each word as it appeared in the input.
    pub(crate) texts: Vec<String>,
    pub(crate) rules: Vec<ConstituentRule>,
    pub(crate) options: ParseOptions,
    pub(crate) deprecations: Arc<DeprecationTracker>,
}

/// A link between two words as seen by callers. Out-of-range lookups yield
/// [`Link::invalid`], whose length is -1 and whose labels are absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub left_index: i32,
    pub right_index: i32,
    pub left_word: String,
    pub right_word: String,
    pub length: i32,
    pub label: Option<String>,
    pub left_sublabel: Option<String>,
    pub right_sublabel: Option<String>,
    pub description: Option<&'static str>,
}

impl Link {
    pub fn invalid() -> Self {
        Self {
            left_index: -1,
            right_index: -1,
            left_word: String::new(),
            right_word: String::new(),
            length: -1,
            label: None,
            left_sublabel: None,
            right_sublabel: None,
            description: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.length >= 0
    }
}

/// One way the words of a sentence link together.
#[derive(Clone)]
pub struct Linkage {
    raw: RawLinkage,
    context: Arc<LinkageContext>,
    current: usize,
    union_computed: bool,
}

impl Linkage {
    pub(crate) fn new(raw: RawLinkage, context: Arc<LinkageContext>) -> Self {
        Self { raw, context, current: 0, union_computed: false }
    }

    fn sub(&self) -> &Sublinkage {
        &self.raw.sublinkages[self.current]
    }

    fn raw_link(&self, index: usize) -> Option<&RawLink> {
        self.sub().links.get(index)
    }

    pub(crate) fn texts(&self) -> &[String] {
        &self.context.texts
    }

    pub(crate) fn rules(&self) -> &[ConstituentRule] {
        &self.context.rules
    }

    pub(crate) fn options(&self) -> &ParseOptions {
        &self.context.options
    }

    pub(crate) fn raw_links(&self) -> &[RawLink] {
        &self.sub().links
    }

    pub(crate) fn domains(&self) -> &[Vec<String>] {
        &self.sub().domains
    }

    /// Word forms: subscripted dictionary entries, null words in brackets.
    pub fn words(&self) -> &[String] {
        &self.raw.words
    }

    pub fn num_words(&self) -> usize {
        self.raw.words.len()
    }

    /// Links of the current sublinkage.
    pub fn num_links(&self) -> usize {
        self.sub().links.len()
    }

    pub fn link(&self, index: usize) -> Link {
        match self.raw_link(index) {
            Some(raw) => Link {
                left_index: raw.left as i32,
                right_index: raw.right as i32,
                left_word: self.raw.words[raw.left].clone(),
                right_word: self.raw.words[raw.right].clone(),
                length: raw.length() as i32,
                label: Some(raw.label.clone()),
                left_sublabel: Some(raw.left_connector.label()),
                right_sublabel: Some(raw.right_connector.label()),
                description: describe_link_type(&raw.label),
            },
            None => Link::invalid(),
        }
    }

    pub fn links(&self) -> Vec<Link> {
        (0..self.num_links()).map(|i| self.link(i)).collect()
    }

    pub fn link_lword(&self, index: usize) -> i32 {
        self.raw_link(index).map_or(-1, |l| l.left as i32)
    }

    pub fn link_rword(&self, index: usize) -> i32 {
        self.raw_link(index).map_or(-1, |l| l.right as i32)
    }

    pub fn link_length(&self, index: usize) -> i32 {
        self.raw_link(index).map_or(-1, |l| l.length() as i32)
    }

    pub fn link_label(&self, index: usize) -> Option<&str> {
        self.raw_link(index).map(|l| l.label.as_str())
    }

    pub fn link_llabel(&self, index: usize) -> Option<String> {
        self.raw_link(index).map(|l| l.left_connector.label())
    }

    pub fn link_rlabel(&self, index: usize) -> Option<String> {
        self.raw_link(index).map(|l| l.right_connector.label())
    }

    pub fn link_num_domains(&self, index: usize) -> i32 {
        self.sub().domains.get(index).map_or(-1, |d| d.len() as i32)
    }

    pub fn link_domain_names(&self, index: usize) -> Vec<String> {
        self.sub().domains.get(index).cloned().unwrap_or_default()
    }

    /// The disjunct each word was linked through; null and conjunction words have none.
    pub fn disjunct_strings(&self) -> Vec<Option<String>> {
        self.raw.chosen.iter().map(|c| c.as_ref().map(|c| describe(&c.disjunct))).collect()
    }

    /// Like [`Linkage::disjunct_strings`], split into connectors.
    pub fn disjuncts(&self) -> Vec<Option<Vec<String>>> {
        self.raw
            .chosen
            .iter()
            .map(|c| c.as_ref().map(|c| c.disjunct.connectors().map(|conn| conn.to_string()).collect()))
            .collect()
    }

    pub fn unused_word_cost(&self) -> usize {
        self.raw.cost.unused_word_cost
    }

    pub fn disjunct_cost(&self) -> u32 {
        self.raw.cost.disjunct_cost
    }

    pub fn corpus_cost(&self) -> f32 {
        self.raw.cost.corpus_cost
    }

    pub fn and_cost(&self) -> usize {
        self.raw.cost.and_cost
    }

    pub fn link_cost(&self) -> usize {
        self.raw.cost.link_cost
    }

    /// Name of the rule the linkage breaks, if any.
    pub fn violation_name(&self) -> Option<&str> {
        self.raw.violation()
    }

    pub fn is_improper(&self) -> bool {
        !self.raw.is_valid() || self.raw.has_inconsistent_domains()
    }

    pub fn is_canonical(&self) -> bool {
        self.raw.canonical
    }

    pub fn has_inconsistent_domains(&self) -> bool {
        self.raw.has_inconsistent_domains()
    }

    pub fn num_sublinkages(&self) -> usize {
        self.raw.sublinkages.len()
    }

    pub fn current_sublinkage(&self) -> usize {
        self.current
    }

    pub fn set_current_sublinkage(&mut self, index: usize) -> Result<(), LinkageError> {
        if index >= self.num_sublinkages() {
            return Err(LinkageError::Sublinkage { index, count: self.num_sublinkages() });
        }
        self.current = index;
        Ok(())
    }

    pub fn has_conjunction(&self) -> bool {
        self.num_sublinkages() > 1
    }

    /// Appends a sublinkage holding every link of the others. Only linkages
    /// with a conjunction get one, and only once; returns whether one was added.
    pub fn compute_union(&mut self) -> bool {
        if self.union_computed || !self.has_conjunction() {
            return false;
        }
        let union = Sublinkage::union(&self.raw.sublinkages);
        self.raw.sublinkages.push(union);
        self.union_computed = true;
        true
    }

    /// The main verb, found by link type. A heuristic: grammars that name
    /// their links differently will not answer it.
    pub fn verb(&self, keep_subscript: bool) -> Option<String> {
        let links = self.links();
        let word = links
            .iter()
            .find(|l| l.left_sublabel.as_deref().is_some_and(|s| VERB_LEFT.is_match(s)))
            .map(|l| &l.left_word)
            .or_else(|| {
                links
                    .iter()
                    .find(|l| l.right_sublabel.as_deref().is_some_and(|s| VERB_RIGHT.is_match(s)))
                    .map(|l| &l.right_word)
            })?;
        Some(subscript(word, keep_subscript))
    }

    /// Left word of the first subject link.
    pub fn subject(&self, keep_subscript: bool) -> Option<String> {
        self.links()
            .iter()
            .find(|l| l.left_sublabel.as_deref().is_some_and(|s| s.starts_with('S')))
            .map(|l| subscript(&l.left_word, keep_subscript))
    }

    /// Right word of the first object link.
    pub fn object(&self, keep_subscript: bool) -> Option<String> {
        self.links()
            .iter()
            .find(|l| l.right_sublabel.as_deref().is_some_and(|s| s.starts_with('O')))
            .map(|l| subscript(&l.right_word, keep_subscript))
    }

    /// Every linked word marked as a noun, without the marker.
    pub fn nouns(&self) -> Vec<String> {
        let mut nouns: Vec<String> = Vec::new();
        for link in self.raw_links() {
            for word in [&self.raw.words[link.left], &self.raw.words[link.right]] {
                if let Some(caps) = NOUN.captures(word) {
                    let noun = caps[1].to_string();
                    if !nouns.contains(&noun) {
                        nouns.push(noun);
                    }
                }
            }
        }
        nouns
    }

    pub fn is_imperative(&self) -> bool {
        self.raw_links().iter().any(|l| l.label == "Wi" && VERB_FORM.is_match(&self.raw.words[l.right]))
    }

    pub fn constituent_tree(&self) -> Option<CTree> {
        constituents::build(self)
    }

    /// Renders the constituent tree. `mode` is a [`ConstituentMode`] or its
    /// integer; strings are a type error. `ConstituentMode::default()` is mode 1.
    pub fn constituent_tree_string<M>(&self, mode: M) -> Result<String, LinkageError>
    where
        M: TryInto<ConstituentMode>,
        LinkageError: From<M::Error>,
    {
        let mode = mode.try_into()?;
        Ok(self.constituent_tree().map(|tree| tree.render(mode)).unwrap_or_default())
    }

    /// The linkage as the parse's display options ask for it, wrapped at the
    /// screen width. Empty when display is off or in batch mode.
    pub fn diagram(&self) -> String {
        let options = self.options();
        if !options.display_on() || options.batch_mode {
            return String::new();
        }
        self.diagram_with_width(options.screen_width)
    }

    /// ASCII diagram of the current sublinkage, or of the union with
    /// `display_union`, followed by the sections the other display options
    /// turn on: links and domains, the constituent tree, then PostScript.
    pub fn diagram_with_width(&self, max_width: usize) -> String {
        let options = self.options();
        let union;
        let shown = if options.display_union() && self.has_conjunction() {
            union = self.union_view();
            &union
        } else {
            self
        };

        let mut out = render::diagram(shown, max_width);
        if options.display_links() {
            out.push('\n');
            out.push_str(&render::links_and_domains(shown));
        }
        if options.display_constituents() {
            if let Some(tree) = shown.constituent_tree() {
                out.push('\n');
                out.push_str(&tree.render(ConstituentMode::Indented));
            }
        }
        if options.display_postscript() {
            out.push('\n');
            out.push_str(&render::postscript(shown, false));
        }
        out
    }

    /// A copy positioned on the union sublinkage.
    fn union_view(&self) -> Linkage {
        let mut view = self.clone();
        view.compute_union();
        view.current = view.num_sublinkages() - 1;
        view
    }

    pub fn postscript_diagram(&self, full_doc: bool) -> String {
        render::postscript(self, full_doc)
    }

    pub fn links_and_domains(&self) -> String {
        render::links_and_domains(self)
    }

    pub fn report(&self) -> LinkageReport {
        LinkageReport {
            words: self.words().to_vec(),
            links: self.links(),
            domains: self.sub().domains.clone(),
            disjuncts: self.disjunct_strings(),
            unused_word_cost: self.unused_word_cost(),
            disjunct_cost: self.disjunct_cost(),
            and_cost: self.and_cost(),
            link_cost: self.link_cost(),
            violation: self.violation_name().map(str::to_string),
            num_sublinkages: self.num_sublinkages(),
            current_sublinkage: self.current,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.report())
    }

    #[deprecated(note = "use num_words")]
    #[track_caller]
    pub fn word_count(&self) -> usize {
        self.context.deprecations.record("word_count", Location::caller());
        self.num_words()
    }

    #[deprecated(note = "use num_links")]
    #[track_caller]
    pub fn link_count(&self) -> usize {
        self.context.deprecations.record("link_count", Location::caller());
        self.num_links()
    }
}

fn subscript(word: &str, keep: bool) -> String {
    if keep {
        word.to_string()
    } else {
        SUBSCRIPT.replace(word, "").into_owned()
    }
}

impl fmt::Debug for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Linkage")
            .field("words", &self.raw.words)
            .field("links", &self.num_links())
            .field("sublinkage", &format_args!("{}/{}", self.current, self.num_sublinkages()))
            .field("cost", &self.raw.cost)
            .finish()
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.diagram())
    }
}

/// Serializable summary of a linkage's current sublinkage.
#[derive(Debug, Clone, Serialize)]
pub struct LinkageReport {
    pub words: Vec<String>,
    pub links: Vec<Link>,
    pub domains: Vec<Vec<String>>,
    pub disjuncts: Vec<Option<String>>,
    pub unused_word_cost: usize,
    pub disjunct_cost: u32,
    pub and_cost: usize,
    pub link_cost: usize,
    pub violation: Option<String>,
    pub num_sublinkages: usize,
    pub current_sublinkage: usize,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::options::DisplayFlags;
    use lg_protocol::{Connector, Side};
    use lg_solver::LinkageCost;

    fn link(left: usize, right: usize, l: &str, r: &str) -> RawLink {
        let left_connector = Connector::parse(&format!("{}+", l)).unwrap();
        let right_connector = Connector::parse(&format!("{}-", r)).unwrap();
        RawLink {
            left,
            right,
            label: lg_protocol::link_label(&left_connector, &right_connector),
            left_connector,
            right_connector,
        }
    }

    fn rule(label: &str, side: Side, phrase: &str) -> ConstituentRule {
        ConstituentRule { label: label.to_string(), side, phrase: phrase.to_string() }
    }

    /// "The flag was wet." as the solver links it.
    pub(crate) fn flag_was_wet() -> Linkage {
        flag_was_wet_with(ParseOptions::default())
    }

    pub(crate) fn flag_was_wet_with(options: ParseOptions) -> Linkage {
        let words = ["LEFT-WALL", "the", "flag.n", "was.v", "wet.a", ".", "RIGHT-WALL"];
        let texts = ["LEFT-WALL", "The", "flag", "was", "wet", ".", "RIGHT-WALL"];
        let mut sub = Sublinkage::new(vec![
            link(0, 5, "Xp", "Xp"),
            link(0, 2, "Wd", "Wd"),
            link(1, 2, "D", "Ds"),
            link(2, 3, "Ss", "Ss"),
            link(3, 4, "Pa", "Pa"),
            link(5, 6, "RW", "RW"),
        ]);
        sub.domains = vec![vec![], vec!["m".into()], vec!["m".into()], vec!["m".into()], vec!["m".into()], vec![]];
        let raw = RawLinkage {
            words: words.iter().map(|w| w.to_string()).collect(),
            chosen: vec![None; words.len()],
            sublinkages: vec![sub],
            cost: LinkageCost { link_cost: 5, ..LinkageCost::default() },
            canonical: true,
        };
        let context = LinkageContext {
            texts: texts.iter().map(|w| w.to_string()).collect(),
            rules: vec![
                rule("S", Side::Left, "NP"),
                rule("S", Side::Right, "VP"),
                rule("Pa", Side::Right, "ADJP"),
            ],
            options,
            deprecations: Arc::new(DeprecationTracker::new()),
        };
        Linkage::new(raw, Arc::new(context))
    }

    #[test]
    fn test_link_queries() {
        let linkage = flag_was_wet();
        assert_eq!(linkage.num_words(), 7);
        assert_eq!(linkage.num_links(), 6);

        let labels: Vec<_> = (0..6).filter_map(|i| linkage.link_label(i)).collect();
        assert_eq!(labels, vec!["Xp", "Wd", "Ds", "Ss", "Pa", "RW"]);

        let ds = linkage.link(2);
        assert_eq!((ds.left_index, ds.right_index, ds.length), (1, 2, 1));
        assert_eq!(ds.left_sublabel.as_deref(), Some("D"));
        assert_eq!(ds.right_sublabel.as_deref(), Some("Ds"));
        assert_eq!(ds.right_word, "flag.n");
        assert!(ds.description.is_some());
    }

    #[test]
    fn test_out_of_range_links() {
        let linkage = flag_was_wet();
        assert_eq!(linkage.link_length(6), -1);
        assert_eq!(linkage.link_lword(99), -1);
        assert_eq!(linkage.link_rword(99), -1);
        assert_eq!(linkage.link_label(6), None);
        assert_eq!(linkage.link_llabel(6), None);
        assert_eq!(linkage.link_rlabel(6), None);
        assert_eq!(linkage.link_num_domains(6), -1);
        assert!(linkage.link_domain_names(6).is_empty());
        assert_eq!(linkage.link(6), Link::invalid());
    }

    #[test]
    fn test_domains() {
        let linkage = flag_was_wet();
        let counts: Vec<i32> = (0..6).map(|i| linkage.link_num_domains(i)).collect();
        assert_eq!(counts, vec![0, 1, 1, 1, 1, 0]);
        assert_eq!(linkage.link_domain_names(3), vec!["m".to_string()]);
    }

    #[test]
    fn test_heuristics() {
        let linkage = flag_was_wet();
        assert_eq!(linkage.verb(false).as_deref(), Some("was"));
        assert_eq!(linkage.verb(true).as_deref(), Some("was.v"));
        assert_eq!(linkage.subject(false).as_deref(), Some("flag"));
        assert_eq!(linkage.object(false), None);
        assert_eq!(linkage.nouns(), vec!["flag".to_string()]);
        assert!(!linkage.is_imperative());
    }

    #[test]
    fn test_display_sections() {
        let plain = flag_was_wet().diagram();

        // 1. Each option appends its own section after the arcs
        let mut options = ParseOptions::default();
        options.display.insert(DisplayFlags::LINKS);
        let with_links = flag_was_wet_with(options).diagram();
        assert!(with_links.starts_with(&plain));
        assert!(with_links.ends_with(&flag_was_wet().links_and_domains()));

        let mut options = ParseOptions::default();
        options.display.insert(DisplayFlags::CONSTITUENTS);
        let with_tree = flag_was_wet_with(options).diagram();
        assert!(with_tree.starts_with(&plain));
        assert!(with_tree.ends_with(&flag_was_wet().constituent_tree_string(1).unwrap()));

        let mut options = ParseOptions::default();
        options.display.insert(DisplayFlags::POSTSCRIPT);
        let with_ps = flag_was_wet_with(options).diagram();
        assert!(with_ps.starts_with(&plain));
        assert!(with_ps.ends_with(&flag_was_wet().postscript_diagram(false)));

        // 2. Sections come in a fixed order
        let mut options = ParseOptions::default();
        options.display.insert(DisplayFlags::LINKS | DisplayFlags::CONSTITUENTS | DisplayFlags::POSTSCRIPT);
        let all = flag_was_wet_with(options).diagram();
        let links_at = all.find("<---Ds").unwrap();
        let tree_at = all.find("(S (NP").unwrap();
        let ps_at = all.find("[(LEFT-WALL)").unwrap();
        assert!(links_at < tree_at && tree_at < ps_at);

        // 3. Union display leaves a linkage without a conjunction alone
        let mut options = ParseOptions::default();
        options.display.insert(DisplayFlags::UNION);
        assert_eq!(flag_was_wet_with(options).diagram(), plain);
    }

    #[test]
    fn test_display_suppressed() {
        let mut options = ParseOptions::default();
        options.display.remove(DisplayFlags::ON);
        assert_eq!(flag_was_wet_with(options).diagram(), "");

        let mut options = ParseOptions::default();
        options.batch_mode = true;
        let linkage = flag_was_wet_with(options);
        assert_eq!(linkage.diagram(), "");
        assert_eq!(linkage.diagram_with_width(200), flag_was_wet().diagram_with_width(200));
    }

    #[test]
    fn test_union_only_with_conjunction() {
        let mut linkage = flag_was_wet();
        assert!(!linkage.has_conjunction());
        assert!(!linkage.compute_union());
        assert_eq!(linkage.num_sublinkages(), 1);
        assert!(linkage.set_current_sublinkage(1).is_err());
    }

    #[test]
    #[allow(deprecated)]
    fn test_deprecated_counts() {
        let linkage = flag_was_wet();
        assert_eq!(linkage.word_count(), 7);
        assert_eq!(linkage.link_count(), 6);
        assert_eq!(linkage.context.deprecations.count("word_count"), 1);
    }

    #[test]
    fn test_json_report() {
        let linkage = flag_was_wet();
        let json: serde_json::Value = serde_json::from_str(&linkage.to_json().unwrap()).unwrap();
        assert_eq!(json["words"][2], "flag.n");
        assert_eq!(json["links"].as_array().unwrap().len(), 6);
        assert_eq!(json["links"][4]["label"], "Pa");
        assert_eq!(json["link_cost"], 5);
    }
}
