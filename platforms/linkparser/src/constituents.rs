use lg_protocol::{label_matches, Side};
use lg_solver::LinkGraph;
use serde::Serialize;

use crate::error::LinkageError;
use crate::linkage::Linkage;

/// Output layouts of [`CTree::render`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConstituentMode {
    /// Parenthesised, a phrase per line under its parent.
    #[default]
    Indented = 1,
    /// Bracketed, each phrase closed with its label.
    Bracketed = 2,
    /// Parenthesised on a single line.
    Flat = 3,
}

impl From<ConstituentMode> for i32 {
    fn from(mode: ConstituentMode) -> i32 {
        mode as i32
    }
}

impl TryFrom<i64> for ConstituentMode {
    type Error = LinkageError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ConstituentMode::Indented),
            2 => Ok(ConstituentMode::Bracketed),
            3 => Ok(ConstituentMode::Flat),
            other => Err(LinkageError::Argument(other.to_string())),
        }
    }
}

impl TryFrom<i32> for ConstituentMode {
    type Error = LinkageError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        ConstituentMode::try_from(i64::from(value))
    }
}

/// Modes are numbers; text is a type error even when it spells one.
impl TryFrom<&str> for ConstituentMode {
    type Error = LinkageError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Err(LinkageError::Type(value.to_string()))
    }
}

/// A node of a phrase-structure tree. Leaves hold a word's spelling as the
/// label and span just that word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CTree {
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub children: Vec<CTree>,
}

impl CTree {
    fn leaf(index: usize, text: &str) -> Self {
        Self { label: text.to_string(), start: index, end: index, children: Vec::new() }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Leaf labels in order.
    pub fn words(&self) -> Vec<&str> {
        if self.is_leaf() {
            return vec![self.label.as_str()];
        }
        self.children.iter().flat_map(|c| c.words()).collect()
    }

    pub fn render(&self, mode: ConstituentMode) -> String {
        let mut out = String::new();
        match mode {
            ConstituentMode::Indented => {
                self.write_indented(&mut out, 0);
                out.push('\n');
            }
            ConstituentMode::Bracketed => {
                self.write_bracketed(&mut out);
                out.push_str(" \n");
            }
            ConstituentMode::Flat => {
                self.write_flat(&mut out);
                out.push('\n');
            }
        }
        out
    }

    fn write_indented(&self, out: &mut String, column: usize) {
        if self.is_leaf() {
            out.push_str(&self.label);
            return;
        }
        out.push('(');
        out.push_str(&self.label);
        out.push(' ');
        let indent = column + self.label.len() + 2;
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                if !child.is_leaf() || !self.children[i - 1].is_leaf() {
                    out.push('\n');
                    out.push_str(&" ".repeat(indent));
                } else {
                    out.push(' ');
                }
            }
            child.write_indented(out, indent);
        }
        out.push(')');
    }

    fn write_bracketed(&self, out: &mut String) {
        if self.is_leaf() {
            out.push_str(&self.label);
            return;
        }
        out.push('[');
        out.push_str(&self.label);
        for child in &self.children {
            out.push(' ');
            child.write_bracketed(out);
        }
        out.push(' ');
        out.push_str(&self.label);
        out.push(']');
    }

    fn write_flat(&self, out: &mut String) {
        if self.is_leaf() {
            out.push_str(&self.label);
            return;
        }
        out.push('(');
        out.push_str(&self.label);
        for child in &self.children {
            out.push(' ');
            child.write_flat(out);
        }
        out.push(')');
    }
}

struct Span {
    label: String,
    start: usize,
    end: usize,
}

impl Span {
    fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    fn crosses(&self, other: &Span) -> bool {
        (self.start < other.start && other.start <= self.end && self.end < other.end)
            || (other.start < self.start && self.start <= other.end && other.end < self.end)
    }
}

/// Phrase structure of the current sublinkage, or `None` when it has no words
/// between the walls.
pub(crate) fn build(linkage: &Linkage) -> Option<CTree> {
    let words = linkage.words();
    let n = words.len();
    if n < 3 {
        return None;
    }
    let (first, last) = (1, n - 2);
    let links = linkage.raw_links();
    let rules = linkage.rules();

    let graph = LinkGraph::from_links(n, links.iter().map(|l| (l.left, l.right)));
    let structural = |i: usize| {
        let l = &links[i];
        l.left == 0 || l.right == n - 1 || ["W", "X", "RW"].iter().any(|p| l.label.starts_with(p))
    };

    // 1. One candidate span per rule-matching link
    let mut spans = vec![Span { label: "S".to_string(), start: first, end: last }];
    for link in links {
        for rule in rules.iter().filter(|r| label_matches(&r.label, &link.label)) {
            let (from, away) = match rule.side {
                Side::Left => (link.left, link.right),
                Side::Right => (link.right, link.left),
            };
            let (reached, _) = graph.reach(from, Some(away), &structural);
            let inner: Vec<usize> = reached.into_iter().filter(|&w| w >= first && w <= last).collect();
            if let (Some(&start), Some(&end)) = (inner.first(), inner.last()) {
                spans.push(Span { label: rule.phrase.clone(), start, end });
            }
        }
    }

    // 2. Keep the first of equal spans, drop any that cross a kept one
    let mut kept: Vec<Span> = Vec::new();
    for span in spans {
        let clash = kept.iter().any(|k| (k.start == span.start && k.end == span.end) || k.crosses(&span));
        if !clash {
            kept.push(span);
        }
    }
    kept.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    // 3. Nest; the root spans everything, so it sorts first
    let texts = linkage.texts();
    Some(nest(&kept, 0, texts).0)
}

/// Builds the node for `spans[index]` and returns it with the index of the
/// first span outside it.
fn nest(spans: &[Span], index: usize, texts: &[String]) -> (CTree, usize) {
    let span = &spans[index];
    let mut children = Vec::new();
    let mut next = index + 1;
    let mut word = span.start;

    while word <= span.end {
        if next < spans.len() && span.contains(&spans[next]) && spans[next].start == word {
            let (child, after) = nest(spans, next, texts);
            word = child.end + 1;
            children.push(child);
            next = after;
        } else {
            children.push(CTree::leaf(word, &texts[word]));
            word += 1;
        }
    }

    // Spans starting inside a child but not nested were already consumed by it
    while next < spans.len() && span.contains(&spans[next]) {
        next += 1;
    }

    let tree = CTree { label: span.label.clone(), start: span.start, end: span.end, children };
    (tree, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linkage::tests::flag_was_wet;

    #[test]
    fn test_flag_was_wet_tree() {
        let tree = flag_was_wet().constituent_tree().unwrap();
        assert_eq!(tree.label, "S");
        assert_eq!((tree.start, tree.end), (1, 5));
        assert_eq!(tree.words(), vec!["The", "flag", "was", "wet", "."]);

        let labels: Vec<&str> = tree.children.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["NP", "VP", "."]);
        assert_eq!(tree.children[1].children[1].label, "ADJP");
    }

    #[test]
    fn test_render_modes() {
        let linkage = flag_was_wet();
        assert_eq!(
            linkage.constituent_tree_string(1).unwrap(),
            "(S (NP The flag)\n   (VP was\n       (ADJP wet))\n   .)\n"
        );
        assert_eq!(
            linkage.constituent_tree_string(ConstituentMode::Bracketed).unwrap(),
            "[S [NP The flag NP] [VP was [ADJP wet ADJP] VP] . S] \n"
        );
        assert_eq!(linkage.constituent_tree_string(3).unwrap(), "(S (NP The flag) (VP was (ADJP wet)) .)\n");
        assert_eq!(
            linkage.constituent_tree_string(ConstituentMode::default()),
            linkage.constituent_tree_string(1)
        );
    }

    #[test]
    fn test_bad_modes() {
        let linkage = flag_was_wet();
        assert_eq!(linkage.constituent_tree_string(4), Err(LinkageError::Argument("4".to_string())));
        assert_eq!(linkage.constituent_tree_string(0), Err(LinkageError::Argument("0".to_string())));
        assert_eq!(linkage.constituent_tree_string("x"), Err(LinkageError::Type("x".to_string())));
        assert_eq!(linkage.constituent_tree_string("3"), Err(LinkageError::Type("3".to_string())));
        assert_eq!(linkage.constituent_tree_string(" 1 "), Err(LinkageError::Type(" 1 ".to_string())));
    }

    #[test]
    fn test_crossing_spans_are_dropped() {
        let spans = [
            Span { label: "S".into(), start: 1, end: 4 },
            Span { label: "A".into(), start: 1, end: 2 },
            Span { label: "B".into(), start: 2, end: 3 },
        ];
        assert!(spans[1].crosses(&spans[2]));
        assert!(!spans[0].crosses(&spans[1]));
        assert!(spans[0].contains(&spans[2]));
    }
}
