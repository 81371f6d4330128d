use alloc::string::String;
use bitflags::bitflags;
use core::fmt;
use rkyv::{Archive, Deserialize, Serialize};

/// Which neighbour a connector reaches for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
#[repr(u8)]
pub enum Direction {
    /// `-`: links to a word on the left.
    Left = 0,
    /// `+`: links to a word on the right.
    Right = 1,
}

impl Direction {
    pub const fn symbol(self) -> char {
        match self {
            Direction::Left => '-',
            Direction::Right => '+',
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct ConnectorFlags: u8 {
        /// `@`: may attach to more than one word.
        const MULTI = 1;
        /// `h`: head side of a head/dependent pair.
        const HEAD = 2;
        /// `d`: dependent side of a head/dependent pair.
        const DEPENDENT = 4;
    }
}

// rkyv support for ConnectorFlags
impl Archive for ConnectorFlags {
    type Archived = u8;
    type Resolver = ();

    unsafe fn resolve(&self, _pos: usize, _resolver: Self::Resolver, out: *mut Self::Archived) {
        out.write(self.bits());
    }
}

impl<S: rkyv::ser::Serializer + ?Sized> Serialize<S> for ConnectorFlags {
    fn serialize(&self, _serializer: &mut S) -> Result<Self::Resolver, S::Error> {
        Ok(())
    }
}

impl<D: rkyv::Fallible + ?Sized> Deserialize<ConnectorFlags, D> for u8 {
    fn deserialize(&self, _deserializer: &mut D) -> Result<ConnectorFlags, D::Error> {
        Ok(ConnectorFlags::from_bits_truncate(*self))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    Empty,
    MissingDirection(String),
    MissingHead(String),
    InvalidSubscript(String),
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorError::Empty => write!(f, "empty connector"),
            ConnectorError::MissingDirection(c) => write!(f, "connector '{}' must end in '+' or '-'", c),
            ConnectorError::MissingHead(c) => write!(f, "connector '{}' has no uppercase type", c),
            ConnectorError::InvalidSubscript(c) => write!(f, "connector '{}' has an invalid subscript", c),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConnectorError {}

/// A typed, directional terminal of a disjunct, e.g. `@Ss*b+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct Connector {
    /// Uppercase type, e.g. `S`.
    pub head: String,
    /// Lowercase refinement, e.g. `s*b`.
    pub subscript: String,
    pub direction: Direction,
    pub flags: ConnectorFlags,
}

impl Connector {
    pub fn new(label: &str, direction: Direction) -> Result<Self, ConnectorError> {
        let (head, subscript) = split_label(label);
        if head.is_empty() {
            return Err(ConnectorError::MissingHead(label.into()));
        }
        if !subscript.chars().all(is_subscript_char) {
            return Err(ConnectorError::InvalidSubscript(label.into()));
        }
        Ok(Self {
            head: head.into(),
            subscript: subscript.into(),
            direction,
            flags: ConnectorFlags::empty(),
        })
    }

    /// Parses the lexicon spelling of a connector: `[@][h|d]TYPEsub(+|-)`.
    pub fn parse(text: &str) -> Result<Self, ConnectorError> {
        let mut rest = text.trim();
        if rest.is_empty() {
            return Err(ConnectorError::Empty);
        }

        let direction = match rest.chars().last() {
            Some('+') => Direction::Right,
            Some('-') => Direction::Left,
            _ => return Err(ConnectorError::MissingDirection(text.into())),
        };
        rest = &rest[..rest.len() - 1];

        let mut flags = ConnectorFlags::empty();
        if let Some(stripped) = rest.strip_prefix('@') {
            flags |= ConnectorFlags::MULTI;
            rest = stripped;
        }
        if let Some(stripped) = rest.strip_prefix('h') {
            flags |= ConnectorFlags::HEAD;
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('d') {
            flags |= ConnectorFlags::DEPENDENT;
            rest = stripped;
        }

        let mut connector = Self::new(rest, direction).map_err(|err| match err {
            ConnectorError::MissingHead(_) => ConnectorError::MissingHead(text.into()),
            ConnectorError::InvalidSubscript(_) => ConnectorError::InvalidSubscript(text.into()),
            other => other,
        })?;
        connector.flags = flags;
        Ok(connector)
    }

    pub fn with_flags(mut self, flags: ConnectorFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Type plus subscript, without markers or direction.
    pub fn label(&self) -> String {
        let mut label = self.head.clone();
        label.push_str(&self.subscript);
        label
    }

    pub fn is_multi(&self) -> bool {
        self.flags.contains(ConnectorFlags::MULTI)
    }

    /// True if `self` (on the left word) can link to `other` (on the right word).
    pub fn links_to(&self, other: &Connector) -> bool {
        if self.direction != Direction::Right || other.direction != Direction::Left {
            return false;
        }
        if self.head != other.head {
            return false;
        }
        let both_heads = self.flags.contains(ConnectorFlags::HEAD) && other.flags.contains(ConnectorFlags::HEAD);
        let both_deps =
            self.flags.contains(ConnectorFlags::DEPENDENT) && other.flags.contains(ConnectorFlags::DEPENDENT);
        if both_heads || both_deps {
            return false;
        }
        subscripts_compatible(&self.subscript, &other.subscript)
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_multi() {
            f.write_str("@")?;
        }
        if self.flags.contains(ConnectorFlags::HEAD) {
            f.write_str("h")?;
        } else if self.flags.contains(ConnectorFlags::DEPENDENT) {
            f.write_str("d")?;
        }
        write!(f, "{}{}{}", self.head, self.subscript, self.direction.symbol())
    }
}

fn is_subscript_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '*'
}

/// Splits `Ss*b` into (`S`, `s*b`).
pub fn split_label(label: &str) -> (&str, &str) {
    let split = label
        .char_indices()
        .find(|(_, c)| !c.is_ascii_uppercase())
        .map(|(i, _)| i)
        .unwrap_or(label.len());
    label.split_at(split)
}

/// Position-wise subscript comparison; `*` and missing positions match anything.
pub fn subscripts_compatible(a: &str, b: &str) -> bool {
    a.chars().zip(b.chars()).all(|(x, y)| x == '*' || y == '*' || x == y)
}

/// True if a rule pattern such as `S` or `MVp` applies to a link label such as `Ss` or `MVp`.
pub fn label_matches(pattern: &str, label: &str) -> bool {
    let (pattern_head, pattern_sub) = split_label(pattern);
    let (head, sub) = split_label(label);
    pattern_head == head && subscripts_compatible(pattern_sub, sub)
}

/// The label of a link between two matched connectors: the more specific character wins at
/// each subscript position, so `D+` joined with `Ds-` reads `Ds`.
pub fn link_label(left: &Connector, right: &Connector) -> String {
    let mut label = left.head.clone();
    let mut l = left.subscript.chars();
    let mut r = right.subscript.chars();
    loop {
        match (l.next(), r.next()) {
            (None, None) => break,
            (Some(c), None) | (None, Some(c)) => label.push(c),
            (Some('*'), Some(c)) => label.push(c),
            (Some(c), Some(_)) => label.push(c),
        }
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_parse_connector() {
        let c = Connector::parse("@hSs*b+").unwrap();
        assert_eq!(c.head, "S");
        assert_eq!(c.subscript, "s*b");
        assert_eq!(c.direction, Direction::Right);
        assert!(c.is_multi());
        assert!(c.flags.contains(ConnectorFlags::HEAD));
        assert_eq!(c.to_string(), "@hSs*b+");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Connector::parse(""), Err(ConnectorError::Empty));
        assert!(matches!(Connector::parse("Ss"), Err(ConnectorError::MissingDirection(_))));
        assert!(matches!(Connector::parse("s+"), Err(ConnectorError::MissingHead(_))));
        assert!(matches!(Connector::parse("S?+"), Err(ConnectorError::InvalidSubscript(_))));
    }

    #[test]
    fn test_matching_rules() {
        let d = Connector::parse("D+").unwrap();
        let ds = Connector::parse("Ds-").unwrap();
        let sp = Connector::parse("Sp-").unwrap();
        let ss = Connector::parse("Ss+").unwrap();

        assert!(d.links_to(&ds));
        // Direction matters
        assert!(!ds.links_to(&d));
        assert!(!ss.links_to(&sp));
        assert!(Connector::parse("S*+").unwrap().links_to(&sp));
    }

    #[test]
    fn test_head_dependent_markers() {
        let h_left = Connector::parse("hA+").unwrap();
        let h_right = Connector::parse("hA-").unwrap();
        let d_right = Connector::parse("dA-").unwrap();
        assert!(!h_left.links_to(&h_right));
        assert!(h_left.links_to(&d_right));
    }

    #[test]
    fn test_link_label_intersection() {
        let d = Connector::parse("D+").unwrap();
        let ds = Connector::parse("Ds-").unwrap();
        assert_eq!(link_label(&d, &ds), "Ds");

        let spi = Connector::parse("Sp*i+").unwrap();
        let sp = Connector::parse("Sp-").unwrap();
        assert_eq!(link_label(&spi, &sp), "Sp*i");
    }

    #[test]
    fn test_label_patterns() {
        assert!(label_matches("S", "Ss"));
        assert!(!label_matches("S", "SI"));
        assert!(label_matches("MVp", "MVp"));
        assert!(!label_matches("MVp", "MVa"));
    }

    #[test]
    fn test_flags_serialization() {
        let original = Connector::parse("@Xp-").unwrap();
        let bytes = rkyv::to_bytes::<_, 256>(&original).expect("Failed to serialize Connector");
        let restored: Connector = rkyv::from_bytes(&bytes).expect("Failed to deserialize Connector");
        assert_eq!(original, restored);
    }
}
