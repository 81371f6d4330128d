#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LeftWall,
    RightWall,
    /// A word found in the dictionary
    Word,
    /// Punctuation found in the dictionary
    Punctuation,
    /// Not in the dictionary; kept so it can be linked as a null word
    Unknown,
    /// Unknown as written, replaced by a spelling suggestion
    Guessed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub span: Span,
    /// Spelling as it appeared in the input.
    pub text: String,
    /// Form used for dictionary lookup.
    pub form: String,
    pub kind: TokenKind,
}

impl Token {
    pub fn is_wall(&self) -> bool {
        matches!(self.kind, TokenKind::LeftWall | TokenKind::RightWall)
    }

    pub fn is_unknown(&self) -> bool {
        self.kind == TokenKind::Unknown
    }
}
