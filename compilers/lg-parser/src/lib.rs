pub mod error;
pub mod expression;
pub mod lexicon;
pub mod parser;
pub mod tables;
pub mod token;

pub use error::LexiconError;
pub use lexicon::{Lexicon, LexiconSources};

use lg_morph::split_unit;
use lg_protocol::{Dictionary, LEFT_WALL, RIGHT_WALL};
use log::trace;

use crate::parser::parse_with_spans;
use crate::token::{Span, Token, TokenKind};

/// Turns raw text into the wall-delimited word sequence the solver links.
pub struct Tokenizer<'d, D: Dictionary + ?Sized> {
    dict: &'d D,
    spell_guess: bool,
}

impl<'d, D: Dictionary + ?Sized> Tokenizer<'d, D> {
    pub fn new(dict: &'d D) -> Self {
        Self { dict, spell_guess: false }
    }

    pub fn with_spell_guess(mut self, enabled: bool) -> Self {
        self.spell_guess = enabled;
        self
    }

    /// Primary entry point: Text -> Words, always `LEFT-WALL ... RIGHT-WALL`
    pub fn tokenize(&self, input: &str) -> Vec<Token> {
        let mut tokens = vec![Token {
            span: Span::new(0, 0),
            text: LEFT_WALL.to_string(),
            form: LEFT_WALL.to_string(),
            kind: TokenKind::LeftWall,
        }];

        for (span, unit) in parse_with_spans(input) {
            let pieces = split_unit(unit, self.dict.affixes(), |s| self.resolve(s).is_some());
            for piece in pieces {
                let text = piece.text(unit);
                let piece_span = Span::new(span.start + piece.start, span.start + piece.end);
                tokens.push(self.classify(piece_span, text));
            }
        }

        tokens.push(Token {
            span: Span::new(input.len(), input.len()),
            text: RIGHT_WALL.to_string(),
            form: RIGHT_WALL.to_string(),
            kind: TokenKind::RightWall,
        });

        trace!(count = tokens.len(); "Tokenized sentence");
        tokens
    }

    /// The lookup form of a piece: as written, or lowercased for capitalised words.
    fn resolve(&self, text: &str) -> Option<String> {
        if self.dict.is_known(text) {
            return Some(text.to_string());
        }
        let lower = text.to_lowercase();
        if lower != text && self.dict.is_known(&lower) {
            return Some(lower);
        }
        None
    }

    fn classify(&self, span: Span, text: &str) -> Token {
        if let Some(form) = self.resolve(text) {
            let kind = if form.chars().all(|c| c.is_ascii_punctuation()) {
                TokenKind::Punctuation
            } else {
                TokenKind::Word
            };
            return Token { span, text: text.to_string(), form, kind };
        }

        if self.spell_guess {
            if let Some(guess) = self.dict.guess_spelling(text).into_iter().next() {
                trace!(word = text, guess = guess.as_str(); "Spelling guess");
                return Token { span, text: text.to_string(), form: guess, kind: TokenKind::Guessed };
            }
        }

        Token { span, text: text.to_string(), form: text.to_string(), kind: TokenKind::Unknown }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> Lexicon {
        Lexicon::from_sources(
            "en",
            LexiconSources {
                dictionary: "LEFT-WALL: Wd+; RIGHT-WALL: RW-; the: D+; cat.n: Ds- & Ss+; runs.v: Ss-; \".\": Xp-; do.v: I+; \"n't\": N-;",
                knowledge: "",
                constraints: "",
                affixes: "RPUNC . !\nSUFFIX n't\n",
            },
        )
        .unwrap()
    }

    fn forms(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.form.as_str()).collect()
    }

    #[test]
    fn test_tokenizer_integration() {
        let lex = lexicon();
        let tokenizer = Tokenizer::new(&lex);
        let input = "The cat runs.";
        let tokens = tokenizer.tokenize(input);

        assert_eq!(forms(&tokens), vec!["LEFT-WALL", "the", "cat", "runs", ".", "RIGHT-WALL"]);
        assert_eq!(tokens[0].kind, TokenKind::LeftWall);
        assert_eq!(tokens[5].kind, TokenKind::RightWall);

        // Original spelling survives lowercasing
        assert_eq!(tokens[1].text, "The");
        assert_eq!(tokens[4].kind, TokenKind::Punctuation);
        assert_eq!(&input[tokens[3].span.start..tokens[3].span.end], "runs");
    }

    #[test]
    fn test_unknown_words_are_kept() {
        let lex = lexicon();
        let tokens = Tokenizer::new(&lex).tokenize("Blorgle zibbit!");
        assert_eq!(forms(&tokens), vec!["LEFT-WALL", "Blorgle", "zibbit", "!", "RIGHT-WALL"]);
        assert!(tokens[1].is_unknown());
        assert!(tokens[3].is_unknown());
    }

    #[test]
    fn test_contraction_split() {
        let lex = lexicon();
        let tokens = Tokenizer::new(&lex).tokenize("don't");
        assert_eq!(forms(&tokens), vec!["LEFT-WALL", "do", "n't", "RIGHT-WALL"]);
    }

    #[test]
    fn test_spell_guess() {
        let lex = lexicon();
        let tokens = Tokenizer::new(&lex).with_spell_guess(true).tokenize("teh cta");
        assert_eq!(tokens[1].kind, TokenKind::Guessed);
        assert_eq!(tokens[1].form, "the");
        assert_eq!(tokens[1].text, "teh");
        assert_eq!(tokens[2].form, "cat");
    }

    #[test]
    fn test_empty_input_is_just_walls() {
        let lex = lexicon();
        let tokens = Tokenizer::new(&lex).tokenize("   ");
        assert_eq!(forms(&tokens), vec!["LEFT-WALL", "RIGHT-WALL"]);
    }
}
