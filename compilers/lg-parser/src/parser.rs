use nom::{
    bytes::complete::take_till1,
    character::complete::multispace0,
    IResult,
};
use crate::token::Span;

/// Splits raw input into whitespace-delimited units with their byte spans.
pub fn parse_with_spans(original_input: &str) -> Vec<(Span, &str)> {
    let mut input = original_input;
    let mut result = Vec::new();

    loop {
        // 1. Skip whitespace
        let (next_input, _) = match multispace0::<&str, nom::error::Error<&str>>(input) {
            Ok(res) => res,
            Err(_) => break,
        };
        input = next_input;

        if input.is_empty() {
            break;
        }

        // 2. Take everything up to the next whitespace
        let parse_res: IResult<&str, &str> = take_till1(char::is_whitespace)(input);

        match parse_res {
            Ok((next_input, unit)) => {
                let start = original_input.len() - input.len();
                result.push((Span::new(start, start + unit.len()), unit));
                input = next_input;
            }
            Err(_) => break,
        }
    }

    result
}
