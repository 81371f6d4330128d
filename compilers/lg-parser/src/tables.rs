//! Line-oriented side files: knowledge, constraints and affixes.
//!
//! Every non-blank line is `KEYWORD value value ...`; `%` starts a comment.

use std::collections::HashMap;

use lg_protocol::{AffixTable, ConstituentRule, ContainsOneRule, DomainStarter, Knowledge, Side};
use nom::{
    bytes::complete::take_till1,
    character::complete::{multispace1, space0},
    multi::many0,
    sequence::preceded,
    IResult,
};

use crate::error::LexiconError;

fn field(input: &str) -> IResult<&str, &str> {
    take_till1(char::is_whitespace)(input)
}

fn line_fields(input: &str) -> IResult<&str, (&str, Vec<&str>)> {
    let (input, _) = space0(input)?;
    let (input, keyword) = field(input)?;
    let (input, values) = many0(preceded(multispace1, field))(input)?;
    Ok((input, (keyword, values)))
}

/// Yields `(line number, keyword, values)` for every meaningful line.
fn lines<'a>(
    file: &'static str,
    text: &'a str,
) -> impl Iterator<Item = Result<(usize, &'a str, Vec<&'a str>), LexiconError>> + 'a {
    text.lines().enumerate().filter_map(move |(n, raw)| {
        let line = raw.split('%').next().unwrap_or("").trim();
        if line.is_empty() {
            return None;
        }
        Some(match line_fields(line) {
            Ok((_, (keyword, values))) => Ok((n + 1, keyword, values)),
            Err(err) => Err(LexiconError::Syntax { file, line: n + 1, message: format!("{:?}", err) }),
        })
    })
}

fn syntax(file: &'static str, line: usize, message: impl Into<String>) -> LexiconError {
    LexiconError::Syntax { file, line, message: message.into() }
}

/// Knowledge file plus the corpus scores it may carry (`CORPUS flag.n 0.25`).
#[derive(Debug, Default)]
pub struct KnowledgeFile {
    pub knowledge: Knowledge,
    pub corpus_costs: HashMap<String, f32>,
}

pub fn parse_knowledge(text: &str) -> Result<KnowledgeFile, LexiconError> {
    const FILE: &str = "knowledge";
    let mut parsed = KnowledgeFile::default();

    for line in lines(FILE, text) {
        let (n, keyword, values) = line?;
        match keyword {
            "DOMAIN" => match values.as_slice() {
                [label, domain] => parsed.knowledge.domain_starters.push(DomainStarter {
                    label: label.to_string(),
                    domain: domain.to_string(),
                }),
                _ => return Err(syntax(FILE, n, "DOMAIN expects a link type and a domain name")),
            },
            "CONSTITUENT" => match values.as_slice() {
                [label, side, phrase] => {
                    let side = match *side {
                        "left" => Side::Left,
                        "right" => Side::Right,
                        other => return Err(syntax(FILE, n, format!("unknown side '{}'", other))),
                    };
                    parsed.knowledge.constituent_rules.push(ConstituentRule {
                        label: label.to_string(),
                        side,
                        phrase: phrase.to_string(),
                    });
                }
                _ => return Err(syntax(FILE, n, "CONSTITUENT expects a link type, a side and a phrase")),
            },
            "CONJUNCTION" => parsed.knowledge.conjunctions.extend(values.iter().map(|v| v.to_string())),
            "UNLIMITED" => parsed.knowledge.unlimited.extend(values.iter().map(|v| v.to_string())),
            "CORPUS" => match values.as_slice() {
                [word, cost] => {
                    let cost: f32 = cost
                        .parse()
                        .map_err(|_| syntax(FILE, n, format!("'{}' is not a number", cost)))?;
                    parsed.corpus_costs.insert(word.to_string(), cost);
                }
                _ => return Err(syntax(FILE, n, "CORPUS expects a word and a cost")),
            },
            other => return Err(syntax(FILE, n, format!("unknown keyword '{}'", other))),
        }
    }

    Ok(parsed)
}

/// `CONTAINS-ONE name trigger : required...`
pub fn parse_constraints(text: &str) -> Result<Vec<ContainsOneRule>, LexiconError> {
    const FILE: &str = "constraint";
    let mut rules = Vec::new();

    for line in lines(FILE, text) {
        let (n, keyword, values) = line?;
        if keyword != "CONTAINS-ONE" {
            return Err(syntax(FILE, n, format!("unknown keyword '{}'", keyword)));
        }
        match values.as_slice() {
            [name, trigger, ":", required @ ..] if !required.is_empty() => rules.push(ContainsOneRule {
                name: name.to_string(),
                trigger: trigger.to_string(),
                required: required.iter().map(|r| r.to_string()).collect(),
            }),
            _ => return Err(syntax(FILE, n, "expected CONTAINS-ONE <name> <trigger> : <required>...")),
        }
    }

    Ok(rules)
}

pub fn parse_affixes(text: &str) -> Result<AffixTable, LexiconError> {
    const FILE: &str = "affix";
    let mut table = AffixTable::default();

    for line in lines(FILE, text) {
        let (n, keyword, values) = line?;
        let target = match keyword {
            "LPUNC" => &mut table.left_punctuation,
            "RPUNC" => &mut table.right_punctuation,
            "SUFFIX" => &mut table.suffixes,
            other => return Err(syntax(FILE, n, format!("unknown keyword '{}'", other))),
        };
        target.extend(values.iter().map(|v| v.to_string()));
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knowledge_file() {
        let text = "% domains\nDOMAIN W m\nCONSTITUENT S left NP\nCONJUNCTION and or\nUNLIMITED Xp RW\nCORPUS flag.n 0.5\n";
        let parsed = parse_knowledge(text).unwrap();
        assert_eq!(parsed.knowledge.domain_starters[0].domain, "m");
        assert_eq!(parsed.knowledge.constituent_rules[0].side, Side::Left);
        assert_eq!(parsed.knowledge.conjunctions, vec!["and", "or"]);
        assert_eq!(parsed.knowledge.unlimited, vec!["Xp", "RW"]);
        assert_eq!(parsed.corpus_costs.get("flag.n"), Some(&0.5));
    }

    #[test]
    fn test_knowledge_errors_carry_line() {
        let err = parse_knowledge("DOMAIN W m\nCONSTITUENT S up NP\n").unwrap_err();
        assert!(matches!(err, LexiconError::Syntax { line: 2, .. }));
    }

    #[test]
    fn test_constraints() {
        let rules = parse_constraints("CONTAINS-ONE no-subject Sw : S SI\n").unwrap();
        assert_eq!(rules[0].name, "no-subject");
        assert_eq!(rules[0].required, vec!["S", "SI"]);
        assert!(parse_constraints("CONTAINS-ONE broken\n").is_err());
    }

    #[test]
    fn test_affixes() {
        let table = parse_affixes("LPUNC ( \"\nRPUNC ) . , ! ?\nSUFFIX 's n't\n").unwrap();
        assert_eq!(table.left_punctuation, vec!["(", "\""]);
        assert_eq!(table.right_punctuation.len(), 5);
        assert_eq!(table.suffixes, vec!["'s", "n't"]);
        assert!(parse_affixes("PREFIX un\n").is_err());
    }
}
