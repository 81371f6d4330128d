use std::collections::HashMap;

use lg_protocol::{Connector, Direction, Disjunct, DisjunctId};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0, multispace1, one_of},
    combinator::{map, map_res, opt, recognize},
    multi::separated_list1,
    sequence::{delimited, pair, tuple},
    IResult,
};

use crate::error::LexiconError;

/// Upper bound on the disjuncts a single entry may expand to.
pub const MAX_DISJUNCTS: usize = 4096;

/// A connector formula as written in the lexicon.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Connector(Connector),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    /// `{ x }`
    Optional(Box<Expr>),
    /// `[ x ]` adds one to the cost of everything inside
    Cost(Box<Expr>, u32),
    /// `()`
    Empty,
    Macro(String),
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn connector(input: &str) -> IResult<&str, Expr> {
    map_res(
        recognize(tuple((
            opt(char('@')),
            opt(one_of("hd")),
            take_while1(|c: char| c.is_ascii_uppercase()),
            take_while(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '*'),
            one_of("+-"),
        ))),
        |text: &str| Connector::parse(text).map(Expr::Connector),
    )(input)
}

fn macro_ref(input: &str) -> IResult<&str, Expr> {
    map(
        delimited(char('<'), take_while1(|c: char| c != '>' && !c.is_whitespace()), char('>')),
        |name: &str| Expr::Macro(name.to_string()),
    )(input)
}

fn group(input: &str) -> IResult<&str, Expr> {
    alt((
        map(
            delimited(pair(char('('), multispace0), opt(expression), pair(multispace0, char(')'))),
            |inner| inner.unwrap_or(Expr::Empty),
        ),
        map(
            delimited(pair(char('{'), multispace0), expression, pair(multispace0, char('}'))),
            |inner| Expr::Optional(Box::new(inner)),
        ),
        map(
            delimited(pair(char('['), multispace0), expression, pair(multispace0, char(']'))),
            |inner| Expr::Cost(Box::new(inner), 1),
        ),
    ))(input)
}

fn unary(input: &str) -> IResult<&str, Expr> {
    alt((group, macro_ref, connector))(input)
}

fn and_expr(input: &str) -> IResult<&str, Expr> {
    map(separated_list1(ws(char('&')), unary), |mut items| {
        if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::And(items)
        }
    })(input)
}

/// `a & b or c` binds as `(a & b) or c`.
pub fn expression(input: &str) -> IResult<&str, Expr> {
    map(separated_list1(delimited(multispace1, tag("or"), multispace1), and_expr), |mut items| {
        if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::Or(items)
        }
    })(input)
}

/// Connectors in formula order plus accumulated cost.
#[derive(Debug, Clone, PartialEq)]
struct Clause {
    connectors: Vec<Connector>,
    cost: u32,
}

/// Expands a formula into its disjuncts, resolving macros from `macros`.
pub fn expand(word: &str, expr: &Expr, macros: &HashMap<String, Expr>) -> Result<Vec<Disjunct>, LexiconError> {
    let mut active = Vec::new();
    let clauses = expand_clauses(word, expr, macros, &mut active)?;

    let mut disjuncts: Vec<Disjunct> = Vec::with_capacity(clauses.len());
    for clause in clauses {
        let (left, right): (Vec<Connector>, Vec<Connector>) =
            clause.connectors.into_iter().partition(|c| c.direction == Direction::Left);

        // Same connectors reachable twice: keep the cheaper one
        if let Some(existing) = disjuncts.iter_mut().find(|d| d.left == left && d.right == right) {
            existing.cost = existing.cost.min(clause.cost);
            continue;
        }
        let id = DisjunctId(disjuncts.len() as u32);
        disjuncts.push(Disjunct::new(id, left, right, clause.cost));
    }
    Ok(disjuncts)
}

fn expand_clauses(
    word: &str,
    expr: &Expr,
    macros: &HashMap<String, Expr>,
    active: &mut Vec<String>,
) -> Result<Vec<Clause>, LexiconError> {
    let clauses = match expr {
        Expr::Connector(c) => vec![Clause { connectors: vec![c.clone()], cost: 0 }],
        Expr::Empty => vec![Clause { connectors: Vec::new(), cost: 0 }],
        Expr::Optional(inner) => {
            let mut clauses = vec![Clause { connectors: Vec::new(), cost: 0 }];
            clauses.extend(expand_clauses(word, inner, macros, active)?);
            clauses
        }
        Expr::Cost(inner, extra) => {
            let mut clauses = expand_clauses(word, inner, macros, active)?;
            for clause in &mut clauses {
                clause.cost += extra;
            }
            clauses
        }
        Expr::Or(items) => {
            let mut clauses = Vec::new();
            for item in items {
                clauses.extend(expand_clauses(word, item, macros, active)?);
            }
            clauses
        }
        Expr::And(items) => {
            let mut clauses = vec![Clause { connectors: Vec::new(), cost: 0 }];
            for item in items {
                let rhs = expand_clauses(word, item, macros, active)?;
                if clauses.len().saturating_mul(rhs.len()) > MAX_DISJUNCTS {
                    return Err(LexiconError::TooManyDisjuncts { word: word.to_string(), limit: MAX_DISJUNCTS });
                }
                let mut product = Vec::with_capacity(clauses.len() * rhs.len());
                for lhs in &clauses {
                    for r in &rhs {
                        let mut connectors = lhs.connectors.clone();
                        connectors.extend(r.connectors.iter().cloned());
                        product.push(Clause { connectors, cost: lhs.cost + r.cost });
                    }
                }
                clauses = product;
            }
            clauses
        }
        Expr::Macro(name) => {
            if active.iter().any(|m| m == name) {
                return Err(LexiconError::RecursiveMacro(name.clone()));
            }
            let body = macros.get(name).ok_or_else(|| LexiconError::UnknownMacro(name.clone()))?;
            active.push(name.clone());
            let clauses = expand_clauses(word, body, macros, active)?;
            active.pop();
            clauses
        }
    };

    if clauses.len() > MAX_DISJUNCTS {
        return Err(LexiconError::TooManyDisjuncts { word: word.to_string(), limit: MAX_DISJUNCTS });
    }
    Ok(clauses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nom::combinator::all_consuming;

    fn parse(text: &str) -> Expr {
        all_consuming(ws(expression))(text).expect("expression should parse").1
    }

    fn strings(disjuncts: &[Disjunct]) -> Vec<String> {
        disjuncts.iter().map(|d| format!("{}", d)).collect()
    }

    #[test]
    fn test_precedence() {
        let expr = parse("A+ & B- or C+");
        assert!(matches!(expr, Expr::Or(ref items) if items.len() == 2));
    }

    #[test]
    fn test_expand_walls() {
        let expr = parse("(Wd+ or Wi+) & {Xp+ or RW+}");
        let disjuncts = expand("LEFT-WALL", &expr, &HashMap::new()).unwrap();
        assert_eq!(
            strings(&disjuncts),
            vec!["Wd+", "Wd+ Xp+", "Wd+ RW+", "Wi+", "Wi+ Xp+", "Wi+ RW+"]
        );
    }

    #[test]
    fn test_sides_keep_formula_order() {
        let expr = parse("Wd- & Ds- & Ss+ & @MV+");
        let disjuncts = expand("cat", &expr, &HashMap::new()).unwrap();
        assert_eq!(disjuncts.len(), 1);
        assert_eq!(disjuncts[0].left.len(), 2);
        assert_eq!(disjuncts[0].left[0].head, "W");
        assert!(disjuncts[0].right[1].is_multi());
    }

    #[test]
    fn test_costs_and_empty() {
        let expr = parse("[A+] or ()");
        let disjuncts = expand("x", &expr, &HashMap::new()).unwrap();
        assert_eq!(disjuncts[0].cost, 1);
        assert!(disjuncts[1].is_empty());
    }

    #[test]
    fn test_macros() {
        let mut macros = HashMap::new();
        macros.insert("det".to_string(), parse("Ds- & {@A-}"));
        let expr = parse("<det> & Ss+");
        let disjuncts = expand("cat", &expr, &macros).unwrap();
        assert_eq!(strings(&disjuncts), vec!["Ds- Ss+", "Ds- @A- Ss+"]);

        let missing = expand("cat", &parse("<nope>"), &macros);
        assert!(matches!(missing, Err(LexiconError::UnknownMacro(name)) if name == "nope"));
    }

    #[test]
    fn test_recursive_macro() {
        let mut macros = HashMap::new();
        macros.insert("loop".to_string(), parse("A+ or <loop>"));
        let result = expand("x", &parse("<loop>"), &macros);
        assert!(matches!(result, Err(LexiconError::RecursiveMacro(_))));
    }
}
