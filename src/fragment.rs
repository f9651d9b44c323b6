//! Fragment reader
//!
//! Reads one already-extracted property fragment (`(id, dt)`, `HASH(id)`,
//! `kind='HASH'`, `10`) into an [`Expr`]. This is not a source-file parser:
//! it only covers the value shapes property types accept as strings.
//! Nesting deeper than [`MAX_DEPTH`] is rejected.
//!
//! ```text
//! fragment := item ("," item)*          -- several items read as a tuple
//! item     := operand ("=" operand)?
//! operand  := "(" items? ")" | name "(" items? ")" | literal | name
//! literal  := 'text' | number | TRUE | FALSE
//! name     := ident ("." ident)* | "quoted" | `quoted`
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while, take_while1},
    character::complete::{char, digit1, multispace0, satisfy},
    combinator::{all_consuming, cut, map, not, opt, peek, recognize},
    error::{context, ContextError, ErrorKind, ParseError, VerboseError},
    multi::{many0, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::error::{PropertyError, Result};
use crate::expr::{Expr, Literal};

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// Deepest accepted nesting of tuples and calls
pub const MAX_DEPTH: usize = 64;

// ============================================================================
// Public API
// ============================================================================

/// Read a fragment into an expression node
pub fn parse_fragment(text: &str) -> Result<Expr> {
    let input = text.trim();
    if input.is_empty() {
        return Err(fragment_error(text, "empty fragment".to_string()));
    }
    match all_consuming(fragment)(input) {
        Ok((_, node)) => Ok(node),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(fragment_error(text, nom::error::convert_error(input, e)))
        }
        Err(nom::Err::Incomplete(_)) => Err(fragment_error(text, "incomplete input".to_string())),
    }
}

/// Read a single bare or quoted word as an identifier
pub fn parse_identifier(text: &str) -> Result<Expr> {
    let input = text.trim();
    match all_consuming(alt((dotted_name, quoted_name)))(input) {
        Ok((_, name)) => Ok(Expr::identifier(name)),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(fragment_error(text, nom::error::convert_error(input, e)))
        }
        Err(nom::Err::Incomplete(_)) => Err(fragment_error(text, "incomplete input".to_string())),
    }
}

fn fragment_error(text: &str, reason: String) -> PropertyError {
    PropertyError::Fragment {
        text: text.to_string(),
        reason,
    }
}

// ============================================================================
// Internal Parsers
// ============================================================================

fn fragment(input: &str) -> Res<'_, Expr> {
    let (input, mut items) =
        delimited(multispace0, |i| items1(i, 0), multispace0)(input)?;
    if items.len() == 1 {
        Ok((input, items.remove(0)))
    } else {
        Ok((input, Expr::tuple(items)))
    }
}

fn items1(input: &str, depth: usize) -> Res<'_, Vec<Expr>> {
    separated_list1(comma, |i| item(i, depth))(input)
}

fn items0(input: &str, depth: usize) -> Res<'_, Vec<Expr>> {
    terminated(separated_list0(comma, |i| item(i, depth)), opt(comma))(input)
}

fn comma(input: &str) -> Res<'_, char> {
    delimited(multispace0, char(','), multispace0)(input)
}

fn item(input: &str, depth: usize) -> Res<'_, Expr> {
    let (input, left) = operand(input, depth)?;
    let (input, right) = opt(preceded(
        delimited(multispace0, char('='), multispace0),
        cut(context("value after '='", |i| operand(i, depth))),
    ))(input)?;
    match right {
        Some(right) => Ok((input, Expr::equality(left, right))),
        None => Ok((input, left)),
    }
}

fn operand(input: &str, depth: usize) -> Res<'_, Expr> {
    if depth >= MAX_DEPTH {
        return Err(nom::Err::Failure(VerboseError::add_context(
            input,
            "nesting too deep",
            VerboseError::from_error_kind(input, ErrorKind::TooLarge),
        )));
    }
    alt((
        // Order matters: calls before bare names, literals before names
        |i| paren_tuple(i, depth + 1),
        |i| function_call(i, depth + 1),
        map(literal, |literal| Expr::Literal { literal }),
        map(alt((dotted_name, quoted_name)), Expr::column),
    ))(input)
}

fn paren_tuple(input: &str, depth: usize) -> Res<'_, Expr> {
    let (input, items) = delimited(
        pair(char('('), multispace0),
        |i| items0(i, depth),
        cut(context("closing parenthesis", preceded(multispace0, char(')')))),
    )(input)?;
    Ok((input, Expr::tuple(items)))
}

fn function_call(input: &str, depth: usize) -> Res<'_, Expr> {
    let (input, name) = terminated(identifier, multispace0)(input)?;
    let (input, args) = delimited(
        pair(char('('), multispace0),
        |i| items0(i, depth),
        cut(context("closing parenthesis", preceded(multispace0, char(')')))),
    )(input)?;
    Ok((input, Expr::function(name, args)))
}

fn literal(input: &str) -> Res<'_, Literal> {
    alt((
        map(single_quoted, Literal::String),
        map(number, Literal::number),
        map(boolean, Literal::Boolean),
    ))(input)
}

/// `'it''s'` -> `it's`
fn single_quoted(input: &str) -> Res<'_, String> {
    let (mut rest, _) = char('\'')(input)?;
    let mut out = String::new();
    loop {
        let Some(pos) = rest.find('\'') else {
            return Err(nom::Err::Failure(VerboseError::add_context(
                rest,
                "closing quote",
                VerboseError::from_error_kind(rest, ErrorKind::Char),
            )));
        };
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 1..];
        match rest.strip_prefix('\'') {
            Some(after) => {
                out.push('\'');
                rest = after;
            }
            None => return Ok((rest, out)),
        }
    }
}

fn number(input: &str) -> Res<'_, &str> {
    terminated(
        recognize(tuple((
            opt(char('-')),
            digit1,
            opt(pair(char('.'), digit1)),
        ))),
        not(peek(word_char)),
    )(input)
}

fn boolean(input: &str) -> Res<'_, bool> {
    terminated(
        alt((
            map(tag_no_case("true"), |_| true),
            map(tag_no_case("false"), |_| false),
        )),
        not(peek(word_char)),
    )(input)
}

fn word_char(input: &str) -> Res<'_, char> {
    satisfy(|c| c.is_alphanumeric() || c == '_')(input)
}

/// Unicode letters, digits and `_`, not starting with a digit
fn identifier(input: &str) -> Res<'_, &str> {
    recognize(pair(
        satisfy(|c| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)
}

fn dotted_name(input: &str) -> Res<'_, String> {
    map(
        recognize(pair(identifier, many0(pair(char('.'), identifier)))),
        str::to_string,
    )(input)
}

fn quoted_name(input: &str) -> Res<'_, String> {
    map(
        alt((
            delimited(char('"'), take_while1(|c| c != '"'), char('"')),
            delimited(char('`'), take_while1(|c| c != '`'), char('`')),
        )),
        str::to_string,
    )(input)
}

// ============================================================================
// Tests
// ============================================================================
