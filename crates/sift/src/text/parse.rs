//! Module: text::parse
//! Responsibility: tokenizing and parsing the textual filter form into
//! expressions, field filters, and filters.
//! Does not own: formatting or evaluation.

use crate::{
    expr::{Expression, FieldFilter},
    filter::{
        DurationCondition, Filter, FilterKind, NumberCondition, StringCondition, StringFilter,
        TimeCondition,
    },
    text::parse_duration_literal,
};
use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error as ThisError;

///
/// ParseError
///
/// Syntax failure with the byte position of the offending token.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message} (at position {position})")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Parse an expression from its formatted representation.
/// An empty input returns `None`, mirroring the empty format of no
/// expression at all.
pub fn parse_expression(input: &str) -> Result<Option<Expression>, ParseError> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    let mut parser = Parser::new(input)?;
    let expr = parser.expression()?;
    parser.expect_eof()?;
    Ok(Some(expr))
}

/// Parse a single field filter, e.g. `name eq 'John'`.
pub fn parse_field_filter(input: &str) -> Result<Option<FieldFilter>, ParseError> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    let mut parser = Parser::new(input)?;
    let ff = parser.field_filter()?;
    parser.expect_eof()?;
    Ok(Some(ff))
}

/// Parse a bare filter, e.g. `not in ('a', 'b')`.
pub fn parse_filter(input: &str) -> Result<Option<Filter>, ParseError> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    let mut parser = Parser::new(input)?;
    let filter = parser.filter()?;
    parser.expect_eof()?;
    Ok(Some(filter))
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TokenKind {
    Eof,
    Word,
    Str,
    LParen,
    RParen,
    Comma,
}

impl TokenKind {
    const fn label(self) -> &'static str {
        match self {
            Self::Eof => "end of input",
            Self::Word => "word",
            Self::Str => "string",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::Comma => "','",
        }
    }
}

#[derive(Clone, Debug)]
struct Token {
    kind: TokenKind,
    value: String,
    pos: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '\'' => {
                let start = idx;
                let mut value = String::new();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    match c {
                        '\\' => match chars.next() {
                            Some((_, escaped)) => value.push(escaped),
                            None => {
                                return Err(ParseError::new("unterminated escape", start));
                            }
                        },
                        '\'' => {
                            closed = true;
                            break;
                        }
                        c => value.push(c),
                    }
                }
                if !closed {
                    return Err(ParseError::new("unterminated string literal", start));
                }
                tokens.push(Token {
                    kind: TokenKind::Str,
                    value,
                    pos: start,
                });
            }
            '(' | ')' | ',' => {
                let kind = match c {
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    _ => TokenKind::Comma,
                };
                tokens.push(Token {
                    kind,
                    value: c.to_string(),
                    pos: idx,
                });
            }
            c => {
                let mut value = String::new();
                value.push(c);
                while let Some((_, next)) = chars.peek() {
                    let next = *next;
                    if next.is_whitespace() || matches!(next, '(' | ')' | ',' | '\'') {
                        break;
                    }
                    value.push(next);
                    chars.next();
                }
                tokens.push(Token {
                    kind: TokenKind::Word,
                    value,
                    pos: idx,
                });
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        value: String::new(),
        pos: input.len(),
    });

    Ok(tokens)
}

/// Operators whose `i`-prefixed spelling selects the case-insensitive
/// variant. The words `in`, `is`, and `inf` keep their plain meaning:
/// stripping their leading `i` leaves `n`, `s`, and `nf`, none of which
/// appear here.
const CASE_INSENSITIVE_OPS: [&str; 7] = [
    "eq",
    "has_prefix",
    "has_suffix",
    "matches",
    "in",
    "inf",
    "sup",
];

fn normalize_operator(word: &str) -> (String, bool) {
    let lower = word.to_ascii_lowercase();
    if let Some(base) = lower.strip_prefix('i')
        && CASE_INSENSITIVE_OPS.contains(&base)
    {
        return (base.to_string(), true);
    }
    (lower, false)
}

struct Parser {
    tokens: Vec<Token>,
    idx: usize,
}

impl Parser {
    fn new(input: &str) -> Result<Self, ParseError> {
        Ok(Self {
            tokens: tokenize(input)?,
            idx: 0,
        })
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.idx.min(self.tokens.len() - 1)]
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.idx < self.tokens.len() {
            self.idx += 1;
        }
        token
    }

    fn peek_word(&self, word: &str) -> bool {
        let token = self.peek();
        token.kind == TokenKind::Word && token.value.eq_ignore_ascii_case(word)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let token = self.next();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(ParseError::new(
                format!("expected {}", kind.label()),
                token.pos,
            ))
        }
    }

    fn expect_eof(&mut self) -> Result<(), ParseError> {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            Ok(())
        } else {
            Err(ParseError::new(
                format!("unexpected token '{}'", token.value),
                token.pos,
            ))
        }
    }

    fn expression(&mut self) -> Result<Expression, ParseError> {
        self.or()
    }

    fn or(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.and()?;
        while self.peek_word("or") {
            self.next();
            let right = self.and()?;
            left.or_exprs.push(right);
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.primary()?;
        while self.peek_word("and") {
            self.next();
            let right = self.primary()?;
            left.and_exprs.push(right);
        }
        Ok(left)
    }

    fn primary(&mut self) -> Result<Expression, ParseError> {
        if self.peek().kind == TokenKind::LParen {
            self.next();
            let expr = self.expression()?;
            self.expect(TokenKind::RParen)?;
            return Ok(expr);
        }
        Ok(Expression::new(self.field_filter()?))
    }

    fn field_filter(&mut self) -> Result<FieldFilter, ParseError> {
        let token = self.next();
        if token.kind != TokenKind::Word {
            return Err(ParseError::new("expected field name", token.pos));
        }
        let filter = self.filter()?;
        Ok(FieldFilter::new(token.value, filter))
    }

    fn filter(&mut self) -> Result<Filter, ParseError> {
        // Consecutive `not` tokens cancel pairwise.
        let mut negated = false;
        while self.peek_word("not") {
            negated = !negated;
            self.next();
        }

        let token = self.next();
        if token.kind != TokenKind::Word {
            return Err(ParseError::new("expected filter operator", token.pos));
        }
        if token.value.eq_ignore_ascii_case("is") {
            return self.is_filter(negated);
        }

        let (op, ci) = normalize_operator(&token.value);
        match op.as_str() {
            "eq" => self.eq_filter(ci, negated),
            "has_prefix" => self.string_func(ci, negated, StringCondition::HasPrefix),
            "has_suffix" => self.string_func(ci, negated, StringCondition::HasSuffix),
            "matches" => self.string_func(ci, negated, StringCondition::Regex),
            "in" => self.in_filter(ci, negated),
            "inf" | "sup" => self.order_filter(&op, ci, negated),
            "before" | "after" => self.time_comparison(&op, negated),
            _ => Err(ParseError::new(
                format!("unexpected operator '{}'", token.value),
                token.pos,
            )),
        }
    }

    fn is_filter(&mut self, negated: bool) -> Result<Filter, ParseError> {
        let token = self.next();
        if token.kind != TokenKind::Word {
            return Err(ParseError::new("expected value after 'is'", token.pos));
        }
        let kind = match token.value.to_ascii_lowercase().as_str() {
            "null" => FilterKind::Null,
            "true" => FilterKind::Bool { equals: true },
            "false" => FilterKind::Bool { equals: false },
            _ => {
                return Err(ParseError::new(
                    format!("unexpected value '{}' after 'is'", token.value),
                    token.pos,
                ));
            }
        };
        Ok(Filter { kind, not: negated })
    }

    fn string_func(
        &mut self,
        ci: bool,
        negated: bool,
        condition: fn(String) -> StringCondition,
    ) -> Result<Filter, ParseError> {
        let token = self.next();
        if token.kind != TokenKind::Str {
            return Err(ParseError::new("expected quoted string value", token.pos));
        }
        Ok(Filter {
            kind: FilterKind::String(StringFilter {
                condition: condition(token.value),
                case_insensitive: ci,
            }),
            not: negated,
        })
    }

    fn eq_filter(&mut self, ci: bool, negated: bool) -> Result<Filter, ParseError> {
        let token = self.next();
        let literal = classify_literal(&token)?;
        let kind = match literal {
            Literal::Str(s) => {
                return Ok(Filter {
                    kind: FilterKind::String(StringFilter {
                        condition: StringCondition::Equals(s),
                        case_insensitive: ci,
                    }),
                    not: negated,
                });
            }
            Literal::Time(t) => {
                reject_ci(ci, "time comparisons", &token)?;
                FilterKind::Time(TimeCondition::Equals(t))
            }
            Literal::Duration(d) => {
                reject_ci(ci, "durations", &token)?;
                FilterKind::Duration(DurationCondition::Equals(d))
            }
            Literal::Number(n) => {
                reject_ci(ci, "numbers", &token)?;
                FilterKind::Number(NumberCondition::Equals(n))
            }
        };
        Ok(Filter { kind, not: negated })
    }

    fn order_filter(&mut self, op: &str, ci: bool, negated: bool) -> Result<Filter, ParseError> {
        let inf = op == "inf";
        let token = self.next();
        let literal = classify_literal(&token)?;
        let kind = match literal {
            Literal::Str(s) => FilterKind::String(StringFilter {
                condition: if inf {
                    StringCondition::Inf(s)
                } else {
                    StringCondition::Sup(s)
                },
                case_insensitive: ci,
            }),
            Literal::Duration(d) => {
                reject_ci(ci, "durations", &token)?;
                FilterKind::Duration(if inf {
                    DurationCondition::Inf(d)
                } else {
                    DurationCondition::Sup(d)
                })
            }
            Literal::Number(n) => {
                reject_ci(ci, "numbers", &token)?;
                FilterKind::Number(if inf {
                    NumberCondition::Inf(n)
                } else {
                    NumberCondition::Sup(n)
                })
            }
            Literal::Time(_) => {
                return Err(ParseError::new(
                    format!("unsupported literal for {op}"),
                    token.pos,
                ));
            }
        };
        Ok(Filter { kind, not: negated })
    }

    fn in_filter(&mut self, ci: bool, negated: bool) -> Result<Filter, ParseError> {
        self.expect(TokenKind::LParen)?;
        let peeked = self.peek().clone();
        if peeked.kind == TokenKind::RParen {
            return Err(ParseError::new(
                "expected at least one value in 'in' clause",
                peeked.pos,
            ));
        }

        if peeked.kind == TokenKind::Str {
            let mut values = Vec::new();
            loop {
                let token = self.next();
                if token.kind != TokenKind::Str {
                    return Err(ParseError::new(
                        "expected quoted string value in 'in' clause",
                        token.pos,
                    ));
                }
                values.push(token.value);
                if self.peek().kind != TokenKind::Comma {
                    break;
                }
                self.next();
            }
            self.expect(TokenKind::RParen)?;
            return Ok(Filter {
                kind: FilterKind::String(StringFilter {
                    condition: StringCondition::In(values),
                    case_insensitive: ci,
                }),
                not: negated,
            });
        }

        reject_ci(ci, "numeric 'in'", &peeked)?;
        let mut values = Vec::new();
        loop {
            let token = self.next();
            if token.kind != TokenKind::Word {
                return Err(ParseError::new(
                    "expected number in 'in' clause",
                    token.pos,
                ));
            }
            let value: f64 = token.value.parse().map_err(|_| {
                ParseError::new(format!("invalid number '{}'", token.value), token.pos)
            })?;
            values.push(value);
            if self.peek().kind != TokenKind::Comma {
                break;
            }
            self.next();
        }
        self.expect(TokenKind::RParen)?;
        Ok(Filter {
            kind: FilterKind::Number(NumberCondition::In(values)),
            not: negated,
        })
    }

    fn time_comparison(&mut self, op: &str, negated: bool) -> Result<Filter, ParseError> {
        let token = self.next();
        if token.kind != TokenKind::Word {
            return Err(ParseError::new("expected RFC3339 timestamp", token.pos));
        }
        let instant = parse_rfc3339(&token.value).ok_or_else(|| {
            ParseError::new(
                format!("invalid RFC3339 timestamp '{}'", token.value),
                token.pos,
            )
        })?;
        let condition = if op == "before" {
            TimeCondition::Before(instant)
        } else {
            TimeCondition::After(instant)
        };
        Ok(Filter {
            kind: FilterKind::Time(condition),
            not: negated,
        })
    }
}

enum Literal {
    Str(String),
    Number(f64),
    Duration(TimeDelta),
    Time(DateTime<Utc>),
}

/// Word literals classify by attempting RFC3339, then duration, then
/// float, in that order.
fn classify_literal(token: &Token) -> Result<Literal, ParseError> {
    match token.kind {
        TokenKind::Str => Ok(Literal::Str(token.value.clone())),
        TokenKind::Word => {
            if let Some(t) = parse_rfc3339(&token.value) {
                return Ok(Literal::Time(t));
            }
            if let Some(d) = parse_duration_literal(&token.value) {
                return Ok(Literal::Duration(d));
            }
            if let Ok(n) = token.value.parse::<f64>() {
                return Ok(Literal::Number(n));
            }
            Err(invalid_literal(token))
        }
        _ => Err(invalid_literal(token)),
    }
}

fn invalid_literal(token: &Token) -> ParseError {
    ParseError::new(format!("invalid literal '{}'", token.value), token.pos)
}

fn parse_rfc3339(word: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(word)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn reject_ci(ci: bool, what: &str, token: &Token) -> Result<(), ParseError> {
    if ci {
        return Err(ParseError::new(
            format!("case insensitive modifier is invalid for {what}"),
            token.pos,
        ));
    }
    Ok(())
}

///
/// TESTS
///
