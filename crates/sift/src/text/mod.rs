//! Module: text
//! Responsibility: the canonical textual form — pretty-printing and the
//! tokenizer/recursive-descent parser — plus the literal conventions they
//! share (RFC3339 instants, short-form durations, base-10 floats).
//! Does not own: expression semantics or evaluation.

mod format;
mod parse;

pub use parse::{ParseError, parse_expression, parse_field_filter, parse_filter};

use chrono::TimeDelta;

/// Parse one short-form duration word (`300ms`, `5s`, `1h30m`), with an
/// optional leading sign. Bare numbers are rejected so they classify as
/// floats instead.
pub(crate) fn parse_duration_literal(word: &str) -> Option<TimeDelta> {
    let (negative, rest) = match word.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, word),
    };
    let parsed = humantime::parse_duration(rest).ok()?;
    let delta = TimeDelta::from_std(parsed).ok()?;
    Some(if negative { -delta } else { delta })
}

/// Format a duration as a single token: the short form with inter-unit
/// spaces removed, so the result always tokenizes as one word.
pub(crate) fn format_duration_literal(delta: TimeDelta) -> String {
    let (sign, magnitude) = if delta < TimeDelta::zero() {
        ("-", -delta)
    } else {
        ("", delta)
    };
    let std = magnitude.to_std().unwrap_or_default();
    let body: String = humantime::format_duration(std)
        .to_string()
        .split_whitespace()
        .collect();
    format!("{sign}{body}")
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_literals_round_trip() {
        for delta in [
            TimeDelta::zero(),
            TimeDelta::milliseconds(300),
            TimeDelta::seconds(5),
            TimeDelta::seconds(5400),
            TimeDelta::seconds(-90),
            TimeDelta::nanoseconds(123_456_789),
        ] {
            let text = format_duration_literal(delta);
            assert!(
                !text.contains(char::is_whitespace),
                "'{text}' must be one token"
            );
            assert_eq!(parse_duration_literal(&text), Some(delta), "from '{text}'");
        }
    }

    #[test]
    fn bare_numbers_are_not_durations() {
        assert_eq!(parse_duration_literal("42"), None);
        assert_eq!(parse_duration_literal("-1.5"), None);
    }

    #[test]
    fn signed_duration_literals_parse() {
        assert_eq!(
            parse_duration_literal("-5s"),
            Some(TimeDelta::seconds(-5)),
        );
        assert_eq!(
            parse_duration_literal("1h30m"),
            Some(TimeDelta::seconds(5400)),
        );
    }
}
