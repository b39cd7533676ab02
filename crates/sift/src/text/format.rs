//! Module: text::format
//! Responsibility: the canonical pretty-printed form. Formatting then
//! parsing a built expression reproduces its structure.
//! Does not own: parsing or literal classification.

use crate::{
    expr::{Expression, FieldFilter},
    filter::{
        DurationCondition, Filter, FilterKind, NumberCondition, StringCondition, StringFilter,
        TimeCondition,
    },
    text::format_duration_literal,
};
use chrono::SecondsFormat;
use std::fmt;

impl Expression {
    /// The canonical textual form; same as `Display`.
    #[must_use]
    pub fn format(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.condition)?;

        // A child is parenthesized exactly when it carries children of the
        // opposite kind; flat chains stay flat.
        for child in &self.and_exprs {
            f.write_str(" and ")?;
            if child.or_exprs.is_empty() {
                write!(f, "{child}")?;
            } else {
                write!(f, "({child})")?;
            }
        }
        for child in &self.or_exprs {
            f.write_str(" or ")?;
            if child.and_exprs.is_empty() {
                write!(f, "{child}")?;
            } else {
                write!(f, "({child})")?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for FieldFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.filter)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.not {
            f.write_str("not ")?;
        }
        match &self.kind {
            FilterKind::String(sf) => write_string_filter(f, sf),
            FilterKind::Number(condition) => write_number_condition(f, condition),
            FilterKind::Bool { equals } => {
                write!(f, "is {}", if *equals { "true" } else { "false" })
            }
            FilterKind::Null => f.write_str("is null"),
            FilterKind::Time(condition) => write_time_condition(f, condition),
            FilterKind::Duration(condition) => write_duration_condition(f, condition),
        }
    }
}

fn write_string_filter(f: &mut fmt::Formatter<'_>, sf: &StringFilter) -> fmt::Result {
    let i = if sf.case_insensitive { "i" } else { "" };
    match &sf.condition {
        StringCondition::Equals(s) => write!(f, "{i}eq {}", quoted(s)),
        StringCondition::Regex(s) => write!(f, "{i}matches {}", quoted(s)),
        StringCondition::HasPrefix(s) => write!(f, "{i}has_prefix {}", quoted(s)),
        StringCondition::HasSuffix(s) => write!(f, "{i}has_suffix {}", quoted(s)),
        StringCondition::Inf(s) => write!(f, "{i}inf {}", quoted(s)),
        StringCondition::Sup(s) => write!(f, "{i}sup {}", quoted(s)),
        StringCondition::In(values) => {
            write!(f, "{i}in (")?;
            for (idx, value) in values.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                f.write_str(&quoted(value))?;
            }
            f.write_str(")")
        }
    }
}

fn write_number_condition(f: &mut fmt::Formatter<'_>, condition: &NumberCondition) -> fmt::Result {
    match condition {
        NumberCondition::Equals(n) => write!(f, "eq {n}"),
        NumberCondition::Inf(n) => write!(f, "inf {n}"),
        NumberCondition::Sup(n) => write!(f, "sup {n}"),
        NumberCondition::In(values) => {
            f.write_str("in (")?;
            for (idx, value) in values.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{value}")?;
            }
            f.write_str(")")
        }
    }
}

fn write_time_condition(f: &mut fmt::Formatter<'_>, condition: &TimeCondition) -> fmt::Result {
    let (op, instant) = match condition {
        TimeCondition::Equals(t) => ("eq", t),
        TimeCondition::Before(t) => ("before", t),
        TimeCondition::After(t) => ("after", t),
    };
    write!(
        f,
        "{op} {}",
        instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    )
}

fn write_duration_condition(
    f: &mut fmt::Formatter<'_>,
    condition: &DurationCondition,
) -> fmt::Result {
    let (op, delta) = match condition {
        DurationCondition::Equals(d) => ("eq", d),
        DurationCondition::Inf(d) => ("inf", d),
        DurationCondition::Sup(d) => ("sup", d),
    };
    write!(f, "{op} {}", format_duration_literal(*delta))
}

/// Single-quote a literal, escaping the two characters the tokenizer
/// treats specially so formatted strings always re-parse to themselves.
fn quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

///
/// TESTS
///
