//! Module: filter
//! Responsibility: the per-field filter algebra (tagged union + negation)
//! and its construction helpers.
//! Does not own: expression trees, textual form, or evaluation walks.

mod predicate;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

///
/// Filter
///
/// A single-field predicate. `not` is applied last and inverts whatever
/// the inner condition decides; two negations cancel.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub kind: FilterKind,
    pub not: bool,
}

impl Filter {
    #[must_use]
    pub const fn new(kind: FilterKind) -> Self {
        Self { kind, not: false }
    }

    #[must_use]
    pub const fn negated(kind: FilterKind) -> Self {
        Self { kind, not: true }
    }

    /// Flip the negation flag.
    #[must_use]
    pub fn negate(mut self) -> Self {
        self.not = !self.not;
        self
    }
}

///
/// FilterKind
///
/// The closed union of per-kind conditions. Dispatch over this tag is
/// exhaustive everywhere it happens.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FilterKind {
    String(StringFilter),
    Number(NumberCondition),
    Bool { equals: bool },
    Null,
    Time(TimeCondition),
    Duration(DurationCondition),
}

///
/// StringFilter
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StringFilter {
    pub condition: StringCondition,
    pub case_insensitive: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StringCondition {
    Equals(String),
    Regex(String),
    HasPrefix(String),
    HasSuffix(String),
    In(Vec<String>),
    Inf(String),
    Sup(String),
}

///
/// NumberCondition
///
/// Numbers compare in f64 after widening; equality is exact and NaN never
/// equals NaN.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NumberCondition {
    Equals(f64),
    Inf(f64),
    Sup(f64),
    In(Vec<f64>),
}

///
/// TimeCondition
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TimeCondition {
    Equals(DateTime<Utc>),
    Before(DateTime<Utc>),
    After(DateTime<Utc>),
}

///
/// DurationCondition
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DurationCondition {
    Equals(#[serde(with = "delta_serde")] TimeDelta),
    Inf(#[serde(with = "delta_serde")] TimeDelta),
    Sup(#[serde(with = "delta_serde")] TimeDelta),
}

/// Signed (seconds, subsecond nanos) wire form for `TimeDelta`.
mod delta_serde {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(delta: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        let seconds = delta.num_seconds();
        let nanos = (*delta - TimeDelta::seconds(seconds))
            .num_nanoseconds()
            .unwrap_or(0);
        (seconds, nanos).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let (seconds, nanos) = <(i64, i64)>::deserialize(deserializer)?;
        Ok(TimeDelta::seconds(seconds) + TimeDelta::nanoseconds(nanos))
    }
}

fn string_filter(condition: StringCondition, case_insensitive: bool, not: bool) -> Filter {
    Filter {
        kind: FilterKind::String(StringFilter {
            condition,
            case_insensitive,
        }),
        not,
    }
}

/// Constructs a string equals filter.
#[must_use]
pub fn string_equals(s: impl Into<String>) -> Filter {
    string_filter(StringCondition::Equals(s.into()), false, false)
}

/// Constructs a string not equals filter.
#[must_use]
pub fn string_not_equals(s: impl Into<String>) -> Filter {
    string_filter(StringCondition::Equals(s.into()), false, true)
}

/// Constructs a case insensitive string equals filter.
#[must_use]
pub fn string_iequals(s: impl Into<String>) -> Filter {
    string_filter(StringCondition::Equals(s.into()), true, false)
}

/// Constructs a case insensitive string not equals filter.
#[must_use]
pub fn string_not_iequals(s: impl Into<String>) -> Filter {
    string_filter(StringCondition::Equals(s.into()), true, true)
}

/// Constructs a string match prefix filter.
#[must_use]
pub fn string_has_prefix(s: impl Into<String>) -> Filter {
    string_filter(StringCondition::HasPrefix(s.into()), false, false)
}

/// Constructs a string not match prefix filter.
#[must_use]
pub fn string_not_has_prefix(s: impl Into<String>) -> Filter {
    string_filter(StringCondition::HasPrefix(s.into()), false, true)
}

/// Constructs a case insensitive string match prefix filter.
#[must_use]
pub fn string_ihas_prefix(s: impl Into<String>) -> Filter {
    string_filter(StringCondition::HasPrefix(s.into()), true, false)
}

/// Constructs a case insensitive string not match prefix filter.
#[must_use]
pub fn string_not_ihas_prefix(s: impl Into<String>) -> Filter {
    string_filter(StringCondition::HasPrefix(s.into()), true, true)
}

/// Constructs a string match suffix filter.
#[must_use]
pub fn string_has_suffix(s: impl Into<String>) -> Filter {
    string_filter(StringCondition::HasSuffix(s.into()), false, false)
}

/// Constructs a string not match suffix filter.
#[must_use]
pub fn string_not_has_suffix(s: impl Into<String>) -> Filter {
    string_filter(StringCondition::HasSuffix(s.into()), false, true)
}

/// Constructs a case insensitive string match suffix filter.
#[must_use]
pub fn string_ihas_suffix(s: impl Into<String>) -> Filter {
    string_filter(StringCondition::HasSuffix(s.into()), true, false)
}

/// Constructs a case insensitive string not match suffix filter.
#[must_use]
pub fn string_not_ihas_suffix(s: impl Into<String>) -> Filter {
    string_filter(StringCondition::HasSuffix(s.into()), true, true)
}

/// Constructs a string match regex filter.
#[must_use]
pub fn string_regex(s: impl Into<String>) -> Filter {
    string_filter(StringCondition::Regex(s.into()), false, false)
}

/// Constructs a string not match regex filter.
#[must_use]
pub fn string_not_regex(s: impl Into<String>) -> Filter {
    string_filter(StringCondition::Regex(s.into()), false, true)
}

/// Constructs a case insensitive string match regex filter.
#[must_use]
pub fn string_iregex(s: impl Into<String>) -> Filter {
    string_filter(StringCondition::Regex(s.into()), true, false)
}

/// Constructs a string in slice filter.
#[must_use]
pub fn string_in<I, S>(values: I) -> Filter
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    string_filter(
        StringCondition::In(values.into_iter().map(Into::into).collect()),
        false,
        false,
    )
}

/// Constructs a string not in slice filter.
#[must_use]
pub fn string_not_in<I, S>(values: I) -> Filter
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    string_filter(
        StringCondition::In(values.into_iter().map(Into::into).collect()),
        false,
        true,
    )
}

/// Constructs a string inferior filter.
#[must_use]
pub fn string_inf(s: impl Into<String>) -> Filter {
    string_filter(StringCondition::Inf(s.into()), false, false)
}

/// Constructs a string superior filter.
#[must_use]
pub fn string_sup(s: impl Into<String>) -> Filter {
    string_filter(StringCondition::Sup(s.into()), false, false)
}

/// Constructs a case insensitive string inferior filter.
#[must_use]
pub fn string_iinf(s: impl Into<String>) -> Filter {
    string_filter(StringCondition::Inf(s.into()), true, false)
}

/// Constructs a case insensitive string superior filter.
#[must_use]
pub fn string_isup(s: impl Into<String>) -> Filter {
    string_filter(StringCondition::Sup(s.into()), true, false)
}

/// Constructs a number equals filter.
#[must_use]
pub const fn number_equals(n: f64) -> Filter {
    Filter::new(FilterKind::Number(NumberCondition::Equals(n)))
}

/// Constructs a number not equals filter.
#[must_use]
pub const fn number_not_equals(n: f64) -> Filter {
    Filter::negated(FilterKind::Number(NumberCondition::Equals(n)))
}

/// Constructs a number inferior filter.
#[must_use]
pub const fn number_inf(n: f64) -> Filter {
    Filter::new(FilterKind::Number(NumberCondition::Inf(n)))
}

/// Constructs a number superior filter.
#[must_use]
pub const fn number_sup(n: f64) -> Filter {
    Filter::new(FilterKind::Number(NumberCondition::Sup(n)))
}

/// Constructs a number in slice filter.
#[must_use]
pub fn number_in(values: impl IntoIterator<Item = f64>) -> Filter {
    Filter::new(FilterKind::Number(NumberCondition::In(
        values.into_iter().collect(),
    )))
}

/// Constructs a number not in slice filter.
#[must_use]
pub fn number_not_in(values: impl IntoIterator<Item = f64>) -> Filter {
    Filter::negated(FilterKind::Number(NumberCondition::In(
        values.into_iter().collect(),
    )))
}

/// Constructs a bool is true filter.
#[must_use]
pub const fn is_true() -> Filter {
    Filter::new(FilterKind::Bool { equals: true })
}

/// Constructs a bool is false filter.
#[must_use]
pub const fn is_false() -> Filter {
    Filter::new(FilterKind::Bool { equals: false })
}

/// Constructs a null check filter.
#[must_use]
pub const fn null() -> Filter {
    Filter::new(FilterKind::Null)
}

/// Constructs a not null check filter.
#[must_use]
pub const fn not_null() -> Filter {
    Filter::negated(FilterKind::Null)
}

/// Constructs a duration equals filter.
#[must_use]
pub const fn duration_equals(d: TimeDelta) -> Filter {
    Filter::new(FilterKind::Duration(DurationCondition::Equals(d)))
}

/// Constructs a duration not equals filter.
#[must_use]
pub const fn duration_not_equals(d: TimeDelta) -> Filter {
    Filter::negated(FilterKind::Duration(DurationCondition::Equals(d)))
}

/// Constructs a duration inferior filter.
#[must_use]
pub const fn duration_inf(d: TimeDelta) -> Filter {
    Filter::new(FilterKind::Duration(DurationCondition::Inf(d)))
}

/// Constructs a duration superior filter.
#[must_use]
pub const fn duration_sup(d: TimeDelta) -> Filter {
    Filter::new(FilterKind::Duration(DurationCondition::Sup(d)))
}

/// Constructs a time equals filter.
#[must_use]
pub const fn time_equals(t: DateTime<Utc>) -> Filter {
    Filter::new(FilterKind::Time(TimeCondition::Equals(t)))
}

/// Constructs a time not equals filter.
#[must_use]
pub const fn time_not_equals(t: DateTime<Utc>) -> Filter {
    Filter::negated(FilterKind::Time(TimeCondition::Equals(t)))
}

/// Constructs a time before filter.
#[must_use]
pub const fn time_before(t: DateTime<Utc>) -> Filter {
    Filter::new(FilterKind::Time(TimeCondition::Before(t)))
}

/// Constructs a time after filter.
#[must_use]
pub const fn time_after(t: DateTime<Utc>) -> Filter {
    Filter::new(FilterKind::Time(TimeCondition::After(t)))
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negate_flips_and_cancels() {
        let f = string_equals("x");
        assert!(!f.not);
        let f = f.negate();
        assert!(f.not);
        let f = f.negate();
        assert_eq!(f, string_equals("x"));
    }

    #[test]
    fn constructors_set_flags() {
        assert_eq!(
            string_not_iequals("A"),
            Filter {
                kind: FilterKind::String(StringFilter {
                    condition: StringCondition::Equals("A".to_string()),
                    case_insensitive: true,
                }),
                not: true,
            }
        );
        assert_eq!(not_null(), null().negate());
    }

    #[test]
    fn duration_wire_form_round_trips() {
        let filter = duration_equals(TimeDelta::milliseconds(1500));
        let json = serde_json::to_string(&filter).expect("serializes");
        let back: Filter = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(filter, back);
    }
}
