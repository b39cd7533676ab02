//! Module: filter::predicate
//! Responsibility: per-kind match primitives over already-extracted
//! payloads. Negation is not applied here; callers invert last.
//! Does not own: value extraction or absent-value policy.

use crate::filter::{DurationCondition, NumberCondition, StringCondition, StringFilter, TimeCondition};
use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use std::borrow::Cow;

/// Case folding used by every case-insensitive string operation.
/// ASCII stays on the fast path; everything else takes the full Unicode
/// lowercase.
fn fold_case(s: &str) -> Cow<'_, str> {
    if s.is_ascii() {
        Cow::Owned(s.to_ascii_lowercase())
    } else {
        Cow::Owned(s.to_lowercase())
    }
}

impl StringFilter {
    /// Apply the condition to one string payload. Only the regex arm can
    /// fail, on a pattern that does not compile.
    pub(crate) fn matches(&self, value: &str) -> Result<bool, regex::Error> {
        fn fold(case_insensitive: bool, s: &str) -> Cow<'_, str> {
            if case_insensitive {
                fold_case(s)
            } else {
                Cow::Borrowed(s)
            }
        }
        let ci = self.case_insensitive;

        let matched = match &self.condition {
            StringCondition::Equals(lit) => fold(ci, lit) == fold(ci, value),
            StringCondition::Regex(pattern) => Regex::new(pattern)?.is_match(value),
            StringCondition::HasPrefix(lit) => fold(ci, value).starts_with(fold(ci, lit).as_ref()),
            StringCondition::HasSuffix(lit) => fold(ci, value).ends_with(fold(ci, lit).as_ref()),
            StringCondition::In(values) => values.iter().any(|lit| fold(ci, lit) == fold(ci, value)),
            StringCondition::Inf(lit) => fold(ci, value) < fold(ci, lit),
            StringCondition::Sup(lit) => fold(ci, value) > fold(ci, lit),
        };

        Ok(matched)
    }
}

impl NumberCondition {
    /// Exact f64 comparison; NaN never equals NaN.
    #[expect(clippy::float_cmp)]
    #[must_use]
    pub(crate) fn matches(&self, value: f64) -> bool {
        match self {
            Self::Equals(n) => value == *n,
            Self::Inf(n) => value < *n,
            Self::Sup(n) => value > *n,
            Self::In(values) => values.iter().any(|n| value == *n),
        }
    }
}

impl TimeCondition {
    /// Instants compare in UTC at nanosecond precision.
    #[must_use]
    pub(crate) fn matches(&self, value: DateTime<Utc>) -> bool {
        match self {
            Self::Equals(t) => value == *t,
            Self::Before(t) => value < *t,
            Self::After(t) => value > *t,
        }
    }
}

impl DurationCondition {
    #[must_use]
    pub(crate) fn matches(&self, value: TimeDelta) -> bool {
        match self {
            Self::Equals(d) => value == *d,
            Self::Inf(d) => value < *d,
            Self::Sup(d) => value > *d,
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterKind, string_iequals, string_regex};

    fn string_filter(filter: crate::filter::Filter) -> StringFilter {
        match filter.kind {
            FilterKind::String(sf) => sf,
            _ => panic!("expected string filter"),
        }
    }

    #[test]
    fn iequals_matches_across_case() {
        let sf = string_filter(string_iequals("Foo"));
        for candidate in ["foo", "FOO", "Foo", "fOo"] {
            assert!(sf.matches(candidate).expect("no regex"), "candidate {candidate}");
        }
        assert!(!sf.matches("bar").expect("no regex"));
    }

    #[test]
    fn iequals_folds_unicode() {
        let sf = string_filter(string_iequals("STRASSE"));
        assert!(sf.matches("strasse").expect("no regex"));
        let sf = string_filter(string_iequals("ÉTÉ"));
        assert!(sf.matches("été").expect("no regex"));
    }

    #[test]
    fn regex_matches_any_substring() {
        let sf = string_filter(string_regex("o.k"));
        assert!(sf.matches("look").expect("compiles"));
        assert!(!sf.matches("nope").expect("compiles"));
    }

    #[test]
    fn bad_regex_reports_compile_error() {
        let sf = string_filter(string_regex("([unclosed"));
        assert!(sf.matches("anything").is_err());
    }

    #[test]
    fn prefix_suffix_respect_case_mode() {
        let sf = StringFilter {
            condition: StringCondition::HasPrefix("Jo".to_string()),
            case_insensitive: false,
        };
        assert!(sf.matches("John").expect("no regex"));
        assert!(!sf.matches("john").expect("no regex"));

        let sf = StringFilter {
            condition: StringCondition::HasSuffix("HN".to_string()),
            case_insensitive: true,
        };
        assert!(sf.matches("John").expect("no regex"));
    }

    #[test]
    fn string_ordering_is_lexicographic() {
        let inf = StringFilter {
            condition: StringCondition::Inf("m".to_string()),
            case_insensitive: false,
        };
        assert!(inf.matches("apple").expect("no regex"));
        assert!(!inf.matches("zebra").expect("no regex"));
    }

    #[test]
    fn number_nan_never_equals() {
        assert!(!NumberCondition::Equals(f64::NAN).matches(f64::NAN));
        assert!(NumberCondition::Equals(42.0).matches(42.0));
        assert!(NumberCondition::In(vec![1.0, 2.0]).matches(2.0));
        assert!(!NumberCondition::In(vec![]).matches(2.0));
    }

    #[test]
    fn time_comparisons_are_strict() {
        let t = DateTime::from_timestamp(1_000, 0).expect("valid instant");
        assert!(TimeCondition::Equals(t).matches(t));
        assert!(!TimeCondition::Before(t).matches(t));
        assert!(TimeCondition::Before(t).matches(t - TimeDelta::nanoseconds(1)));
        assert!(TimeCondition::After(t).matches(t + TimeDelta::nanoseconds(1)));
    }

    #[test]
    fn duration_comparisons_are_signed() {
        let d = TimeDelta::seconds(5);
        assert!(DurationCondition::Equals(d).matches(d));
        assert!(DurationCondition::Inf(d).matches(TimeDelta::seconds(-6)));
        assert!(DurationCondition::Sup(TimeDelta::seconds(-6)).matches(d));
    }
}
