//! Module: expr::fields
//! Responsibility: kind-typed field facades. Each facade exposes only the
//! predicates legal for its kind, so schema-aware callers get compile-time
//! guidance instead of runtime kind errors.
//! Does not own: filter construction or expression composition.

use crate::{
    expr::FieldFilter,
    filter::{self},
};
use chrono::{DateTime, TimeDelta, Utc};

macro_rules! field_facade {
    ( $(#[$meta:meta])* $name:ident, $ctor:ident ) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name {
            field: String,
        }

        #[must_use]
        pub fn $ctor(field: impl Into<String>) -> $name {
            $name {
                field: field.into(),
            }
        }

        impl $name {
            fn make(&self, filter: filter::Filter) -> FieldFilter {
                FieldFilter::new(self.field.clone(), filter)
            }

            /// Presence check: the field is unset.
            #[must_use]
            pub fn null(&self) -> FieldFilter {
                self.make(filter::null())
            }

            /// Presence check: the field is set.
            #[must_use]
            pub fn not_null(&self) -> FieldFilter {
                self.make(filter::not_null())
            }
        }
    };
}

field_facade!(
    /// Facade over a string-kind (or enum-kind) field.
    StringField,
    string_field
);
field_facade!(
    /// Facade over a numeric or enum field.
    NumberField,
    number_field
);
field_facade!(
    /// Facade over a bool field.
    BoolField,
    bool_field
);
field_facade!(
    /// Facade over a well-known Timestamp field.
    TimeField,
    time_field
);
field_facade!(
    /// Facade over a well-known Duration field.
    DurationField,
    duration_field
);
field_facade!(
    /// Facade carrying only the presence predicates.
    NullField,
    null_field
);

impl StringField {
    #[must_use]
    pub fn equals(&self, s: impl Into<String>) -> FieldFilter {
        self.make(filter::string_equals(s))
    }

    #[must_use]
    pub fn not_equals(&self, s: impl Into<String>) -> FieldFilter {
        self.make(filter::string_not_equals(s))
    }

    #[must_use]
    pub fn iequals(&self, s: impl Into<String>) -> FieldFilter {
        self.make(filter::string_iequals(s))
    }

    #[must_use]
    pub fn not_iequals(&self, s: impl Into<String>) -> FieldFilter {
        self.make(filter::string_not_iequals(s))
    }

    #[must_use]
    pub fn has_prefix(&self, s: impl Into<String>) -> FieldFilter {
        self.make(filter::string_has_prefix(s))
    }

    #[must_use]
    pub fn has_suffix(&self, s: impl Into<String>) -> FieldFilter {
        self.make(filter::string_has_suffix(s))
    }

    #[must_use]
    pub fn regex(&self, s: impl Into<String>) -> FieldFilter {
        self.make(filter::string_regex(s))
    }

    #[must_use]
    pub fn not_regex(&self, s: impl Into<String>) -> FieldFilter {
        self.make(filter::string_not_regex(s))
    }

    #[must_use]
    pub fn in_values<I, S>(&self, values: I) -> FieldFilter
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.make(filter::string_in(values))
    }

    #[must_use]
    pub fn not_in_values<I, S>(&self, values: I) -> FieldFilter
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.make(filter::string_not_in(values))
    }
}

impl NumberField {
    #[must_use]
    pub fn equals(&self, n: f64) -> FieldFilter {
        self.make(filter::number_equals(n))
    }

    #[must_use]
    pub fn not_equals(&self, n: f64) -> FieldFilter {
        self.make(filter::number_not_equals(n))
    }

    #[must_use]
    pub fn inf(&self, n: f64) -> FieldFilter {
        self.make(filter::number_inf(n))
    }

    #[must_use]
    pub fn sup(&self, n: f64) -> FieldFilter {
        self.make(filter::number_sup(n))
    }

    #[must_use]
    pub fn in_values(&self, values: impl IntoIterator<Item = f64>) -> FieldFilter {
        self.make(filter::number_in(values))
    }

    #[must_use]
    pub fn not_in_values(&self, values: impl IntoIterator<Item = f64>) -> FieldFilter {
        self.make(filter::number_not_in(values))
    }
}

impl BoolField {
    #[must_use]
    pub fn is_true(&self) -> FieldFilter {
        self.make(filter::is_true())
    }

    #[must_use]
    pub fn is_false(&self) -> FieldFilter {
        self.make(filter::is_false())
    }
}

impl TimeField {
    #[must_use]
    pub fn equals(&self, t: DateTime<Utc>) -> FieldFilter {
        self.make(filter::time_equals(t))
    }

    #[must_use]
    pub fn not_equals(&self, t: DateTime<Utc>) -> FieldFilter {
        self.make(filter::time_not_equals(t))
    }

    #[must_use]
    pub fn before(&self, t: DateTime<Utc>) -> FieldFilter {
        self.make(filter::time_before(t))
    }

    #[must_use]
    pub fn after(&self, t: DateTime<Utc>) -> FieldFilter {
        self.make(filter::time_after(t))
    }
}

impl DurationField {
    #[must_use]
    pub fn equals(&self, d: TimeDelta) -> FieldFilter {
        self.make(filter::duration_equals(d))
    }

    #[must_use]
    pub fn not_equals(&self, d: TimeDelta) -> FieldFilter {
        self.make(filter::duration_not_equals(d))
    }

    #[must_use]
    pub fn inf(&self, d: TimeDelta) -> FieldFilter {
        self.make(filter::duration_inf(d))
    }

    #[must_use]
    pub fn sup(&self, d: TimeDelta) -> FieldFilter {
        self.make(filter::duration_sup(d))
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{is_true, string_iequals};

    #[test]
    fn facades_build_field_filters() {
        let name = string_field("name");
        assert_eq!(
            name.iequals("john"),
            FieldFilter::new("name", string_iequals("john"))
        );
        let active = bool_field("active");
        assert_eq!(active.is_true(), FieldFilter::new("active", is_true()));
    }

    #[test]
    fn facades_are_reusable() {
        let age = number_field("age");
        let a = age.sup(18.0);
        let b = age.inf(65.0);
        assert_eq!(a.field, b.field);
        assert_ne!(a.filter, b.filter);
    }
}
