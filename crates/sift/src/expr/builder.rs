//! Module: expr::builder
//! Responsibility: the fluent expression builder. `where_` opens a field,
//! a predicate method closes it, and the builder keeps accepting AND/OR
//! siblings or whole sub-expressions.
//! Does not own: filter construction rules (filter module).

use crate::{
    expr::{Expression, FieldFilter},
    filter::{self, Filter},
};
use chrono::{DateTime, TimeDelta, Utc};

/// Open a new expression on the given field path. The returned
/// [`FieldBuilder`] must be completed with a predicate method.
#[must_use]
pub fn where_(field: impl Into<String>) -> FieldBuilder {
    FieldBuilder {
        root: None,
        slot: Slot::Root,
        field: field.into(),
    }
}

#[derive(Clone, Copy, Debug)]
enum Slot {
    Root,
    And,
    Or,
}

///
/// FieldBuilder
///
/// An expression with one field opened and no predicate chosen yet. Every
/// predicate method resolves it into a [`Builder`]. Keeping this a
/// separate type makes "field without filter" unrepresentable.
///

#[derive(Clone, Debug)]
pub struct FieldBuilder {
    root: Option<Expression>,
    slot: Slot,
    field: String,
}

///
/// Builder
///
/// A completed expression that can keep growing. All methods return the
/// root builder so chains read left to right.
///

#[derive(Clone, Debug)]
pub struct Builder {
    root: Expression,
}

impl FieldBuilder {
    fn filter(self, filter: Filter) -> Builder {
        let node = Expression::new(FieldFilter::new(self.field, filter));
        let root = match (self.root, self.slot) {
            (None, _) | (Some(_), Slot::Root) => node,
            (Some(mut root), Slot::And) => {
                root.and_exprs.push(node);
                root
            }
            (Some(mut root), Slot::Or) => {
                root.or_exprs.push(node);
                root
            }
        };

        Builder { root }
    }

    #[must_use]
    pub fn string_equals(self, s: impl Into<String>) -> Builder {
        self.filter(filter::string_equals(s))
    }

    #[must_use]
    pub fn string_not_equals(self, s: impl Into<String>) -> Builder {
        self.filter(filter::string_not_equals(s))
    }

    #[must_use]
    pub fn string_iequals(self, s: impl Into<String>) -> Builder {
        self.filter(filter::string_iequals(s))
    }

    #[must_use]
    pub fn string_not_iequals(self, s: impl Into<String>) -> Builder {
        self.filter(filter::string_not_iequals(s))
    }

    #[must_use]
    pub fn string_has_prefix(self, s: impl Into<String>) -> Builder {
        self.filter(filter::string_has_prefix(s))
    }

    #[must_use]
    pub fn string_not_has_prefix(self, s: impl Into<String>) -> Builder {
        self.filter(filter::string_not_has_prefix(s))
    }

    #[must_use]
    pub fn string_ihas_prefix(self, s: impl Into<String>) -> Builder {
        self.filter(filter::string_ihas_prefix(s))
    }

    #[must_use]
    pub fn string_not_ihas_prefix(self, s: impl Into<String>) -> Builder {
        self.filter(filter::string_not_ihas_prefix(s))
    }

    #[must_use]
    pub fn string_has_suffix(self, s: impl Into<String>) -> Builder {
        self.filter(filter::string_has_suffix(s))
    }

    #[must_use]
    pub fn string_not_has_suffix(self, s: impl Into<String>) -> Builder {
        self.filter(filter::string_not_has_suffix(s))
    }

    #[must_use]
    pub fn string_ihas_suffix(self, s: impl Into<String>) -> Builder {
        self.filter(filter::string_ihas_suffix(s))
    }

    #[must_use]
    pub fn string_not_ihas_suffix(self, s: impl Into<String>) -> Builder {
        self.filter(filter::string_not_ihas_suffix(s))
    }

    #[must_use]
    pub fn string_regex(self, s: impl Into<String>) -> Builder {
        self.filter(filter::string_regex(s))
    }

    #[must_use]
    pub fn string_not_regex(self, s: impl Into<String>) -> Builder {
        self.filter(filter::string_not_regex(s))
    }

    #[must_use]
    pub fn string_in<I, S>(self, values: I) -> Builder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter(filter::string_in(values))
    }

    #[must_use]
    pub fn string_not_in<I, S>(self, values: I) -> Builder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter(filter::string_not_in(values))
    }

    #[must_use]
    pub fn string_inf(self, s: impl Into<String>) -> Builder {
        self.filter(filter::string_inf(s))
    }

    #[must_use]
    pub fn string_sup(self, s: impl Into<String>) -> Builder {
        self.filter(filter::string_sup(s))
    }

    #[must_use]
    pub fn string_iinf(self, s: impl Into<String>) -> Builder {
        self.filter(filter::string_iinf(s))
    }

    #[must_use]
    pub fn string_isup(self, s: impl Into<String>) -> Builder {
        self.filter(filter::string_isup(s))
    }

    #[must_use]
    pub fn number_equals(self, n: f64) -> Builder {
        self.filter(filter::number_equals(n))
    }

    #[must_use]
    pub fn number_not_equals(self, n: f64) -> Builder {
        self.filter(filter::number_not_equals(n))
    }

    #[must_use]
    pub fn number_inf(self, n: f64) -> Builder {
        self.filter(filter::number_inf(n))
    }

    #[must_use]
    pub fn number_sup(self, n: f64) -> Builder {
        self.filter(filter::number_sup(n))
    }

    #[must_use]
    pub fn number_in(self, values: impl IntoIterator<Item = f64>) -> Builder {
        self.filter(filter::number_in(values))
    }

    #[must_use]
    pub fn number_not_in(self, values: impl IntoIterator<Item = f64>) -> Builder {
        self.filter(filter::number_not_in(values))
    }

    #[must_use]
    pub fn is_true(self) -> Builder {
        self.filter(filter::is_true())
    }

    #[must_use]
    pub fn is_false(self) -> Builder {
        self.filter(filter::is_false())
    }

    #[must_use]
    pub fn null(self) -> Builder {
        self.filter(filter::null())
    }

    #[must_use]
    pub fn not_null(self) -> Builder {
        self.filter(filter::not_null())
    }

    #[must_use]
    pub fn duration_equals(self, d: TimeDelta) -> Builder {
        self.filter(filter::duration_equals(d))
    }

    #[must_use]
    pub fn duration_not_equals(self, d: TimeDelta) -> Builder {
        self.filter(filter::duration_not_equals(d))
    }

    #[must_use]
    pub fn duration_inf(self, d: TimeDelta) -> Builder {
        self.filter(filter::duration_inf(d))
    }

    #[must_use]
    pub fn duration_sup(self, d: TimeDelta) -> Builder {
        self.filter(filter::duration_sup(d))
    }

    #[must_use]
    pub fn time_equals(self, t: DateTime<Utc>) -> Builder {
        self.filter(filter::time_equals(t))
    }

    #[must_use]
    pub fn time_not_equals(self, t: DateTime<Utc>) -> Builder {
        self.filter(filter::time_not_equals(t))
    }

    #[must_use]
    pub fn time_before(self, t: DateTime<Utc>) -> Builder {
        self.filter(filter::time_before(t))
    }

    #[must_use]
    pub fn time_after(self, t: DateTime<Utc>) -> Builder {
        self.filter(filter::time_after(t))
    }
}

impl Builder {
    /// Open an AND sibling on the given field.
    #[must_use]
    pub fn and_where(self, field: impl Into<String>) -> FieldBuilder {
        FieldBuilder {
            root: Some(self.root),
            slot: Slot::And,
            field: field.into(),
        }
    }

    /// Open an OR sibling on the given field.
    #[must_use]
    pub fn or_where(self, field: impl Into<String>) -> FieldBuilder {
        FieldBuilder {
            root: Some(self.root),
            slot: Slot::Or,
            field: field.into(),
        }
    }

    /// Attach a fully built sub-expression as an AND child.
    #[must_use]
    pub fn and(mut self, expr: impl Into<Expression>) -> Self {
        self.root.and_exprs.push(expr.into());
        self
    }

    /// Attach a fully built sub-expression as an OR child.
    #[must_use]
    pub fn or(mut self, expr: impl Into<Expression>) -> Self {
        self.root.or_exprs.push(expr.into());
        self
    }

    #[must_use]
    pub fn build(self) -> Expression {
        self.root
    }
}

impl From<Builder> for Expression {
    fn from(builder: Builder) -> Self {
        builder.root
    }
}

///
/// TESTS
///
