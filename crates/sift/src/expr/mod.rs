//! Module: expr
//! Responsibility: the boolean expression tree over field filters, plus the
//! flat AND-only shorthand.
//! Does not own: filter payload semantics or textual form.

mod builder;
mod fields;

pub use builder::{Builder, FieldBuilder, where_};
pub use fields::{
    BoolField, DurationField, NullField, NumberField, StringField, TimeField, bool_field,
    duration_field, null_field, number_field, string_field, time_field,
};

use crate::filter::Filter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Joins path segments into a dotted field path, e.g.
/// `field_path(&["message_field", "string_field"])` is
/// `"message_field.string_field"`.
#[must_use]
pub fn field_path(parts: &[&str]) -> String {
    parts.join(".")
}

///
/// FieldFilter
///
/// One dotted field path paired with the filter applied at that path.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub filter: Filter,
}

impl FieldFilter {
    #[must_use]
    pub fn new(field: impl Into<String>, filter: Filter) -> Self {
        Self {
            field: field.into(),
            filter,
        }
    }

    /// Conjoin with another field filter, producing an expression.
    #[must_use]
    pub fn and(self, other: Self) -> Expression {
        Expression {
            condition: self,
            and_exprs: vec![Expression::from(other)],
            or_exprs: Vec::new(),
        }
    }

    /// Disjoin with another field filter, producing an expression.
    #[must_use]
    pub fn or(self, other: Self) -> Expression {
        Expression {
            condition: self,
            and_exprs: Vec::new(),
            or_exprs: vec![Expression::from(other)],
        }
    }
}

///
/// Expression
///
/// A tree, not a graph: attaching a sub-expression moves it, so built
/// trees never share nodes. Evaluation is
/// `(condition AND all(and_exprs)) OR any(or_exprs)`.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub condition: FieldFilter,
    pub and_exprs: Vec<Expression>,
    pub or_exprs: Vec<Expression>,
}

impl Expression {
    #[must_use]
    pub const fn new(condition: FieldFilter) -> Self {
        Self {
            condition,
            and_exprs: Vec::new(),
            or_exprs: Vec::new(),
        }
    }

    /// Append a conjoined sub-expression.
    #[must_use]
    pub fn and(mut self, expr: impl Into<Self>) -> Self {
        self.and_exprs.push(expr.into());
        self
    }

    /// Append a disjoined sub-expression.
    #[must_use]
    pub fn or(mut self, expr: impl Into<Self>) -> Self {
        self.or_exprs.push(expr.into());
        self
    }
}

impl From<FieldFilter> for Expression {
    fn from(condition: FieldFilter) -> Self {
        Self::new(condition)
    }
}

///
/// FieldsFilter
///
/// Flat path → filter map, evaluated as a conjunction. Lossy by design:
/// when several filters target the same path the last one wins, so
/// conjunctions over one path need an `Expression` instead.
///

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldsFilter {
    pub filters: BTreeMap<String, Filter>,
}

impl FieldsFilter {
    #[must_use]
    pub fn new(filters: impl IntoIterator<Item = FieldFilter>) -> Self {
        Self {
            filters: filters
                .into_iter()
                .map(|ff| (ff.field, ff.filter))
                .collect(),
        }
    }
}

impl FromIterator<FieldFilter> for FieldsFilter {
    fn from_iter<I: IntoIterator<Item = FieldFilter>>(iter: I) -> Self {
        Self::new(iter)
    }
}

///
/// TESTS
///
