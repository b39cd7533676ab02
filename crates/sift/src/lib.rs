//! Sift: typed filter expressions over schema-described records, a
//! reflective matcher, and an in-memory inverted index with pluggable
//! posting sets.
//!
//! A filter is built fluently or parsed from its textual form, then
//! evaluated either per record through [`matcher::Matcher`] or over a
//! population through [`index::Index`]. The two agree: everything the
//! index returns as an unambiguous key matches, and collision candidates
//! are re-verified with the matcher.

pub mod cancel;
pub mod expr;
pub mod filter;
pub mod index;
pub mod matcher;
pub mod record;
pub mod reflect;
pub mod schema;
pub mod text;

///
/// Prelude
///
/// Domain vocabulary only; stores, providers, and error types stay one
/// module level down.
///

pub mod prelude {
    pub use crate::{
        cancel::CancelToken,
        expr::{Expression, FieldFilter, FieldsFilter, where_},
        filter::Filter,
        index::{FindResult, Index},
        matcher::Matcher,
        record::{Record, Value},
        schema::SchemaRegistry,
        text::{parse_expression, parse_field_filter, parse_filter},
    };
}
