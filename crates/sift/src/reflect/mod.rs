//! Module: reflect
//! Responsibility: resolving dotted paths to descriptor chains and
//! dispatching a filter against one extracted value. This dispatch is the
//! single predicate surface shared by the matcher and the index.
//! Does not own: record walking (matcher) or posting storage (index).

mod lookup;

pub use lookup::lookup;

use crate::{
    filter::{Filter, FilterKind},
    record::Value,
    schema::{FieldDescriptor, FieldKind, WellKnown},
};
use thiserror::Error as ThisError;

///
/// MatchError
///

#[derive(Debug, ThisError)]
pub enum MatchError {
    #[error("'{message}' does not contain '{path}'")]
    UnknownField { message: String, path: String },

    #[error("cannot use {filter} filter on {kind}")]
    InvalidPredicate { filter: &'static str, kind: String },

    #[error("invalid regex: {0}")]
    BadRegex(#[from] regex::Error),

    #[error("matching against {kind} is not supported")]
    UnsupportedKind { kind: &'static str },

    #[error("field path is empty")]
    EmptyPath,
}

fn invalid(filter: &'static str, fd: &FieldDescriptor) -> MatchError {
    let kind = fd.well_known().map_or_else(
        || fd.kind().label().to_string(),
        |wk| wk.full_name().to_string(),
    );
    MatchError::InvalidPredicate { filter, kind }
}

const fn is_numeric_wrapper(wk: WellKnown) -> bool {
    matches!(
        wk,
        WellKnown::DoubleValue
            | WellKnown::FloatValue
            | WellKnown::Int64Value
            | WellKnown::UInt64Value
            | WellKnown::Int32Value
            | WellKnown::UInt32Value
    )
}

const fn is_numeric_kind(kind: FieldKind) -> bool {
    matches!(
        kind,
        FieldKind::Int32
            | FieldKind::Int64
            | FieldKind::Uint32
            | FieldKind::Uint64
            | FieldKind::Float
            | FieldKind::Double
            | FieldKind::Enum
    )
}

/// Apply a filter to one extracted value.
///
/// `value` is post-extraction: wrappers are already unwrapped and
/// `Value::Null` marks absence. The absent-value rule is uniform — any
/// positive predicate on an absent value is false, so its negation is
/// true. Null filters instead test presence itself. Negation is applied
/// last, after the per-kind primitive.
pub fn match_value(value: &Value, fd: &FieldDescriptor, filter: &Filter) -> Result<bool, MatchError> {
    let matched = match &filter.kind {
        FilterKind::String(sf) => {
            let kind_ok = matches!(fd.kind(), FieldKind::String | FieldKind::Enum)
                || fd.well_known() == Some(WellKnown::StringValue);
            if !kind_ok {
                return Err(invalid("string", fd));
            }
            match value {
                Value::Null => return Ok(filter.not),
                Value::String(s) => sf.matches(s)?,
                Value::Enum(number) => {
                    // An enum value with no declared name matches nothing.
                    let Some(name) = fd.enum_descriptor().and_then(|e| e.name_of(*number))
                    else {
                        return Ok(false);
                    };
                    sf.matches(name)?
                }
                _ => return Err(invalid("string", fd)),
            }
        }

        FilterKind::Number(condition) => {
            let kind_ok = is_numeric_kind(fd.kind())
                || fd.well_known().is_some_and(is_numeric_wrapper);
            if !kind_ok {
                return Err(invalid("number", fd));
            }
            match value {
                Value::Null => return Ok(filter.not),
                value => match value.as_f64() {
                    Some(number) => condition.matches(number),
                    None => return Err(invalid("number", fd)),
                },
            }
        }

        FilterKind::Bool { equals } => {
            let kind_ok = matches!(fd.kind(), FieldKind::Bool)
                || fd.well_known() == Some(WellKnown::BoolValue);
            if !kind_ok {
                return Err(invalid("bool", fd));
            }
            match value {
                Value::Null => return Ok(filter.not),
                Value::Bool(b) => b == equals,
                _ => return Err(invalid("bool", fd)),
            }
        }

        FilterKind::Null => {
            if !fd.has_presence() {
                return Err(invalid("null", fd));
            }
            value.is_null()
        }

        FilterKind::Time(condition) => {
            if fd.well_known() != Some(WellKnown::Timestamp) {
                return Err(invalid("time", fd));
            }
            match value {
                Value::Null => return Ok(filter.not),
                Value::Timestamp(at) => condition.matches(*at),
                _ => return Err(invalid("time", fd)),
            }
        }

        FilterKind::Duration(condition) => {
            if fd.well_known() != Some(WellKnown::Duration) {
                return Err(invalid("duration", fd));
            }
            match value {
                Value::Null => return Ok(filter.not),
                Value::Duration(delta) => condition.matches(*delta),
                _ => return Err(invalid("duration", fd)),
            }
        }
    };

    Ok(matched != filter.not)
}

///
/// TESTS
///
