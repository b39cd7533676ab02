//! Module: record::value
//! Responsibility: the scalar/value union stored in record fields and
//! posting buckets, with kind checks and numeric widening.
//! Does not own: field cardinality (record module) or predicate semantics.

use crate::{record::Record, schema::FieldKind};
use chrono::{DateTime, TimeDelta, Utc};

///
/// Value
///
/// `Null` is the absence marker: extraction yields it for presence-capable
/// fields that are unset, and the index posts it for absent optionals so
/// negated predicates can still hit.
///
/// `Timestamp` and `Duration` never appear inside records (records carry
/// the wrapper messages); they are produced by unwrapping during
/// extraction and stored in posting buckets.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Enum(i32),
    Message(Record),
    Timestamp(DateTime<Utc>),
    Duration(TimeDelta),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        if let Self::String(s) = self {
            Some(s.as_str())
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_message(&self) -> Option<&Record> {
        if let Self::Message(m) = self {
            Some(m)
        } else {
            None
        }
    }

    /// Numeric widening to f64, the domain of number predicates.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::I32(n) => Some(*n as f64),
            Self::I64(n) => Some(*n as f64),
            Self::U32(n) => Some(*n as f64),
            Self::U64(n) => Some(*n as f64),
            Self::F32(n) => Some(*n as f64),
            Self::F64(n) => Some(*n),
            Self::Enum(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Default value read from an unset field without explicit presence.
    #[must_use]
    pub fn default_for(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Bool => Self::Bool(false),
            FieldKind::Int32 => Self::I32(0),
            FieldKind::Int64 => Self::I64(0),
            FieldKind::Uint32 => Self::U32(0),
            FieldKind::Uint64 => Self::U64(0),
            FieldKind::Float => Self::F32(0.0),
            FieldKind::Double => Self::F64(0.0),
            FieldKind::String => Self::String(String::new()),
            FieldKind::Bytes => Self::Bytes(Vec::new()),
            FieldKind::Enum => Self::Enum(0),
            FieldKind::Message | FieldKind::Group => Self::Null,
        }
    }

    /// True when this value is storable under the given scalar kind.
    #[must_use]
    pub const fn matches_kind(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (Self::Bool(_), FieldKind::Bool)
                | (Self::I32(_), FieldKind::Int32)
                | (Self::I64(_), FieldKind::Int64)
                | (Self::U32(_), FieldKind::Uint32)
                | (Self::U64(_), FieldKind::Uint64)
                | (Self::F32(_), FieldKind::Float)
                | (Self::F64(_), FieldKind::Double)
                | (Self::String(_), FieldKind::String)
                | (Self::Bytes(_), FieldKind::Bytes)
                | (Self::Enum(_), FieldKind::Enum)
        )
    }

    /// Short label for error messages.
    #[must_use]
    pub const fn type_label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::I32(_) => "int32",
            Self::I64(_) => "int64",
            Self::U32(_) => "uint32",
            Self::U64(_) => "uint64",
            Self::F32(_) => "float",
            Self::F64(_) => "double",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Enum(_) => "enum",
            Self::Message(_) => "message",
            Self::Timestamp(_) => "timestamp",
            Self::Duration(_) => "duration",
        }
    }
}

macro_rules! impl_value_from {
    ( $( $type:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$type> for Value {
                fn from(v: $type) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_value_from! {
    bool            => Bool,
    i32             => I32,
    i64             => I64,
    u32             => U32,
    u64             => U64,
    f32             => F32,
    f64             => F64,
    &str            => String,
    String          => String,
    Vec<u8>         => Bytes,
    Record          => Message,
    DateTime<Utc>   => Timestamp,
    TimeDelta       => Duration,
}

///
/// TESTS
///
