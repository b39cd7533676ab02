//! Module: schema::wkt
//! Responsibility: well-known wrapper classification and schema seeding.
//! Does not own: wrapper construction or payload extraction (record module).

use crate::schema::{FieldKind, SchemaBuilder};

///
/// WellKnown
///
/// Messages recognized by full name and unwrapped to their payload during
/// matching and indexing: the two time types plus the nullable scalar
/// wrappers.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WellKnown {
    Timestamp,
    Duration,
    DoubleValue,
    FloatValue,
    Int64Value,
    UInt64Value,
    Int32Value,
    UInt32Value,
    BoolValue,
    StringValue,
    BytesValue,
}

impl WellKnown {
    pub const ALL: [Self; 11] = [
        Self::Timestamp,
        Self::Duration,
        Self::DoubleValue,
        Self::FloatValue,
        Self::Int64Value,
        Self::UInt64Value,
        Self::Int32Value,
        Self::UInt32Value,
        Self::BoolValue,
        Self::StringValue,
        Self::BytesValue,
    ];

    #[must_use]
    pub const fn full_name(self) -> &'static str {
        match self {
            Self::Timestamp => "well_known.Timestamp",
            Self::Duration => "well_known.Duration",
            Self::DoubleValue => "well_known.DoubleValue",
            Self::FloatValue => "well_known.FloatValue",
            Self::Int64Value => "well_known.Int64Value",
            Self::UInt64Value => "well_known.UInt64Value",
            Self::Int32Value => "well_known.Int32Value",
            Self::UInt32Value => "well_known.UInt32Value",
            Self::BoolValue => "well_known.BoolValue",
            Self::StringValue => "well_known.StringValue",
            Self::BytesValue => "well_known.BytesValue",
        }
    }

    #[must_use]
    pub fn from_full_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|wk| wk.full_name() == name)
    }

    /// Scalar wrappers, i.e. everything except the two time types.
    #[must_use]
    pub const fn is_wrapper(self) -> bool {
        !matches!(self, Self::Timestamp | Self::Duration)
    }

    /// Payload kind of a scalar wrapper's single `value` field.
    #[must_use]
    pub(crate) const fn payload_kind(self) -> FieldKind {
        match self {
            Self::DoubleValue => FieldKind::Double,
            Self::FloatValue => FieldKind::Float,
            Self::Int64Value | Self::Timestamp | Self::Duration => FieldKind::Int64,
            Self::UInt64Value => FieldKind::Uint64,
            Self::Int32Value => FieldKind::Int32,
            Self::UInt32Value => FieldKind::Uint32,
            Self::BoolValue => FieldKind::Bool,
            Self::StringValue => FieldKind::String,
            Self::BytesValue => FieldKind::Bytes,
        }
    }
}

/// Seed every well-known schema into a fresh builder.
pub(super) fn register(builder: &mut SchemaBuilder) {
    builder
        .message(WellKnown::Timestamp.full_name())
        .field("seconds", 1, FieldKind::Int64)
        .field("nanos", 2, FieldKind::Int32);
    builder
        .message(WellKnown::Duration.full_name())
        .field("seconds", 1, FieldKind::Int64)
        .field("nanos", 2, FieldKind::Int32);

    for wk in WellKnown::ALL {
        if wk.is_wrapper() {
            builder
                .message(wk.full_name())
                .field("value", 1, wk.payload_kind());
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_round_trips_full_names() {
        for wk in WellKnown::ALL {
            assert_eq!(WellKnown::from_full_name(wk.full_name()), Some(wk));
        }
        assert_eq!(WellKnown::from_full_name("well_known.Other"), None);
    }

    #[test]
    fn time_types_are_not_wrappers() {
        assert!(!WellKnown::Timestamp.is_wrapper());
        assert!(!WellKnown::Duration.is_wrapper());
        assert!(WellKnown::StringValue.is_wrapper());
    }
}
