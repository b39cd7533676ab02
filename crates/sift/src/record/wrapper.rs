//! Module: record::wrapper
//! Responsibility: building well-known wrapper messages from payloads and
//! unwrapping them back during extraction.
//! Does not own: wrapper classification (schema::wkt).

use crate::{
    record::{FieldValue, Record, Value},
    schema::{MessageDescriptor, SchemaRegistry, WellKnown},
};
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;

const TAG_SECONDS: u32 = 1;
const TAG_NANOS: u32 = 2;
const TAG_VALUE: u32 = 1;

/// Build a wrapper message value around an already-validated payload.
pub(crate) fn wrap(descriptor: &Arc<MessageDescriptor>, wk: WellKnown, payload: Value) -> Value {
    let mut record = Record::new(descriptor.clone());
    match (wk, payload) {
        (WellKnown::Timestamp, Value::Timestamp(at)) => {
            record.insert_slot(
                TAG_SECONDS,
                FieldValue::Singular(Value::I64(at.timestamp())),
            );
            record.insert_slot(
                TAG_NANOS,
                FieldValue::Singular(Value::I32(at.timestamp_subsec_nanos().cast_signed())),
            );
        }
        (WellKnown::Duration, Value::Duration(delta)) => {
            let seconds = delta.num_seconds();
            let nanos = (delta - TimeDelta::seconds(seconds))
                .num_nanoseconds()
                .unwrap_or(0);
            record.insert_slot(TAG_SECONDS, FieldValue::Singular(Value::I64(seconds)));
            #[expect(clippy::cast_possible_truncation)]
            record.insert_slot(TAG_NANOS, FieldValue::Singular(Value::I32(nanos as i32)));
        }
        (_, payload) => {
            record.insert_slot(TAG_VALUE, FieldValue::Singular(payload));
        }
    }

    Value::Message(record)
}

/// Read the payload back out of a wrapper message. A missing payload field
/// reads as the payload kind's default, mirroring scalar field semantics.
pub(crate) fn unwrap(record: &Record, wk: WellKnown) -> Value {
    match wk {
        WellKnown::Timestamp => {
            let (seconds, nanos) = seconds_nanos(record);
            DateTime::from_timestamp(seconds, nanos.cast_unsigned())
                .map_or(Value::Null, Value::Timestamp)
        }
        WellKnown::Duration => {
            let (seconds, nanos) = seconds_nanos(record);
            Value::Duration(
                TimeDelta::seconds(seconds) + TimeDelta::nanoseconds(i64::from(nanos)),
            )
        }
        wrapper => match record.fields.get(&TAG_VALUE) {
            Some(FieldValue::Singular(v)) => v.clone(),
            _ => Value::default_for(wrapper.payload_kind()),
        },
    }
}

/// Unwrap one repeated-field element when the field is well-known;
/// everything else passes through unchanged.
pub(crate) fn unwrap_element(
    element: &Value,
    fd: &crate::schema::FieldDescriptor,
) -> Value {
    match (element, fd.well_known()) {
        (Value::Message(m), Some(wk)) => unwrap(m, wk),
        _ => element.clone(),
    }
}

fn seconds_nanos(record: &Record) -> (i64, i32) {
    let seconds = match record.fields.get(&TAG_SECONDS) {
        Some(FieldValue::Singular(Value::I64(s))) => *s,
        _ => 0,
    };
    let nanos = match record.fields.get(&TAG_NANOS) {
        Some(FieldValue::Singular(Value::I32(n))) => *n,
        _ => 0,
    };
    (seconds, nanos)
}

/// Standalone constructors for callers assembling records by hand.
#[must_use]
pub fn timestamp(registry: &SchemaRegistry, at: DateTime<Utc>) -> Value {
    wrap(
        registry.well_known(WellKnown::Timestamp),
        WellKnown::Timestamp,
        Value::Timestamp(at),
    )
}

#[must_use]
pub fn duration(registry: &SchemaRegistry, delta: TimeDelta) -> Value {
    wrap(
        registry.well_known(WellKnown::Duration),
        WellKnown::Duration,
        Value::Duration(delta),
    )
}

macro_rules! wrapper_constructor {
    ( $( $(#[$meta:meta])* $fn_name:ident, $wk:ident, $payload:ty => $variant:ident );* $(;)? ) => {
        $(
            $(#[$meta])*
            #[must_use]
            pub fn $fn_name(registry: &SchemaRegistry, value: $payload) -> Value {
                wrap(
                    registry.well_known(WellKnown::$wk),
                    WellKnown::$wk,
                    Value::$variant(value.into()),
                )
            }
        )*
    };
}

wrapper_constructor! {
    double_value, DoubleValue, f64 => F64;
    float_value, FloatValue, f32 => F32;
    int64_value, Int64Value, i64 => I64;
    uint64_value, UInt64Value, u64 => U64;
    int32_value, Int32Value, i32 => I32;
    uint32_value, UInt32Value, u32 => U32;
    bool_value, BoolValue, bool => Bool;
    string_value, StringValue, &str => String;
    bytes_value, BytesValue, Vec<u8> => Bytes;
}

///
/// TESTS
///
