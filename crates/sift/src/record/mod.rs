//! Module: record
//! Responsibility: dynamic, schema-validated record instances and their
//! field slots.
//! Does not own: path lookup, predicate dispatch, or posting storage.

mod value;
pub mod wrapper;

pub use value::Value;

use crate::schema::{Cardinality, FieldDescriptor, FieldKind, MessageDescriptor, WellKnown};
use std::{collections::BTreeMap, sync::Arc};
use thiserror::Error as ThisError;

///
/// RecordError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum RecordError {
    #[error("message '{message}' has no field '{field}'")]
    UnknownField { message: String, field: String },

    #[error("field '{field}' expects {expected}, got {got}")]
    KindMismatch {
        field: String,
        expected: String,
        got: &'static str,
    },

    #[error("field '{field}' is {actual}, expected {expected}")]
    CardinalityMismatch {
        field: String,
        actual: &'static str,
        expected: &'static str,
    },
}

///
/// FieldValue
///
/// The slot stored for one set field. Absence is modeled by the slot not
/// existing at all, which is what presence checks observe.
///

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Singular(Value),
    Repeated(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

///
/// Record
///
/// A message instance. Fields are stored sparsely by tag; every mutation
/// validates kind and cardinality against the descriptor, so downstream
/// evaluation can trust the shape of what it reads.
///

#[derive(Clone, Debug)]
pub struct Record {
    descriptor: Arc<MessageDescriptor>,
    fields: BTreeMap<u32, FieldValue>,
}

impl Record {
    #[must_use]
    pub const fn new(descriptor: Arc<MessageDescriptor>) -> Self {
        Self {
            descriptor,
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    /// Set a singular field. Values destined for well-known wrapper fields
    /// may be passed as their payload (or as `Value::Timestamp` /
    /// `Value::Duration`) and are wrapped in place.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self, RecordError> {
        let fd = self.field_descriptor(field)?.clone();
        if fd.cardinality() != Cardinality::Singular {
            return Err(cardinality_mismatch(&fd, "singular"));
        }
        let stored = coerce_singular(&fd, value.into())?;
        self.fields.insert(fd.number(), FieldValue::Singular(stored));
        Ok(self)
    }

    /// Set a repeated field from element values, each validated like a
    /// singular value of the element type.
    pub fn set_repeated(
        &mut self,
        field: &str,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Result<&mut Self, RecordError> {
        let fd = self.field_descriptor(field)?.clone();
        if fd.cardinality() != Cardinality::Repeated {
            return Err(cardinality_mismatch(&fd, "repeated"));
        }
        let elements = values
            .into_iter()
            .map(|v| coerce_singular(&fd, v.into()))
            .collect::<Result<Vec<_>, _>>()?;
        self.fields
            .insert(fd.number(), FieldValue::Repeated(elements));
        Ok(self)
    }

    pub fn set_map(
        &mut self,
        field: &str,
        entries: Vec<(Value, Value)>,
    ) -> Result<&mut Self, RecordError> {
        let fd = self.field_descriptor(field)?.clone();
        if fd.cardinality() != Cardinality::Map {
            return Err(cardinality_mismatch(&fd, "map"));
        }
        self.fields.insert(fd.number(), FieldValue::Map(entries));
        Ok(self)
    }

    /// Unset a field, restoring the not-present state.
    pub fn clear(&mut self, field: &str) -> Result<&mut Self, RecordError> {
        let number = self.field_descriptor(field)?.number();
        self.fields.remove(&number);
        Ok(self)
    }

    #[must_use]
    pub fn get(&self, field: &FieldDescriptor) -> Option<&FieldValue> {
        self.fields.get(&field.number())
    }

    /// Presence in the explicit sense: the slot exists.
    #[must_use]
    pub fn has(&self, field: &FieldDescriptor) -> bool {
        self.fields.contains_key(&field.number())
    }

    pub fn field_descriptor(&self, name: &str) -> Result<&Arc<FieldDescriptor>, RecordError> {
        self.descriptor
            .field(name)
            .ok_or_else(|| RecordError::UnknownField {
                message: self.descriptor.full_name().to_string(),
                field: name.to_string(),
            })
    }

    /// Terminal-value extraction for predicate evaluation: unwraps
    /// well-known wrappers, reads kind defaults for unset no-presence
    /// scalars, and yields `Null` for everything absent.
    #[must_use]
    pub(crate) fn extract(&self, fd: &FieldDescriptor) -> Value {
        match self.fields.get(&fd.number()) {
            Some(FieldValue::Singular(v)) => match (v, fd.well_known()) {
                (Value::Message(m), Some(wk)) => wrapper::unwrap(m, wk),
                _ => v.clone(),
            },
            Some(_) => Value::Null,
            None => {
                if fd.has_presence() {
                    Value::Null
                } else {
                    Value::default_for(fd.kind())
                }
            }
        }
    }

    pub(crate) fn insert_slot(&mut self, number: u32, slot: FieldValue) {
        self.fields.insert(number, slot);
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.full_name() == other.descriptor.full_name() && self.fields == other.fields
    }
}

fn cardinality_mismatch(fd: &FieldDescriptor, expected: &'static str) -> RecordError {
    let actual = match fd.cardinality() {
        Cardinality::Singular => "singular",
        Cardinality::Repeated => "repeated",
        Cardinality::Map => "map",
    };
    RecordError::CardinalityMismatch {
        field: fd.full_name().to_string(),
        actual,
        expected,
    }
}

fn kind_mismatch(fd: &FieldDescriptor, got: &Value) -> RecordError {
    let expected = match fd.kind() {
        FieldKind::Message | FieldKind::Group => fd
            .message_full_name()
            .map_or_else(|| fd.kind().label().to_string(), ToString::to_string),
        kind => kind.label().to_string(),
    };
    RecordError::KindMismatch {
        field: fd.full_name().to_string(),
        expected,
        got: got.type_label(),
    }
}

/// Validate one element value against a field, wrapping well-known
/// payloads into their wrapper message on the way in.
fn coerce_singular(fd: &FieldDescriptor, value: Value) -> Result<Value, RecordError> {
    if !fd.kind().is_message() {
        return if value.matches_kind(fd.kind()) {
            Ok(value)
        } else {
            Err(kind_mismatch(fd, &value))
        };
    }

    // Message/group kinds: accept an instance of the linked message.
    if let Value::Message(m) = &value {
        if Some(m.descriptor().full_name()) == fd.message_full_name() {
            return Ok(value);
        }
        return Err(kind_mismatch(fd, &value));
    }

    // Well-known fields additionally accept their payload form.
    if let Some(wk) = fd.well_known()
        && let Some(message) = fd.message()
    {
        let accepted = match (wk, &value) {
            (WellKnown::Timestamp, Value::Timestamp(_))
            | (WellKnown::Duration, Value::Duration(_)) => true,
            _ => wk.is_wrapper() && value.matches_kind(wk.payload_kind()),
        };
        if accepted {
            return Ok(wrapper::wrap(&message, wk, value));
        }
    }

    Err(kind_mismatch(fd, &value))
}

///
/// TESTS
///
