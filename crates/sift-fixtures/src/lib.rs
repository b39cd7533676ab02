//! Shared test schema for the sift engine: the recursive `test.Test`
//! message with scalar, enum, repeated, wrapper, and optional fields.

use sift::{
    record::Record,
    schema::{EnumDescriptor, FieldKind, MessageDescriptor, SchemaRegistry},
};
use std::sync::{Arc, LazyLock};

/// Full name of the fixture message.
pub const TEST: &str = "test.Test";

/// Field names of `test.Test`, one constant per declared field.
pub mod fields {
    pub const STRING_FIELD: &str = "string_field";
    pub const NUMBER_FIELD: &str = "number_field";
    pub const BOOL_FIELD: &str = "bool_field";
    pub const ENUM_FIELD: &str = "enum_field";
    pub const MESSAGE_FIELD: &str = "message_field";
    pub const REPEATED_STRING_FIELD: &str = "repeated_string_field";
    pub const REPEATED_MESSAGE_FIELD: &str = "repeated_message_field";
    pub const NUMBER_VALUE_FIELD: &str = "number_value_field";
    pub const STRING_VALUE_FIELD: &str = "string_value_field";
    pub const BOOL_VALUE_FIELD: &str = "bool_value_field";
    pub const TIME_VALUE_FIELD: &str = "time_value_field";
    pub const DURATION_VALUE_FIELD: &str = "duration_value_field";
    pub const OPTIONAL_STRING_FIELD: &str = "optional_string_field";
    pub const OPTIONAL_NUMBER_FIELD: &str = "optional_number_field";
    pub const OPTIONAL_BOOL_FIELD: &str = "optional_bool_field";
    pub const OPTIONAL_ENUM_FIELD: &str = "optional_enum_field";
    pub const METADATA_FIELD: &str = "metadata_field";
}

/// `test.Test.Type` enum values.
pub mod type_values {
    pub const NONE: i32 = 0;
    pub const ONE: i32 = 1;
    pub const TWO: i32 = 2;
}

static REGISTRY: LazyLock<SchemaRegistry> = LazyLock::new(|| {
    let type_enum = EnumDescriptor::new(
        "test.Test.Type",
        &[("NONE", 0), ("ONE", 1), ("TWO", 2)],
    );

    let mut builder = SchemaRegistry::builder();
    builder
        .message(TEST)
        .field(fields::STRING_FIELD, 1, FieldKind::String)
        .field(fields::NUMBER_FIELD, 2, FieldKind::Int64)
        .field(fields::BOOL_FIELD, 3, FieldKind::Bool)
        .enumeration(fields::ENUM_FIELD, 4, &type_enum)
        .message_field(fields::MESSAGE_FIELD, 5, TEST)
        .repeated(fields::REPEATED_STRING_FIELD, 6, FieldKind::String)
        .repeated_message(fields::REPEATED_MESSAGE_FIELD, 7, TEST)
        .message_field(fields::NUMBER_VALUE_FIELD, 8, "well_known.Int64Value")
        .message_field(fields::STRING_VALUE_FIELD, 9, "well_known.StringValue")
        .message_field(fields::BOOL_VALUE_FIELD, 10, "well_known.BoolValue")
        .message_field(fields::TIME_VALUE_FIELD, 11, "well_known.Timestamp")
        .message_field(fields::DURATION_VALUE_FIELD, 12, "well_known.Duration")
        .optional(fields::OPTIONAL_STRING_FIELD, 13, FieldKind::String)
        .optional(fields::OPTIONAL_NUMBER_FIELD, 14, FieldKind::Int64)
        .optional(fields::OPTIONAL_BOOL_FIELD, 15, FieldKind::Bool)
        .optional_enumeration(fields::OPTIONAL_ENUM_FIELD, 16, &type_enum)
        .map_field(fields::METADATA_FIELD, 17);

    builder.build().expect("fixture schema builds")
});

/// The shared fixture registry (well-known wrappers included).
#[must_use]
pub fn registry() -> SchemaRegistry {
    REGISTRY.clone()
}

/// Descriptor of `test.Test`.
#[must_use]
pub fn test_descriptor() -> Arc<MessageDescriptor> {
    REGISTRY
        .message(TEST)
        .expect("fixture message is registered")
}

/// A fresh, empty `test.Test` record.
#[must_use]
pub fn test_record() -> Record {
    Record::new(test_descriptor())
}
