//! Module: schema
//! Responsibility: immutable message/field/enum descriptors and the registry
//! that resolves message links (including recursive ones) by full name.
//! Does not own: record storage, path lookup, or predicate semantics.

mod build;
mod wkt;

pub use build::{MessageBuilder, SchemaBuilder};
pub use wkt::WellKnown;

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};
use thiserror::Error as ThisError;

///
/// SchemaError
///
/// Construction-time violations reported by `SchemaBuilder::build`.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SchemaError {
    #[error("duplicate message '{name}'")]
    DuplicateMessage { name: String },

    #[error("duplicate field '{field}' in message '{message}'")]
    DuplicateField { message: String, field: String },

    #[error("duplicate field number {number} in message '{message}'")]
    DuplicateNumber { message: String, number: u32 },

    #[error("field '{field}' in message '{message}' links to unknown message '{target}'")]
    UnknownMessage {
        message: String,
        field: String,
        target: String,
    },
}

///
/// FieldKind
///
/// The closed set of field kinds a schema can describe. `Group` is the
/// legacy inline-message form; its fields are always repeated.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Float,
    Double,
    String,
    Bytes,
    Enum,
    Message,
    Group,
}

impl FieldKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Enum => "enum",
            Self::Message => "message",
            Self::Group => "group",
        }
    }

    /// Kinds that carry a nested message link.
    #[must_use]
    pub const fn is_message(self) -> bool {
        matches!(self, Self::Message | Self::Group)
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

///
/// Cardinality
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Cardinality {
    Singular,
    Repeated,
    Map,
}

///
/// EnumDescriptor
///
/// Name/number pairs for an enum type. Unknown numbers are representable
/// in records; they simply have no name.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EnumDescriptor {
    full_name: String,
    values: Vec<(String, i32)>,
}

impl EnumDescriptor {
    #[must_use]
    pub fn new(full_name: &str, values: &[(&str, i32)]) -> Arc<Self> {
        Arc::new(Self {
            full_name: full_name.to_string(),
            values: values
                .iter()
                .map(|(name, number)| ((*name).to_string(), *number))
                .collect(),
        })
    }

    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Name of the value with the given number, if declared.
    #[must_use]
    pub fn name_of(&self, number: i32) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, n)| *n == number)
            .map(|(name, _)| name.as_str())
    }

    /// Number of the value with the given name, if declared.
    #[must_use]
    pub fn number_of(&self, name: &str) -> Option<i32> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, number)| *number)
    }
}

///
/// FieldDescriptor
///
/// One field of a message: name, tag, kind, cardinality, presence, and an
/// optional message or enum link. Message links are stored by full name and
/// resolved through the owning registry, which is what makes recursive
/// schemas possible without reference cycles.
///

#[derive(Debug)]
pub struct FieldDescriptor {
    name: String,
    number: u32,
    kind: FieldKind,
    cardinality: Cardinality,
    explicit_presence: bool,
    message_full_name: Option<String>,
    enum_descriptor: Option<Arc<EnumDescriptor>>,
    full_name: String,
    registry: Weak<RegistryInner>,
}

impl FieldDescriptor {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full name of the field, `<message full name>.<field name>`.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }

    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    #[must_use]
    pub const fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// True when absence is observable (optional scalars and message kinds).
    #[must_use]
    pub const fn has_presence(&self) -> bool {
        self.explicit_presence || self.kind.is_message()
    }

    /// True for explicitly `optional` fields only.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.explicit_presence
    }

    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self.cardinality, Cardinality::Repeated)
    }

    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self.cardinality, Cardinality::Map)
    }

    /// Resolve the nested message descriptor for message/group kinds.
    ///
    /// Returns `None` for scalar kinds, and also when the owning registry
    /// has been dropped while a record kept this descriptor alive.
    #[must_use]
    pub fn message(&self) -> Option<Arc<MessageDescriptor>> {
        let name = self.message_full_name.as_deref()?;
        let registry = self.registry.upgrade()?;
        registry.messages.get(name).cloned()
    }

    #[must_use]
    pub fn enum_descriptor(&self) -> Option<&Arc<EnumDescriptor>> {
        self.enum_descriptor.as_ref()
    }

    pub(crate) fn message_full_name(&self) -> Option<&str> {
        self.message_full_name.as_deref()
    }

    /// Well-known wrapper classification of the linked message, if any.
    #[must_use]
    pub fn well_known(&self) -> Option<WellKnown> {
        self.message_full_name
            .as_deref()
            .and_then(WellKnown::from_full_name)
    }
}

///
/// MessageDescriptor
///
/// Ordered field list plus by-name lookup for one message type.
///

#[derive(Debug)]
pub struct MessageDescriptor {
    full_name: String,
    fields: Vec<Arc<FieldDescriptor>>,
    by_name: HashMap<String, usize>,
}

impl MessageDescriptor {
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Short name: the last dotted segment of the full name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.full_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.full_name)
    }

    #[must_use]
    pub fn fields(&self) -> &[Arc<FieldDescriptor>] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Arc<FieldDescriptor>> {
        self.by_name.get(name).map(|i| &self.fields[*i])
    }

    #[must_use]
    pub fn field_by_number(&self, number: u32) -> Option<&Arc<FieldDescriptor>> {
        self.fields.iter().find(|f| f.number == number)
    }
}

///
/// SchemaRegistry
///
/// Immutable set of message descriptors built once by `SchemaBuilder`.
/// Cloning is cheap; descriptors hold weak back-references into the
/// registry so message links never form strong cycles.
///

#[derive(Clone, Debug)]
pub struct SchemaRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Debug)]
pub(crate) struct RegistryInner {
    messages: HashMap<String, Arc<MessageDescriptor>>,
    well_known: Vec<Arc<MessageDescriptor>>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    #[must_use]
    pub fn message(&self, full_name: &str) -> Option<Arc<MessageDescriptor>> {
        self.inner.messages.get(full_name).cloned()
    }

    /// Descriptor of a well-known wrapper type. Always present: the builder
    /// seeds every wrapper schema before user messages.
    #[must_use]
    pub fn well_known(&self, wk: WellKnown) -> &Arc<MessageDescriptor> {
        &self.inner.well_known[wk as usize]
    }

    pub(crate) const fn from_inner(inner: Arc<RegistryInner>) -> Self {
        Self { inner }
    }
}

impl RegistryInner {
    pub(crate) fn assemble(
        messages: HashMap<String, Arc<MessageDescriptor>>,
        well_known: Vec<Arc<MessageDescriptor>>,
    ) -> Self {
        Self {
            messages,
            well_known,
        }
    }
}

#[expect(clippy::too_many_arguments)]
pub(crate) fn new_field(
    parent_full_name: &str,
    name: String,
    number: u32,
    kind: FieldKind,
    cardinality: Cardinality,
    explicit_presence: bool,
    message_full_name: Option<String>,
    enum_descriptor: Option<Arc<EnumDescriptor>>,
    registry: Weak<RegistryInner>,
) -> FieldDescriptor {
    let full_name = format!("{parent_full_name}.{name}");
    FieldDescriptor {
        name,
        number,
        kind,
        cardinality,
        explicit_presence,
        message_full_name,
        enum_descriptor,
        full_name,
        registry,
    }
}

pub(crate) fn new_message(
    full_name: String,
    fields: Vec<Arc<FieldDescriptor>>,
) -> MessageDescriptor {
    let by_name = fields
        .iter()
        .enumerate()
        .map(|(i, f)| (f.name.clone(), i))
        .collect();
    MessageDescriptor {
        full_name,
        fields,
        by_name,
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_registry() -> SchemaRegistry {
        let mut builder = SchemaRegistry::builder();
        builder
            .message("sample.Node")
            .field("label", 1, FieldKind::String)
            .message_field("next", 2, "sample.Node")
            .repeated("tags", 3, FieldKind::String);
        builder.build().expect("sample schema builds")
    }

    #[test]
    fn recursive_message_link_resolves() {
        let registry = sample_registry();
        let node = registry.message("sample.Node").expect("registered");
        let next = node.field("next").expect("declared");
        let linked = next.message().expect("link resolves");
        assert_eq!(linked.full_name(), "sample.Node");
    }

    #[test]
    fn field_full_name_includes_parent() {
        let registry = sample_registry();
        let node = registry.message("sample.Node").expect("registered");
        let label = node.field("label").expect("declared");
        assert_eq!(label.full_name(), "sample.Node.label");
    }

    #[test]
    fn unknown_link_is_rejected() {
        let mut builder = SchemaRegistry::builder();
        builder
            .message("sample.Broken")
            .message_field("missing", 1, "sample.Nowhere");
        let err = builder.build().expect_err("link must not resolve");
        assert_eq!(
            err,
            SchemaError::UnknownMessage {
                message: "sample.Broken".to_string(),
                field: "missing".to_string(),
                target: "sample.Nowhere".to_string(),
            }
        );
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let mut builder = SchemaRegistry::builder();
        builder
            .message("sample.Dup")
            .field("a", 1, FieldKind::Bool)
            .field("a", 2, FieldKind::Bool);
        let err = builder.build().expect_err("duplicate field");
        assert!(matches!(err, SchemaError::DuplicateField { .. }));
    }

    #[test]
    fn well_known_wrappers_are_seeded() {
        let registry = sample_registry();
        let ts = registry.well_known(WellKnown::Timestamp);
        assert_eq!(ts.full_name(), WellKnown::Timestamp.full_name());
        assert_eq!(ts.fields().len(), 2);
        let wrapper = registry.well_known(WellKnown::StringValue);
        assert_eq!(wrapper.fields().len(), 1);
        assert_eq!(wrapper.fields()[0].name(), "value");
    }

    #[test]
    fn enum_descriptor_lookups() {
        let e = EnumDescriptor::new("sample.Color", &[("RED", 0), ("BLUE", 2)]);
        assert_eq!(e.name_of(2), Some("BLUE"));
        assert_eq!(e.name_of(7), None);
        assert_eq!(e.number_of("RED"), Some(0));
    }
}
