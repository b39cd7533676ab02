//! Module: schema::build
//! Responsibility: staged construction and validation of a `SchemaRegistry`.
//! Does not own: descriptor semantics or well-known classification.

use crate::schema::{
    Cardinality, EnumDescriptor, FieldKind, RegistryInner, SchemaError, SchemaRegistry, new_field,
    new_message, wkt,
};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

///
/// SchemaBuilder
///
/// Collects message specs, validates them as a set (duplicates, link
/// resolution), then assembles the registry in one pass so recursive and
/// mutually recursive links are legal.
///

pub struct SchemaBuilder {
    messages: Vec<MessageBuilder>,
}

impl SchemaBuilder {
    #[must_use]
    pub(super) fn new() -> Self {
        let mut builder = Self {
            messages: Vec::new(),
        };
        wkt::register(&mut builder);
        builder
    }

    /// Start the spec of a message with the given full name.
    pub fn message(&mut self, full_name: &str) -> &mut MessageBuilder {
        self.messages.push(MessageBuilder {
            full_name: full_name.to_string(),
            fields: Vec::new(),
        });
        let last = self.messages.len() - 1;
        &mut self.messages[last]
    }

    pub fn build(self) -> Result<SchemaRegistry, SchemaError> {
        self.validate()?;

        let specs = self.messages;
        let inner = Arc::new_cyclic(|weak| {
            let mut messages = HashMap::with_capacity(specs.len());
            for spec in &specs {
                let fields = spec
                    .fields
                    .iter()
                    .map(|f| {
                        Arc::new(new_field(
                            &spec.full_name,
                            f.name.clone(),
                            f.number,
                            f.kind,
                            f.cardinality,
                            f.explicit_presence,
                            f.message_full_name.clone(),
                            f.enum_descriptor.clone(),
                            weak.clone(),
                        ))
                    })
                    .collect();
                messages.insert(
                    spec.full_name.clone(),
                    Arc::new(new_message(spec.full_name.clone(), fields)),
                );
            }
            let well_known = wkt::WellKnown::ALL
                .iter()
                .map(|wk| {
                    messages
                        .get(wk.full_name())
                        .cloned()
                        .unwrap_or_else(|| unreachable!("wrapper schemas are always seeded"))
                })
                .collect();
            RegistryInner::assemble(messages, well_known)
        });

        Ok(SchemaRegistry::from_inner(inner))
    }

    fn validate(&self) -> Result<(), SchemaError> {
        let mut names = HashSet::new();
        for spec in &self.messages {
            if !names.insert(spec.full_name.as_str()) {
                return Err(SchemaError::DuplicateMessage {
                    name: spec.full_name.clone(),
                });
            }
        }
        for spec in &self.messages {
            let mut fields = HashSet::new();
            let mut numbers = HashSet::new();
            for f in &spec.fields {
                if !fields.insert(f.name.as_str()) {
                    return Err(SchemaError::DuplicateField {
                        message: spec.full_name.clone(),
                        field: f.name.clone(),
                    });
                }
                if !numbers.insert(f.number) {
                    return Err(SchemaError::DuplicateNumber {
                        message: spec.full_name.clone(),
                        number: f.number,
                    });
                }
                if let Some(target) = &f.message_full_name
                    && !names.contains(target.as_str())
                {
                    return Err(SchemaError::UnknownMessage {
                        message: spec.full_name.clone(),
                        field: f.name.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

///
/// MessageBuilder
///

pub struct MessageBuilder {
    full_name: String,
    fields: Vec<FieldSpec>,
}

struct FieldSpec {
    name: String,
    number: u32,
    kind: FieldKind,
    cardinality: Cardinality,
    explicit_presence: bool,
    message_full_name: Option<String>,
    enum_descriptor: Option<Arc<EnumDescriptor>>,
}

impl MessageBuilder {
    fn push(
        &mut self,
        name: &str,
        number: u32,
        kind: FieldKind,
        cardinality: Cardinality,
        explicit_presence: bool,
        message_full_name: Option<String>,
        enum_descriptor: Option<Arc<EnumDescriptor>>,
    ) -> &mut Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            number,
            kind,
            cardinality,
            explicit_presence,
            message_full_name,
            enum_descriptor,
        });
        self
    }

    /// Singular scalar field without explicit presence.
    pub fn field(&mut self, name: &str, number: u32, kind: FieldKind) -> &mut Self {
        self.push(name, number, kind, Cardinality::Singular, false, None, None)
    }

    /// Singular scalar field with explicit presence (`optional`).
    pub fn optional(&mut self, name: &str, number: u32, kind: FieldKind) -> &mut Self {
        self.push(name, number, kind, Cardinality::Singular, true, None, None)
    }

    pub fn repeated(&mut self, name: &str, number: u32, kind: FieldKind) -> &mut Self {
        self.push(name, number, kind, Cardinality::Repeated, false, None, None)
    }

    pub fn enumeration(
        &mut self,
        name: &str,
        number: u32,
        values: &Arc<EnumDescriptor>,
    ) -> &mut Self {
        self.push(
            name,
            number,
            FieldKind::Enum,
            Cardinality::Singular,
            false,
            None,
            Some(values.clone()),
        )
    }

    pub fn optional_enumeration(
        &mut self,
        name: &str,
        number: u32,
        values: &Arc<EnumDescriptor>,
    ) -> &mut Self {
        self.push(
            name,
            number,
            FieldKind::Enum,
            Cardinality::Singular,
            true,
            None,
            Some(values.clone()),
        )
    }

    pub fn message_field(&mut self, name: &str, number: u32, message: &str) -> &mut Self {
        self.push(
            name,
            number,
            FieldKind::Message,
            Cardinality::Singular,
            false,
            Some(message.to_string()),
            None,
        )
    }

    pub fn repeated_message(&mut self, name: &str, number: u32, message: &str) -> &mut Self {
        self.push(
            name,
            number,
            FieldKind::Message,
            Cardinality::Repeated,
            false,
            Some(message.to_string()),
            None,
        )
    }

    /// Legacy group field. Groups are repeated inline messages; the path
    /// lookup also accepts the group's message name as the segment.
    pub fn group(&mut self, name: &str, number: u32, message: &str) -> &mut Self {
        self.push(
            name,
            number,
            FieldKind::Group,
            Cardinality::Repeated,
            false,
            Some(message.to_string()),
            None,
        )
    }

    /// Map field. Maps are opaque to matching and indexing.
    pub fn map_field(&mut self, name: &str, number: u32) -> &mut Self {
        self.push(
            name,
            number,
            FieldKind::Message,
            Cardinality::Map,
            false,
            None,
            None,
        )
    }
}
