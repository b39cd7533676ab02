//! Module: reflect::lookup
//! Responsibility: resolving a dotted path against a message descriptor
//! into the ordered chain of field descriptors.
//! Does not own: caching (matcher) or value extraction.

use crate::{
    reflect::MatchError,
    schema::{FieldDescriptor, FieldKind, MessageDescriptor},
};
use std::sync::Arc;

/// Resolve `path` against `descriptor`, walking into sub-messages.
///
/// A segment may descend through a singular message or a list of
/// messages. Maps, scalars, and lists of scalars terminate the walk: a
/// further segment past one of them fails with `UnknownField`, as does
/// any segment that names no field.
pub fn lookup(
    descriptor: &Arc<MessageDescriptor>,
    path: &str,
) -> Result<Vec<Arc<FieldDescriptor>>, MatchError> {
    let unknown = || MatchError::UnknownField {
        message: descriptor.full_name().to_string(),
        path: path.to_string(),
    };

    let mut chain = Vec::new();
    let mut current = Some(descriptor.clone());
    for segment in path.split('.') {
        let md = current.take().ok_or_else(unknown)?;
        let fd = resolve_segment(&md, segment).ok_or_else(unknown)?;

        // Identify the next message to search within; scalars, maps, and
        // lists of scalars have none.
        current = fd.message();
        if (fd.is_list() && !fd.kind().is_message()) || fd.is_map() {
            current = None;
        }
        chain.push(fd);
    }

    Ok(chain)
}

/// Resolve one path segment within a message. The real field name of a
/// group is its lowercased message name, so the group's message name is
/// accepted as an alternative spelling.
fn resolve_segment(md: &MessageDescriptor, segment: &str) -> Option<Arc<FieldDescriptor>> {
    if let Some(fd) = md.field(segment) {
        if fd.kind() == FieldKind::Group
            && !fd.message().is_some_and(|m| m.name() == segment)
        {
            return None;
        }
        return Some(fd.clone());
    }

    let fd = md.field(&segment.to_lowercase())?;
    (fd.kind() == FieldKind::Group && fd.message().is_some_and(|m| m.name() == segment))
        .then(|| fd.clone())
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldKind, SchemaRegistry};

    fn registry() -> SchemaRegistry {
        let mut builder = SchemaRegistry::builder();
        builder
            .message("look.Outer")
            .field("name", 1, FieldKind::String)
            .message_field("inner", 2, "look.Inner")
            .repeated_message("items", 3, "look.Inner")
            .repeated("tags", 4, FieldKind::String)
            .map_field("attrs", 5)
            .group("extras", 6, "look.Extras");
        builder
            .message("look.Inner")
            .field("value", 1, FieldKind::Int64);
        builder
            .message("look.Extras")
            .field("note", 1, FieldKind::String);
        builder.build().expect("schema builds")
    }

    fn outer() -> Arc<MessageDescriptor> {
        registry().message("look.Outer").expect("registered")
    }

    #[test]
    fn resolves_nested_chains_in_order() {
        let chain = lookup(&outer(), "inner.value").expect("resolves");
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].full_name(), "look.Outer.inner");
        assert_eq!(chain[1].full_name(), "look.Inner.value");
    }

    #[test]
    fn descends_through_list_of_messages() {
        let chain = lookup(&outer(), "items.value").expect("resolves");
        assert_eq!(chain.len(), 2);
        assert!(chain[0].is_list());
    }

    #[test]
    fn terminal_scalar_list_is_allowed_but_not_descent() {
        assert_eq!(lookup(&outer(), "tags").expect("resolves").len(), 1);
        assert!(lookup(&outer(), "tags.anything").is_err());
    }

    #[test]
    fn maps_terminate_the_walk() {
        assert_eq!(lookup(&outer(), "attrs").expect("resolves").len(), 1);
        assert!(lookup(&outer(), "attrs.key").is_err());
    }

    #[test]
    fn scalar_descent_is_rejected() {
        let err = lookup(&outer(), "name.anything").expect_err("rejects");
        assert!(matches!(err, MatchError::UnknownField { .. }));
    }

    #[test]
    fn missing_segment_is_unknown_field() {
        let err = lookup(&outer(), "nope").expect_err("rejects");
        let MatchError::UnknownField { message, path } = err else {
            panic!("expected unknown field");
        };
        assert_eq!(message, "look.Outer");
        assert_eq!(path, "nope");
    }

    #[test]
    fn group_accepts_message_name_spelling() {
        // By field name (the lowercased message name).
        let err = lookup(&outer(), "extras.note").expect_err("field-name spelling rejected");
        assert!(matches!(err, MatchError::UnknownField { .. }));
        // By group message name.
        let chain = lookup(&outer(), "Extras.note").expect("resolves");
        assert_eq!(chain[0].kind(), FieldKind::Group);
    }
}
