//! Module: matcher
//! Responsibility: evaluating expressions against one record, with a
//! read-biased cache of path lookups keyed by (schema full name, path).
//! Does not own: predicate dispatch (reflect) or population-wide search
//! (index).

use crate::{
    expr::{Expression, FieldFilter, FieldsFilter},
    filter::{Filter, FilterKind},
    record::{FieldValue, Record, Value, wrapper},
    reflect::{MatchError, lookup, match_value},
    schema::{FieldDescriptor, MessageDescriptor},
};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};

///
/// Matcher
///
/// Safe for concurrent use after construction: evaluation never mutates
/// the record, and the lookup cache is reader/writer protected with rare
/// writes (cache fills only).
///

#[derive(Debug, Default)]
pub struct Matcher {
    cache: RwLock<HashMap<String, Arc<Vec<Arc<FieldDescriptor>>>>>,
}

impl Matcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate an expression: `(condition AND all(and)) OR any(or)`.
    /// The AND fold stops at its first false child and the OR fold at its
    /// first true child; both folds run regardless of the condition, so
    /// evaluation errors in either branch always surface.
    pub fn match_record(&self, record: &Record, expr: &Expression) -> Result<bool, MatchError> {
        let c = self.match_condition(record, &expr.condition)?;

        let mut a = true;
        for child in &expr.and_exprs {
            a = self.match_record(record, child)?;
            if !a {
                break;
            }
        }

        let mut o = false;
        for child in &expr.or_exprs {
            o = self.match_record(record, child)?;
            if o {
                break;
            }
        }

        Ok(c && a || o)
    }

    /// Evaluate field filters as a conjunction.
    pub fn match_fields(&self, record: &Record, filters: &[FieldFilter]) -> Result<bool, MatchError> {
        for ff in filters {
            if !self.match_condition(record, ff)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Evaluate the flat path → filter shorthand as a conjunction.
    pub fn match_fields_filter(
        &self,
        record: &Record,
        filters: &FieldsFilter,
    ) -> Result<bool, MatchError> {
        for (path, filter) in &filters.filters {
            let chain = self.chain(record.descriptor(), path)?;
            if !walk(record, &chain, filter)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Drop every cached path lookup.
    pub fn clear_cache(&self) {
        self.cache.write().clear();
    }

    fn match_condition(&self, record: &Record, ff: &FieldFilter) -> Result<bool, MatchError> {
        let chain = self.chain(record.descriptor(), &ff.field)?;
        walk(record, &chain, &ff.filter)
    }

    fn chain(
        &self,
        descriptor: &Arc<MessageDescriptor>,
        path: &str,
    ) -> Result<Arc<Vec<Arc<FieldDescriptor>>>, MatchError> {
        let key = format!("{}.{path}", descriptor.full_name());
        if let Some(found) = self.cache.read().get(&key) {
            return Ok(found.clone());
        }

        let chain = Arc::new(lookup(descriptor, path)?);
        tracing::trace!(message = descriptor.full_name(), path, "cached path lookup");
        self.cache.write().insert(key, chain.clone());
        Ok(chain)
    }
}

/// Walk one descriptor chain from the record's root.
fn walk(
    record: &Record,
    chain: &[Arc<FieldDescriptor>],
    filter: &Filter,
) -> Result<bool, MatchError> {
    let Some((fd, rest)) = chain.split_first() else {
        return Err(MatchError::EmptyPath);
    };

    if !rest.is_empty() {
        // Lookup only descends through message kinds, so a non-terminal
        // scalar segment cannot reach here.
        if fd.is_list() {
            // Existential descent: the remainder must match for some
            // element.
            let Some(FieldValue::Repeated(elements)) = record.get(fd) else {
                return Ok(false);
            };
            for element in elements {
                if let Value::Message(m) = element
                    && walk(m, rest, filter)?
                {
                    return Ok(true);
                }
            }
            return Ok(false);
        }

        return match record.get(fd) {
            Some(FieldValue::Singular(Value::Message(m))) => walk(m, rest, filter),
            // An unset sub-message reads as empty: the remainder is
            // evaluated against absence.
            _ => {
                let md = fd.message().ok_or_else(|| MatchError::UnknownField {
                    message: fd.full_name().to_string(),
                    path: rest[0].name().to_string(),
                })?;
                walk(&Record::new(md), rest, filter)
            }
        };
    }

    // Terminal segment.
    if matches!(filter.kind, FilterKind::Null) {
        return match_null(record, fd, filter);
    }

    if fd.is_map() {
        return Err(MatchError::UnsupportedKind { kind: "map" });
    }

    if fd.is_list() {
        let elements = match record.get(fd) {
            Some(FieldValue::Repeated(elements)) => elements.as_slice(),
            _ => &[],
        };
        // Negated filters must hold for every element; positive filters
        // for at least one.
        for element in elements {
            let value = wrapper::unwrap_element(element, fd);
            let matched = match_value(&value, fd, filter)?;
            if filter.not && !matched {
                return Ok(false);
            }
            if !filter.not && matched {
                return Ok(true);
            }
        }
        return Ok(filter.not);
    }

    match_value(&record.extract(fd), fd, filter)
}

/// Null filters test presence itself: an unset message, an optional
/// scalar without a value, or a group/list with zero elements.
fn match_null(record: &Record, fd: &FieldDescriptor, filter: &Filter) -> Result<bool, MatchError> {
    if !fd.has_presence() {
        return Err(MatchError::InvalidPredicate {
            filter: "null",
            kind: fd.kind().label().to_string(),
        });
    }

    let present = match record.get(fd) {
        None => false,
        Some(FieldValue::Repeated(elements)) => !elements.is_empty(),
        Some(FieldValue::Map(entries)) => !entries.is_empty(),
        Some(FieldValue::Singular(v)) => !v.is_null(),
    };

    Ok(!present != filter.not)
}
