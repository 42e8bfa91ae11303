//! Schema matcher — checks a runtime value against a declared schema
//!
//! # Algorithm
//!
//! Breadth-first over `(schema, value)` pairs with an explicit FIFO queue,
//! so deeply nested values never grow the call stack:
//!
//! 1. **Type check**: the value's runtime type must be the schema's
//!    expected type or a subtype; this always precedes structural checks
//! 2. **Structure**: tuples enqueue their positional pairs, lists and sets
//!    enqueue every element against the representative, dicts enqueue every
//!    key and value against the representative pair, contracts compare
//!    schema pairs
//! 3. **Arity**: tuple arity is checked at every level except the first
//!    pair popped: the outermost tuple is the call-argument list, whose
//!    length the invocation itself enforces
//!
//! The first failure is returned immediately; no partial results.

use std::collections::VecDeque;

use tracing::debug;

use crate::error::ContractViolation;
use crate::schema::Schema;
use crate::value::Value;
use crate::{Error, Result};

/// A pending unit of work. Borrows from the caller; lives for one
/// `check_value` call.
#[derive(Debug)]
enum WorkItem<'a> {
    /// Match `value` against `schema`
    Check(&'a Schema, &'a Value),
    /// A dict entry; expands into its key check then its value check
    Entry {
        key_schema: &'a Schema,
        value_schema: &'a Schema,
        key: &'a Value,
        value: &'a Value,
    },
}

// ── Public API ────────────────────────────────────────────

/// Check that `value` conforms to `schema`.
///
/// With `debug` set, every pair is traced at DEBUG level along with the
/// current arity flag. Tracing never changes the outcome.
///
/// # Errors
/// Returns `Violation` (`TypeMismatch`, `ArityMismatch` or
/// `ValueMismatch`) for the first mismatch found.
pub fn check_value(schema: &Schema, value: &Value, debug: bool) -> Result<()> {
    let mut queue = VecDeque::new();
    queue.push_back(WorkItem::Check(schema, value));

    // The outermost pair is exempt from tuple arity checks
    let mut check_arity = false;

    while let Some(item) = queue.pop_front() {
        match item {
            WorkItem::Check(schema, value) => {
                check_pair(schema, value, check_arity, debug, &mut queue)?;
            }
            WorkItem::Entry {
                key_schema,
                value_schema,
                key,
                value,
            } => {
                if debug {
                    debug!(key = %key, value = %value, check_arity, "checking entry");
                }
                queue.push_back(WorkItem::Check(key_schema, key));
                queue.push_back(WorkItem::Check(value_schema, value));
            }
        }
        check_arity = true;
    }

    Ok(())
}

/// Parse `exemplar` into a schema and check `value` against it.
///
/// # Errors
/// A malformed exemplar fails with `InvalidSchema` whatever `value` is;
/// otherwise as [`check_value`].
pub fn check_exemplar(exemplar: &Value, value: &Value, debug: bool) -> Result<()> {
    let schema = Schema::from_exemplar(exemplar)?;
    check_value(&schema, value, debug)
}

// ── Pair Checking ─────────────────────────────────────────

fn check_pair<'a>(
    schema: &'a Schema,
    value: &'a Value,
    check_arity: bool,
    debug: bool,
    queue: &mut VecDeque<WorkItem<'a>>,
) -> Result<()> {
    if debug {
        debug!(schema = %schema, value = %value, check_arity, "checking");
    }

    let expected = schema.expected_type();
    if !value.runtime_type().is_subtype_of(&expected) {
        if debug {
            debug!(expected = %expected, actual = value.type_name(), "type mismatch");
        }
        return Err(ContractViolation::TypeMismatch {
            expected: expected.name().to_string(),
            actual: value.type_name().to_string(),
        }
        .into());
    }

    if schema.is_terminal() {
        return Ok(());
    }

    match (schema, value) {
        (Schema::Tuple(elements), Value::Tuple(items)) => {
            if check_arity && elements.len() != items.len() {
                return Err(ContractViolation::ArityMismatch {
                    expected: elements.len(),
                    actual: items.len(),
                }
                .into());
            }
            queue.extend(
                elements
                    .iter()
                    .zip(items)
                    .map(|(schema, value)| WorkItem::Check(schema, value)),
            );
        }
        (Schema::Sequence(element), Value::List(items))
        | (Schema::Set(element), Value::Set(items)) => {
            queue.extend(items.iter().map(|item| WorkItem::Check(element, item)));
        }
        (Schema::Mapping(key_schema, value_schema), Value::Map(pairs)) => {
            queue.extend(pairs.iter().map(|(key, value)| WorkItem::Entry {
                key_schema,
                value_schema,
                key,
                value,
            }));
        }
        (Schema::Contract(expected), Value::Contract(actual)) => {
            if **expected != *actual.definition() {
                return Err(ContractViolation::ValueMismatch {
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                }
                .into());
            }
        }
        // The type check admits only the value variant each shape expects
        (schema, value) => {
            return Err(Error::InvalidSchema(format!(
                "unhandled schema/value combination: {} / {}",
                schema,
                value.type_name()
            )));
        }
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────
