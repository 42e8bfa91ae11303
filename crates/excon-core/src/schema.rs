//! Schema declarations — the exemplar-shaped description of acceptable values
//!
//! A schema is written in the shape of an example value: a type reference,
//! a tuple of schemas, a list/set holding one representative element, a map
//! holding one representative key→value pair, or a nested contract.
//!
//! Exemplars are turned into the tagged [`Schema`] once, at declaration
//! time, so a malformed schema is rejected before any value is checked.
//!
//! # Display
//!
//! The Display form reads back like the exemplar it came from:
//! `str`, `(int, str)`, `[int]`, `{int}`, `{int: str}`, `None`,
//! `contract(str, str)`.

use std::fmt;

use crate::contract::ContractDefinition;
use crate::value::{Class, TypeRef, Value};
use crate::{Error, Result};

/// A declared value shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schema {
    /// Any value whose runtime type is the type or a subtype
    Type(TypeRef),
    /// Any value at all
    Wildcard,
    /// Fixed-arity ordered product
    Tuple(Vec<Schema>),
    /// List whose every element matches the representative
    Sequence(Box<Schema>),
    /// Set whose every element matches the representative
    Set(Box<Schema>),
    /// Dict whose every key and every value match the representative pair
    Mapping(Box<Schema>, Box<Schema>),
    /// A contract value with an equal schema pair
    Contract(Box<ContractDefinition>),
}

impl Schema {
    pub fn of(t: impl Into<TypeRef>) -> Self {
        Schema::Type(t.into())
    }

    pub fn any() -> Self {
        Schema::Wildcard
    }

    /// The `None` exemplar: only the absent value is accepted
    pub fn none() -> Self {
        Schema::Type(TypeRef::NoneType)
    }

    pub fn tuple<I, S>(elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Schema>,
    {
        Schema::Tuple(elements.into_iter().map(Into::into).collect())
    }

    pub fn list(element: impl Into<Schema>) -> Self {
        Schema::Sequence(Box::new(element.into()))
    }

    pub fn set(element: impl Into<Schema>) -> Self {
        Schema::Set(Box::new(element.into()))
    }

    pub fn map(key: impl Into<Schema>, value: impl Into<Schema>) -> Self {
        Schema::Mapping(Box::new(key.into()), Box::new(value.into()))
    }

    pub fn contract(definition: ContractDefinition) -> Self {
        Schema::Contract(Box::new(definition))
    }

    /// The runtime type a value must have before its structure is examined
    pub fn expected_type(&self) -> TypeRef {
        match self {
            Schema::Type(t) => t.clone(),
            Schema::Wildcard => TypeRef::Object,
            Schema::Tuple(_) => TypeRef::Tuple,
            Schema::Sequence(_) => TypeRef::List,
            Schema::Set(_) => TypeRef::Set,
            Schema::Mapping(_, _) => TypeRef::Dict,
            Schema::Contract(_) => TypeRef::Contract,
        }
    }

    /// True when matching stops after the type check
    pub fn is_terminal(&self) -> bool {
        matches!(self, Schema::Type(_) | Schema::Wildcard)
    }

    /// Build a schema from an exemplar value.
    ///
    /// Nested exemplars are walked with an explicit stack, so declaration
    /// depth is bounded by memory rather than the call stack.
    ///
    /// # Errors
    /// Returns `InvalidSchema` when a list or set exemplar does not hold
    /// exactly one element, a map exemplar does not hold exactly one pair,
    /// or the value is not a schema shape at all (a scalar, function,
    /// object or instance).
    pub fn from_exemplar(exemplar: &Value) -> Result<Schema> {
        let mut pending = vec![Step::Visit(exemplar)];
        let mut built: Vec<Schema> = Vec::new();

        while let Some(step) = pending.pop() {
            match step {
                Step::Visit(value) => match value {
                    Value::Type(t) => built.push(Schema::Type(t.clone())),
                    Value::Null => built.push(Schema::none()),
                    Value::Tuple(items) => {
                        pending.push(Step::Tuple(items.len()));
                        pending.extend(items.iter().rev().map(Step::Visit));
                    }
                    Value::List(items) => {
                        pending.push(Step::List);
                        pending.push(Step::Visit(single_element(value, items)?));
                    }
                    Value::Set(items) => {
                        pending.push(Step::Set);
                        pending.push(Step::Visit(single_element(value, items)?));
                    }
                    Value::Map(pairs) => {
                        let [(key, item)] = pairs.as_slice() else {
                            return Err(Error::InvalidSchema(format!(
                                "expected just one key/value pair to be checked: {}",
                                value
                            )));
                        };
                        pending.push(Step::Map);
                        pending.push(Step::Visit(item));
                        pending.push(Step::Visit(key));
                    }
                    Value::Contract(contract) => {
                        built.push(Schema::contract(contract.definition().clone()))
                    }
                    other => {
                        return Err(Error::InvalidSchema(format!(
                            "unrecognized schema shape: {} ({})",
                            other,
                            other.type_name()
                        )))
                    }
                },
                Step::Tuple(len) => {
                    let start = built.len().checked_sub(len).ok_or_else(unbalanced)?;
                    let elements = built.split_off(start);
                    built.push(Schema::Tuple(elements));
                }
                Step::List => {
                    let element = built.pop().ok_or_else(unbalanced)?;
                    built.push(Schema::list(element));
                }
                Step::Set => {
                    let element = built.pop().ok_or_else(unbalanced)?;
                    built.push(Schema::set(element));
                }
                Step::Map => {
                    let value = built.pop().ok_or_else(unbalanced)?;
                    let key = built.pop().ok_or_else(unbalanced)?;
                    built.push(Schema::map(key, value));
                }
            }
        }

        match (built.pop(), built.is_empty()) {
            (Some(schema), true) => Ok(schema),
            _ => Err(unbalanced()),
        }
    }
}

/// Exemplar walk: visit a value, or assemble its already-built children
enum Step<'a> {
    Visit(&'a Value),
    Tuple(usize),
    List,
    Set,
    Map,
}

fn unbalanced() -> Error {
    Error::InvalidSchema("unbalanced exemplar walk".to_string())
}

fn single_element<'a>(exemplar: &Value, items: &'a [Value]) -> Result<&'a Value> {
    match items {
        [element] => Ok(element),
        _ => Err(Error::InvalidSchema(format!(
            "expected just one type to be checked: {}",
            exemplar
        ))),
    }
}

impl From<TypeRef> for Schema {
    fn from(t: TypeRef) -> Self {
        Schema::Type(t)
    }
}

impl From<&Class> for Schema {
    fn from(class: &Class) -> Self {
        Schema::Type(TypeRef::from(class))
    }
}

impl From<ContractDefinition> for Schema {
    fn from(definition: ContractDefinition) -> Self {
        Schema::contract(definition)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Type(TypeRef::NoneType) => write!(f, "None"),
            Schema::Type(t) => write!(f, "{}", t),
            Schema::Wildcard => write!(f, "any"),
            Schema::Tuple(elements) => {
                write!(f, "(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                if elements.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Schema::Sequence(element) => write!(f, "[{}]", element),
            Schema::Set(element) => write!(f, "{{{}}}", element),
            Schema::Mapping(key, value) => write!(f, "{{{}: {}}}", key, value),
            Schema::Contract(definition) => write!(f, "{}", definition),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────
