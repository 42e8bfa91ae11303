//! Runtime value model — the dynamically typed values contracts guard
//!
//! Contracts check values whose shape is only known at runtime, so the
//! crate carries its own small object model:
//!
//! - [`TypeRef`]: a runtime type with a subtype relation
//! - [`Class`]: a user-declared nominal type with single inheritance
//! - [`Function`]: a named callable with an optional declared arity
//! - [`Value`]: the value under test
//!
//! Type names follow the familiar dynamic-language spelling (`str`, `int`,
//! `NoneType`, `list`, ...) because they appear verbatim in violation
//! messages.

use std::fmt;
use std::sync::Arc;

use crate::contract::BoundContract;
use crate::{Error, Result};

// ── Classes ───────────────────────────────────────────────

#[derive(Debug)]
struct ClassDef {
    name: String,
    base: Option<Class>,
}

/// A user-declared nominal type.
///
/// Classes compare by identity: two classes declared with the same name
/// are still distinct types.
#[derive(Clone)]
pub struct Class(Arc<ClassDef>);

impl Class {
    /// Declare a new root class (its only supertype is `object`)
    pub fn new(name: impl Into<String>) -> Self {
        Class(Arc::new(ClassDef {
            name: name.into(),
            base: None,
        }))
    }

    /// Declare a class deriving from `base`
    pub fn subclass(name: impl Into<String>, base: &Class) -> Self {
        Class(Arc::new(ClassDef {
            name: name.into(),
            base: Some(base.clone()),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn base(&self) -> Option<&Class> {
        self.0.base.as_ref()
    }

    /// True if `self` is `other` or derives from it, directly or not
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class == other {
                return true;
            }
            current = class.base();
        }
        false
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Class {}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.name())
    }
}

// ── Type References ───────────────────────────────────────

/// A runtime type reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// Root of the hierarchy; every value is an `object`
    Object,
    NoneType,
    /// `bool` is a subtype of `int`
    Bool,
    Int,
    Float,
    Str,
    Tuple,
    List,
    Set,
    Dict,
    /// The type of type references themselves
    Type,
    Function,
    Contract,
    Class(Class),
}

impl TypeRef {
    /// Name used in diagnostics
    pub fn name(&self) -> &str {
        match self {
            TypeRef::Object => "object",
            TypeRef::NoneType => "NoneType",
            TypeRef::Bool => "bool",
            TypeRef::Int => "int",
            TypeRef::Float => "float",
            TypeRef::Str => "str",
            TypeRef::Tuple => "tuple",
            TypeRef::List => "list",
            TypeRef::Set => "set",
            TypeRef::Dict => "dict",
            TypeRef::Type => "type",
            TypeRef::Function => "function",
            TypeRef::Contract => "contract",
            TypeRef::Class(class) => class.name(),
        }
    }

    /// True if a value of type `self` is an instance of `other`
    pub fn is_subtype_of(&self, other: &TypeRef) -> bool {
        match (self, other) {
            (_, TypeRef::Object) => true,
            (TypeRef::Bool, TypeRef::Int) => true,
            (TypeRef::Class(sub), TypeRef::Class(sup)) => sub.is_subclass_of(sup),
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Class> for TypeRef {
    fn from(class: Class) -> Self {
        TypeRef::Class(class)
    }
}

impl From<&Class> for TypeRef {
    fn from(class: &Class) -> Self {
        TypeRef::Class(class.clone())
    }
}

// ── Functions ─────────────────────────────────────────────

type NativeFn = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

/// A named callable.
///
/// A function declared with an arity rejects calls with a different number
/// of arguments before its body runs; a variadic one accepts any count.
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    arity: Option<usize>,
    body: Arc<NativeFn>,
}

impl Function {
    pub fn new<F>(name: &str, arity: usize, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Function {
            name: Arc::from(name),
            arity: Some(arity),
            body: Arc::new(body),
        }
    }

    pub fn variadic<F>(name: &str, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Function {
            name: Arc::from(name),
            arity: None,
            body: Arc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    /// Invoke the function, enforcing its declared arity
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        if let Some(expected) = self.arity {
            if args.len() != expected {
                return Err(Error::ArgumentCount {
                    function: self.name.to_string(),
                    expected,
                    given: args.len(),
                });
            }
        }
        (self.body)(args)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name)
    }
}

// ── Values ────────────────────────────────────────────────

/// A dynamically typed runtime value
#[derive(Debug, Clone)]
pub enum Value {
    /// The absent value (`NoneType`)
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Fixed-arity ordered product
    Tuple(Vec<Value>),
    /// Ordered, variable-length sequence
    List(Vec<Value>),
    /// Unordered collection; built through [`Value::set`] to drop duplicates
    Set(Vec<Value>),
    /// Key→value association; built through [`Value::map`] to keep keys unique
    Map(Vec<(Value, Value)>),
    /// A type reference used as a value
    Type(TypeRef),
    /// A bare `object` instance
    Object,
    /// An instance of a user-declared class
    Instance(Class),
    Function(Function),
    Contract(BoundContract),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn tuple<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::Tuple(items.into_iter().collect())
    }

    pub fn list<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::List(items.into_iter().collect())
    }

    /// Build a set, dropping duplicate elements
    pub fn set<I: IntoIterator<Item = Value>>(items: I) -> Self {
        let mut unique: Vec<Value> = Vec::new();
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Value::Set(unique)
    }

    /// Build a map; a repeated key replaces the earlier value in place
    pub fn map<I: IntoIterator<Item = (Value, Value)>>(pairs: I) -> Self {
        let mut entries: Vec<(Value, Value)> = Vec::new();
        for (key, value) in pairs {
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = value,
                None => entries.push((key, value)),
            }
        }
        Value::Map(entries)
    }

    pub fn instance(class: &Class) -> Self {
        Value::Instance(class.clone())
    }

    /// The runtime type of this value
    pub fn runtime_type(&self) -> TypeRef {
        match self {
            Value::Null => TypeRef::NoneType,
            Value::Bool(_) => TypeRef::Bool,
            Value::Int(_) => TypeRef::Int,
            Value::Float(_) => TypeRef::Float,
            Value::Str(_) => TypeRef::Str,
            Value::Tuple(_) => TypeRef::Tuple,
            Value::List(_) => TypeRef::List,
            Value::Set(_) => TypeRef::Set,
            Value::Map(_) => TypeRef::Dict,
            Value::Type(_) => TypeRef::Type,
            Value::Object => TypeRef::Object,
            Value::Instance(class) => TypeRef::Class(class.clone()),
            Value::Function(_) => TypeRef::Function,
            Value::Contract(_) => TypeRef::Contract,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "dict",
            Value::Type(_) => "type",
            Value::Object => "object",
            Value::Instance(class) => class.name(),
            Value::Function(_) => "function",
            Value::Contract(_) => "contract",
        }
    }

    /// Elements of a tuple, list or set; empty for every other value
    pub fn as_slice(&self) -> &[Value] {
        match self {
            Value::Tuple(items) | Value::List(items) | Value::Set(items) => items,
            _ => &[],
        }
    }

    /// Invoke a function or contract value
    pub fn call(&self, args: Vec<Value>) -> Result<Value> {
        match self {
            Value::Function(func) => func.call(&args),
            Value::Contract(contract) => contract.call(args),
            other => Err(Error::NotCallable {
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Convert from serde_json::Value
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_f64().map(Value::Float))
                .unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(arr) => Value::List(arr.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (Value::Str(k.clone()), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to serde_json::Value.
    ///
    /// Tuples and sets become arrays. Only plain data converts: maps need
    /// string keys and floats must be finite.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::json!(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or_else(|| Error::Conversion(format!("non-finite float {} has no JSON form", f)))?,
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Tuple(items) | Value::List(items) | Value::Set(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect::<Result<_>>()?)
            }
            Value::Map(pairs) => {
                let mut obj = serde_json::Map::with_capacity(pairs.len());
                for (key, value) in pairs {
                    let Value::Str(key) = key else {
                        return Err(Error::Conversion(format!(
                            "map key of type {} has no JSON form",
                            key.type_name()
                        )));
                    };
                    obj.insert(key.clone(), value.to_json()?);
                }
                serde_json::Value::Object(obj)
            }
            other => {
                return Err(Error::Conversion(format!(
                    "{} value has no JSON form",
                    other.type_name()
                )))
            }
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Object, Value::Object) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) | (Value::List(a), Value::List(b)) => a == b,
            // Sets and maps are unordered: equal under mutual containment
            (Value::Set(a), Value::Set(b)) => contains_all(a, b) && contains_all(b, a),
            (Value::Map(a), Value::Map(b)) => contains_all(a, b) && contains_all(b, a),
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Contract(a), Value::Contract(b)) => a == b,
            _ => false,
        }
    }
}

fn contains_all<T: PartialEq>(items: &[T], other: &[T]) -> bool {
    items.iter().all(|item| other.contains(item))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Str(s) => write_quoted(f, s),
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_joined(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::List(items) => {
                write!(f, "[")?;
                write_joined(f, items)?;
                write!(f, "]")
            }
            Value::Set(items) if items.is_empty() => write!(f, "set()"),
            Value::Set(items) => {
                write!(f, "{{")?;
                write_joined(f, items)?;
                write!(f, "}}")
            }
            Value::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Type(t) => write!(f, "<class '{}'>", t),
            Value::Object => write!(f, "<object>"),
            Value::Instance(class) => write!(f, "<{} object>", class.name()),
            Value::Function(func) => write!(f, "<function {}>", func.name()),
            Value::Contract(contract) => write!(f, "{}", contract),
        }
    }
}

/// Quote like a dynamic-language repr: single quotes unless the text holds
/// a `'` and no `"`, with the chosen quote and control characters escaped
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    write!(f, "{}", quote)?;
    for c in s.chars() {
        match c {
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            c if c == quote => write!(f, "\\{}", c)?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "{}", quote)
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<TypeRef> for Value {
    fn from(t: TypeRef) -> Self {
        Value::Type(t)
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Value::Function(func)
    }
}

impl From<BoundContract> for Value {
    fn from(contract: BoundContract) -> Self {
        Value::Contract(contract)
    }
}

// ── Tests ─────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Type Tests ────────────────────────────────────────

    #[test]
    fn test_builtin_subtyping() {
        assert!(TypeRef::Bool.is_subtype_of(&TypeRef::Int));
        assert!(!TypeRef::Int.is_subtype_of(&TypeRef::Bool));
        assert!(TypeRef::Str.is_subtype_of(&TypeRef::Object));
        assert!(TypeRef::NoneType.is_subtype_of(&TypeRef::Object));
        assert!(!TypeRef::Object.is_subtype_of(&TypeRef::Str));
        assert!(!TypeRef::Tuple.is_subtype_of(&TypeRef::List));
    }

    #[test]
    fn test_class_hierarchy() {
        let animal = Class::new("Animal");
        let dog = Class::subclass("Dog", &animal);
        let puppy = Class::subclass("Puppy", &dog);

        assert!(puppy.is_subclass_of(&animal));
        assert!(puppy.is_subclass_of(&dog));
        assert!(!animal.is_subclass_of(&dog));
        assert!(TypeRef::from(&puppy).is_subtype_of(&TypeRef::Object));
        assert_eq!(dog.base(), Some(&animal));
    }

    #[test]
    fn test_class_identity() {
        let a = Class::new("C");
        let b = Class::new("C");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert!(!TypeRef::from(&a).is_subtype_of(&TypeRef::from(&b)));
    }

    #[test]
    fn test_type_names() {
        let c = Class::new("C");
        assert_eq!(Value::Null.type_name(), "NoneType");
        assert_eq!(Value::from(5).type_name(), "int");
        assert_eq!(Value::from(true).type_name(), "bool");
        assert_eq!(Value::str("x").type_name(), "str");
        assert_eq!(Value::Type(TypeRef::Int).type_name(), "type");
        assert_eq!(Value::Object.type_name(), "object");
        assert_eq!(Value::instance(&c).type_name(), "C");
        assert_eq!(Value::Map(vec![]).type_name(), "dict");
    }

    // ── Function Tests ────────────────────────────────────

    #[test]
    fn test_function_arity_enforced() {
        let f = Function::new("f", 0, |_| Ok(Value::Int(42)));
        assert_eq!(f.call(&[]).unwrap(), Value::Int(42));
        let err = f.call(&[Value::Tuple(vec![])]).unwrap_err();
        assert_eq!(err.to_string(), "f() takes exactly 0 arguments (1 given)");
    }

    #[test]
    fn test_variadic_function() {
        let count = Function::variadic("count", |args| Ok(Value::Int(args.len() as i64)));
        assert_eq!(count.arity(), None);
        assert_eq!(count.call(&[Value::Null, Value::Null]).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_function_identity_equality() {
        let f = Function::new("f", 0, |_| Ok(Value::Null));
        let g = Function::new("f", 0, |_| Ok(Value::Null));
        assert_eq!(f, f.clone());
        assert_ne!(f, g);
    }

    #[test]
    fn test_call_non_callable() {
        let err = Value::str("joy").call(vec![]).unwrap_err();
        assert_eq!(err, Error::NotCallable { found: "str".into() });
    }

    // ── Collection Tests ──────────────────────────────────

    #[test]
    fn test_set_drops_duplicates() {
        let s = Value::set([Value::Int(1), Value::Int(2), Value::Int(1)]);
        assert_eq!(s.as_slice().len(), 2);
        assert_eq!(s, Value::set([Value::Int(2), Value::Int(1)]));
    }

    #[test]
    fn test_map_replaces_repeated_key() {
        let m = Value::map([
            (Value::str("a"), Value::Int(1)),
            (Value::str("a"), Value::Int(2)),
        ]);
        assert_eq!(m, Value::Map(vec![(Value::str("a"), Value::Int(2))]));
    }

    #[test]
    fn test_set_equality_symmetric_with_duplicate_payload() {
        let a = Value::Set(vec![Value::Int(1), Value::Int(1)]);
        let b = Value::Set(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(a == b, b == a);
        assert_ne!(a, b);
        assert_eq!(a, Value::set([Value::Int(1)]));
    }

    #[test]
    fn test_map_equality_symmetric_with_repeated_key() {
        let pair = (Value::str("k"), Value::Int(1));
        let a = Value::Map(vec![pair.clone(), pair.clone()]);
        let b = Value::Map(vec![pair.clone(), (Value::str("j"), Value::Int(2))]);
        assert_eq!(a == b, b == a);
        assert_ne!(a, b);
        assert_eq!(a, Value::Map(vec![pair]));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "None");
        assert_eq!(Value::tuple([Value::Int(1)]).to_string(), "(1,)");
        assert_eq!(Value::Tuple(vec![]).to_string(), "()");
        assert_eq!(
            Value::list([Value::Int(1), Value::str("hi")]).to_string(),
            "[1, 'hi']"
        );
        assert_eq!(Value::Set(vec![]).to_string(), "set()");
        assert_eq!(
            Value::map([(Value::Int(5), Value::str("hi"))]).to_string(),
            "{5: 'hi'}"
        );
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
    }

    #[test]
    fn test_string_display_escapes_quotes() {
        assert_eq!(Value::str("it's").to_string(), r#""it's""#);
        assert_eq!(Value::str(r#"a'b"c"#).to_string(), r#"'a\'b"c'"#);
        assert_eq!(Value::str("a\nb").to_string(), r"'a\nb'");
        assert_eq!(Value::str(r"back\slash").to_string(), r"'back\\slash'");
    }

    // ── JSON Tests ────────────────────────────────────────

    #[test]
    fn test_value_from_json() {
        let value = Value::from_json(&serde_json::json!({
            "name": "test",
            "count": 42,
            "ratio": 0.5,
            "items": [1, null, true]
        }));
        let Value::Map(pairs) = &value else {
            panic!("expected a map, got {}", value);
        };
        assert_eq!(pairs.len(), 4);
        assert!(pairs.contains(&(Value::str("count"), Value::Int(42))));
        assert!(pairs.contains(&(Value::str("ratio"), Value::Float(0.5))));
        assert!(pairs.contains(&(
            Value::str("items"),
            Value::list([Value::Int(1), Value::Null, Value::Bool(true)])
        )));
    }

    #[test]
    fn test_value_to_json() {
        let value = Value::map([
            (Value::str("pair"), Value::tuple([Value::Int(1), Value::str("a")])),
            (Value::str("none"), Value::Null),
        ]);
        assert_eq!(
            value.to_json().unwrap(),
            serde_json::json!({"pair": [1, "a"], "none": null})
        );
    }

    #[test]
    fn test_to_json_rejects_non_data() {
        assert!(matches!(
            Value::map([(Value::Int(1), Value::Null)]).to_json(),
            Err(Error::Conversion(_))
        ));
        assert!(matches!(Value::Type(TypeRef::Int).to_json(), Err(Error::Conversion(_))));
        assert!(matches!(Value::Float(f64::NAN).to_json(), Err(Error::Conversion(_))));
    }
}
