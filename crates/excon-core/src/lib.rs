//! excon core - exemplar-shaped contracts for function boundaries
//!
//! A contract pairs an input schema with an output schema. Schemas are
//! written in the shape of an example value: `str`, `[int]`, `{int: str}`,
//! `((),)`, or another contract. Calling a bound contract validates the
//! arguments, runs the function, then validates the result.
//!
//! # Architecture
//!
//! ```text
//! Exemplar Value → Schema (validated at declaration)
//!                     ↓
//!              ContractDefinition ──attach──▶ BoundContract
//!                                                 ↓ call(args)
//!                  Matcher(input) → Function → Matcher(output) → Value
//! ```
//!
//! # Guarantees
//!
//! - **Eager**: malformed schemas fail at declaration, not at first use
//! - **Ordered**: type checks precede structural checks at every level
//! - **Bounded stack**: matching is breadth-first over an explicit queue
//! - **Stateless checks**: every call allocates and discards its own queue
//!
//! # Example
//!
//! ```
//! use excon_core::{ContractDefinition, Function, Schema, TypeRef, Value};
//!
//! let join = Function::new("join", 1, |args| {
//!     let parts: Vec<String> = args[0].as_slice().iter().map(|v| v.to_string()).collect();
//!     Ok(Value::str(parts.join(",")))
//! });
//! let joined = ContractDefinition::new(Schema::list(TypeRef::Int), TypeRef::Str).attach(join);
//!
//! let ints = Value::list([Value::Int(1), Value::Int(2), Value::Int(3)]);
//! assert_eq!(joined.call(vec![ints]).unwrap(), Value::str("1,2,3"));
//!
//! let err = joined.call(vec![Value::Null]).unwrap_err();
//! assert_eq!(err.to_string(), "expected a list, got a NoneType");
//! ```

pub mod contract;
pub mod error;
pub mod matcher;
pub mod schema;
pub mod value;

pub use contract::{BoundContract, ContractDefinition};
pub use error::{ContractViolation, Error, Result};
pub use matcher::{check_exemplar, check_value};
pub use schema::Schema;
pub use value::{Class, Function, TypeRef, Value};
