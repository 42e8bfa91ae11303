//! Contracts — input/output schema pairs guarding a function
//!
//! A contract has two phases:
//!
//! ```text
//! ContractDefinition ──attach(func)──▶ BoundContract ──call(args)──▶ Value
//!   (schemas only)                      (schemas + func)
//! ```
//!
//! `attach` consumes the definition, so a contract is bound at most once.
//! Every `call` is independent: the input is matched, the function runs,
//! the output is matched, and the result is returned unchanged.
//!
//! # Failure points
//!
//! - Input mismatch: the function never runs
//! - Output mismatch: the function already ran; its side effects stand

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::matcher::check_value;
use crate::schema::Schema;
use crate::value::{Function, Value};
use crate::{Error, Result};

// ── Definition ────────────────────────────────────────────

/// An unbound input/output schema pair.
///
/// Equality is structural over `(input_schema, output_schema)`; the debug
/// flag does not take part.
#[derive(Debug, Clone)]
pub struct ContractDefinition {
    /// Always a `Schema::Tuple`, one element per call argument
    input_schema: Schema,
    output_schema: Schema,
    debug: bool,
}

impl ContractDefinition {
    /// Create a definition. A non-tuple input schema describes a single
    /// argument and is wrapped in a one-element tuple.
    pub fn new(input: impl Into<Schema>, output: impl Into<Schema>) -> Self {
        let input_schema = match input.into() {
            tuple @ Schema::Tuple(_) => tuple,
            single => Schema::Tuple(vec![single]),
        };
        ContractDefinition {
            input_schema,
            output_schema: output.into(),
            debug: false,
        }
    }

    /// Create a definition from exemplar values.
    ///
    /// # Errors
    /// Returns `InvalidSchema` naming the side whose exemplar is malformed.
    pub fn from_exemplars(input: &Value, output: &Value) -> Result<Self> {
        let input = Schema::from_exemplar(input).map_err(|e| in_declaration("input", e))?;
        let output = Schema::from_exemplar(output).map_err(|e| in_declaration("output", e))?;
        Ok(ContractDefinition::new(input, output))
    }

    /// Trace every checked pair at DEBUG level
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    pub fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Bind the definition to `func`
    pub fn attach(self, func: Function) -> BoundContract {
        BoundContract {
            definition: Arc::new(self),
            func,
        }
    }

    /// Apply the definition to call arguments, the way a wrapping step
    /// receives the function it wraps.
    ///
    /// # Errors
    /// Returns `InvalidBinding` unless `args` holds exactly one callable
    /// value (a function or another contract).
    pub fn bind(self, args: Vec<Value>) -> Result<BoundContract> {
        let mut args = args.into_iter();
        let (Some(target), None) = (args.next(), args.next()) else {
            return Err(Error::InvalidBinding(format!(
                "{} must be applied to exactly one callable",
                self
            )));
        };

        let func = match target {
            Value::Function(func) => func,
            Value::Contract(inner) => {
                let name = inner.function().name().to_string();
                Function::variadic(&name, move |args| inner.call(args.to_vec()))
            }
            other => {
                return Err(Error::InvalidBinding(format!(
                    "cannot attach {} to a non-callable {}",
                    self,
                    other.type_name()
                )))
            }
        };
        Ok(self.attach(func))
    }

    /// Run `func` under this contract without binding it.
    ///
    /// # Errors
    /// Returns the input violation (the function is not invoked), any
    /// error the function itself returns, or the output violation.
    pub fn check_with(&self, func: &Function, args: Vec<Value>) -> Result<Value> {
        if self.debug {
            debug!(contract = %self, function = func.name(), "checking call");
        }

        let args = Value::Tuple(args);
        check_value(&self.input_schema, &args, self.debug)?;

        let output = func.call(args.as_slice())?;

        check_value(&self.output_schema, &output, self.debug)?;
        Ok(output)
    }
}

fn in_declaration(side: &str, err: Error) -> Error {
    match err {
        Error::InvalidSchema(msg) => Error::InvalidSchema(format!("{} schema: {}", side, msg)),
        other => other,
    }
}

impl PartialEq for ContractDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.input_schema == other.input_schema && self.output_schema == other.output_schema
    }
}

impl Eq for ContractDefinition {}

impl fmt::Display for ContractDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // A single argument reads unwrapped: contract(str, str)
        let input = match &self.input_schema {
            Schema::Tuple(elements) => match elements.as_slice() {
                [single] => single,
                _ => &self.input_schema,
            },
            other => other,
        };
        write!(f, "contract({}, {})", input, self.output_schema)
    }
}

// ── Bound Contract ────────────────────────────────────────

/// A definition bound to the function it guards.
///
/// Cheap to clone and safe to call from several threads at once; any
/// synchronization of the function's own side effects is up to it.
#[derive(Clone)]
pub struct BoundContract {
    definition: Arc<ContractDefinition>,
    func: Function,
}

impl BoundContract {
    pub fn definition(&self) -> &ContractDefinition {
        &self.definition
    }

    pub fn function(&self) -> &Function {
        &self.func
    }

    /// Invoke the bound function with input and output validation
    pub fn call(&self, args: Vec<Value>) -> Result<Value> {
        self.definition.check_with(&self.func, args)
    }
}

impl PartialEq for BoundContract {
    fn eq(&self, other: &Self) -> bool {
        self.definition == other.definition
    }
}

impl PartialEq<ContractDefinition> for BoundContract {
    fn eq(&self, other: &ContractDefinition) -> bool {
        *self.definition == *other
    }
}

impl fmt::Debug for BoundContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundContract")
            .field("definition", &self.definition)
            .field("function", &self.func.name())
            .finish()
    }
}

impl fmt::Display for BoundContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.definition)
    }
}

// ── Tests ─────────────────────────────────────────────────
