//! Operation tables for the plotspec grammars.
//!
//! The options grammar accepts the value names of registered compositor
//! definitions as path specifications, and the compositor grammar resolves
//! operation names against a name → operation table. Both sets change at
//! runtime as operations and definitions are registered, so the grammars query
//! a [`Registry`] on every parse call instead of baking names into the grammar.
//!
//! [`OperationTable`] is the plain in-memory table (deserializable from the
//! registry JSON file); [`SharedRegistry`] wraps one behind a lock so that
//! registrations become visible to subsequent parses.

mod error;
mod shared;

pub use error::RegistryError;
pub use shared::SharedRegistry;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

/// Current format version for the registry JSON schema.
pub const REGISTRY_FORMAT_VERSION: &str = "0.1.0";

/// Compositor mode: whether the operation applies to data or to display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The derived element is computed from the data.
    Data,
    /// The derived element only affects display.
    Display,
}

impl Mode {
    /// Parse a mode keyword. Only the exact lowercase words are accepted.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "data" => Some(Mode::Data),
            "display" => Some(Mode::Display),
            _ => None,
        }
    }

    /// The surface keyword for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Data => "data",
            Mode::Display => "display",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A constructible operation that compositors can apply to an overlay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Operation {
    /// Name used in compositor specifications (e.g. `"add"`).
    pub name: String,
    /// Optional one-line description, shown by tooling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Names of the settings the operation accepts. Informational only;
    /// settings are passed through without validation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
}

impl Operation {
    /// Create an operation with no description and no declared params.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            params: Vec::new(),
        }
    }
}

/// A registered compositor definition.
///
/// Its `value` is the name of the derived element, which the options grammar
/// accepts as a path specification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DerivedDefinition {
    /// Name of the derived element (e.g. `"RGB"`).
    pub value: String,
    /// Name of the operation that produces it.
    pub operation: String,
    /// Whether the definition applies in data or display mode.
    pub mode: Mode,
    /// Overlay specification text the operation consumes (e.g. `"A * B"`).
    pub overlay_spec: String,
}

/// Allow-list for the literal evaluator, as stored in the registry file.
///
/// Constants are kept as raw JSON here; the parser converts them to its own
/// value type when it builds its namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NamespaceConfig {
    /// Constructor names that may be called from keyword values.
    #[serde(default)]
    pub callables: Vec<String>,
    /// Bare names that evaluate to a constant.
    #[serde(default)]
    pub constants: BTreeMap<String, serde_json::Value>,
}

/// Read-only view of the live operation registry.
///
/// The grammars take one snapshot at the start of each parse and resolve
/// every group against it, so registrations that land mid-parse are seen
/// by the next call only.
pub trait Registry {
    /// The table as it is now.
    fn snapshot(&self) -> Cow<'_, OperationTable>;
}

/// In-memory operation table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationTable {
    /// Table format version for compatibility checks.
    #[serde(default = "default_format_version")]
    pub format_version: String,
    /// All known operations.
    #[serde(default)]
    pub operations: Vec<Operation>,
    /// Registered compositor definitions.
    #[serde(default)]
    pub definitions: Vec<DerivedDefinition>,
    /// Literal-evaluator allow-list extensions.
    #[serde(default)]
    pub namespace: NamespaceConfig,

    /// Cached map from operation name → index into `operations` (lazily initialized).
    #[serde(skip)]
    op_map: OnceLock<HashMap<String, usize>>,
}

fn default_format_version() -> String {
    REGISTRY_FORMAT_VERSION.to_string()
}

impl OperationTable {
    /// Create a table from operations and definitions.
    /// The lookup cache is initialized lazily on first access.
    pub fn new(operations: Vec<Operation>, definitions: Vec<DerivedDefinition>) -> Self {
        Self {
            format_version: default_format_version(),
            operations,
            definitions,
            namespace: NamespaceConfig::default(),
            op_map: OnceLock::new(),
        }
    }

    /// Returns the cached name → index map, building it lazily on first access.
    fn op_map(&self) -> &HashMap<String, usize> {
        self.op_map.get_or_init(|| {
            self.operations
                .iter()
                .enumerate()
                .map(|(i, op)| (op.name.clone(), i))
                .collect()
        })
    }

    /// Value names of all registered compositor definitions.
    pub fn derived_names(&self) -> Vec<String> {
        self.definitions.iter().map(|d| d.value.clone()).collect()
    }

    /// Look up an operation by name.
    pub fn op_by_name(&self, name: &str) -> Option<&Operation> {
        self.op_map().get(name).map(|&i| &self.operations[i])
    }

    /// Add an operation. Fails if the name is already taken.
    pub fn register_operation(&mut self, operation: Operation) -> Result<(), RegistryError> {
        check_identifier("operations.name", &operation.name)?;
        if self.op_by_name(&operation.name).is_some() {
            return Err(RegistryError::Duplicate {
                kind: "operation",
                name: operation.name,
            });
        }
        tracing::debug!(operation = %operation.name, "registered operation");
        self.operations.push(operation);
        self.op_map = OnceLock::new();
        Ok(())
    }

    /// Add a compositor definition, replacing any existing definition with
    /// the same value name. The operation must already be registered.
    pub fn register_definition(
        &mut self,
        definition: DerivedDefinition,
    ) -> Result<(), RegistryError> {
        check_identifier("definitions.value", &definition.value)?;
        if self.op_by_name(&definition.operation).is_none() {
            return Err(RegistryError::UnknownOperation {
                definition: definition.value,
                operation: definition.operation,
            });
        }
        tracing::debug!(
            value = %definition.value,
            operation = %definition.operation,
            mode = %definition.mode,
            "registered compositor definition"
        );
        self.definitions.retain(|d| d.value != definition.value);
        self.definitions.push(definition);
        Ok(())
    }
}

impl Registry for OperationTable {
    fn snapshot(&self) -> Cow<'_, OperationTable> {
        Cow::Borrowed(self)
    }
}

/// Names must be usable as compositor words: ASCII letters, digits, `_`.
fn check_identifier(field: &str, name: &str) -> Result<(), RegistryError> {
    if name.is_empty() {
        return Err(RegistryError::InvalidField {
            field: field.into(),
            reason: "must not be empty".into(),
        });
    }
    if !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return Err(RegistryError::InvalidField {
            field: field.into(),
            reason: format!("'{name}' may only contain ASCII letters, digits and '_'"),
        });
    }
    Ok(())
}

/// Load and validate an operation table from a JSON string.
///
/// Validates that operation and definition names are non-empty identifiers,
/// that operation names are unique, and that every definition references a
/// known operation.
pub fn load_registry_from_str(s: &str) -> Result<OperationTable, RegistryError> {
    let table: OperationTable = serde_json::from_str(s)?;

    let mut seen = HashSet::new();
    for op in &table.operations {
        check_identifier("operations.name", &op.name)?;
        if !seen.insert(op.name.as_str()) {
            return Err(RegistryError::Duplicate {
                kind: "operation",
                name: op.name.clone(),
            });
        }
    }

    let mut values = HashSet::new();
    for def in &table.definitions {
        check_identifier("definitions.value", &def.value)?;
        if !seen.contains(def.operation.as_str()) {
            return Err(RegistryError::UnknownOperation {
                definition: def.value.clone(),
                operation: def.operation.clone(),
            });
        }
        if !values.insert(def.value.as_str()) {
            return Err(RegistryError::Duplicate {
                kind: "definition",
                name: def.value.clone(),
            });
        }
    }

    for name in &table.namespace.callables {
        check_identifier("namespace.callables", name)?;
    }
    for name in table.namespace.constants.keys() {
        check_identifier("namespace.constants", name)?;
    }

    tracing::debug!(
        operations = table.operations.len(),
        definitions = table.definitions.len(),
        "loaded operation registry"
    );
    Ok(table)
}
