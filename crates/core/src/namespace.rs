//! Allow-list of names reachable from keyword values.

use std::collections::{BTreeMap, BTreeSet};

use plotspec_registry::NamespaceConfig;

use crate::value::Value;

/// Names the literal evaluator may resolve.
///
/// Anything not listed here is an evaluation error: values are literals,
/// calls to listed constructors, or listed constants, and nothing else.
#[derive(Debug, Clone)]
pub struct Namespace {
    callables: BTreeSet<String>,
    constants: BTreeMap<String, Value>,
}

impl Default for Namespace {
    /// `dict`, `Cycle` and `Palette` are callable; `inf` and `nan` are constants.
    fn default() -> Self {
        Self::empty()
            .with_callable("dict")
            .with_callable("Cycle")
            .with_callable("Palette")
            .with_constant("inf", Value::Float(f64::INFINITY))
            .with_constant("nan", Value::Float(f64::NAN))
    }
}

impl Namespace {
    /// A namespace with nothing but literals. `dict(...)` stays available
    /// because keyword fragments are evaluated as its arguments.
    pub fn empty() -> Self {
        Self {
            callables: BTreeSet::from(["dict".to_string()]),
            constants: BTreeMap::new(),
        }
    }

    /// Allow calls to `name(...)`.
    pub fn with_callable(mut self, name: impl Into<String>) -> Self {
        self.callables.insert(name.into());
        self
    }

    /// Bind the bare name `name` to a constant.
    pub fn with_constant(mut self, name: impl Into<String>, value: Value) -> Self {
        self.constants.insert(name.into(), value);
        self
    }

    /// Extend with the allow-list from a registry file.
    pub fn extend_from_config(mut self, config: &NamespaceConfig) -> Self {
        self.callables.extend(config.callables.iter().cloned());
        for (name, json) in &config.constants {
            self.constants
                .insert(name.clone(), Value::from(json.clone()));
        }
        self
    }

    /// Whether `name(...)` may be called.
    pub fn is_callable(&self, name: &str) -> bool {
        self.callables.contains(name)
    }

    /// Resolve a bare name.
    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }
}
