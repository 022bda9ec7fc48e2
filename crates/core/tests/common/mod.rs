//! Shared test helpers for `plotspec_core` integration tests.

#![allow(unreachable_pub)]

use std::sync::LazyLock;

use plotspec_core::{
    CompositorDef, CompositorSpec, Namespace, Options, OptionsSpec, OptsSpec, SpecError, Value,
};
use plotspec_registry::{OperationTable, load_registry_from_str};

/// Registry fixture loaded once per test binary.
pub static REGISTRY: LazyLock<OperationTable> = LazyLock::new(|| {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/registry.json");
    let json = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e));
    load_registry_from_str(&json)
        .unwrap_or_else(|e| panic!("failed to load {}: {}", path.display(), e))
});

/// Default namespace extended with the fixture's allow-list.
#[allow(dead_code)]
pub fn namespace() -> Namespace {
    Namespace::default().extend_from_config(&REGISTRY.namespace)
}

/// Parse an options line against the fixture registry, panicking on error.
#[allow(dead_code)]
pub fn opts(line: &str) -> OptionsSpec {
    OptsSpec::new(&*REGISTRY)
        .with_namespace(namespace())
        .parse(line)
        .unwrap_or_else(|e| panic!("failed to parse {line:?}: {e}"))
}

/// Parse an options line that must fail.
#[allow(dead_code)]
pub fn opts_err(line: &str) -> SpecError {
    match OptsSpec::new(&*REGISTRY).with_namespace(namespace()).parse(line) {
        Ok(spec) => panic!("expected {line:?} to fail, got {spec:?}"),
        Err(e) => e,
    }
}

/// Parse a compositor line against the fixture registry, panicking on error.
#[allow(dead_code)]
pub fn comps(line: &str) -> Vec<CompositorDef> {
    CompositorSpec::new(&*REGISTRY)
        .with_namespace(namespace())
        .parse(line)
        .unwrap_or_else(|e| panic!("failed to parse {line:?}: {e}"))
}

/// Parse a compositor line that must fail.
#[allow(dead_code)]
pub fn comps_err(line: &str) -> SpecError {
    match CompositorSpec::new(&*REGISTRY).with_namespace(namespace()).parse(line) {
        Ok(defs) => panic!("expected {line:?} to fail, got {defs:?}"),
        Err(e) => e,
    }
}

/// Build an options object from `(key, value)` pairs.
#[allow(dead_code)]
pub fn options<const N: usize>(pairs: [(&str, Value); N]) -> Options {
    pairs.into_iter().collect()
}
