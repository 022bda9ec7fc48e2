//! Compositor definition grammar.
//!
//! ```text
//! line     = group+
//! group    = mode op "(" overlay ")" value settings?
//! settings = "[" kw* "]"
//! ```
//!
//! `mode`, `op` and `value` are words of `[A-Za-z0-9_]`. Mode and operation
//! are validated after the whole line has matched.

use std::collections::BTreeMap;

use plotspec_diagnostics::Span;
use plotspec_registry::{
    DerivedDefinition, Mode, Operation, OperationTable, Registry, SharedRegistry,
};
use serde::Serialize;

use super::collect::{NestStyle, raw_tokens, to_dict};
use super::lexer::{BRACKETS, Block, Cursor, PARENS, scan_block, scan_ident};
use super::scan::match_line;
use crate::error::SpecError;
use crate::namespace::Namespace;
use crate::value::Value;

/// A rule deriving a new element from an overlay via a named operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositorDef {
    /// Whether the operation applies to data or to display.
    pub mode: Mode,
    /// The operation, resolved from the registry.
    pub operation: Operation,
    /// Overlay specification the operation consumes, e.g. `Image * Image`.
    pub overlay_spec: String,
    /// Name of the derived element.
    pub value: String,
    /// Keyword settings passed to the operation.
    pub settings: BTreeMap<String, Value>,
}

impl CompositorDef {
    /// Build a definition. Arguments follow the order of the surface syntax
    /// after the mode: overlay, operation, value.
    pub fn new(
        overlay_spec: impl Into<String>,
        operation: Operation,
        value: impl Into<String>,
        mode: Mode,
        settings: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            mode,
            operation,
            overlay_spec: overlay_spec.into(),
            value: value.into(),
            settings,
        }
    }

    /// The registry entry for this definition.
    pub fn to_definition(&self) -> DerivedDefinition {
        DerivedDefinition {
            value: self.value.clone(),
            operation: self.operation.name.clone(),
            mode: self.mode,
            overlay_spec: self.overlay_spec.clone(),
        }
    }
}

#[derive(Debug)]
struct RawGroup {
    mode: (String, Span),
    op: (String, Span),
    overlay: Block,
    value: String,
    settings: Option<Block>,
}

fn match_group(cur: &mut Cursor<'_>) -> Result<Option<RawGroup>, SpecError> {
    let start = cur.pos();
    let group = match_group_parts(cur)?;
    if group.is_none() {
        cur.reset(start);
    }
    Ok(group)
}

fn match_group_parts(cur: &mut Cursor<'_>) -> Result<Option<RawGroup>, SpecError> {
    let Some(mode) = scan_ident(cur) else {
        return Ok(None);
    };
    cur.skip_ws();
    let Some(op) = scan_ident(cur) else {
        return Ok(None);
    };
    cur.skip_ws();
    let Some(overlay) = scan_block(cur, PARENS)? else {
        return Ok(None);
    };
    cur.skip_ws();
    let Some((value, _)) = scan_ident(cur) else {
        return Ok(None);
    };

    let mark = cur.pos();
    cur.skip_ws();
    let settings = scan_block(cur, BRACKETS)?;
    if settings.is_none() {
        cur.reset(mark);
    }
    Ok(Some(RawGroup {
        mode,
        op,
        overlay,
        value,
        settings,
    }))
}

/// Compositor-line parser bound to a registry and an evaluation namespace.
pub struct CompositorSpec<'r> {
    registry: &'r dyn Registry,
    namespace: Namespace,
}

impl<'r> CompositorSpec<'r> {
    /// Parser using the default [`Namespace`].
    pub fn new(registry: &'r dyn Registry) -> Self {
        Self {
            registry,
            namespace: Namespace::default(),
        }
    }

    /// Replace the evaluation namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }

    /// Parse one compositor line into definitions, in source order.
    ///
    /// Every operation is resolved against the same registry snapshot.
    pub fn parse(&self, line: &str) -> Result<Vec<CompositorDef>, SpecError> {
        let groups = match_line(line, match_group)?;
        let table = self.registry.snapshot();
        groups.into_iter().map(|g| self.build(g, &table)).collect()
    }

    fn build(&self, group: RawGroup, table: &OperationTable) -> Result<CompositorDef, SpecError> {
        let (mode_word, mode_span) = group.mode;
        let mode = Mode::from_keyword(&mode_word).ok_or_else(|| SpecError::InvalidMode {
            mode: mode_word.clone(),
            span: Some(mode_span),
        })?;

        let (op_name, op_span) = group.op;
        let operation = table.op_by_name(&op_name).cloned().ok_or_else(|| {
            SpecError::UnknownOperation {
                operation: op_name.clone(),
                span: Some(op_span),
            }
        })?;

        let overlay_spec = raw_tokens(&group.overlay.items, NestStyle::Parens).join(" ");
        let settings = match &group.settings {
            Some(block) => to_dict(Some(&block.items), NestStyle::Brackets, &self.namespace)?,
            None => BTreeMap::new(),
        };

        tracing::debug!(
            mode = %mode,
            operation = %operation.name,
            value = %group.value,
            overlay = %overlay_spec,
            settings = settings.len(),
            "parsed compositor group"
        );
        Ok(CompositorDef::new(
            overlay_spec,
            operation,
            group.value,
            mode,
            settings,
        ))
    }
}

/// Parse a compositor line against `registry` with the default namespace.
pub fn parse_compositors(
    line: &str,
    registry: &dyn Registry,
) -> Result<Vec<CompositorDef>, SpecError> {
    CompositorSpec::new(registry).parse(line)
}

/// Parse a compositor line and register every definition, so their value
/// names become path-specs for subsequent option parses.
///
/// Nothing is registered unless the whole line parses.
pub fn register_compositors(
    line: &str,
    registry: &SharedRegistry,
) -> Result<Vec<CompositorDef>, SpecError> {
    let defs = parse_compositors(line, registry)?;
    for def in &defs {
        registry
            .register_definition(def.to_definition())
            .map_err(|e| SpecError::Registration {
                value: def.value.clone(),
                reason: e.to_string(),
            })?;
    }
    Ok(defs)
}
