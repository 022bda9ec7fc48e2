//! Emitter: renders parse results back to canonical short-form text.
//!
//! Output re-parses to an equal result. Canonical form means short block
//! delimiters, settings in key order, and explicit signs for both
//! normalization flags.

use std::fmt::Write;

use super::compositor::CompositorDef;
use super::options::{Normalization, OptionRecord, OptionsSpec};
use crate::value::Options;

// ── Options ─────────────────────────────────────────────────────────────

/// Emit an options line: `Path {flags} [plot] (style)` per path, in key
/// order, separated by single spaces.
pub fn emit_options(spec: &OptionsSpec) -> String {
    let mut out = String::new();
    for (path, record) in spec {
        if !out.is_empty() {
            out.push(' ');
        }
        emit_record(&mut out, path, record);
    }
    out
}

fn emit_record(out: &mut String, path: &str, record: &OptionRecord) {
    out.push_str(path);
    if let Some(norm) = &record.norm {
        let n = Normalization::from_options(norm);
        let _ = write!(
            out,
            " {{{}groupwise {}mapwise}}",
            sign(n.groupwise),
            sign(n.mapwise)
        );
    }
    if let Some(plot) = &record.plot {
        emit_block(out, '[', plot, ']');
    }
    if let Some(style) = &record.style {
        emit_block(out, '(', style, ')');
    }
}

fn sign(on: bool) -> char {
    if on { '+' } else { '-' }
}

fn emit_block(out: &mut String, open: char, options: &Options, close: char) {
    out.push(' ');
    out.push(open);
    out.push_str(&options.to_keywords());
    out.push(close);
}

// ── Compositors ─────────────────────────────────────────────────────────

/// Emit a compositor line: `mode op (overlay) Value [settings]` per
/// definition, in order, separated by single spaces. Empty settings are
/// omitted.
pub fn emit_compositors(defs: &[CompositorDef]) -> String {
    let mut out = String::new();
    for def in defs {
        if !out.is_empty() {
            out.push(' ');
        }
        let _ = write!(
            out,
            "{} {} ({}) {}",
            def.mode, def.operation.name, def.overlay_spec, def.value
        );
        if !def.settings.is_empty() {
            let settings = Options::new(def.settings.clone());
            emit_block(&mut out, '[', &settings, ']');
        }
    }
    out
}
