//! Parsers for the plot options and compositor specification languages.
//!
//! An options line assigns plot, style and normalization settings to dotted
//! element paths:
//!
//! ```text
//! Image (cmap='gray') [size=5] {-mapwise} Curve plot(show_grid=True)
//! ```
//!
//! A compositor line declares derived elements built from an overlay by a
//! registered operation:
//!
//! ```text
//! display toRGB (Image * Image) RGB [alpha=0.5]
//! ```
//!
//! The main entry points are [`parse_options`] and [`parse_compositors`];
//! [`OptsSpec`] and [`CompositorSpec`] allow a custom evaluation
//! [`Namespace`]. Names that change at runtime (derived element names and
//! operations) come from a [`Registry`], queried on every parse.

#![warn(missing_docs)]

/// Error type shared by both grammars.
pub mod error;
/// Scanners, grammars and the emitter.
pub mod grammar;
/// Names reachable from keyword values.
pub mod namespace;
/// Evaluated keyword values and options objects.
pub mod value;

// ── Convenience re-exports ──────────────────────────────────────────────────

// Grammars
pub use grammar::compositor::{
    CompositorDef, CompositorSpec, parse_compositors, register_compositors,
};
pub use grammar::options::{
    Normalization, OptionRecord, OptionsSpec, OptsSpec, parse_options, process_normalization,
};

// Collection and evaluation
pub use grammar::collect::{NestStyle, collect_tokens, group_keywords, to_dict};

// Emitter
pub use grammar::emit::{emit_compositors, emit_options};

// Values
pub use namespace::Namespace;
pub use value::{Options, Value};

pub use error::SpecError;

// Re-exported from the dependency crates
pub use plotspec_diagnostics::{Diagnostic, Severity, Span, codes};
pub use plotspec_registry::{
    DerivedDefinition, Mode, Operation, OperationTable, Registry, SharedRegistry,
};
