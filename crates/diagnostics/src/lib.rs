//! Diagnostics for the plotspec parsers.
//!
//! Provides [`Diagnostic`], [`Severity`] and [`Span`] used to report errors
//! from the options and compositor grammars and from registry loading.
//! Diagnostic codes are defined in the [`codes`] module.

#![warn(missing_docs)]

/// Diagnostic ID constants.
pub mod codes;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Severity level for a diagnostic message.
///
/// Parsing has no partial results, so every diagnostic is an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Severity {
    /// Hard error; the line is rejected.
    Error,
}

/// Byte span in the source line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the first character (0-based).
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Span {
    /// Create a span covering `[start, end)`.
    ///
    /// Panics if `end < start`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(end >= start, "Span end ({end}) < start ({start})");
        Self { start, end }
    }
}

/// A diagnostic message produced while parsing a specification line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Unique diagnostic code (e.g., `"SPEC1003"`).
    pub id: Cow<'static, str>,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable diagnostic message.
    pub message: String,
    /// Optional byte span in the source line that this diagnostic relates to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Machine-readable context for tooling. Keys and values are free-form strings.
    ///
    /// Uses `BTreeMap` for deterministic key ordering in serialized output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl Diagnostic {
    /// Create a diagnostic with the given fields.
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        severity: Severity,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
            span,
            context: None,
        }
    }

    /// Shorthand for an `Error` diagnostic.
    pub fn error(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Error, message, span)
    }

    /// Attach machine-readable context metadata (builder pattern).
    ///
    /// Keys are short descriptors like `"flag"`, `"operation"`, `"fragment"`.
    pub fn with_context(mut self, ctx: BTreeMap<String, String>) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Returns the human-readable explanation for this diagnostic's code, if available.
    pub fn explain(&self) -> Option<&'static str> {
        explain(&self.id)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.id, self.message)
    }
}

/// Returns the human-readable explanation for a diagnostic code, if known.
pub fn explain(id: &str) -> Option<&'static str> {
    let text = match id {
        codes::INVALID_SYNTAX => {
            "The line must start with a path specification (for options) or a \
             `mode operation (overlay) Value` group (for compositors)."
        }
        codes::AMBIGUOUS_SPEC => {
            "The line contains more than one independent match; text between \
             groups could not be attributed to any group."
        }
        codes::UNPARSED_REMAINDER => {
            "Everything after the last complete group must be whitespace. Check \
             for a stray word or a block given twice for the same path."
        }
        codes::UNTERMINATED_BLOCK => {
            "A `(`, `[` or `{` block (or `plot(`, `style(`, `norm(`) is missing \
             its closing delimiter."
        }
        codes::NESTING_TOO_DEEP => {
            "Blocks, or brackets inside a keyword value, are nested more than 256 \
             levels deep."
        }
        codes::DANGLING_VALUE => {
            "Inside a keyword block every value must follow a `key=` token; a \
             bare value was found before any keyword."
        }
        codes::KEYWORD_EVAL => {
            "A `key=value` fragment is not a valid literal keyword list. Values \
             may be numbers, quoted strings, True/False/None, tuples, lists, \
             dicts or calls to allowed constructors."
        }
        codes::REPEATED_NORM_FLAG => "A normalization flag may appear at most once per block.",
        codes::UNKNOWN_NORM_FLAG => {
            "Normalization blocks accept only +mapwise, -mapwise, +groupwise \
             and -groupwise."
        }
        codes::CONFLICTING_NORM_FLAGS => {
            "A normalization block cannot contain both signs of the same flag \
             (e.g. +mapwise and -mapwise)."
        }
        codes::INVALID_MODE => "Compositor mode must be either `data` or `display`.",
        codes::UNKNOWN_OPERATION => {
            "The compositor operation is not registered. Register it in the \
             operation table or pass a registry file with --registry."
        }
        codes::REGISTRY_INVALID => {
            "The registry file must be JSON with uniquely named operations and \
             definitions that reference known operations."
        }
        codes::REGISTRATION_FAILED => {
            "The definition parsed, but the live registry rejected it. The \
             operation may have been removed or the value name is invalid."
        }
        _ => return None,
    };
    Some(text)
}
