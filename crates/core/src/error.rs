//! Error type shared by both grammars.

use std::collections::BTreeMap;

use plotspec_diagnostics::{Diagnostic, Span, codes};

/// Shorthand for building a `BTreeMap<String, String>` context from key-value pairs.
macro_rules! ctx {
    ($($k:expr => $v:expr),+ $(,)?) => {
        BTreeMap::from([$(($k.into(), $v.into())),+])
    };
}

/// Why a specification line was rejected.
///
/// Every variant is a syntax error in the user's line. Spans are byte
/// offsets into the line passed to `parse`, when a location is known.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpecError {
    // -- Grammar --
    /// The line does not start with a group the grammar recognizes.
    #[error("invalid specification syntax")]
    InvalidSyntax {
        /// Location of the first unrecognized text.
        span: Option<Span>,
    },

    /// Text after the matched groups contains another independent match.
    #[error("invalid specification syntax: ambiguous match at {text:?}")]
    Ambiguous {
        /// The text that starts the second match.
        text: String,
        /// Location of the second match.
        span: Option<Span>,
    },

    /// Text remains after the last group.
    #[error("failed to parse remainder of string: {remainder:?}")]
    UnparsedRemainder {
        /// The unparsed remainder, trimmed of surrounding whitespace.
        remainder: String,
        /// Location of the remainder.
        span: Option<Span>,
    },

    /// A block was opened but not closed before the end of the line.
    #[error("unterminated block: expected {expected:?} before end of input")]
    UnterminatedBlock {
        /// The closing delimiter that was expected.
        expected: char,
        /// From the opening delimiter to the end of the line.
        span: Option<Span>,
    },

    /// Groups are nested deeper than the parser allows.
    #[error("nesting exceeds the maximum depth of {limit}")]
    NestingTooDeep {
        /// The maximum depth.
        limit: usize,
        /// Location of the opener that went past the limit.
        span: Option<Span>,
    },

    // -- Keyword evaluation --
    /// A value continuation appeared before any `key=value` token.
    #[error("value {token:?} does not follow any keyword")]
    DanglingValue {
        /// The offending token.
        token: String,
    },

    /// A keyword fragment could not be evaluated as a literal argument list.
    #[error("could not evaluate keyword: {fragment:?} ({reason})")]
    KeywordEval {
        /// The fragment that failed.
        fragment: String,
        /// What the literal evaluator rejected.
        reason: String,
    },

    // -- Semantic validation --
    /// A normalization flag appeared more than once.
    #[error("normalization specification must not contain repeated {flag:?}")]
    RepeatedNormFlag {
        /// The repeated flag.
        flag: String,
        /// Location of the norm block.
        span: Option<Span>,
    },

    /// A normalization token is not one of the four recognized flags.
    #[error(
        "normalization option {flag:?} not one of +mapwise, -mapwise, +groupwise, -groupwise"
    )]
    UnknownNormFlag {
        /// The unrecognized token.
        flag: String,
        /// Location of the token.
        span: Option<Span>,
    },

    /// Both signs of the same normalization flag were given.
    #[error("normalization specification cannot contain both {first} and {second}")]
    ConflictingNormFlags {
        /// The positive flag.
        first: &'static str,
        /// The negative flag.
        second: &'static str,
        /// Location of the norm block.
        span: Option<Span>,
    },

    /// Compositor mode is neither `data` nor `display`.
    #[error("either data or display mode must be specified, got {mode:?}")]
    InvalidMode {
        /// The mode word as written.
        mode: String,
        /// Location of the mode word.
        span: Option<Span>,
    },

    /// Compositor operation is not in the live operation table.
    #[error("operation {operation} not available for use with compositors")]
    UnknownOperation {
        /// The operation name as written.
        operation: String,
        /// Location of the operation name.
        span: Option<Span>,
    },

    // -- Registry --
    /// A parsed compositor definition was rejected by the live registry.
    #[error("could not register compositor {value}: {reason}")]
    Registration {
        /// Value name of the definition.
        value: String,
        /// Why the registry refused it.
        reason: String,
    },
}

impl SpecError {
    /// Stable diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            SpecError::InvalidSyntax { .. } => codes::INVALID_SYNTAX,
            SpecError::Ambiguous { .. } => codes::AMBIGUOUS_SPEC,
            SpecError::UnparsedRemainder { .. } => codes::UNPARSED_REMAINDER,
            SpecError::UnterminatedBlock { .. } => codes::UNTERMINATED_BLOCK,
            SpecError::NestingTooDeep { .. } => codes::NESTING_TOO_DEEP,
            SpecError::DanglingValue { .. } => codes::DANGLING_VALUE,
            SpecError::KeywordEval { .. } => codes::KEYWORD_EVAL,
            SpecError::RepeatedNormFlag { .. } => codes::REPEATED_NORM_FLAG,
            SpecError::UnknownNormFlag { .. } => codes::UNKNOWN_NORM_FLAG,
            SpecError::ConflictingNormFlags { .. } => codes::CONFLICTING_NORM_FLAGS,
            SpecError::InvalidMode { .. } => codes::INVALID_MODE,
            SpecError::UnknownOperation { .. } => codes::UNKNOWN_OPERATION,
            SpecError::Registration { .. } => codes::REGISTRATION_FAILED,
        }
    }

    /// Source location, when known.
    pub fn span(&self) -> Option<Span> {
        match self {
            SpecError::InvalidSyntax { span }
            | SpecError::Ambiguous { span, .. }
            | SpecError::UnparsedRemainder { span, .. }
            | SpecError::UnterminatedBlock { span, .. }
            | SpecError::NestingTooDeep { span, .. }
            | SpecError::RepeatedNormFlag { span, .. }
            | SpecError::UnknownNormFlag { span, .. }
            | SpecError::ConflictingNormFlags { span, .. }
            | SpecError::InvalidMode { span, .. }
            | SpecError::UnknownOperation { span, .. } => *span,
            SpecError::DanglingValue { .. }
            | SpecError::KeywordEval { .. }
            | SpecError::Registration { .. } => None,
        }
    }

    /// Convert into a [`Diagnostic`] carrying the code, span and
    /// machine-readable context.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code(), self.to_string(), self.span());
        match self {
            SpecError::Ambiguous { text, .. } => diag.with_context(ctx!("text" => text.as_str())),
            SpecError::UnparsedRemainder { remainder, .. } => {
                diag.with_context(ctx!("remainder" => remainder.as_str()))
            }
            SpecError::UnterminatedBlock { expected, .. } => {
                diag.with_context(ctx!("expected" => expected.to_string()))
            }
            SpecError::NestingTooDeep { limit, .. } => {
                diag.with_context(ctx!("limit" => limit.to_string()))
            }
            SpecError::DanglingValue { token } => {
                diag.with_context(ctx!("token" => token.as_str()))
            }
            SpecError::KeywordEval { fragment, reason } => diag.with_context(ctx!(
                "fragment" => fragment.as_str(),
                "reason" => reason.as_str(),
            )),
            SpecError::RepeatedNormFlag { flag, .. } | SpecError::UnknownNormFlag { flag, .. } => {
                diag.with_context(ctx!("flag" => flag.as_str()))
            }
            SpecError::ConflictingNormFlags { first, second, .. } => {
                diag.with_context(ctx!("first" => *first, "second" => *second))
            }
            SpecError::InvalidMode { mode, .. } => {
                diag.with_context(ctx!("mode" => mode.as_str(), "expected" => "data|display"))
            }
            SpecError::UnknownOperation { operation, .. } => {
                diag.with_context(ctx!("operation" => operation.as_str()))
            }
            SpecError::Registration { value, reason } => diag.with_context(ctx!(
                "value" => value.as_str(),
                "reason" => reason.as_str(),
            )),
            SpecError::InvalidSyntax { .. } => diag,
        }
    }
}
