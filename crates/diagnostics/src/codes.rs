//! Diagnostic ID constants.
//!
//! Use these instead of string literals to get compile-time typo detection
//! and IDE autocomplete. The numbering groups codes by stage:
//! `SPEC1xxx` grammar, `SPEC2xxx` keyword evaluation, `SPEC3xxx` semantic
//! validation, `SPEC4xxx` registry configuration.

/// The line does not start with a recognizable group.
pub const INVALID_SYNTAX: &str = "SPEC1001";
/// More than one independent top-level match was found.
pub const AMBIGUOUS_SPEC: &str = "SPEC1002";
/// Text remains after the last matched group.
pub const UNPARSED_REMAINDER: &str = "SPEC1003";
/// A delimited block was opened but never closed.
pub const UNTERMINATED_BLOCK: &str = "SPEC1004";
/// Blocks are nested deeper than the parser allows.
pub const NESTING_TOO_DEEP: &str = "SPEC1005";

/// A value continuation appeared before any `key=value` token.
pub const DANGLING_VALUE: &str = "SPEC2001";
/// A keyword fragment could not be evaluated as a literal argument list.
pub const KEYWORD_EVAL: &str = "SPEC2002";

/// A normalization flag was given more than once.
pub const REPEATED_NORM_FLAG: &str = "SPEC3001";
/// A normalization token is not one of the recognized flags.
pub const UNKNOWN_NORM_FLAG: &str = "SPEC3002";
/// Both signs of the same normalization flag were given.
pub const CONFLICTING_NORM_FLAGS: &str = "SPEC3003";
/// Compositor mode is neither `data` nor `display`.
pub const INVALID_MODE: &str = "SPEC3101";
/// Compositor operation name is not in the operation table.
pub const UNKNOWN_OPERATION: &str = "SPEC3102";

/// The operation registry file could not be loaded.
pub const REGISTRY_INVALID: &str = "SPEC4001";
/// A parsed compositor definition could not be registered.
pub const REGISTRATION_FAILED: &str = "SPEC4002";
