/// Block scanning: cursor, delimited blocks, word shapes.
pub mod lexer;
/// Token collection, keyword grouping and fragment evaluation.
pub mod collect;
/// Restricted literal evaluator for keyword fragments.
pub mod literal;
/// Whole-line group matching with remainder checks.
pub mod scan;
/// Options specification grammar and normalization flags.
pub mod options;
/// Compositor definition grammar.
pub mod compositor;
/// Canonical re-serialization of parse results.
pub mod emit;
