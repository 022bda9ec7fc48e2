//! Options specification grammar.
//!
//! ```text
//! line  = group+
//! group = path-spec (norm? & plot? & style?)
//! plot  = "[" kw* "]"  | "plot(" kw* ")"
//! style = "(" kw* ")"  | "style(" kw* ")"
//! norm  = "{" flag* "}" | "norm(" flag* ")"
//! ```
//!
//! A path-spec is a dotted path starting with a capital letter, or the value
//! name of a registered compositor definition. The blocks may appear in any
//! order, each at most once per group.

use std::collections::BTreeMap;

use plotspec_diagnostics::Span;
use plotspec_registry::Registry;
use serde::Serialize;

use super::collect::{NestStyle, raw_tokens, to_dict};
use super::lexer::{
    BRACES, BRACKETS, Block, Cursor, Delim, PARENS, scan_block, scan_dotted_path,
    scan_keyword_block, scan_literal_name,
};
use super::scan::match_line;
use crate::error::SpecError;
use crate::namespace::Namespace;
use crate::value::{Options, Value};

/// The four recognized normalization flags.
pub const NORM_FLAGS: [&str; 4] = ["+mapwise", "-mapwise", "+groupwise", "-groupwise"];

const EXCLUSIVE_FLAGS: [(&str, &str); 2] = [("+mapwise", "-mapwise"), ("+groupwise", "-groupwise")];

/// Resolved normalization settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Normalization {
    /// Normalize across the whole group of elements.
    pub groupwise: bool,
    /// Normalize across the frames of a map.
    pub mapwise: bool,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            groupwise: true,
            mapwise: true,
        }
    }
}

impl Normalization {
    /// The options object stored under `norm`.
    pub fn to_options(self) -> Options {
        [
            ("groupwise", Value::Bool(self.groupwise)),
            ("mapwise", Value::Bool(self.mapwise)),
        ]
        .into_iter()
        .collect()
    }

    /// Read settings back from a `norm` options object. Missing or
    /// non-boolean entries take their default.
    pub fn from_options(options: &Options) -> Self {
        let flag = |key| match options.get(key) {
            Some(Value::Bool(b)) => *b,
            _ => true,
        };
        Self {
            groupwise: flag("groupwise"),
            mapwise: flag("mapwise"),
        }
    }
}

/// Validate normalization flags and reduce them to a [`Normalization`].
///
/// `None` or an empty list yields `None`. Checks run in order: repeated
/// flag, unknown token, both signs of one flag. A family that is not
/// mentioned defaults to `true`.
pub fn process_normalization(
    tokens: Option<&[String]>,
) -> Result<Option<Normalization>, SpecError> {
    resolve_normalization(tokens, None)
}

fn resolve_normalization(
    tokens: Option<&[String]>,
    span: Option<Span>,
) -> Result<Option<Normalization>, SpecError> {
    let Some(tokens) = tokens.filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let has = |flag: &str| tokens.iter().any(|t| t == flag);

    for flag in NORM_FLAGS {
        if tokens.iter().filter(|t| *t == flag).count() > 1 {
            return Err(SpecError::RepeatedNormFlag {
                flag: flag.to_string(),
                span,
            });
        }
    }
    if let Some(unknown) = tokens.iter().find(|t| !NORM_FLAGS.contains(&t.as_str())) {
        return Err(SpecError::UnknownNormFlag {
            flag: unknown.clone(),
            span,
        });
    }
    for (first, second) in EXCLUSIVE_FLAGS {
        if has(first) && has(second) {
            return Err(SpecError::ConflictingNormFlags {
                first,
                second,
                span,
            });
        }
    }

    let family = |name: &str, plus: &str| {
        if tokens.iter().any(|t| t.ends_with(name)) {
            has(plus)
        } else {
            true
        }
    };
    Ok(Some(Normalization {
        groupwise: family("groupwise", "+groupwise"),
        mapwise: family("mapwise", "+mapwise"),
    }))
}

/// Options assigned to one path-spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptionRecord {
    /// Normalization settings (`groupwise`, `mapwise`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub norm: Option<Options>,
    /// Plot options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot: Option<Options>,
    /// Style options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Options>,
}

/// Parsed options line: path-spec → options.
pub type OptionsSpec = BTreeMap<String, OptionRecord>;

/// One matched group before evaluation.
#[derive(Debug)]
struct RawGroup {
    path: String,
    span: Span,
    norm: Option<Block>,
    plot: Option<Block>,
    style: Option<Block>,
}

/// Short-form delimiter and long-form keyword of each block kind.
const PLOT: (Delim, &str) = (BRACKETS, "plot");
const STYLE: (Delim, &str) = (PARENS, "style");
const NORM: (Delim, &str) = (BRACES, "norm");

fn scan_options_block(
    cur: &mut Cursor<'_>,
    (delim, keyword): (Delim, &str),
) -> Result<Option<Block>, SpecError> {
    if let Some(block) = scan_keyword_block(cur, keyword)? {
        return Ok(Some(block));
    }
    scan_block(cur, delim)
}

fn match_group(cur: &mut Cursor<'_>, derived: &[String]) -> Result<Option<RawGroup>, SpecError> {
    let Some((path, span)) = scan_dotted_path(cur).or_else(|| scan_literal_name(cur, derived))
    else {
        return Ok(None);
    };
    let mut group = RawGroup {
        path,
        span,
        norm: None,
        plot: None,
        style: None,
    };

    loop {
        let mark = cur.pos();
        cur.skip_ws();
        if group.plot.is_none()
            && let Some(block) = scan_options_block(cur, PLOT)?
        {
            group.plot = Some(block);
        } else if group.style.is_none()
            && let Some(block) = scan_options_block(cur, STYLE)?
        {
            group.style = Some(block);
        } else if group.norm.is_none()
            && let Some(block) = scan_options_block(cur, NORM)?
        {
            group.norm = Some(block);
        } else {
            cur.reset(mark);
            return Ok(Some(group));
        }
    }
}

fn nest_style(block: &Block) -> NestStyle {
    if block.delim == BRACKETS {
        NestStyle::Brackets
    } else {
        NestStyle::Parens
    }
}

fn block_options(block: &Block, namespace: &Namespace) -> Result<Options, SpecError> {
    to_dict(Some(&block.items), nest_style(block), namespace).map(Options::new)
}

/// Options-line parser bound to a registry and an evaluation namespace.
pub struct OptsSpec<'r> {
    registry: &'r dyn Registry,
    namespace: Namespace,
}

impl<'r> OptsSpec<'r> {
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

    /// The namespace keyword values are evaluated in.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Parse one options line.
    ///
    /// Derived names come from one registry snapshot per call. When the same
    /// path-spec appears twice, the later group replaces the earlier one.
    pub fn parse(&self, line: &str) -> Result<OptionsSpec, SpecError> {
        let derived = self.registry.snapshot().derived_names();
        let groups = match_line(line, |cur| match_group(cur, &derived))?;

        let mut spec = OptionsSpec::new();
        for group in groups {
            let norm_tokens = group
                .norm
                .as_ref()
                .map(|b| raw_tokens(&b.items, NestStyle::Parens));
            let norm = resolve_normalization(
                norm_tokens.as_deref(),
                group.norm.as_ref().map(|b| b.span),
            )?;
            let record = OptionRecord {
                norm: norm.map(Normalization::to_options),
                plot: group
                    .plot
                    .as_ref()
                    .map(|b| block_options(b, &self.namespace))
                    .transpose()?,
                style: group
                    .style
                    .as_ref()
                    .map(|b| block_options(b, &self.namespace))
                    .transpose()?,
            };
            tracing::debug!(
                path = %group.path,
                start = group.span.start,
                plot = record.plot.as_ref().map_or(0, Options::len),
                style = record.style.as_ref().map_or(0, Options::len),
                norm = record.norm.is_some(),
                "parsed options group"
            );
            if spec.insert(group.path.clone(), record).is_some() {
                tracing::debug!(path = %group.path, "path repeated; later group replaces earlier");
            }
        }
        Ok(spec)
    }
}

/// Parse an options line against `registry` with the default namespace.
pub fn parse_options(line: &str, registry: &dyn Registry) -> Result<OptionsSpec, SpecError> {
    OptsSpec::new(registry).parse(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotspec_registry::{DerivedDefinition, Mode, Operation, OperationTable};

    fn flags(tokens: &[&str]) -> Result<Option<Normalization>, SpecError> {
        let owned: Vec<String> = tokens.iter().map(|s| s.to_string()).collect();
        process_normalization(Some(&owned))
    }

    fn norm(groupwise: bool, mapwise: bool) -> Option<Normalization> {
        Some(Normalization { groupwise, mapwise })
    }

    #[test]
    fn normalization_defaults() {
        assert_eq!(process_normalization(None).unwrap(), None);
        assert_eq!(flags(&[]).unwrap(), None);
        assert_eq!(flags(&["-mapwise"]).unwrap(), norm(true, false));
        assert_eq!(flags(&["+mapwise"]).unwrap(), norm(true, true));
        assert_eq!(flags(&["-groupwise"]).unwrap(), norm(false, true));
        assert_eq!(flags(&["+groupwise", "-mapwise"]).unwrap(), norm(true, false));
        assert_eq!(flags(&["-groupwise", "-mapwise"]).unwrap(), norm(false, false));
    }

    #[test]
    fn normalization_check_order() {
        // Repeated is reported before the unknown token.
        assert!(matches!(
            flags(&["bogus", "+mapwise", "+mapwise"]).unwrap_err(),
            SpecError::RepeatedNormFlag { flag, .. } if flag == "+mapwise"
        ));
        assert!(matches!(
            flags(&["+mapwise", "-mapwise", "bogus"]).unwrap_err(),
            SpecError::UnknownNormFlag { flag, .. } if flag == "bogus"
        ));
        assert!(matches!(
            flags(&["-groupwise", "+groupwise"]).unwrap_err(),
            SpecError::ConflictingNormFlags {
                first: "+groupwise",
                second: "-groupwise",
                ..
            }
        ));
    }

    #[test]
    fn normalization_round_trips_through_options() {
        let n = Normalization {
            groupwise: false,
            mapwise: true,
        };
        assert_eq!(Normalization::from_options(&n.to_options()), n);
    }

    fn table() -> OperationTable {
        OperationTable::new(
            vec![Operation::new("toRGB")],
            vec![DerivedDefinition {
                value: "composite".into(),
                operation: "toRGB".into(),
                mode: Mode::Data,
                overlay_spec: "Image * Image".into(),
            }],
        )
    }

    #[test]
    fn blocks_in_any_order() {
        let reg = table();
        let a = parse_options("Image {+mapwise} (cmap='gray') [size=5]", &reg).unwrap();
        let b = parse_options("Image [size=5] {+mapwise} (cmap='gray')", &reg).unwrap();
        assert_eq!(a, b);
        assert_eq!(a["Image"].plot.as_ref().unwrap().get("size"), Some(&Value::Int(5)));
    }

    #[test]
    fn block_given_twice_ends_the_group() {
        let err = parse_options("Image [a=1] [b=2]", &table()).unwrap_err();
        assert!(matches!(
            err,
            SpecError::UnparsedRemainder { remainder, .. } if remainder == "[b=2]"
        ));
    }

    #[test]
    fn path_without_blocks_is_empty_record() {
        let spec = parse_options("Curve", &table()).unwrap();
        assert_eq!(spec["Curve"], OptionRecord::default());
    }

    #[test]
    fn derived_name_is_path_spec() {
        let spec = parse_options("composite [a=1]", &table()).unwrap();
        assert!(spec.contains_key("composite"));
        assert!(matches!(
            parse_options("compositex [a=1]", &table()).unwrap_err(),
            SpecError::InvalidSyntax { .. }
        ));
    }

    #[test]
    fn norm_errors_carry_block_span() {
        let err = parse_options("Image {+mapwise +mapwise}", &table()).unwrap_err();
        assert_eq!(err.span(), Some(Span::new(6, 25)));
    }
}
