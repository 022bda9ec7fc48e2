//! Integration tests for the options specification grammar.

mod common;

use common::{opts, opts_err, options};
use plotspec_core::{Normalization, OptionRecord, SpecError, Value};
use std::collections::BTreeMap;

fn style(line: &str, path: &str) -> BTreeMap<String, Value> {
    let spec = opts(line);
    let record = spec
        .get(path)
        .unwrap_or_else(|| panic!("no record for {path} in {spec:?}"));
    record
        .style
        .as_ref()
        .unwrap_or_else(|| panic!("no style options for {path}"))
        .settings()
        .clone()
}

// ── Single groups ───────────────────────────────────────────────────────

#[test]
fn style_block_evaluates_literally() {
    let cases: &[(&str, Value)] = &[
        ("Image (a=1)", Value::Int(1)),
        ("Image (a=-2.5)", Value::Float(-2.5)),
        ("Image (a='gray')", Value::Str("gray".into())),
        ("Image (a=\"two words\")", Value::Str("two words".into())),
        ("Image (a=True)", Value::Bool(true)),
        ("Image (a=None)", Value::None),
        ("Image (a=[1, 2])", Value::List(vec![Value::Int(1), Value::Int(2)])),
        ("Image (a=(1, 2))", Value::Tuple(vec![Value::Int(1), Value::Int(2)])),
        ("Image (a=red)", Value::Str("#ff0000".into())),
    ];
    for (line, expected) in cases {
        assert_eq!(style(line, "Image")["a"], *expected, "line {line:?}");
    }
}

#[test]
fn dotted_paths() {
    let spec = opts("Image.Channel.Red (a=1) Curve.A_1 [b=2]");
    assert_eq!(
        spec.keys().collect::<Vec<_>>(),
        vec!["Curve.A_1", "Image.Channel.Red"]
    );
}

#[test]
fn all_three_blocks() {
    let spec = opts("Image [size=5 aspect='equal'] (cmap='gray' alpha=0.5) {-groupwise}");
    let record = &spec["Image"];
    assert_eq!(
        record.plot,
        Some(options([
            ("size", Value::Int(5)),
            ("aspect", Value::Str("equal".into()))
        ]))
    );
    assert_eq!(
        record.style,
        Some(options([
            ("cmap", Value::Str("gray".into())),
            ("alpha", Value::Float(0.5))
        ]))
    );
    assert_eq!(
        record.norm,
        Some(
            Normalization {
                groupwise: false,
                mapwise: true
            }
            .to_options()
        )
    );
}

#[test]
fn long_and_short_forms_are_equivalent() {
    let short = opts("Image [size=5] (cmap='gray') {+mapwise -groupwise}");
    let long = opts("Image plot(size=5) style(cmap='gray') norm(+mapwise -groupwise)");
    assert_eq!(short, long);
}

#[test]
fn mixed_forms_in_any_order() {
    let a = opts("Image style(alpha=0.1) [size=5]");
    let b = opts("Image plot(size=5) (alpha=0.1)");
    assert_eq!(a, b);
}

#[test]
fn values_split_across_tokens_reassemble() {
    let s = style("Image (a=(1, 2) b=((1, 2), (3, 4)) c=dict(x=1, y=(2,)))", "Image");
    assert_eq!(s["a"], Value::Tuple(vec![Value::Int(1), Value::Int(2)]));
    assert_eq!(
        s["b"],
        Value::Tuple(vec![
            Value::Tuple(vec![Value::Int(1), Value::Int(2)]),
            Value::Tuple(vec![Value::Int(3), Value::Int(4)]),
        ])
    );
    assert_eq!(
        s["c"],
        Value::Dict(BTreeMap::from([
            ("x".to_string(), Value::Int(1)),
            ("y".to_string(), Value::Tuple(vec![Value::Int(2)])),
        ]))
    );
}

#[test]
fn nested_lists_in_plot_block() {
    let spec = opts("Image [ticks=[1, [2, 3]] size=(3, 4)]");
    let plot = spec["Image"].plot.as_ref().unwrap();
    assert_eq!(
        plot.get("ticks"),
        Some(&Value::List(vec![
            Value::Int(1),
            Value::List(vec![Value::Int(2), Value::Int(3)]),
        ]))
    );
    assert_eq!(
        plot.get("size"),
        Some(&Value::Tuple(vec![Value::Int(3), Value::Int(4)]))
    );
}

#[test]
fn quoted_delimiters_are_literal() {
    let s = style("Image (title='a (b) ] c')", "Image");
    assert_eq!(s["title"], Value::Str("a (b) ] c".into()));
}

#[test]
fn allowed_constructors() {
    let s = style("Curve (color=Cycle(['r', 'g']) dim=Dimension('x'))", "Curve");
    assert!(matches!(&s["color"], Value::Call { name, .. } if name == "Cycle"));
    assert!(matches!(&s["dim"], Value::Call { name, .. } if name == "Dimension"));
}

#[test]
fn empty_blocks() {
    let spec = opts("Image () [] {}");
    assert_eq!(
        spec["Image"],
        OptionRecord {
            norm: None,
            plot: Some(Default::default()),
            style: Some(Default::default()),
        }
    );
}

// ── Path-specs from the registry ────────────────────────────────────────

#[test]
fn derived_names_are_path_specs() {
    let spec = opts("rgb_stack (a=1) rgb [b=2]");
    assert!(spec.contains_key("rgb_stack"));
    assert!(spec.contains_key("rgb"));
}

// ── Multiple groups ─────────────────────────────────────────────────────

#[test]
fn last_group_wins() {
    let spec = opts("Image (a=1) Image (a=2)");
    assert_eq!(spec.len(), 1);
    assert_eq!(spec["Image"].style, Some(options([("a", Value::Int(2))])));
}

#[test]
fn repeated_path_replaces_without_merging() {
    let spec = opts("Image [size=5] Image (a=2)");
    assert_eq!(spec["Image"].plot, None);
}

// ── Errors ──────────────────────────────────────────────────────────────

#[test]
fn unparsed_remainder_is_named() {
    let err = opts_err("Image (a=1) extra garbage");
    assert!(matches!(&err, SpecError::UnparsedRemainder { remainder, .. } if remainder == "extra garbage"));
    assert!(err.to_string().contains("extra garbage"));
}

#[test]
fn remainder_containing_a_group_is_ambiguous() {
    let err = opts_err("Image (a=1) 42 Curve (b=2)");
    assert!(matches!(err, SpecError::Ambiguous { text, .. } if text == "Curve (b=2)"));
}

#[test]
fn line_must_start_with_path() {
    assert!(matches!(opts_err("(a=1)"), SpecError::InvalidSyntax { .. }));
    assert!(matches!(opts_err("image (a=1)"), SpecError::InvalidSyntax { .. }));
    assert!(matches!(opts_err(""), SpecError::InvalidSyntax { .. }));
}

#[test]
fn unterminated_block() {
    assert!(matches!(
        opts_err("Image (a=1"),
        SpecError::UnterminatedBlock { expected: ')', .. }
    ));
    assert!(matches!(
        opts_err("Image [a=(1, 2]"),
        SpecError::UnterminatedBlock { .. }
    ));
}

#[test]
fn dangling_value() {
    assert!(matches!(
        opts_err("Image (1 a=2)"),
        SpecError::DanglingValue { token } if token == "1"
    ));
}

#[test]
fn evaluation_errors_name_the_fragment() {
    for (line, fragment) in [
        ("Image (a=open('x'))", "a=open('x')"),
        ("Image (a=undefined_name)", "a=undefined_name"),
        ("Image (a=1 b=)", "b="),
        ("Image (a=1+2)", "a=1+2"),
    ] {
        match opts_err(line) {
            SpecError::KeywordEval { fragment: got, .. } => assert_eq!(got, fragment, "{line}"),
            other => panic!("{line}: unexpected error {other:?}"),
        }
    }
}

#[test]
fn normalization_errors() {
    assert!(matches!(
        opts_err("Image {+mapwise -mapwise}"),
        SpecError::ConflictingNormFlags { first: "+mapwise", second: "-mapwise", .. }
    ));
    assert!(matches!(
        opts_err("Image {+mapwise +mapwise}"),
        SpecError::RepeatedNormFlag { flag, .. } if flag == "+mapwise"
    ));
    assert!(matches!(
        opts_err("Image {bogus}"),
        SpecError::UnknownNormFlag { flag, .. } if flag == "bogus"
    ));
    // Flags are whitespace-separated; a comma is part of the token.
    assert!(matches!(
        opts_err("Image {+mapwise, -groupwise}"),
        SpecError::UnknownNormFlag { flag, .. } if flag == "+mapwise,"
    ));
}

#[test]
fn first_error_aborts() {
    // The second group is fine; the first group's error is reported.
    assert!(matches!(
        opts_err("Image {bogus} Curve (a=1)"),
        SpecError::UnknownNormFlag { .. }
    ));
}
