//! Keyword blocks → mapping: token collection, keyword grouping, evaluation.
//!
//! A block like `(color='r', lw=2 size=(3, 4))` scans to the words
//! `color='r',`, `lw=2`, `size=` and a nested group `3, 4`. Collection folds
//! the nested group back onto `size=` as `(3,4)` and strips separators;
//! grouping starts one fragment per `key=value` token and glues value
//! continuations onto the previous fragment; evaluation turns each fragment
//! into keyword arguments.

use std::collections::BTreeMap;

use super::lexer::Tree;
use super::literal::eval_keywords;
use crate::error::SpecError;
use crate::namespace::Namespace;
use crate::value::Value;

/// How nested groups are re-serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestStyle {
    /// Wrap nested groups as `(...)`.
    Parens,
    /// Wrap nested groups as `[...]`.
    Brackets,
}

impl NestStyle {
    fn wrap(self, inner: &str) -> String {
        match self {
            NestStyle::Parens => format!("({inner})"),
            NestStyle::Brackets => format!("[{inner}]"),
        }
    }
}

/// First pass: one piece per child, nested groups already serialized.
enum Piece<'a> {
    Word(&'a str),
    Nested(String),
}

fn serialize_nested(items: &[Tree], style: NestStyle) -> String {
    let inner: String = items
        .iter()
        .map(|t| match t {
            Tree::Word { text, .. } => text.clone(),
            Tree::Group { items, .. } => serialize_nested(items, style),
        })
        .collect();
    style.wrap(&inner)
}

/// A block's words as written, nested groups re-serialized in place. No
/// separator stripping and no attaching.
pub fn raw_tokens(items: &[Tree], style: NestStyle) -> Vec<String> {
    items
        .iter()
        .map(|t| match t {
            Tree::Word { text, .. } => text.clone(),
            Tree::Group { items, .. } => serialize_nested(items, style),
        })
        .collect()
}

/// Strip one trailing and then one leading `,`.
fn strip_commas(token: &str) -> &str {
    let token = token.strip_suffix(',').unwrap_or(token);
    token.strip_prefix(',').unwrap_or(token)
}

/// Flatten a block's nested parse result into cleaned string tokens.
///
/// A nested group is attached to the previously emitted token (it continues
/// that token's value); with no previous token it becomes a token of its own.
/// A lone `,` is dropped and every other word loses one leading and one
/// trailing `,`. `None` yields no tokens.
pub fn collect_tokens(result: Option<&[Tree]>, style: NestStyle) -> Vec<String> {
    let Some(items) = result else {
        return Vec::new();
    };

    let pieces = items.iter().map(|t| match t {
        Tree::Word { text, .. } => Piece::Word(text),
        Tree::Group { items, .. } => Piece::Nested(serialize_nested(items, style)),
    });

    let mut tokens: Vec<String> = Vec::new();
    for piece in pieces {
        match piece {
            Piece::Nested(text) => match tokens.last_mut() {
                Some(prev) => prev.push_str(&text),
                None => tokens.push(text),
            },
            Piece::Word(word) => {
                if word.trim() == "," {
                    continue;
                }
                let cleaned = strip_commas(word);
                if !cleaned.is_empty() {
                    tokens.push(cleaned.to_string());
                }
            }
        }
    }
    tokens
}

/// Group tokens into keyword fragments.
///
/// Each token containing `=` starts a fragment; runs of tokens without `=` are
/// concatenated onto the preceding fragment. A continuation with no preceding
/// fragment is an error.
pub fn group_keywords(tokens: &[String]) -> Result<Vec<String>, SpecError> {
    let mut grouped: Vec<String> = Vec::new();
    for token in tokens {
        if token.contains('=') {
            grouped.push(token.clone());
        } else {
            match grouped.last_mut() {
                Some(prev) => prev.push_str(token),
                None => {
                    return Err(SpecError::DanglingValue {
                        token: token.clone(),
                    });
                }
            }
        }
    }
    Ok(grouped)
}

/// Evaluate fragments and merge them into one mapping. Later fragments win on
/// key collisions.
pub fn evaluate_fragments(
    fragments: &[String],
    namespace: &Namespace,
) -> Result<BTreeMap<String, Value>, SpecError> {
    let mut kwargs = BTreeMap::new();
    for fragment in fragments {
        let parsed = eval_keywords(fragment, namespace).map_err(|e| SpecError::KeywordEval {
            fragment: fragment.clone(),
            reason: e.to_string(),
        })?;
        kwargs.extend(parsed);
    }
    Ok(kwargs)
}

/// Collect, group and evaluate a keyword block in one step.
pub fn to_dict(
    result: Option<&[Tree]>,
    style: NestStyle,
    namespace: &Namespace,
) -> Result<BTreeMap<String, Value>, SpecError> {
    let tokens = collect_tokens(result, style);
    tracing::trace!(?tokens, "collected keyword tokens");
    let fragments = group_keywords(&tokens)?;
    evaluate_fragments(&fragments, namespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::lexer::{BRACKETS, Cursor, Delim, PARENS, scan_block};

    fn items(src: &str, delim: Delim) -> Vec<Tree> {
        scan_block(&mut Cursor::new(src), delim).unwrap().unwrap().items
    }

    fn tokens(src: &str, delim: Delim, style: NestStyle) -> Vec<String> {
        collect_tokens(Some(&items(src, delim)), style)
    }

    #[test]
    fn none_yields_no_tokens() {
        assert!(collect_tokens(None, NestStyle::Parens).is_empty());
    }

    #[test]
    fn strips_separators() {
        assert_eq!(
            tokens("(a=1, b=2 , ,c=3,)", PARENS, NestStyle::Parens),
            vec!["a=1", "b=2", "c=3"]
        );
    }

    #[test]
    fn nested_group_attaches_to_previous_token() {
        assert_eq!(
            tokens("(a=(1, 2) b=((1,2),(3,4)))", PARENS, NestStyle::Parens),
            vec!["a=(1,2)", "b=((1,2),(3,4))"]
        );
        assert_eq!(
            tokens("[a=[1, 2]]", BRACKETS, NestStyle::Brackets),
            vec!["a=[1,2]"]
        );
    }

    #[test]
    fn leading_nested_group_stands_alone() {
        assert_eq!(tokens("((1, 2))", PARENS, NestStyle::Parens), vec!["(1,2)"]);
    }

    #[test]
    fn raw_tokens_keep_separators() {
        assert_eq!(
            raw_tokens(&items("(A * (B, C),)", PARENS), NestStyle::Parens),
            vec!["A", "*", "(B,C)", ","]
        );
    }

    #[test]
    fn grouping_appends_continuations() {
        let toks: Vec<String> = ["a=", "3", "b=1", "c='x", "y'"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            group_keywords(&toks).unwrap(),
            vec!["a=3", "b=1", "c='xy'"]
        );
    }

    #[test]
    fn grouping_rejects_leading_continuation() {
        let toks = vec!["1".to_string(), "a=2".to_string()];
        assert_eq!(
            group_keywords(&toks).unwrap_err(),
            SpecError::DanglingValue { token: "1".into() }
        );
    }

    #[test]
    fn to_dict_merges_fragments_last_wins() {
        let ns = Namespace::default();
        let block = items("(a=1 b=(1, 2), a=3)", PARENS);
        let map = to_dict(Some(&block), NestStyle::Parens, &ns).unwrap();
        assert_eq!(map["a"], Value::Int(3));
        assert_eq!(map["b"], Value::Tuple(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn to_dict_names_failing_fragment() {
        let ns = Namespace::default();
        let block = items("(a=1 b=os.system)", PARENS);
        match to_dict(Some(&block), NestStyle::Parens, &ns).unwrap_err() {
            SpecError::KeywordEval { fragment, .. } => assert_eq!(fragment, "b=os.system"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
