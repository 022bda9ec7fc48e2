//! Character-level scanning: a cursor over the line, delimited blocks with
//! nested groups, and the word shapes both grammars are built from.
//!
//! Inside a block, words are whitespace-separated runs of characters. Only the
//! block's own opener/closer characters create nested groups; other bracket
//! kinds are balanced inside the word (so `[1, 2]` inside `( )` stays one
//! word), and quoted strings are consumed whole.

use plotspec_diagnostics::Span;

use crate::error::SpecError;

/// A pair of block delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delim {
    /// Opening character.
    pub open: char,
    /// Closing character.
    pub close: char,
}

/// `( )`
pub const PARENS: Delim = Delim {
    open: '(',
    close: ')',
};
/// `[ ]`
pub const BRACKETS: Delim = Delim {
    open: '[',
    close: ']',
};
/// `{ }`
pub const BRACES: Delim = Delim {
    open: '{',
    close: '}',
};

/// Deepest nesting of groups, and of containers inside a keyword value,
/// that a line may use.
pub const MAX_NESTING: usize = 256;

/// One element of a block's nested parse result.
#[derive(Debug, Clone, PartialEq)]
pub enum Tree {
    /// A run of non-whitespace characters.
    Word {
        /// The word as written.
        text: String,
        /// Location in the line.
        span: Span,
    },
    /// A nested group delimited by the enclosing block's delimiters.
    Group {
        /// Children in source order.
        items: Vec<Tree>,
        /// Location in the line, delimiters included.
        span: Span,
    },
}

/// A delimited block: `(…)`, `[…]`, `{…}` or a long `word(…)` form.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Delimiters that bound the block and its nested groups.
    pub delim: Delim,
    /// Top-level children.
    pub items: Vec<Tree>,
    /// Location in the line, delimiters (and long-form keyword) included.
    pub span: Span,
}

/// Byte cursor over a line.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Start at byte 0 of `src`.
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Start at byte `pos` of `src`. `pos` must be a char boundary.
    pub fn at(src: &'a str, pos: usize) -> Self {
        Self { src, pos }
    }

    /// Current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Move back to an earlier position.
    pub fn reset(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// The whole source line.
    pub fn src(&self) -> &'a str {
        self.src
    }

    /// Unconsumed input.
    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Whether all input has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// Next character without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skip whitespace.
    pub fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    /// Consume `s` if the input continues with it.
    pub fn eat_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Consume the longest prefix whose characters satisfy `pred`.
    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.src[start..self.pos]
    }
}

/// `[A-Za-z0-9_]`
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// `[A-Za-z0-9._]`
pub fn is_path_char(c: char) -> bool {
    is_word_char(c) || c == '.'
}

/// Match a compositor word (`[A-Za-z0-9_]+`).
pub fn scan_ident(cur: &mut Cursor<'_>) -> Option<(String, Span)> {
    let start = cur.pos();
    let word = cur.take_while(is_word_char);
    if word.is_empty() {
        return None;
    }
    Some((word.to_string(), Span::new(start, cur.pos())))
}

/// Match a dotted type path: one ASCII capital followed by at least one
/// character of `[A-Za-z0-9._]`.
pub fn scan_dotted_path(cur: &mut Cursor<'_>) -> Option<(String, Span)> {
    let start = cur.pos();
    if !cur.peek().is_some_and(|c| c.is_ascii_uppercase()) {
        return None;
    }
    cur.bump();
    let tail = cur.take_while(is_path_char);
    if tail.is_empty() {
        cur.reset(start);
        return None;
    }
    Some((cur.src()[start..cur.pos()].to_string(), Span::new(start, cur.pos())))
}

/// Match one of `names` literally, ending at a path-character boundary.
/// The longest matching name wins.
pub fn scan_literal_name(cur: &mut Cursor<'_>, names: &[String]) -> Option<(String, Span)> {
    let start = cur.pos();
    let rest = cur.rest();
    let best = names
        .iter()
        .filter(|n| !n.is_empty() && rest.starts_with(n.as_str()))
        .filter(|n| !rest[n.len()..].starts_with(is_path_char))
        .max_by_key(|n| n.len())?;
    cur.reset(start + best.len());
    Some((best.clone(), Span::new(start, cur.pos())))
}

/// Scan a block opened by `delim.open` at the cursor.
///
/// Returns `Ok(None)` without consuming anything when the cursor is not at the
/// opener. A block that reaches the end of the line unclosed is an error.
pub fn scan_block(cur: &mut Cursor<'_>, delim: Delim) -> Result<Option<Block>, SpecError> {
    let start = cur.pos();
    if cur.peek() != Some(delim.open) {
        return Ok(None);
    }
    let (items, span) = scan_group(cur, delim, 1)?;
    debug_assert_eq!(span.start, start);
    Ok(Some(Block { delim, items, span }))
}

/// Scan a long-form block `keyword(…)`. The keyword must be immediately
/// followed by `(`.
pub fn scan_keyword_block(cur: &mut Cursor<'_>, keyword: &str) -> Result<Option<Block>, SpecError> {
    let start = cur.pos();
    if !cur.rest().starts_with(keyword) || !cur.rest()[keyword.len()..].starts_with('(') {
        return Ok(None);
    }
    cur.eat_str(keyword);
    let (items, span) = scan_group(cur, PARENS, 1)?;
    Ok(Some(Block {
        delim: PARENS,
        items,
        span: Span::new(start, span.end),
    }))
}

fn scan_group(
    cur: &mut Cursor<'_>,
    delim: Delim,
    depth: usize,
) -> Result<(Vec<Tree>, Span), SpecError> {
    let start = cur.pos();
    if depth > MAX_NESTING {
        return Err(SpecError::NestingTooDeep {
            limit: MAX_NESTING,
            span: Some(Span::new(start, start + delim.open.len_utf8())),
        });
    }
    cur.bump();
    let mut items = Vec::new();
    loop {
        cur.skip_ws();
        match cur.peek() {
            None => {
                return Err(SpecError::UnterminatedBlock {
                    expected: delim.close,
                    span: Some(Span::new(start, cur.src().len())),
                });
            }
            Some(c) if c == delim.close => {
                cur.bump();
                return Ok((items, Span::new(start, cur.pos())));
            }
            Some(c) if c == delim.open => {
                let (nested, span) = scan_group(cur, delim, depth + 1)?;
                items.push(Tree::Group {
                    items: nested,
                    span,
                });
            }
            Some(_) => items.push(scan_word(cur, delim)?),
        }
    }
}

fn closer_for(open: char) -> Option<char> {
    match open {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        _ => None,
    }
}

fn scan_word(cur: &mut Cursor<'_>, delim: Delim) -> Result<Tree, SpecError> {
    let start = cur.pos();
    // Closers of foreign brackets opened inside this word.
    let mut pending: Vec<char> = Vec::new();
    while let Some(c) = cur.peek() {
        if pending.is_empty() && (c.is_whitespace() || c == delim.open || c == delim.close) {
            break;
        }
        if c == '\'' || c == '"' {
            scan_quoted(cur, c)?;
            continue;
        }
        cur.bump();
        if pending.last() == Some(&c) {
            pending.pop();
        } else if let Some(closer) = closer_for(c) {
            pending.push(closer);
        }
    }
    if let Some(closer) = pending.last() {
        return Err(SpecError::UnterminatedBlock {
            expected: *closer,
            span: Some(Span::new(start, cur.src().len())),
        });
    }
    Ok(Tree::Word {
        text: cur.src()[start..cur.pos()].to_string(),
        span: Span::new(start, cur.pos()),
    })
}

fn scan_quoted(cur: &mut Cursor<'_>, quote: char) -> Result<(), SpecError> {
    let start = cur.pos();
    cur.bump();
    while let Some(c) = cur.bump() {
        if c == '\\' {
            cur.bump();
        } else if c == quote {
            return Ok(());
        }
    }
    // An unclosed quote swallows the rest of the line, including the closer.
    Err(SpecError::UnterminatedBlock {
        expected: quote,
        span: Some(Span::new(start, cur.src().len())),
    })
}
