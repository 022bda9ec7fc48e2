//! Restricted literal evaluator for keyword fragments.
//!
//! Evaluates `key=value[, key=value...]` where each value is a literal
//! expression: numbers, quoted strings, `True`/`False`/`None`, tuples, lists,
//! string-keyed dicts, unary signs on numbers, and calls to constructors the
//! [`Namespace`] allows. Bare names resolve only to namespace constants.
//! There is no general expression evaluation: no operators, attribute access
//! or indexing.

use std::collections::BTreeMap;
use std::fmt;

use super::lexer::MAX_NESTING;
use crate::namespace::Namespace;
use crate::value::Value;

/// Why a fragment could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError {
    /// Byte offset into the fragment.
    pub pos: usize,
    /// What went wrong.
    pub message: String,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.pos)
    }
}

impl std::error::Error for EvalError {}

type EvalResult<T> = Result<T, EvalError>;

/// Evaluate a keyword argument list such as `a=1, b=(2, 3)`.
///
/// Keys must be identifiers and may not repeat within one list; a trailing
/// comma is allowed.
pub fn eval_keywords(src: &str, namespace: &Namespace) -> EvalResult<Vec<(String, Value)>> {
    let mut p = LiteralParser::new(src, namespace);
    let mut out: Vec<(String, Value)> = Vec::new();
    p.skip_ws();
    if p.at_end() {
        return Err(p.error("expected keyword argument"));
    }
    while !p.at_end() {
        let (key, value) = p.keyword()?;
        if out.iter().any(|(k, _)| *k == key) {
            return Err(p.error(format!("keyword argument repeated: {key}")));
        }
        out.push((key, value));
        p.skip_ws();
        if p.eat(',') {
            p.skip_ws();
        } else if !p.at_end() {
            return Err(p.error("expected ',' between keyword arguments"));
        }
    }
    Ok(out)
}

struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
    ns: &'a Namespace,
}

impl<'a> LiteralParser<'a> {
    fn new(src: &'a str, ns: &'a Namespace) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
            ns,
        }
    }

    fn error(&self, message: impl Into<String>) -> EvalError {
        EvalError {
            pos: self.pos,
            message: message.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek2(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> EvalResult<()> {
        self.skip_ws();
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(match self.peek() {
                Some(found) => format!("expected '{c}', found '{found}'"),
                None => format!("expected '{c}', found end of input"),
            }))
        }
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn ident(&mut self) -> Option<&'a str> {
        let start = self.pos;
        let first = self.peek()?;
        if !(first.is_ascii_alphabetic() || first == '_') {
            return None;
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }
        Some(&self.src[start..self.pos])
    }

    /// `ident = expr`
    fn keyword(&mut self) -> EvalResult<(String, Value)> {
        self.skip_ws();
        let key = self
            .ident()
            .ok_or_else(|| self.error("expected keyword name"))?
            .to_string();
        self.expect('=')?;
        let value = self.expr()?;
        Ok((key, value))
    }

    /// Whether the input continues with `ident =` (but not `==`).
    fn at_keyword(&self) -> bool {
        let mut ahead = LiteralParser::new(self.src, self.ns);
        ahead.pos = self.pos;
        if ahead.ident().is_none() {
            return false;
        }
        ahead.skip_ws();
        ahead.peek() == Some('=') && ahead.peek2() != Some('=')
    }

    fn expr(&mut self) -> EvalResult<Value> {
        if self.depth == MAX_NESTING {
            return Err(self.error(format!(
                "value nested deeper than {MAX_NESTING} levels"
            )));
        }
        self.depth += 1;
        let value = self.term();
        self.depth -= 1;
        value
    }

    fn term(&mut self) -> EvalResult<Value> {
        self.skip_ws();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some(sign @ ('+' | '-')) => {
                self.bump();
                self.skip_ws();
                let negative = sign == '-';
                if self.at_number() {
                    return self.number(negative);
                }
                match self.expr()? {
                    Value::Int(i) if negative => i
                        .checked_neg()
                        .map(Value::Int)
                        .ok_or_else(|| self.error("integer out of range")),
                    Value::Float(x) if negative => Ok(Value::Float(-x)),
                    v @ (Value::Int(_) | Value::Float(_)) => Ok(v),
                    other => Err(self.error(format!(
                        "bad operand type for unary {sign}: '{}'",
                        other.type_name()
                    ))),
                }
            }
            Some(_) if self.at_number() => self.number(false),
            Some(q @ ('\'' | '"')) => {
                let mut s = self.string(q)?;
                // Adjacent literals concatenate.
                loop {
                    self.skip_ws();
                    match self.peek() {
                        Some(q @ ('\'' | '"')) => s.push_str(&self.string(q)?),
                        _ => break,
                    }
                }
                Ok(Value::Str(s))
            }
            Some('(') => self.paren(),
            Some('[') => {
                self.bump();
                let (items, _) = self.sequence(']')?;
                Ok(Value::List(items))
            }
            Some('{') => self.dict(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.name(),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
        }
    }

    fn at_number(&self) -> bool {
        match self.peek() {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => self.peek2().is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn number(&mut self, negative: bool) -> EvalResult<Value> {
        let start = self.pos;
        let rest = self.rest();
        if rest.starts_with("0x") || rest.starts_with("0X") {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit() || c == '_') {
                self.pos += 1;
            }
            let digits = self.src[digits_start..self.pos].replace('_', "");
            let magnitude = i128::from_str_radix(&digits, 16)
                .map_err(|_| self.error("invalid hexadecimal literal"))?;
            return self.int_value(magnitude, negative);
        }

        let mut is_float = false;
        self.digits();
        if self.peek() == Some('.') {
            is_float = true;
            self.pos += 1;
            self.digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some('+' | '-')) {
                self.pos += 1;
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.digits();
            } else {
                self.pos = mark;
            }
        }
        if self.peek().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') {
            return Err(self.error("invalid numeric literal"));
        }

        let text = self.src[start..self.pos].replace('_', "");
        if is_float {
            let x: f64 = text
                .parse()
                .map_err(|_| self.error(format!("invalid float literal '{text}'")))?;
            Ok(Value::Float(if negative { -x } else { x }))
        } else {
            let magnitude: i128 = text
                .parse()
                .map_err(|_| self.error("integer out of range"))?;
            self.int_value(magnitude, negative)
        }
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.pos += 1;
        }
    }

    fn int_value(&self, magnitude: i128, negative: bool) -> EvalResult<Value> {
        let signed = if negative { -magnitude } else { magnitude };
        i64::try_from(signed)
            .map(Value::Int)
            .map_err(|_| self.error("integer out of range"))
    }

    fn string(&mut self, quote: char) -> EvalResult<String> {
        self.bump();
        let mut out = String::new();
        loop {
            let c = self
                .bump()
                .ok_or_else(|| self.error("unterminated string literal"))?;
            if c == quote {
                return Ok(out);
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            let esc = self
                .bump()
                .ok_or_else(|| self.error("unterminated string literal"))?;
            match esc {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '0' => out.push('\0'),
                '\\' | '\'' | '"' => out.push(esc),
                'x' => out.push(self.hex_escape(2)?),
                'u' => out.push(self.hex_escape(4)?),
                // Unknown escapes keep their backslash.
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
        }
    }

    fn hex_escape(&mut self, len: usize) -> EvalResult<char> {
        let digits = self.rest().get(..len).unwrap_or("");
        let code = u32::from_str_radix(digits, 16)
            .ok()
            .filter(|_| digits.len() == len)
            .ok_or_else(|| self.error("truncated escape sequence"))?;
        self.pos += len;
        char::from_u32(code).ok_or_else(|| self.error("invalid escape sequence"))
    }

    /// Comma-separated expressions up to `close`. Returns the items and
    /// whether any comma was seen.
    fn sequence(&mut self, close: char) -> EvalResult<(Vec<Value>, bool)> {
        let mut items = Vec::new();
        let mut saw_comma = false;
        loop {
            self.skip_ws();
            if self.eat(close) {
                return Ok((items, saw_comma));
            }
            items.push(self.expr()?);
            self.skip_ws();
            if self.eat(',') {
                saw_comma = true;
            } else {
                self.expect(close)?;
                return Ok((items, saw_comma));
            }
        }
    }

    fn paren(&mut self) -> EvalResult<Value> {
        self.bump();
        let (mut items, saw_comma) = self.sequence(')')?;
        if items.len() == 1 && !saw_comma {
            return Ok(items.remove(0));
        }
        Ok(Value::Tuple(items))
    }

    fn dict(&mut self) -> EvalResult<Value> {
        self.bump();
        let mut map = BTreeMap::new();
        loop {
            self.skip_ws();
            if self.eat('}') {
                return Ok(Value::Dict(map));
            }
            let key = match self.expr()? {
                Value::Str(s) => s,
                other => {
                    return Err(self.error(format!(
                        "dict keys must be strings, not '{}'",
                        other.type_name()
                    )));
                }
            };
            self.expect(':')?;
            let value = self.expr()?;
            map.insert(key, value);
            self.skip_ws();
            if !self.eat(',') {
                self.expect('}')?;
                return Ok(Value::Dict(map));
            }
        }
    }

    fn name(&mut self) -> EvalResult<Value> {
        let start = self.pos;
        let name = self.ident().unwrap_or_default();
        match name {
            "True" => return Ok(Value::Bool(true)),
            "False" => return Ok(Value::Bool(false)),
            "None" => return Ok(Value::None),
            _ => {}
        }
        let after_name = self.pos;
        self.skip_ws();
        if self.peek() == Some('(') {
            if !self.ns.is_callable(name) {
                self.pos = start;
                return Err(self.error(format!("name '{name}' is not allowed")));
            }
            return self.call(name);
        }
        self.pos = after_name;
        match self.ns.constant(name) {
            Some(v) => Ok(v.clone()),
            None => {
                self.pos = start;
                Err(self.error(format!("name '{name}' is not defined")))
            }
        }
    }

    fn call(&mut self, name: &str) -> EvalResult<Value> {
        self.bump();
        let mut args = Vec::new();
        let mut kwargs = BTreeMap::new();
        loop {
            self.skip_ws();
            if self.eat(')') {
                break;
            }
            if self.at_keyword() {
                let (key, value) = self.keyword()?;
                if kwargs.insert(key.clone(), value).is_some() {
                    return Err(self.error(format!("keyword argument repeated: {key}")));
                }
            } else if !kwargs.is_empty() {
                return Err(self.error("positional argument follows keyword argument"));
            } else {
                args.push(self.expr()?);
            }
            self.skip_ws();
            if !self.eat(',') {
                self.expect(')')?;
                break;
            }
        }

        if name != "dict" {
            return Ok(Value::Call {
                name: name.to_string(),
                args,
                kwargs,
            });
        }
        let mut map = match args.len() {
            0 => BTreeMap::new(),
            1 => match args.remove(0) {
                Value::Dict(m) => m,
                other => {
                    return Err(self.error(format!(
                        "dict() argument must be a dict, not '{}'",
                        other.type_name()
                    )));
                }
            },
            n => return Err(self.error(format!("dict expected at most 1 argument, got {n}"))),
        };
        map.extend(kwargs);
        Ok(Value::Dict(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str) -> EvalResult<Value> {
        let mut pairs = eval_keywords(&format!("v={src}"), &Namespace::default())?;
        assert_eq!(pairs.len(), 1);
        Ok(pairs.remove(0).1)
    }

    fn lit(src: &str) -> Value {
        eval(src).unwrap()
    }

    fn lit_err(src: &str) -> String {
        eval(src).unwrap_err().message
    }

    #[test]
    fn scalars() {
        assert_eq!(lit("None"), Value::None);
        assert_eq!(lit("True"), Value::Bool(true));
        assert_eq!(lit("42"), Value::Int(42));
        assert_eq!(lit("-7"), Value::Int(-7));
        assert_eq!(lit("1_000"), Value::Int(1000));
        assert_eq!(lit("0x1F"), Value::Int(31));
        assert_eq!(lit("1.5"), Value::Float(1.5));
        assert_eq!(lit(".5"), Value::Float(0.5));
        assert_eq!(lit("2."), Value::Float(2.0));
        assert_eq!(lit("1e3"), Value::Float(1000.0));
        assert_eq!(lit("-2.5e-1"), Value::Float(-0.25));
        assert_eq!(lit("-9223372036854775808"), Value::Int(i64::MIN));
    }

    #[test]
    fn strings_and_escapes() {
        assert_eq!(lit("'r'"), Value::Str("r".into()));
        assert_eq!(lit(r#""a\"b""#), Value::Str("a\"b".into()));
        assert_eq!(lit(r"'a\nb\x41'"), Value::Str("a\nbA".into()));
        assert_eq!(lit(r"'\d'"), Value::Str(r"\d".into()));
        assert_eq!(lit("'a' 'b'"), Value::Str("ab".into()));
    }

    #[test]
    fn containers() {
        assert_eq!(lit("()"), Value::Tuple(vec![]));
        assert_eq!(lit("(1)"), Value::Int(1));
        assert_eq!(lit("(1,)"), Value::Tuple(vec![Value::Int(1)]));
        assert_eq!(
            lit("[1, 'a', (2, 3)]"),
            Value::List(vec![
                Value::Int(1),
                Value::Str("a".into()),
                Value::Tuple(vec![Value::Int(2), Value::Int(3)]),
            ])
        );
        assert_eq!(
            lit("{'k': [None], 'j': 1,}"),
            Value::Dict(BTreeMap::from([
                ("k".to_string(), Value::List(vec![Value::None])),
                ("j".to_string(), Value::Int(1)),
            ]))
        );
    }

    #[test]
    fn allowed_calls() {
        assert_eq!(
            lit("dict(a=1, b=dict(c=2))"),
            Value::Dict(BTreeMap::from([
                ("a".to_string(), Value::Int(1)),
                (
                    "b".to_string(),
                    Value::Dict(BTreeMap::from([("c".to_string(), Value::Int(2))]))
                ),
            ]))
        );
        assert_eq!(
            lit("Cycle(['r', 'g'], step = 2)"),
            Value::Call {
                name: "Cycle".into(),
                args: vec![Value::List(vec![
                    Value::Str("r".into()),
                    Value::Str("g".into())
                ])],
                kwargs: BTreeMap::from([("step".to_string(), Value::Int(2))]),
            }
        );
        assert_eq!(lit("inf"), Value::Float(f64::INFINITY));
    }

    #[test]
    fn rejected_names() {
        assert_eq!(lit_err("open('x')"), "name 'open' is not allowed");
        assert_eq!(lit_err("r"), "name 'r' is not defined");
        assert_eq!(lit_err("os.system"), "name 'os' is not defined");
        assert!(lit_err("1 2").contains("expected ','"));
    }

    #[test]
    fn malformed_literals() {
        assert!(lit_err("(1, 2").contains("expected ')'"));
        assert!(lit_err("'abc").contains("unterminated"));
        assert!(lit_err("12abc").contains("invalid numeric"));
        assert!(lit_err("-'a'").contains("unary -"));
        assert!(lit_err("{1: 2}").contains("dict keys"));
        assert!(lit_err("99999999999999999999").contains("out of range"));
        assert!(lit_err("Cycle(a=1, 2)").contains("positional argument"));
    }

    #[test]
    fn nesting_is_capped() {
        let ok = format!("{}1{}", "[".repeat(MAX_NESTING - 1), "]".repeat(MAX_NESTING - 1));
        assert!(eval(&ok).is_ok());

        let deep = format!("{}1{}", "[".repeat(MAX_NESTING), "]".repeat(MAX_NESTING));
        assert!(lit_err(&deep).contains("nested deeper than 256"));
        assert!(lit_err(&"-".repeat(MAX_NESTING + 1)).contains("nested deeper"));
    }

    #[test]
    fn keyword_lists() {
        let ns = Namespace::default();
        assert_eq!(
            eval_keywords("a=1, b='x',", &ns).unwrap(),
            vec![
                ("a".to_string(), Value::Int(1)),
                ("b".to_string(), Value::Str("x".into()))
            ]
        );
        assert_eq!(
            eval_keywords("a = (1,2)", &ns).unwrap(),
            vec![(
                "a".to_string(),
                Value::Tuple(vec![Value::Int(1), Value::Int(2)])
            )]
        );
    }

    #[test]
    fn keyword_list_errors() {
        let ns = Namespace::default();
        assert!(eval_keywords("a=1 b=2", &ns).unwrap_err().message.contains("','"));
        assert!(eval_keywords("a=1, a=2", &ns)
            .unwrap_err()
            .message
            .contains("repeated"));
        assert!(eval_keywords("=1", &ns).unwrap_err().message.contains("keyword name"));
        assert!(eval_keywords("a=", &ns).unwrap_err().message.contains("end of input"));
    }
}
