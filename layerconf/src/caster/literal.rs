//! Evaluation of Python literal expressions.
//!
//! Backs the `@python:` and `@py:` casters. Only literal syntax is accepted:
//! numbers, strings, `True`/`False`/`None`, lists, tuples, sets and dicts,
//! with unary signs on numbers. Names, calls and operators are rejected.
//! Tuples and sets become sequences; dict keys are stringified.

use crate::error::{Error, Result};
use crate::value::{Fragment, Value};

/// Evaluate a Python literal.
///
/// # Errors
///
/// Returns [`Error::Literal`] if `text` is not a literal expression.
///
/// # Examples
///
/// ```
/// use layerconf::caster::literal;
/// use layerconf::Value;
///
/// let value = literal::eval("{'a': (1, 2.5), 'b': None}").unwrap();
/// let map = value.as_mapping().unwrap();
/// assert_eq!(map["a"], Value::Sequence(vec![Value::Integer(1), Value::Float(2.5)]));
/// assert!(map["b"].is_null());
/// ```
pub fn eval(text: &str) -> Result<Value> {
    Parser {
        src: text,
        pos: 0,
        depth: 0,
    }
    .parse_top()
}

/// Deepest container nesting accepted.
const MAX_DEPTH: usize = 200;

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn at_end(&mut self) -> bool {
        self.skip_trivia();
        self.pos >= self.src.len()
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Literal {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('\\') if self.rest()[1..].starts_with('\n') => {
                    self.pos += 2;
                }
                _ => break,
            }
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_trivia();
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{expected}`")))
        }
    }

    fn parse_top(&mut self) -> Result<Value> {
        let first = self.parse_expr()?;
        if self.eat(',') {
            // A bare `1, 2` is a tuple.
            let mut items = vec![first];
            while !self.at_end() {
                items.push(self.parse_expr()?);
                if !self.eat(',') {
                    break;
                }
            }
            if !self.at_end() {
                return Err(self.error("unexpected trailing input"));
            }
            return Ok(Value::Sequence(items));
        }
        if !self.at_end() {
            return Err(self.error("unexpected trailing input"));
        }
        Ok(first)
    }

    fn parse_expr(&mut self) -> Result<Value> {
        self.skip_trivia();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some(sign @ ('+' | '-')) => {
                self.bump();
                self.skip_trivia();
                if !matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
                    return Err(self.error("unary operators apply to numbers only"));
                }
                self.parse_number(sign == '-')
            }
            Some(open @ ('[' | '(' | '{')) => {
                if self.depth >= MAX_DEPTH {
                    return Err(self.error("literal is nested too deeply"));
                }
                self.depth += 1;
                let value = match open {
                    '[' => {
                        self.bump();
                        self.parse_items(']').map(Value::Sequence)
                    }
                    '(' => self.parse_paren(),
                    _ => self.parse_brace(),
                };
                self.depth -= 1;
                value
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.parse_number(false),
            Some('\'' | '"') => self.parse_strings(""),
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_name(),
            Some(c) => Err(self.error(format!("unexpected character `{c}`"))),
        }
    }

    /// Comma separated items up to `close`, trailing comma allowed.
    fn parse_items(&mut self, close: char) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.parse_expr()?);
            if !self.eat(',') {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn parse_paren(&mut self) -> Result<Value> {
        self.bump();
        if self.eat(')') {
            return Ok(Value::Sequence(Vec::new()));
        }
        let first = self.parse_expr()?;
        if self.eat(')') {
            return Ok(first);
        }
        self.expect(',')?;
        let mut items = vec![first];
        items.extend(self.parse_items(')')?);
        Ok(Value::Sequence(items))
    }

    fn parse_brace(&mut self) -> Result<Value> {
        self.bump();
        if self.eat('}') {
            return Ok(Value::Mapping(Fragment::new()));
        }
        let first = self.parse_expr()?;
        if !self.eat(':') {
            // A set literal.
            let mut items = vec![first];
            if self.eat(',') {
                items.extend(self.parse_items('}')?);
            } else {
                self.expect('}')?;
            }
            return Ok(Value::Sequence(items));
        }

        let mut map = Fragment::new();
        let mut key = first;
        loop {
            let value = self.parse_expr()?;
            map.insert(self.key_string(key)?, value);
            if !self.eat(',') {
                self.expect('}')?;
                break;
            }
            if self.eat('}') {
                break;
            }
            key = self.parse_expr()?;
            self.expect(':')?;
        }
        Ok(Value::Mapping(map))
    }

    fn key_string(&self, key: Value) -> Result<String> {
        match key {
            Value::String(s) => Ok(s),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(format!("{f:?}")),
            Value::Bool(true) => Ok("True".to_string()),
            Value::Bool(false) => Ok("False".to_string()),
            Value::Null => Ok("None".to_string()),
            other => Err(self.error(format!("unhashable dict key of kind {}", other.kind()))),
        }
    }

    fn parse_name(&mut self) -> Result<Value> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        let name = &self.src[start..self.pos];
        if matches!(self.peek(), Some('\'' | '"')) {
            let prefix = name.to_ascii_lowercase();
            return self.parse_strings(&prefix);
        }
        match name {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::Null),
            _ => {
                self.pos = start;
                Err(self.error(format!("name `{name}` is not a literal")))
            }
        }
    }

    /// One string token followed by any implicitly concatenated ones.
    fn parse_strings(&mut self, prefix: &str) -> Result<Value> {
        let mut out = self.parse_string(prefix)?;
        loop {
            self.skip_trivia();
            let save = self.pos;
            let mut next_prefix = String::new();
            while matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) && next_prefix.len() < 2 {
                next_prefix.extend(self.bump().map(|c| c.to_ascii_lowercase()));
            }
            if matches!(self.peek(), Some('\'' | '"')) {
                out.push_str(&self.parse_string(&next_prefix)?);
            } else {
                self.pos = save;
                return Ok(Value::String(out));
            }
        }
    }

    fn parse_string(&mut self, prefix: &str) -> Result<String> {
        if !matches!(prefix, "" | "r" | "u" | "b" | "br" | "rb") {
            return Err(self.error(format!("string prefix `{prefix}` is not a literal")));
        }
        let raw = prefix.contains('r');
        let Some(quote) = self.bump() else {
            return Err(self.error("expected a string"));
        };
        let closing_pair: String = [quote, quote].iter().collect();
        let triple = self.rest().starts_with(&closing_pair);
        if triple {
            self.pos += 2;
        }

        let mut out = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.error("unterminated string"));
            };
            match c {
                c if c == quote && !triple => return Ok(out),
                c if c == quote && self.rest().starts_with(&closing_pair) => {
                    self.pos += 2;
                    return Ok(out);
                }
                '\n' if !triple => return Err(self.error("newline in single-quoted string")),
                '\\' if raw => {
                    out.push('\\');
                    out.extend(self.bump());
                }
                '\\' => self.parse_escape(&mut out)?,
                c => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<()> {
        let Some(c) = self.bump() else {
            return Err(self.error("unterminated escape"));
        };
        match c {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(c),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.bump();
                        }
                        None => break,
                    }
                }
                out.push(self.code_point(code)?);
            }
            'x' => out.push(self.hex_escape(2)?),
            'u' => out.push(self.hex_escape(4)?),
            'U' => out.push(self.hex_escape(8)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char> {
        let end = self.pos + digits;
        let hex = self
            .src
            .get(self.pos..end)
            .filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| self.error("truncated hex escape"))?;
        let code = u32::from_str_radix(hex, 16).map_err(|e| self.error(e.to_string()))?;
        self.pos = end;
        self.code_point(code)
    }

    fn code_point(&self, code: u32) -> Result<char> {
        char::from_u32(code).ok_or_else(|| self.error(format!("invalid code point {code:#x}")))
    }

    /// A number literal; `negative` applies a sign already consumed.
    fn parse_number(&mut self, negative: bool) -> Result<Value> {
        let start = self.pos;
        let radix = match self.rest().get(..2).map(str::to_ascii_lowercase).as_deref() {
            Some("0x") => 16,
            Some("0o") => 8,
            Some("0b") => 2,
            _ => 10,
        };

        if radix != 10 {
            self.pos += 2;
            let digits_start = self.pos;
            while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
                self.bump();
            }
            let mut digits = String::from(if negative { "-" } else { "" });
            digits.extend(self.src[digits_start..self.pos].chars().filter(|&c| c != '_'));
            return i64::from_str_radix(&digits, radix)
                .map(Value::Integer)
                .map_err(|e| self.error(format!("invalid integer literal: {e}")));
        }

        let mut is_float = false;
        self.take_digits();
        if self.peek() == Some('.') {
            is_float = true;
            self.bump();
            self.take_digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            self.take_digits();
        }
        if matches!(self.peek(), Some('j' | 'J')) {
            return Err(self.error("complex numbers are not supported"));
        }
        if matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            return Err(self.error("invalid number literal"));
        }

        let mut text = String::from(if negative { "-" } else { "" });
        text.extend(self.src[start..self.pos].chars().filter(|&c| c != '_'));
        if is_float {
            return text
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| self.error(format!("invalid float literal: {e}")));
        }
        let magnitude = text.trim_start_matches('-');
        if magnitude.len() > 1 && magnitude.starts_with('0') && magnitude.chars().any(|c| c != '0') {
            return Err(self.error("leading zeros in decimal integer literals are not permitted"));
        }
        text.parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| self.error(format!("invalid integer literal: {e}")))
    }

    fn take_digits(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '_') {
            self.bump();
        }
    }
}
