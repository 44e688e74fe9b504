//! Safe literal reader for argument values.
//!
//! Accepts a fixed, Python-literal-like grammar and nothing else:
//!
//! ```text
//! literal  = int | float | bool | quoted | list | map
//! int      = [+-]? digits                      (fits in i64, no leading zeros)
//! float    = [+-]? (digits "." digits? | "." digits) exp?  |  [+-]? digits exp
//! exp      = [eE] [+-]? digits
//! bool     = true | false                      (case-insensitive)
//! quoted   = '...' | "..."                     (\\ \' \" \n \t \r escapes)
//! list     = "[" (item ("," item)* ","?)? "]"
//! map      = "{" (key ":" item ("," key ":" item)* ","?)? "}"
//! item     = literal | bareword
//! key      = quoted | int | float | bool | bareword
//! bareword = [A-Za-z_] [A-Za-z0-9_.-]*         (read as a string)
//! ```
//!
//! Anything outside the grammar is not a literal, and [`coerce_value`] keeps
//! it as the raw string.

use planloop_core::Value;
use std::collections::BTreeMap;

/// Containers nested deeper than this are not read as literals.
const MAX_DEPTH: usize = 32;

/// Coerce an argument token: integer, float, boolean, then container/quoted
/// literal, else the raw string unchanged.
pub fn coerce_value(token: &str) -> Value {
    parse_literal(token).unwrap_or_else(|| Value::Str(token.to_string()))
}

/// Read `input` as a literal, or `None` if it is not one.
pub fn parse_literal(input: &str) -> Option<Value> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Some(scalar) = parse_scalar(input) {
        return Some(scalar);
    }
    match input.chars().next() {
        Some('[' | '{' | '\'' | '"') => {
            let mut reader = Reader::new(input);
            let value = reader.item(0)?;
            reader.skip_ws();
            reader.at_end().then_some(value)
        }
        _ => None,
    }
}

fn parse_scalar(token: &str) -> Option<Value> {
    if let Some(n) = parse_int(token) {
        return Some(Value::Int(n));
    }
    if let Some(f) = parse_float(token) {
        return Some(Value::Float(f));
    }
    if token.eq_ignore_ascii_case("true") {
        return Some(Value::Bool(true));
    }
    if token.eq_ignore_ascii_case("false") {
        return Some(Value::Bool(false));
    }
    None
}

fn strip_sign(token: &str) -> &str {
    token
        .strip_prefix('-')
        .or_else(|| token.strip_prefix('+'))
        .unwrap_or(token)
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_int(token: &str) -> Option<i64> {
    let digits = strip_sign(token);
    if !all_digits(digits) {
        return None;
    }
    // `007` is not an integer literal; `0` and `000` are.
    if digits.len() > 1 && digits.starts_with('0') && digits.bytes().any(|b| b != b'0') {
        return None;
    }
    token.parse::<i64>().ok()
}

fn parse_float(token: &str) -> Option<f64> {
    let body = strip_sign(token);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };

    let mantissa_ok = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => {
            (int_part.is_empty() || all_digits(int_part))
                && (frac_part.is_empty() || all_digits(frac_part))
                && !(int_part.is_empty() && frac_part.is_empty())
        }
        // Without a decimal point an exponent is required, else it is an int.
        None => all_digits(mantissa) && exponent.is_some(),
    };
    if !mantissa_ok {
        return None;
    }
    if let Some(exp) = exponent {
        if !all_digits(strip_sign(exp)) {
            return None;
        }
    }

    token.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn is_bareword(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Cursor over a container or quoted literal.
struct Reader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn item(&mut self, depth: usize) -> Option<Value> {
        if depth > MAX_DEPTH {
            return None;
        }
        self.skip_ws();
        match self.peek()? {
            '[' => self.list(depth),
            '{' => self.map(depth),
            '\'' | '"' => self.quoted().map(Value::Str),
            _ => {
                let token = self.token();
                parse_scalar(token).or_else(|| is_bareword(token).then(|| Value::Str(token.to_string())))
            }
        }
    }

    /// An unquoted run up to the next delimiter or whitespace.
    fn token(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, ',' | ':' | '[' | ']' | '{' | '}' | '\'' | '"') {
                break;
            }
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn list(&mut self, depth: usize) -> Option<Value> {
        self.bump(); // '['
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek()? == ']' {
                self.bump();
                return Some(Value::List(items));
            }
            items.push(self.item(depth + 1)?);
            self.skip_ws();
            match self.bump()? {
                ',' => {}
                ']' => return Some(Value::List(items)),
                _ => return None,
            }
        }
    }

    fn map(&mut self, depth: usize) -> Option<Value> {
        self.bump(); // '{'
        let mut map = BTreeMap::new();
        loop {
            self.skip_ws();
            if self.peek()? == '}' {
                self.bump();
                return Some(Value::Map(map));
            }
            let key = self.key()?;
            self.skip_ws();
            if self.bump()? != ':' {
                return None;
            }
            let value = self.item(depth + 1)?;
            map.insert(key, value);
            self.skip_ws();
            match self.bump()? {
                ',' => {}
                '}' => return Some(Value::Map(map)),
                _ => return None,
            }
        }
    }

    fn key(&mut self) -> Option<String> {
        match self.peek()? {
            '\'' | '"' => self.quoted(),
            _ => {
                let token = self.token();
                (parse_scalar(token).is_some() || is_bareword(token)).then(|| token.to_string())
            }
        }
    }

    fn quoted(&mut self) -> Option<String> {
        let quote = self.bump()?;
        let mut out = String::new();
        loop {
            match self.bump()? {
                '\\' => match self.bump()? {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    c @ ('\\' | '\'' | '"') => out.push(c),
                    // Unknown escapes are kept verbatim.
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                },
                c if c == quote => return Some(out),
                c => out.push(c),
            }
        }
    }
}
