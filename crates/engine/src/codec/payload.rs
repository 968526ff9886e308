// Tolerant reader/writer for the `{:key value}` payload literal.
//
// Values: double-quoted strings (backslash escaping), decimal numbers,
// `true`/`false`, `:keyword` tags, and `[...]` vectors. The reader is
// recursive and position-reporting so the annotation scanner can consume
// exactly one balanced literal out of surrounding document text. The same
// reader decodes the nested mini-payload inside legacy `AI-DONE` comments.

use thiserror::Error;

/// A single payload value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Num(f64),
    Bool(bool),
    Keyword(String),
    Vec(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Self::Keyword(k) => Some(k),
            _ => None,
        }
    }

    /// Non-negative whole number, the only integer shape the grammar uses.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Num(n) if n.fract() == 0.0 && *n >= 0.0 => Some(*n as usize),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("expected '{{' at offset {0}")]
    ExpectedOpenBrace(usize),
    #[error("expected ':' key at offset {0}")]
    ExpectedKey(usize),
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),
    #[error("unterminated vector starting at offset {0}")]
    UnterminatedVector(usize),
    #[error("unexpected character at offset {0}")]
    UnexpectedChar(usize),
    #[error("unexpected end of payload")]
    UnexpectedEnd,
    #[error("invalid number at offset {0}")]
    InvalidNumber(usize),
}

/// Read one balanced `{...}` map literal starting at byte `start` of `src`.
///
/// Returns the key/value pairs (later duplicates win at lookup time) and
/// the byte offset just past the closing `}`.
pub fn read_map_at(src: &str, start: usize) -> Result<(Vec<(String, Value)>, usize), PayloadError> {
    let mut cur = Cursor { src, pos: start };
    if cur.peek() != Some(b'{') {
        return Err(PayloadError::ExpectedOpenBrace(start));
    }
    cur.pos += 1;

    let mut pairs = Vec::new();
    loop {
        cur.skip_ws();
        match cur.peek() {
            Some(b'}') => {
                cur.pos += 1;
                return Ok((pairs, cur.pos));
            }
            Some(b':') => {
                let key = cur.read_keyword()?;
                cur.skip_ws();
                let value = cur.read_value()?;
                pairs.push((key, value));
            }
            Some(_) => return Err(PayloadError::ExpectedKey(cur.pos)),
            None => return Err(PayloadError::UnexpectedEnd),
        }
    }
}

/// Look up a key, last occurrence winning.
pub fn get<'a>(pairs: &'a [(String, Value)], key: &str) -> Option<&'a Value> {
    pairs.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v)
}

/// Byte range of the contents of the quoted string whose opening `"` is at
/// `quote`. Honors backslash escaping. Used by the visibility projector's
/// single-forward-scan so it never needs a structural parse.
pub fn quoted_inner(src: &str, quote: usize) -> Option<std::ops::Range<usize>> {
    let bytes = src.as_bytes();
    if bytes.get(quote) != Some(&b'"') {
        return None;
    }
    let mut i = quote + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(quote + 1..i),
            _ => i += 1,
        }
    }
    None
}

/// Append `s` with `"` and `\` escaped.
pub fn escape_into(out: &mut String, s: &str) {
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(ch),
        }
    }
}

/// Append `s` as a quoted, escaped string literal.
pub fn write_str(out: &mut String, s: &str) {
    out.push('"');
    escape_into(out, s);
    out.push('"');
}

/// Append a number, whole values without a trailing fraction.
pub fn write_num(out: &mut String, n: f64) {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        out.push_str(&format!("{}", n as i64));
    } else {
        out.push_str(&format!("{n}"));
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r' | b',')) {
            self.pos += 1;
        }
    }

    fn read_keyword(&mut self) -> Result<String, PayloadError> {
        debug_assert_eq!(self.peek(), Some(b':'));
        self.pos += 1;
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(PayloadError::ExpectedKey(start));
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn read_value(&mut self) -> Result<Value, PayloadError> {
        match self.peek() {
            Some(b'"') => self.read_string(),
            Some(b'[') => self.read_vector(),
            Some(b':') => Ok(Value::Keyword(self.read_keyword()?)),
            Some(b't') | Some(b'f') => self.read_bool(),
            Some(b) if b.is_ascii_digit() || b == b'-' || b == b'+' || b == b'.' => {
                self.read_number()
            }
            Some(_) => Err(PayloadError::UnexpectedChar(self.pos)),
            None => Err(PayloadError::UnexpectedEnd),
        }
    }

    fn read_string(&mut self) -> Result<Value, PayloadError> {
        let open = self.pos;
        let bytes = self.src.as_bytes();
        let mut out = String::new();
        let mut i = open + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => {
                    match self.src[i + 1..].chars().next() {
                        // Only `"` and `\` are meaningful escapes; anything
                        // else keeps the escaped character as-is.
                        Some(ch) => {
                            out.push(ch);
                            i += 1 + ch.len_utf8();
                        }
                        None => return Err(PayloadError::UnterminatedString(open)),
                    }
                }
                b'"' => {
                    self.pos = i + 1;
                    return Ok(Value::Str(out));
                }
                _ => {
                    let ch = self.src[i..].chars().next().ok_or(PayloadError::UnexpectedEnd)?;
                    out.push(ch);
                    i += ch.len_utf8();
                }
            }
        }
        Err(PayloadError::UnterminatedString(open))
    }

    fn read_vector(&mut self) -> Result<Value, PayloadError> {
        let open = self.pos;
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b']') => {
                    self.pos += 1;
                    return Ok(Value::Vec(items));
                }
                Some(_) => items.push(self.read_value()?),
                None => return Err(PayloadError::UnterminatedVector(open)),
            }
        }
    }

    fn read_bool(&mut self) -> Result<Value, PayloadError> {
        for (word, value) in [("true", true), ("false", false)] {
            if self.src[self.pos..].starts_with(word) {
                self.pos += word.len();
                return Ok(Value::Bool(value));
            }
        }
        Err(PayloadError::UnexpectedChar(self.pos))
    }

    fn read_number(&mut self) -> Result<Value, PayloadError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E') {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.src[start..self.pos]
            .parse::<f64>()
            .map(Value::Num)
            .map_err(|_| PayloadError::InvalidNumber(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(src: &str) -> Vec<(String, Value)> {
        let (pairs, end) = read_map_at(src, 0).expect("payload should parse");
        assert_eq!(end, src.len());
        pairs
    }

    #[test]
    fn reads_all_value_shapes() {
        let pairs = read(r#"{:text "hi" :priority 2 :done true :tag :pending :alts ["a" "b"]}"#);

        assert_eq!(get(&pairs, "text"), Some(&Value::Str("hi".into())));
        assert_eq!(get(&pairs, "priority"), Some(&Value::Num(2.0)));
        assert_eq!(get(&pairs, "done"), Some(&Value::Bool(true)));
        assert_eq!(get(&pairs, "tag"), Some(&Value::Keyword("pending".into())));
        assert_eq!(
            get(&pairs, "alts"),
            Some(&Value::Vec(vec![Value::Str("a".into()), Value::Str("b".into())]))
        );
    }

    #[test]
    fn unescapes_quotes_and_backslashes() {
        let pairs = read(r#"{:text "say \"hi\" \\ there"}"#);
        assert_eq!(get(&pairs, "text"), Some(&Value::Str(r#"say "hi" \ there"#.into())));
    }

    #[test]
    fn reports_end_position_within_surrounding_text() {
        let doc = r#"before {:sel 1 :alts ["x"]} after"#;
        let (pairs, end) = read_map_at(doc, 7).expect("payload should parse");
        assert_eq!(&doc[end..], " after");
        assert_eq!(get(&pairs, "sel").and_then(Value::as_index), Some(1));
    }

    #[test]
    fn rejects_unterminated_string() {
        let err = read_map_at(r#"{:text "oops}"#, 0).unwrap_err();
        assert_eq!(err, PayloadError::UnterminatedString(7));
    }

    #[test]
    fn rejects_missing_key() {
        let err = read_map_at(r#"{"just a string"}"#, 0).unwrap_err();
        assert_eq!(err, PayloadError::ExpectedKey(1));
    }

    #[test]
    fn later_duplicate_key_wins() {
        let pairs = read(r#"{:sel 0 :sel 2}"#);
        assert_eq!(get(&pairs, "sel").and_then(Value::as_index), Some(2));
    }

    #[test]
    fn quoted_inner_honors_escapes() {
        let src = r#"x "a\"b" y"#;
        let range = quoted_inner(src, 2).expect("string should terminate");
        assert_eq!(&src[range], r#"a\"b"#);
        assert_eq!(quoted_inner(r#""open"#, 0), None);
    }

    #[test]
    fn write_num_drops_whole_fractions() {
        let mut out = String::new();
        write_num(&mut out, 2.0);
        out.push(' ');
        write_num(&mut out, 2.5);
        assert_eq!(out, "2 2.5");
    }
}
