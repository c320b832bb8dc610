//! Recognition of the `Class.method(args)` command form.
//!
//! Lines that are not a plain verb command may instead be a method call such
//! as `User.show("id")` or `User.update("id", {"age": 30})`. This module
//! extracts the call shape, unwraps quoting, splits argument lists and parses
//! the flat map literal used by bulk updates. The literal parser is
//! deliberately scoped to string keys and scalar values; nothing here ever
//! evaluates input as code.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::AttrValue;

/// A parsed `Class.method(args)` line.
///
/// `args` is the raw text between the outer parentheses, untouched; the
/// dispatcher decides per method how to interpret it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub class: String,
    pub method: String,
    pub args: String,
}

static CALL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\.([a-z_]+)\((.*)\)$").expect("call pattern is valid")
});

/// Try to read a line as a method call. Returns `None` for anything that
/// does not have the `Name.method(...)` shape.
pub fn parse_method_call(line: &str) -> Option<MethodCall> {
    let caps = CALL_SHAPE.captures(line.trim())?;
    Some(MethodCall {
        class: caps[1].to_string(),
        method: caps[2].to_string(),
        args: caps[3].to_string(),
    })
}

/// Remove one layer of matching surrounding quotes, single or double.
/// Never trims more than one layer.
pub fn unquote(s: &str) -> &str {
    strip_pair(s, '"').or_else(|| strip_pair(s, '\'')).unwrap_or(s)
}

/// Remove one layer of surrounding double quotes only. The primary `update`
/// verb strips exactly this.
pub fn unquote_double(s: &str) -> &str {
    strip_pair(s, '"').unwrap_or(s)
}

fn strip_pair(s: &str, quote: char) -> Option<&str> {
    s.strip_prefix(quote)?.strip_suffix(quote)
}

/// Split a call argument list on commas outside quotes, trimming each piece.
/// Quotes are kept; callers unwrap them where the command demands it.
/// A blank input yields no arguments.
pub fn split_args(input: &str) -> Vec<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut start = 0usize;
    let mut quote: Option<char> = None;
    for (i, ch) in trimmed.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                ',' => {
                    parts.push(trimmed[start..i].trim());
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    parts.push(trimmed[start..].trim());
    parts
}

/// Errors produced by the map-literal scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralError {
    ExpectedOpenBrace,
    ExpectedKey,
    ExpectedColon,
    ExpectedValue,
    ExpectedSeparator,
    UnfinishedString,
    TrailingInput,
}

/// Parse a flat `{"key": value}` literal into ordered key/value pairs.
///
/// Keys are quoted strings (single or double); values are quoted strings,
/// integers or floats. Order is preserved because bulk updates apply and
/// persist pair by pair.
pub fn parse_map_literal(input: &str) -> Result<Vec<(String, AttrValue)>, LiteralError> {
    LiteralScanner::new(input).parse_map()
}

struct LiteralScanner {
    input: Vec<char>,
    pos: usize,
}

impl LiteralScanner {
    fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn skip_spaces(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn parse_map(&mut self) -> Result<Vec<(String, AttrValue)>, LiteralError> {
        self.skip_spaces();
        if self.bump() != Some('{') {
            return Err(LiteralError::ExpectedOpenBrace);
        }
        let mut pairs = Vec::new();
        self.skip_spaces();
        if self.peek() == Some('}') {
            self.bump();
            return self.finish(pairs);
        }
        loop {
            self.skip_spaces();
            let key = match self.peek() {
                Some(q @ ('"' | '\'')) => {
                    self.bump();
                    self.read_string(q)?
                }
                _ => return Err(LiteralError::ExpectedKey),
            };
            self.skip_spaces();
            if self.bump() != Some(':') {
                return Err(LiteralError::ExpectedColon);
            }
            self.skip_spaces();
            let value = self.read_value()?;
            pairs.push((key, value));
            self.skip_spaces();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return self.finish(pairs),
                _ => return Err(LiteralError::ExpectedSeparator),
            }
        }
    }

    fn finish(
        &mut self,
        pairs: Vec<(String, AttrValue)>,
    ) -> Result<Vec<(String, AttrValue)>, LiteralError> {
        self.skip_spaces();
        if self.pos < self.input.len() {
            return Err(LiteralError::TrailingInput);
        }
        Ok(pairs)
    }

    fn read_string(&mut self, quote: char) -> Result<String, LiteralError> {
        let mut s = String::new();
        while let Some(ch) = self.bump() {
            if ch == quote {
                return Ok(s);
            }
            s.push(ch);
        }
        Err(LiteralError::UnfinishedString)
    }

    fn read_value(&mut self) -> Result<AttrValue, LiteralError> {
        match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                Ok(AttrValue::Str(self.read_string(q)?))
            }
            Some(_) => {
                let mut token = String::new();
                while let Some(ch) = self.peek() {
                    if ch == ',' || ch == '}' || ch.is_whitespace() {
                        break;
                    }
                    token.push(ch);
                    self.pos += 1;
                }
                if let Ok(i) = token.parse::<i64>() {
                    return Ok(AttrValue::Int(i));
                }
                if let Ok(f) = token.parse::<f64>() {
                    return Ok(AttrValue::Float(f));
                }
                Err(LiteralError::ExpectedValue)
            }
            None => Err(LiteralError::ExpectedValue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        parse_map_literal, parse_method_call, split_args, unquote, unquote_double, LiteralError,
        MethodCall,
    };
    use crate::model::AttrValue;

    #[test]
    fn test_parse_method_call_basic_shapes() {
        assert_eq!(
            parse_method_call("User.all()"),
            Some(MethodCall {
                class: "User".to_string(),
                method: "all".to_string(),
                args: String::new(),
            })
        );
        assert_eq!(
            parse_method_call("Place.update(\"x\", {\"a\": 1})"),
            Some(MethodCall {
                class: "Place".to_string(),
                method: "update".to_string(),
                args: "\"x\", {\"a\": 1}".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_method_call_rejects_non_calls() {
        assert_eq!(parse_method_call("show User 123"), None);
        assert_eq!(parse_method_call("User.all"), None);
        assert_eq!(parse_method_call(".all()"), None);
        assert_eq!(parse_method_call("User.Count()"), None);
    }

    #[test]
    fn test_unquote_removes_exactly_one_layer() {
        assert_eq!(unquote("\"abc\""), "abc");
        assert_eq!(unquote("'abc'"), "abc");
        assert_eq!(unquote("\"\"abc\"\""), "\"abc\"");
        assert_eq!(unquote("abc"), "abc");
        assert_eq!(unquote("\"abc'"), "\"abc'");
        assert_eq!(unquote("\""), "\"");
    }

    #[test]
    fn test_unquote_double_ignores_single_quotes() {
        assert_eq!(unquote_double("\"Bob\""), "Bob");
        assert_eq!(unquote_double("'Bob'"), "'Bob'");
    }

    #[test]
    fn test_split_args_respects_quotes() {
        assert_eq!(
            split_args("\"a\", \"b, c\", 3"),
            vec!["\"a\"", "\"b, c\"", "3"]
        );
        assert_eq!(split_args("  x ,y "), vec!["x", "y"]);
        assert!(split_args("   ").is_empty());
    }

    #[test]
    fn test_parse_map_literal_mixed_values() {
        let pairs = parse_map_literal("{\"age\": 30, \"score\": 9.5, 'name': 'Bob'}")
            .expect("literal is well formed");
        assert_eq!(
            pairs,
            vec![
                ("age".to_string(), AttrValue::Int(30)),
                ("score".to_string(), AttrValue::Float(9.5)),
                ("name".to_string(), AttrValue::Str("Bob".to_string())),
            ]
        );
    }

    #[test]
    fn test_parse_map_literal_empty_map() {
        assert_eq!(parse_map_literal("{}"), Ok(Vec::new()));
        assert_eq!(parse_map_literal("  { }  "), Ok(Vec::new()));
    }

    #[test]
    fn test_parse_map_literal_rejects_bad_input() {
        assert_eq!(
            parse_map_literal("\"a\": 1"),
            Err(LiteralError::ExpectedOpenBrace)
        );
        assert_eq!(
            parse_map_literal("{age: 1}"),
            Err(LiteralError::ExpectedKey)
        );
        assert_eq!(
            parse_map_literal("{\"a\" 1}"),
            Err(LiteralError::ExpectedColon)
        );
        assert_eq!(
            parse_map_literal("{\"a\": maybe}"),
            Err(LiteralError::ExpectedValue)
        );
        assert_eq!(
            parse_map_literal("{\"a\": \"unterminated}"),
            Err(LiteralError::UnfinishedString)
        );
        assert_eq!(
            parse_map_literal("{\"a\": 1} junk"),
            Err(LiteralError::TrailingInput)
        );
    }
}
