//! Parser for the field annotation micro-grammar.
//!
//! An annotation is a comma separated list of clauses, each clause being either a bare key or
//! `key=value`. Values are bare words, quoted strings or bracketed lists of those:
//!
//! ```text
//! name=request_count, labels=[route, status], help='requests served', buckets=[0.1, 1, 5]
//! ```
//!
//! Bare words that read as an integer or a float become numbers; everything else, and anything
//! quoted, is a string.
use std::{iter::Peekable, str::CharIndices};

/// A single value in an annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Integer(i64),
    Float(f64),
    List(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Returns the string if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements if this is a list value.
    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the number as `f64`, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Parse a bare (unquoted) word.
    fn from_bare(word: &str) -> Self {
        // Only words that start like a number are candidates, so `inf` or `nan` stay strings.
        if !word.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.')) {
            return Self::String(word.to_string());
        }

        if let Ok(i) = word.parse::<i64>() {
            Self::Integer(i)
        } else if let Ok(f) = word.parse::<f64>() {
            Self::Float(f)
        } else {
            Self::String(word.to_string())
        }
    }
}

/// One `key` or `key=value` clause of an annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDefinition {
    name: String,
    value: Option<AttributeValue>,
}

impl AttributeDefinition {
    pub fn new(name: impl Into<String>, value: Option<AttributeValue>) -> Self {
        Self { name: name.into(), value }
    }

    /// The attribute-set name, i.e. the key of the clause.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value of the clause, `None` for a bare key.
    pub fn value(&self) -> Option<&AttributeValue> {
        self.value.as_ref()
    }
}

/// A syntax error in an annotation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at offset {offset}")]
pub struct ParseError {
    /// Byte offset into the annotation text.
    pub offset: usize,
    pub message: String,
}

/// Parse annotation text into its clauses, in order of appearance.
///
/// Empty or whitespace-only text yields no definitions.
pub fn parse(text: &str) -> Result<Vec<AttributeDefinition>, ParseError> {
    let mut parser = Parser { text, chars: text.char_indices().peekable() };
    let mut definitions = Vec::new();

    parser.skip_whitespace();
    if parser.peek().is_none() {
        return Ok(definitions);
    }

    loop {
        definitions.push(parser.clause()?);
        parser.skip_whitespace();
        match parser.next() {
            None => return Ok(definitions),
            Some((_, ',')) => parser.skip_whitespace(),
            Some((offset, c)) => {
                return Err(parser.error(offset, format!("expected `,` but found `{c}`")));
            }
        }
    }
}

struct Parser<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn peek(&mut self) -> Option<(usize, char)> {
        self.chars.peek().copied()
    }

    fn next(&mut self) -> Option<(usize, char)> {
        self.chars.next()
    }

    fn offset(&mut self) -> usize {
        self.peek().map(|(offset, _)| offset).unwrap_or(self.text.len())
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> ParseError {
        ParseError { offset, message: message.into() }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|(_, c)| c.is_whitespace()) {
            self.next();
        }
    }

    fn clause(&mut self) -> Result<AttributeDefinition, ParseError> {
        let start = self.offset();
        let name = self.bare_word();
        if name.is_empty() {
            return Err(self.error(start, "expected attribute name"));
        }

        self.skip_whitespace();
        if !matches!(self.peek(), Some((_, '='))) {
            return Ok(AttributeDefinition::new(name, None));
        }
        self.next();
        self.skip_whitespace();

        let value = match self.peek() {
            Some((start, '[')) => {
                self.next();
                self.list(start)?
            }
            _ => self.scalar()?,
        };

        Ok(AttributeDefinition::new(name, Some(value)))
    }

    /// Parse the rest of a list whose opening bracket at `start` was consumed.
    fn list(&mut self, start: usize) -> Result<AttributeValue, ParseError> {
        let mut items = Vec::new();

        self.skip_whitespace();
        if matches!(self.peek(), Some((_, ']'))) {
            self.next();
            return Ok(AttributeValue::List(items));
        }

        loop {
            self.skip_whitespace();
            if let Some((offset, '[')) = self.peek() {
                return Err(self.error(offset, "nested lists are not supported"));
            }
            items.push(self.scalar()?);
            self.skip_whitespace();

            match self.next() {
                Some((_, ',')) => continue,
                Some((_, ']')) => return Ok(AttributeValue::List(items)),
                Some((offset, c)) => {
                    return Err(self.error(offset, format!("expected `,` or `]` but found `{c}`")));
                }
                None => return Err(self.error(start, "unterminated list")),
            }
        }
    }

    fn scalar(&mut self) -> Result<AttributeValue, ParseError> {
        match self.peek() {
            Some((start, quote @ ('\'' | '"'))) => {
                self.next();
                self.quoted(start, quote).map(AttributeValue::String)
            }
            _ => {
                let start = self.offset();
                let word = self.bare_word();
                if word.is_empty() {
                    return Err(self.error(start, "expected a value"));
                }
                Ok(AttributeValue::from_bare(word))
            }
        }
    }

    fn quoted(&mut self, start: usize, quote: char) -> Result<String, ParseError> {
        let mut out = String::new();

        loop {
            match self.next() {
                Some((_, '\\')) => match self.next() {
                    Some((_, c)) => out.push(c),
                    None => break,
                },
                Some((_, c)) if c == quote => return Ok(out),
                Some((_, c)) => out.push(c),
                None => break,
            }
        }

        Err(self.error(start, "unterminated quoted string"))
    }

    fn bare_word(&mut self) -> &'a str {
        let start = self.offset();
        while self
            .peek()
            .is_some_and(|(_, c)| !c.is_whitespace() && !matches!(c, ',' | '[' | ']' | '=' | '\'' | '"'))
        {
            self.next();
        }
        let end = self.offset();
        let text = self.text;
        &text[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(s: &str) -> AttributeValue {
        AttributeValue::String(s.to_string())
    }

    #[test]
    fn parses_full_annotation() {
        let defs =
            parse("name=seconds_from_start,labels=[thread],help='seconds since application start'")
                .unwrap();

        assert_eq!(
            defs,
            vec![
                AttributeDefinition::new("name", Some(string("seconds_from_start"))),
                AttributeDefinition::new("labels", Some(AttributeValue::List(vec![string("thread")]))),
                AttributeDefinition::new("help", Some(string("seconds since application start"))),
            ]
        );
    }

    #[test]
    fn parses_numbers_in_lists() {
        let defs = parse("buckets=[0.0001, 0.001, 10, 1e3]").unwrap();
        assert_eq!(
            defs[0].value(),
            Some(&AttributeValue::List(vec![
                AttributeValue::Float(0.0001),
                AttributeValue::Float(0.001),
                AttributeValue::Integer(10),
                AttributeValue::Float(1000.0),
            ]))
        );
    }

    #[test]
    fn quoted_values_stay_strings() {
        let defs = parse(r#"labels=['1', "two words"], help="it's \"quoted\"""#).unwrap();
        assert_eq!(
            defs[0].value(),
            Some(&AttributeValue::List(vec![string("1"), string("two words")]))
        );
        assert_eq!(defs[1].value(), Some(&string(r#"it's "quoted""#)));
    }

    #[test]
    fn empty_annotation_has_no_definitions() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("   ").unwrap().is_empty());
    }

    #[test]
    fn bare_key_has_no_value() {
        let defs = parse("name, labels = [ ]").unwrap();
        assert_eq!(defs[0], AttributeDefinition::new("name", None));
        assert_eq!(defs[1].value(), Some(&AttributeValue::List(vec![])));
    }

    #[test]
    fn repeated_names_are_kept_in_order() {
        let defs = parse("name=first,name=second").unwrap();
        let names: Vec<_> = defs.iter().map(|d| d.value().and_then(|v| v.as_str())).collect();
        assert_eq!(names, vec![Some("first"), Some("second")]);
    }

    #[test]
    fn rejects_malformed_text() {
        let cases = [
            ("name='unterminated", "unterminated quoted string"),
            ("labels=[a, b", "unterminated list"),
            ("labels=[[a]]", "nested lists are not supported"),
            ("name=a,,help=b", "expected attribute name"),
            ("name=", "expected a value"),
            ("name=a b", "expected `,` but found `b`"),
            ("=a", "expected attribute name"),
            ("labels=[a b]", "expected `,` or `]` but found `b`"),
        ];

        for (text, message) in cases {
            let err = parse(text).unwrap_err();
            assert!(err.message.contains(message), "{text}: {err}");
        }
    }

    #[test]
    fn error_reports_offset() {
        let err = parse("name=a,help='oops").unwrap_err();
        assert_eq!(err.offset, 12);
    }
}
