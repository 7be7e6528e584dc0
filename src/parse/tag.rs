//! Struct tag model and parsers.
//!
//! A tag interior is a run of `id:"value"` triples. Each value is parsed
//! further into an optional namespace (xml only), an optional name and a list
//! of options:
//!
//! ```text
//! xml:"http://www.onvif.org/ver10/schema Name,attr,omitempty"
//!      ^namespace                       ^name ^options
//! ```

use crate::lexer::{Lexer, Span, Token, TAG_STRING, TAG_VALUE};
use crate::parse::errors::FieldError;

const EMPTY_VALUE: &str = "\"\"";

/// One `id:"value"` entry of a field's tag, plus what optimization made of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubTag<'a> {
    pub id: &'a str,
    /// None for placeholders
    pub id_span: Option<Span>,
    /// Value including its quotes
    pub value: &'a str,
    pub value_span: Option<Span>,
    /// False for a placeholder standing in for an absent entry
    pub present: bool,
    pub namespace: Option<Token<'a>>,
    pub tag_name: Option<Token<'a>>,
    pub options: Vec<&'a str>,
    /// Serialization priority among sibling sub-tags, highest first
    pub weight: u8,
    /// Rewritten value, quotes included, when optimization changed it
    pub emit_result: Option<String>,
    /// Effective key after optimization (the field name when unnamed)
    pub emit_name: Option<String>,
}

impl<'a> SubTag<'a> {
    fn parsed(id: Token<'a>, value: Token<'a>) -> Self {
        Self {
            id: id.text(),
            id_span: Some(id.span),
            value: value.text(),
            value_span: Some(value.span),
            present: true,
            namespace: None,
            tag_name: None,
            options: Vec::new(),
            weight: 0,
            emit_result: None,
            emit_name: None,
        }
    }

    /// Zero-valued stand-in for an entry the tag does not contain.
    pub fn placeholder(id: &'a str) -> Self {
        Self {
            id,
            id_span: None,
            value: EMPTY_VALUE,
            value_span: None,
            present: false,
            namespace: None,
            tag_name: None,
            options: Vec::new(),
            weight: 0,
            emit_result: None,
            emit_name: None,
        }
    }

    /// Column diagnostics about this entry point at.
    pub fn anchor(&self) -> Option<usize> {
        self.tag_name
            .map(|t| t.start())
            .or(self.id_span.map(|s| s.start))
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| *o == option)
    }

    /// The value as it will be written: rewritten if optimized.
    pub fn output_value(&self) -> &str {
        self.emit_result.as_deref().unwrap_or(self.value)
    }
}

/// The ordered sub-tags of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet<'a> {
    entries: Vec<SubTag<'a>>,
}

impl<'a> TagSet<'a> {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, id: &str) -> Option<&SubTag<'a>> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn entry(&self, index: usize) -> &SubTag<'a> {
        &self.entries[index]
    }

    pub fn entry_mut(&mut self, index: usize) -> &mut SubTag<'a> {
        &mut self.entries[index]
    }

    /// Append a placeholder for `id` and return its index.
    pub fn push_placeholder(&mut self, id: &'a str) -> usize {
        self.entries.push(SubTag::placeholder(id));
        self.entries.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubTag<'a>> {
        self.entries.iter()
    }

    /// Stable sort, highest weight first.
    pub fn sort_by_weight(&mut self) {
        self.entries.sort_by(|a, b| b.weight.cmp(&a.weight));
    }
}

/// Split a backtick tag into its `id:"value"` entries.
pub fn parse_tag<'a>(source: &'a str, tag: Token<'a>) -> Result<TagSet<'a>, FieldError> {
    let mut lexer = Lexer::with_range(source, &TAG_STRING, tag.interior());
    let mut set = TagSet::default();
    loop {
        let id = lexer.next_token();
        if id.is_null() {
            return Ok(set);
        }
        if !id.is_any_word() {
            return Err(FieldError::TagIdentifierExpected {
                found: id.describe(),
                column: id.start(),
            });
        }
        let separator = lexer.next_token();
        if !separator.is_punct(b':') {
            return Err(FieldError::SeparatorExpected {
                id: id.text().to_string(),
                found: separator.describe(),
                column: separator.start(),
            });
        }
        let value = lexer.next_token();
        if !value.is_string() {
            return Err(FieldError::ValueExpected {
                id: id.text().to_string(),
                found: value.describe(),
                column: value.start(),
            });
        }
        if set.get(id.text()).is_some() {
            return Err(FieldError::DuplicateId {
                id: id.text().to_string(),
                column: id.start(),
            });
        }
        set.entries.push(SubTag::parsed(id, value));
    }
}

/// Parse an entry's value into namespace, name and options.
pub fn parse_value<'a>(
    source: &'a str,
    entry: &mut SubTag<'a>,
    allow_namespace: bool,
) -> Result<(), FieldError> {
    let Some(value_span) = entry.value_span else {
        return Ok(());
    };
    let interior = if value_span.len() >= 2 && entry.value.ends_with('"') {
        Span::new(value_span.start + 1, value_span.end - 1)
    } else {
        Span::new(value_span.start + 1, value_span.end)
    };
    let mut lexer = Lexer::with_range(source, &TAG_VALUE, interior);

    let mut token = lexer.next_token();
    if token.is_null() {
        return Ok(());
    }

    if allow_namespace && token.is_any_word() {
        let next = lexer.peek_token_with_whitespace();
        if next.is_space() {
            entry.namespace = Some(token);
            lexer.next_token();
            token = lexer.next_token();
        }
    }

    if token.is_any_word() {
        entry.tag_name = Some(token);
        token = lexer.next_token();
    }

    loop {
        if token.is_null() {
            return Ok(());
        }
        if !token.is_punct(b',') {
            return Err(FieldError::CommaExpected {
                found: token.describe(),
                column: token.start(),
            });
        }
        while token.is_punct(b',') {
            token = lexer.next_token();
        }
        if token.is_null() {
            return Ok(());
        }
        if !token.is_any_word() {
            return Err(FieldError::OptionExpected {
                found: token.describe(),
                column: token.start(),
            });
        }
        entry.options.push(token.text());
        token = lexer.next_token();
    }
}
