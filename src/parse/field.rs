//! Field-line grammar.
//!
//! ```text
//! field := WORD type [BINARY] [COMMENT]
//! type  := ['[' ']'] ['*'] WORD extra*
//! extra := '[' | ']' | '{' | '}' | '*' | WORD
//! ```
//!
//! The `extra` loop lets type names span several tokens (`map[string]*Foo`,
//! `[]*pkg.Bar`, `struct{}`); brackets and braces must balance by the end.

use crate::diagnostics::Notes;
use crate::lexer::{Lexer, Span, Token, COMMENT_TAG};
use crate::parse::errors::FieldError;

/// One field line inside a type block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDeclaration<'a> {
    pub name: Token<'a>,
    /// Type text without a leading `[]` or `*`
    pub type_span: Span,
    /// Pointer, map or interface: values that can be nil
    pub is_pointer: bool,
    /// Slice or array
    pub is_array: bool,
    pub tag: Option<Token<'a>>,
    pub comment: Option<Token<'a>>,
    /// The `origin` word of an `origin:` marker in the comment
    pub comment_origin: Option<Token<'a>>,
    /// The backtick tag stored after `origin:`
    pub comment_tag: Option<Token<'a>>,
    source: &'a str,
}

impl<'a> FieldDeclaration<'a> {
    pub fn name_text(&self) -> &'a str {
        self.name.text()
    }

    pub fn type_text(&self) -> &'a str {
        &self.source[self.type_span.start..self.type_span.end]
    }

    /// The tag whose sub-tags drive optimization: a stored `origin:` tag wins
    /// over the literal one.
    pub fn source_tag(&self) -> Option<Token<'a>> {
        self.comment_tag.or(self.tag)
    }
}

/// Parse the rest of a field line whose first token is `name`.
///
/// Returns `Ok(None)` for lines that are not tagged fields.
pub(crate) fn parse_field<'a>(
    source: &'a str,
    name: Token<'a>,
    lexer: &mut Lexer<'a>,
    notes: &mut Notes,
) -> Result<Option<FieldDeclaration<'a>>, FieldError> {
    if !name.is_any_word() {
        return Ok(None);
    }

    let mut type_token = lexer.next_token();
    let mut is_array = false;
    let mut is_pointer = false;
    if type_token.is_punct(b'[') && lexer.peek_token().is_punct(b']') {
        is_array = true;
        lexer.next_token();
        type_token = lexer.next_token();
    }
    if type_token.is_punct(b'*') {
        is_pointer = true;
        type_token = lexer.next_token();
    }
    if !type_token.is_any_word() {
        return Ok(None);
    }
    if type_token.is_word("map") || type_token.is_word("interface") {
        is_pointer = true;
    }

    let mut type_end = type_token.end();
    let mut token = lexer.next_token();
    let mut brackets = 0i32;
    let mut braces = 0i32;
    loop {
        if token.is_punct(b'[') {
            brackets += 1;
        } else if token.is_punct(b']') {
            brackets -= 1;
        } else if token.is_punct(b'{') {
            braces += 1;
        } else if token.is_punct(b'}') {
            braces -= 1;
        } else if !token.is_punct(b'*') && !token.is_any_word() {
            break;
        }
        type_end = token.end();
        token = lexer.next_token();
    }

    if brackets != 0 || braces != 0 {
        let column = token.start();
        if braces == 1 && type_token.is_word("struct") {
            return Err(FieldError::InlineStruct { column });
        }
        let (what, depth) = if brackets != 0 {
            ("brackets", brackets)
        } else {
            ("braces", braces)
        };
        return Err(FieldError::BracketMismatch {
            what,
            depth,
            column,
        });
    }

    let mut tag = None;
    if token.is_binary() {
        tag = Some(token);
        token = lexer.next_token();
    }

    let mut comment = None;
    let mut comment_origin = None;
    let mut comment_tag = None;
    if !token.is_null() {
        if !token.is_comment() {
            return Err(FieldError::UnexpectedToken {
                found: token.describe(),
                column: token.start(),
            });
        }
        comment = Some(token);
        if let Some((origin, stored)) = parse_comment_tag(source, token, notes) {
            comment_origin = Some(origin);
            comment_tag = Some(stored);
        }
    }

    if tag.is_none() && comment_tag.is_none() {
        return Ok(None);
    }

    Ok(Some(FieldDeclaration {
        name,
        type_span: Span::new(type_token.start(), type_end),
        is_pointer,
        is_array,
        tag,
        comment,
        comment_origin,
        comment_tag,
        source,
    }))
}

/// Find `origin:` followed by a backtick tag inside a trailing comment.
fn parse_comment_tag<'a>(
    source: &'a str,
    comment: Token<'a>,
    notes: &mut Notes,
) -> Option<(Token<'a>, Token<'a>)> {
    let range = Span::new(comment.start() + 2, comment.end());
    let mut lexer = Lexer::with_range(source, &COMMENT_TAG, range);
    let mut token = lexer.next_token();
    while !token.is_null() {
        if token.is_word("origin") && lexer.peek_token().is_punct(b':') {
            lexer.next_token();
            let stored = lexer.peek_token();
            if stored.is_binary() {
                return Some((token, stored));
            }
            notes.warning(
                Some(token.start()),
                format!("binary tag expected after 'origin:', found {}", stored.describe()),
            );
        }
        token = lexer.next_token();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::lexer::GO_SOURCE;

    fn parse(line: &str) -> (Result<Option<FieldDeclaration<'_>>, FieldError>, Notes) {
        let mut notes = Notes::new();
        let mut lexer = Lexer::new(line, &GO_SOURCE);
        let name = lexer.next_token();
        let result = parse_field(line, name, &mut lexer, &mut notes);
        (result, notes)
    }

    #[test]
    fn test_plain_tagged_field() {
        let (result, notes) = parse("\tName string `xml:\"Name\"`");
        let decl = result.unwrap().unwrap();
        assert_eq!(decl.name_text(), "Name");
        assert_eq!(decl.type_text(), "string");
        assert!(!decl.is_pointer && !decl.is_array);
        assert_eq!(decl.tag.unwrap().text(), "`xml:\"Name\"`");
        assert!(decl.comment.is_none());
        assert!(notes.is_empty());
    }

    #[test]
    fn test_slice_of_pointers() {
        let (result, _) = parse("Items []*pkg.Bar `json:\"items\"`");
        let decl = result.unwrap().unwrap();
        assert!(decl.is_array);
        assert!(decl.is_pointer);
        assert_eq!(decl.type_text(), "pkg.Bar");
    }

    #[test]
    fn test_map_type_spans_tokens() {
        let (result, _) = parse("Index map[string]*Foo `json:\"index\"` // lookup");
        let decl = result.unwrap().unwrap();
        assert!(decl.is_pointer);
        assert!(!decl.is_array);
        assert_eq!(decl.type_text(), "map[string]*Foo");
        assert_eq!(decl.comment.unwrap().text(), "// lookup");
    }

    #[test]
    fn test_untagged_field_skipped() {
        let (result, _) = parse("Count int // just a comment");
        assert_eq!(result.unwrap(), None);
    }

    #[test]
    fn test_embedded_field_ignored() {
        let (result, _) = parse("pkg.Base");
        assert_eq!(result.unwrap(), None);
    }

    #[test]
    fn test_inline_struct_rejected() {
        let (result, _) = parse("Inner struct {");
        let err = result.unwrap_err();
        assert!(matches!(err, FieldError::InlineStruct { .. }));
        assert!(err.is_structural());
    }

    #[test]
    fn test_bracket_mismatch() {
        let (result, _) = parse("Broken map[string `json:\"x\"`");
        match result.unwrap_err() {
            FieldError::BracketMismatch { what, depth, column } => {
                assert_eq!(what, "brackets");
                assert_eq!(depth, 1);
                assert_eq!(column, 18);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_struct_type_balanced() {
        let (result, _) = parse("Marker struct{} `json:\"-\"`");
        let decl = result.unwrap().unwrap();
        assert_eq!(decl.type_text(), "struct{}");
    }

    #[test]
    fn test_unexpected_token_after_type() {
        let (result, _) = parse("Name string \"oops\"");
        let err = result.unwrap_err();
        assert!(matches!(err, FieldError::UnexpectedToken { column: 12, .. }));
        assert!(!err.is_structural());
    }

    #[test]
    fn test_origin_comment_tag() {
        let line = "Name string `json:\"n\"` // keep origin:`json:\"Name\"` tail";
        let (result, _) = parse(line);
        let decl = result.unwrap().unwrap();
        assert_eq!(decl.comment_origin.unwrap().text(), "origin");
        assert_eq!(decl.comment_tag.unwrap().text(), "`json:\"Name\"`");
        assert_eq!(decl.source_tag().unwrap().text(), "`json:\"Name\"`");
    }

    #[test]
    fn test_origin_comment_without_literal_tag() {
        let (result, _) = parse("Name string // origin:`xml:\"Name\"`");
        let decl = result.unwrap().unwrap();
        assert!(decl.tag.is_none());
        assert!(decl.comment_tag.is_some());
    }

    #[test]
    fn test_origin_without_binary_warns() {
        let (result, notes) = parse("Name string `json:\"n\"` // origin: none");
        let decl = result.unwrap().unwrap();
        assert!(decl.comment_tag.is_none());
        let diags = notes.into_vec();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
    }
}
