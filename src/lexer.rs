//! Single-line tokenizer driven by per-context character classes.
//!
//! The same lexer is used for Go source lines, tag strings, tag values and
//! trailing comments. Each context is a [`LexerConfig`] naming which bytes are
//! one-byte punctuation and which bytes open a delimited span. Everything else
//! accumulates into words.
//!
//! Tokens are views into the line: they carry byte offsets, never copies, so a
//! rewritten line can be assembled from the untouched slices around them.

use std::fmt;

const CLASS_DEFAULT: u8 = 0;
const CLASS_PUNCT: u8 = 1;
const CLASS_STRING: u8 = 2;

const BACKTICK: u8 = b'`';

/// Kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// End of input
    Null,
    Word,
    /// Run of whitespace (only produced in whitespace mode)
    Space,
    /// Double-quoted span
    String,
    /// Backtick span, i.e. a struct tag
    Binary,
    /// `//` through end of input
    Comment,
    Punct,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Null => "end of line",
            TokenKind::Word => "word",
            TokenKind::Space => "space",
            TokenKind::String => "string",
            TokenKind::Binary => "binary",
            TokenKind::Comment => "comment",
            TokenKind::Punct => "punct",
        };
        f.write_str(name)
    }
}

/// Character classes for one lexing context.
#[derive(Debug, Clone)]
pub struct LexerConfig {
    classes: [u8; 256],
}

impl LexerConfig {
    /// Build a config from its punctuation and string-delimiter bytes.
    ///
    /// A byte listed in both sets is treated as punctuation.
    pub const fn new(punct: &[u8], strings: &[u8]) -> Self {
        let mut classes = [CLASS_DEFAULT; 256];
        let mut i = 0;
        while i < punct.len() {
            classes[punct[i] as usize] = CLASS_PUNCT;
            i += 1;
        }
        let mut i = 0;
        while i < strings.len() {
            if classes[strings[i] as usize] == CLASS_DEFAULT {
                classes[strings[i] as usize] = CLASS_STRING;
            }
            i += 1;
        }
        Self { classes }
    }

    fn class(&self, byte: u8) -> u8 {
        self.classes[byte as usize]
    }
}

/// Go source lines: type punctuation plus both quoting styles.
pub const GO_SOURCE: LexerConfig = LexerConfig::new(b"{}[]*", b"\"`");

/// Trailing comments, where `origin:` is followed by a backtick tag.
pub const COMMENT_TAG: LexerConfig = LexerConfig::new(b":", b"\"`");

/// The interior of a backtick tag: `id:"value"` triples.
pub const TAG_STRING: LexerConfig = LexerConfig::new(b":", b"\"");

/// The interior of one sub-tag value: `[ns ]name,opt,opt`.
pub const TAG_VALUE: LexerConfig = LexerConfig::new(b",", b"");

/// Byte range into a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A token: kind plus a byte range into the owning line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    source: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn text(&self) -> &'a str {
        &self.source[self.span.start..self.span.end]
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    pub fn is_null(&self) -> bool {
        self.kind == TokenKind::Null
    }

    pub fn is_space(&self) -> bool {
        self.kind == TokenKind::Space
    }

    pub fn is_comment(&self) -> bool {
        self.kind == TokenKind::Comment
    }

    pub fn is_string(&self) -> bool {
        self.kind == TokenKind::String
    }

    pub fn is_binary(&self) -> bool {
        self.kind == TokenKind::Binary
    }

    pub fn is_any_word(&self) -> bool {
        self.kind == TokenKind::Word
    }

    pub fn is_word(&self, value: &str) -> bool {
        self.kind == TokenKind::Word && self.text() == value
    }

    pub fn is_punct(&self, value: u8) -> bool {
        self.kind == TokenKind::Punct && self.source.as_bytes()[self.span.start] == value
    }

    /// Span of a delimited token without its delimiters.
    ///
    /// An unterminated span only loses its opening delimiter.
    pub fn interior(&self) -> Span {
        let bytes = self.source.as_bytes();
        let Span { start, end } = self.span;
        if end <= start {
            return self.span;
        }
        let open = bytes[start];
        if end - start >= 2 && bytes[end - 1] == open {
            Span::new(start + 1, end - 1)
        } else {
            Span::new(start + 1, end)
        }
    }

    /// Human-readable description used in diagnostics.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Null => "end of line".to_string(),
            kind => format!("'{}' ({kind})", self.text()),
        }
    }
}

/// Tokenizer over a byte range of one line, with one token of lookahead.
pub struct Lexer<'a> {
    source: &'a str,
    config: &'a LexerConfig,
    pos: usize,
    end: usize,
    whitespace: bool,
    peeked: Option<Token<'a>>,
}

impl<'a> Lexer<'a> {
    /// Lex the whole of `source`.
    pub fn new(source: &'a str, config: &'a LexerConfig) -> Self {
        Self::with_range(source, config, Span::new(0, source.len()))
    }

    /// Lex only `range` of `source`; token offsets stay relative to `source`.
    pub fn with_range(source: &'a str, config: &'a LexerConfig, range: Span) -> Self {
        let end = range.end.min(source.len());
        Self {
            source,
            config,
            pos: range.start.min(end),
            end,
            whitespace: false,
            peeked: None,
        }
    }

    pub fn next_token(&mut self) -> Token<'a> {
        match self.peeked.take() {
            Some(token) => token,
            None => self.lex(),
        }
    }

    pub fn peek_token(&mut self) -> Token<'a> {
        if let Some(token) = self.peeked {
            return token;
        }
        let token = self.lex();
        self.peeked = Some(token);
        token
    }

    /// Peek with whitespace preserved, so a run of blanks shows up as a
    /// [`TokenKind::Space`] token.
    pub fn peek_token_with_whitespace(&mut self) -> Token<'a> {
        if let Some(token) = self.peeked {
            return token;
        }
        self.whitespace = true;
        let token = self.peek_token();
        self.whitespace = false;
        token
    }

    fn make(&mut self, kind: TokenKind, start: usize, end: usize) -> Token<'a> {
        self.pos = end;
        Token {
            kind,
            source: self.source,
            span: Span::new(start, end),
        }
    }

    fn lex(&mut self) -> Token<'a> {
        let source = self.source;
        let bytes = source.as_bytes();
        let end = self.end;
        let mut pos = self.pos;

        while pos < end && bytes[pos] <= b' ' {
            pos += 1;
        }
        if self.whitespace && pos != self.pos {
            return self.make(TokenKind::Space, self.pos, pos);
        }

        let start = pos;
        if pos >= end {
            return self.make(TokenKind::Null, start, start);
        }

        let byte = bytes[pos];
        match self.config.class(byte) {
            CLASS_PUNCT => return self.make(TokenKind::Punct, start, pos + 1),
            CLASS_STRING => {
                let kind = if byte == BACKTICK {
                    TokenKind::Binary
                } else {
                    TokenKind::String
                };
                pos += 1;
                while pos < end {
                    if bytes[pos] == byte {
                        return self.make(kind, start, pos + 1);
                    }
                    pos += 1;
                }
                return self.make(kind, start, end);
            }
            _ => {}
        }

        if byte == b'/' && pos + 1 < end && bytes[pos + 1] == b'/' {
            return self.make(TokenKind::Comment, start, end);
        }

        while pos < end {
            let byte = bytes[pos];
            if byte <= b' ' || self.config.class(byte) != CLASS_DEFAULT {
                break;
            }
            pos += 1;
        }
        self.make(TokenKind::Word, start, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str, config: &LexerConfig) -> Vec<(TokenKind, String)> {
        let mut lexer = Lexer::new(source, config);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token();
            if token.is_null() {
                break;
            }
            out.push((token.kind, token.text().to_string()));
        }
        out
    }

    #[test]
    fn test_go_source_field_line() {
        let tokens = kinds("\tItems []*pkg.Bar `json:\"items\"` // note", &GO_SOURCE);
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Word, "Items".to_string()),
                (TokenKind::Punct, "[".to_string()),
                (TokenKind::Punct, "]".to_string()),
                (TokenKind::Punct, "*".to_string()),
                (TokenKind::Word, "pkg.Bar".to_string()),
                (TokenKind::Binary, "`json:\"items\"`".to_string()),
                (TokenKind::Comment, "// note".to_string()),
            ]
        );
    }

    #[test]
    fn test_unterminated_span_runs_to_end() {
        let mut lexer = Lexer::new("Name string `xml:\"a\"", &GO_SOURCE);
        lexer.next_token();
        lexer.next_token();
        let tag = lexer.next_token();
        assert!(tag.is_binary());
        assert_eq!(tag.text(), "`xml:\"a\"");
        assert_eq!(&"Name string `xml:\"a\""[tag.interior().start..], "xml:\"a\"");
        assert!(lexer.next_token().is_null());
    }

    #[test]
    fn test_tag_string_config() {
        let tokens = kinds("xml:\"a b,attr\" json:\"b\"", &TAG_STRING);
        let kinds: Vec<TokenKind> = tokens.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Word,
                TokenKind::Punct,
                TokenKind::String,
                TokenKind::Word,
                TokenKind::Punct,
                TokenKind::String,
            ]
        );
        assert_eq!(tokens[2].1, "\"a b,attr\"");
    }

    #[test]
    fn test_tag_value_config_keeps_colons_in_words() {
        let tokens = kinds("tns1:Name,omitempty", &TAG_VALUE);
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Word, "tns1:Name".to_string()),
                (TokenKind::Punct, ",".to_string()),
                (TokenKind::Word, "omitempty".to_string()),
            ]
        );
    }

    #[test]
    fn test_whitespace_peek_reports_space() {
        let source = "http://example.org/ns Name";
        let mut lexer = Lexer::new(source, &TAG_VALUE);
        let first = lexer.next_token();
        assert_eq!(first.text(), "http://example.org/ns");
        let space = lexer.peek_token_with_whitespace();
        assert!(space.is_space());
        lexer.next_token();
        assert_eq!(lexer.next_token().text(), "Name");
    }

    #[test]
    fn test_range_offsets_are_absolute() {
        let source = "abc `x:\"y\"`";
        let mut lexer = Lexer::with_range(source, &TAG_STRING, Span::new(5, 10));
        let id = lexer.next_token();
        assert_eq!(id.text(), "x");
        assert_eq!(id.start(), 5);
        assert!(lexer.next_token().is_punct(b':'));
        let value = lexer.next_token();
        assert!(value.is_string());
        assert_eq!(value.span, Span::new(7, 10));
    }

    #[test]
    fn test_comment_only_at_token_start() {
        let tokens = kinds("a//b // c", &GO_SOURCE);
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Word, "a//b".to_string()),
                (TokenKind::Comment, "// c".to_string()),
            ]
        );
    }
}
