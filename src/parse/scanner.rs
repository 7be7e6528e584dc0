use crate::diagnostics::Notes;
use crate::lexer::{Lexer, GO_SOURCE};
use crate::parse::errors::FieldError;
use crate::parse::field::{parse_field, FieldDeclaration};

/// Line-by-line tracker of `type NAME struct { ... }` blocks.
///
/// Two states: outside any block, or inside the block named by
/// [`current_type`](Self::current_type). Only one block is tracked at a time.
#[derive(Debug, Default, Clone)]
pub struct StructScanner {
    current: Option<String>,
}

impl StructScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the type block the scanner is inside, if any.
    pub fn current_type(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_inside(&self) -> bool {
        self.current.is_some()
    }

    /// Feed the next line; returns the tagged field it declares, if any.
    pub fn scan_line<'a>(
        &mut self,
        line: &'a str,
        notes: &mut Notes,
    ) -> Result<Option<FieldDeclaration<'a>>, FieldError> {
        let mut lexer = Lexer::new(line, &GO_SOURCE);
        let first = lexer.next_token();

        if self.current.is_none() {
            if first.is_word("type") {
                let name = lexer.next_token();
                if name.is_any_word()
                    && lexer.next_token().is_word("struct")
                    && lexer.next_token().is_punct(b'{')
                {
                    let rest = lexer.next_token();
                    if rest.is_null() || rest.is_comment() {
                        tracing::debug!(name = name.text(), "entering type block");
                        self.current = Some(name.text().to_string());
                    }
                }
            }
            return Ok(None);
        }

        if first.is_punct(b'}') {
            let rest = lexer.next_token();
            if rest.is_null() || rest.is_comment() {
                tracing::debug!(name = self.current.as_deref(), "leaving type block");
                self.current = None;
            }
            return Ok(None);
        }

        parse_field(line, first, &mut lexer, notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(scanner: &mut StructScanner, line: &str) -> bool {
        let mut notes = Notes::new();
        matches!(scanner.scan_line(line, &mut notes), Ok(Some(_)))
    }

    #[test]
    fn test_enter_and_leave_block() {
        let mut scanner = StructScanner::new();
        assert!(!feed(&mut scanner, "type Device struct { // comment"));
        assert_eq!(scanner.current_type(), Some("Device"));
        assert!(feed(&mut scanner, "\tName string `xml:\"Name\"`"));
        assert!(!feed(&mut scanner, "} // end"));
        assert!(!scanner.is_inside());
    }

    #[test]
    fn test_fields_outside_block_ignored() {
        let mut scanner = StructScanner::new();
        assert!(!feed(&mut scanner, "Name string `xml:\"Name\"`"));
        assert!(!scanner.is_inside());
    }

    #[test]
    fn test_non_struct_types_ignored() {
        let mut scanner = StructScanner::new();
        feed(&mut scanner, "type Mode int");
        assert!(!scanner.is_inside());
        feed(&mut scanner, "type Runner interface {");
        assert!(!scanner.is_inside());
        feed(&mut scanner, "type Inline struct { A int }");
        assert!(!scanner.is_inside());
    }

    #[test]
    fn test_closing_brace_with_code_stays_inside() {
        let mut scanner = StructScanner::new();
        feed(&mut scanner, "type A struct {");
        feed(&mut scanner, "} `json:\"x\"`");
        assert!(scanner.is_inside());
    }

    #[test]
    fn test_inline_struct_field_is_error() {
        let mut scanner = StructScanner::new();
        feed(&mut scanner, "type Outer struct {");
        let mut notes = Notes::new();
        let result = scanner.scan_line("\tInner struct {", &mut notes);
        assert!(matches!(result, Err(FieldError::InlineStruct { .. })));
    }
}
