use thiserror::Error;

/// Errors that stop a single field line from being rewritten.
///
/// Every variant carries the byte column the caret should point at.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("inline struct declaration is not supported, consider a named type")]
    InlineStruct { column: usize },

    #[error("opening and closing {what} mismatch ({depth})")]
    BracketMismatch {
        what: &'static str,
        depth: i32,
        column: usize,
    },

    #[error("comment or end of line expected, found {found}")]
    UnexpectedToken { found: String, column: usize },

    #[error("tag identifier expected, found {found}")]
    TagIdentifierExpected { found: String, column: usize },

    #[error("separator ':' expected after tag '{id}', found {found}")]
    SeparatorExpected {
        id: String,
        found: String,
        column: usize,
    },

    #[error("configuration string expected for '{id}', found {found}")]
    ValueExpected {
        id: String,
        found: String,
        column: usize,
    },

    #[error("duplicate tag identifier '{id}'")]
    DuplicateId { id: String, column: usize },

    #[error("comma separator ',' expected, found {found}")]
    CommaExpected { found: String, column: usize },

    #[error("option identifier expected, found {found}")]
    OptionExpected { found: String, column: usize },
}

impl FieldError {
    pub fn column(&self) -> usize {
        match self {
            FieldError::InlineStruct { column }
            | FieldError::BracketMismatch { column, .. }
            | FieldError::UnexpectedToken { column, .. }
            | FieldError::TagIdentifierExpected { column, .. }
            | FieldError::SeparatorExpected { column, .. }
            | FieldError::ValueExpected { column, .. }
            | FieldError::DuplicateId { column, .. }
            | FieldError::CommaExpected { column, .. }
            | FieldError::OptionExpected { column, .. } => *column,
        }
    }

    /// Structural errors leave the block structure in doubt, so the whole
    /// file is kept as is.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            FieldError::InlineStruct { .. } | FieldError::BracketMismatch { .. }
        )
    }
}
