//! Line-oriented parsing of Go type blocks and their struct tags.
//!
//! Nothing here builds a syntax tree: a two-state scanner finds type blocks,
//! a field-line parser pulls out the name, type shape, tag and comment, and
//! the tag parser splits the tag into sub-tags.

pub mod errors;
pub mod field;
pub mod scanner;
pub mod tag;

pub use errors::FieldError;
pub use field::FieldDeclaration;
pub use scanner::StructScanner;
pub use tag::{parse_tag, parse_value, SubTag, TagSet};
