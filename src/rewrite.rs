//! Splicing a rewritten tag and comment back into a field line.
//!
//! Only the region from the tag (or the comment, when there is no tag) to the
//! end of the comment is regenerated. Everything before it, and anything after
//! the tag on a comment-less line, is copied through untouched.

use crate::config::OptimizationPolicy;
use crate::parse::FieldDeclaration;

const ORIGIN_MARKER: &str = "origin:";

/// Produce the new text of `line`, or `None` when it stays as is.
///
/// `new_tag` is the engine's result: `Some` with the new tag text (possibly
/// empty) when sub-tags were rewritten, `None` when nothing changed. In the
/// latter case a stored `origin:` tag is put back as the literal tag.
pub fn rewrite_field(
    line: &str,
    decl: &FieldDeclaration<'_>,
    new_tag: Option<&str>,
    policy: &OptimizationPolicy,
) -> Option<String> {
    let literal = decl.tag.map(|t| t.text()).unwrap_or("");
    let comment = decl.comment.map(|c| c.text().trim_end());

    let (tag, comment) = match new_tag {
        Some(tag) => {
            if tag == literal {
                return None;
            }
            let comment = if policy.preserve_original_as_comment
                && decl.comment_tag.is_none()
                && !literal.is_empty()
            {
                Some(match comment {
                    Some(text) => format!("{text} {ORIGIN_MARKER}{literal}"),
                    None => format!("// {ORIGIN_MARKER}{literal}"),
                })
            } else {
                comment.map(str::to_string)
            };
            (tag.to_string(), comment)
        }
        None => {
            let (Some(origin), Some(stored), Some(full), Some(text)) =
                (decl.comment_origin, decl.comment_tag, decl.comment, comment)
            else {
                return None;
            };
            // An unterminated stored tag runs into the trailing blanks.
            let comment_end = full.start() + text.len();
            let stored_end = stored.end().min(comment_end);
            let before = line.get(full.start()..origin.start()).unwrap_or("");
            let after = line.get(stored_end..comment_end).unwrap_or("");
            let joined = format!("{before} {after}");
            let collapsed = joined.split_whitespace().collect::<Vec<_>>().join(" ");
            let comment = (collapsed != "//").then_some(collapsed);
            let restored = line.get(stored.start()..stored_end).unwrap_or(stored.text());
            (restored.to_string(), comment)
        }
    };

    let rewritten = splice(line, decl, &tag, comment.as_deref());
    (rewritten != line).then_some(rewritten)
}

fn splice(line: &str, decl: &FieldDeclaration<'_>, tag: &str, comment: Option<&str>) -> String {
    let region_start = match (decl.tag, decl.comment) {
        (Some(tag), _) => tag.start(),
        (None, Some(comment)) => comment.start(),
        (None, None) => return line.to_string(),
    };
    // Trailing blanks (a `\r` included) stay outside the region.
    let region_end = decl
        .comment
        .map(|c| c.start() + c.text().trim_end().len())
        .or(decl.tag.map(|t| t.end()))
        .unwrap_or(region_start);

    let gap = match (decl.tag, decl.comment) {
        (Some(tag), Some(comment)) => &line[tag.end()..comment.start()],
        _ => " ",
    };

    let mut out = line[..region_start].to_string();
    if tag.is_empty() {
        out.truncate(out.trim_end().len());
    } else {
        out.push_str(tag);
    }
    if let Some(comment) = comment {
        if !out.ends_with(char::is_whitespace) {
            out.push_str(if gap.is_empty() { " " } else { gap });
        }
        out.push_str(comment);
    }
    out.push_str(&line[region_end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Notes;
    use crate::parse::StructScanner;

    fn rewrite(line: &str, new_tag: Option<&str>, policy: OptimizationPolicy) -> Option<String> {
        let mut scanner = StructScanner::new();
        let mut notes = Notes::new();
        scanner.scan_line("type T struct {", &mut notes).unwrap();
        let decl = scanner.scan_line(line, &mut notes).unwrap().unwrap();
        rewrite_field(line, &decl, new_tag, &policy)
    }

    #[test]
    fn test_replace_tag_keeps_prefix_and_comment() {
        let line = "\tFoo  string `xml:\"Foo\"`   // note";
        assert_eq!(
            rewrite(line, Some("`xml:\"\"`"), OptimizationPolicy::none()).as_deref(),
            Some("\tFoo  string `xml:\"\"`   // note")
        );
    }

    #[test]
    fn test_same_tag_is_no_change() {
        let line = "Foo string `xml:\"Foo\"`";
        assert_eq!(
            rewrite(line, Some("`xml:\"Foo\"`"), OptimizationPolicy::none()),
            None
        );
    }

    #[test]
    fn test_empty_tag_removed() {
        let line = "Foo string `json:\"Foo\"`";
        assert_eq!(
            rewrite(line, Some(""), OptimizationPolicy::none()).as_deref(),
            Some("Foo string")
        );
        let commented = "Foo string `json:\"Foo\"` // kept";
        assert_eq!(
            rewrite(commented, Some(""), OptimizationPolicy::none()).as_deref(),
            Some("Foo string // kept")
        );
    }

    #[test]
    fn test_preserve_original_as_comment() {
        let policy = OptimizationPolicy {
            preserve_original_as_comment: true,
            ..Default::default()
        };
        assert_eq!(
            rewrite("Foo string `xml:\"Foo\"`", Some("`xml:\"\"`"), policy).as_deref(),
            Some("Foo string `xml:\"\"` // origin:`xml:\"Foo\"`")
        );
        assert_eq!(
            rewrite("Foo string `xml:\"Foo\"` // note", Some("`xml:\"\"`"), policy).as_deref(),
            Some("Foo string `xml:\"\"` // note origin:`xml:\"Foo\"`")
        );
    }

    #[test]
    fn test_existing_origin_not_duplicated() {
        let policy = OptimizationPolicy {
            preserve_original_as_comment: true,
            ..Default::default()
        };
        let line = "Foo string `xml:\"Bar\"` // origin:`xml:\"Foo\"`";
        assert_eq!(
            rewrite(line, Some("`xml:\"\"`"), policy).as_deref(),
            Some("Foo string `xml:\"\"` // origin:`xml:\"Foo\"`")
        );
    }

    #[test]
    fn test_restore_from_origin() {
        let line = "Foo string `xml:\"\"` // origin:`xml:\"Foo\"`";
        assert_eq!(
            rewrite(line, None, OptimizationPolicy::none()).as_deref(),
            Some("Foo string `xml:\"Foo\"`")
        );
        let noted = "Foo string `xml:\"\"` // note origin:`xml:\"Foo\"` tail";
        assert_eq!(
            rewrite(noted, None, OptimizationPolicy::none()).as_deref(),
            Some("Foo string `xml:\"Foo\"` // note tail")
        );
    }

    #[test]
    fn test_restore_without_literal_tag() {
        let line = "Foo string // origin:`xml:\"Foo\"`";
        assert_eq!(
            rewrite(line, None, OptimizationPolicy::none()).as_deref(),
            Some("Foo string `xml:\"Foo\"`")
        );
    }

    #[test]
    fn test_insert_tag_before_comment() {
        let line = "Foo string // origin:`xml:\"Foo\"`";
        assert_eq!(
            rewrite(line, Some("`xml:\"\"`"), OptimizationPolicy::none()).as_deref(),
            Some("Foo string `xml:\"\"` // origin:`xml:\"Foo\"`")
        );
    }

    #[test]
    fn test_carriage_return_kept() {
        let policy = OptimizationPolicy {
            preserve_original_as_comment: true,
            ..Default::default()
        };
        let line = "Foo string `xml:\"Foo\"` // note\r";
        let annotated = rewrite(line, Some("`xml:\"\"`"), policy).unwrap();
        assert_eq!(annotated, "Foo string `xml:\"\"` // note origin:`xml:\"Foo\"`\r");
        assert_eq!(
            rewrite(&annotated, None, OptimizationPolicy::none()).as_deref(),
            Some("Foo string `xml:\"Foo\"` // note\r")
        );
    }

    #[test]
    fn test_restore_unterminated_origin_before_trailing_blanks() {
        let crlf = "\tFoo string // origin:`xml:\"Foo\"\r";
        assert_eq!(
            rewrite(crlf, None, OptimizationPolicy::none()).as_deref(),
            Some("\tFoo string `xml:\"Foo\"\r")
        );
        let spaced = "\tFoo string // origin:`xml:\"Foo\"  ";
        assert_eq!(
            rewrite(spaced, None, OptimizationPolicy::none()).as_deref(),
            Some("\tFoo string `xml:\"Foo\"  ")
        );
    }

    #[test]
    fn test_no_change_without_origin() {
        assert_eq!(
            rewrite("Foo string `xml:\"Foo\"`", None, OptimizationPolicy::none()),
            None
        );
    }
}
