//! Splits embedded-logic markup into text and tag segments.
//!
//! Supported tags: `<% code %>`, `<%= escaped %>`, `<%- raw %>`,
//! `<%# comment %>` and the literal `<%%`. A closing `-%>` swallows the
//! newline right after it.

use super::RenderError;

const OPEN: &str = "<%";
const CLOSE: &str = "%>";

/// One piece of a template, borrowing from the template text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Code(&'a str),
    Escaped(&'a str),
    Raw(&'a str),
}

#[derive(Clone, Copy)]
enum TagKind {
    Code,
    Escaped,
    Raw,
    Comment,
}

/// Split a template into segments, in order. Comments are dropped.
pub fn parse(template: &str) -> Result<Vec<Segment<'_>>, RenderError> {
    let mut segments = Vec::new();
    let mut pos = 0;

    while let Some(found) = template[pos..].find(OPEN) {
        let start = pos + found;
        if start > pos {
            segments.push(Segment::Text(&template[pos..start]));
        }

        let after_open = start + OPEN.len();
        let rest = &template[after_open..];

        if rest.starts_with('%') {
            // `<%%` -> literal `<%`
            segments.push(Segment::Text(&template[start..after_open]));
            pos = after_open + 1;
            continue;
        }

        let (kind, body_start) = match rest.chars().next() {
            Some('=') => (TagKind::Escaped, after_open + 1),
            Some('-') => (TagKind::Raw, after_open + 1),
            Some('#') => (TagKind::Comment, after_open + 1),
            _ => (TagKind::Code, after_open),
        };

        let Some(close) = template[body_start..].find(CLOSE) else {
            return Err(RenderError::Syntax {
                offset: start,
                message: "unclosed tag, expected \"%>\"".to_string(),
            });
        };
        let close = body_start + close;

        let trim_newline = close > body_start && template[..close].ends_with('-');
        let body_end = if trim_newline { close - 1 } else { close };

        let body = &template[body_start..body_end];
        match kind {
            TagKind::Code => segments.push(Segment::Code(body)),
            TagKind::Escaped => segments.push(Segment::Escaped(body)),
            TagKind::Raw => segments.push(Segment::Raw(body)),
            TagKind::Comment => {}
        }

        pos = close + CLOSE.len();
        if trim_newline {
            if template[pos..].starts_with("\r\n") {
                pos += 2;
            } else if template[pos..].starts_with('\n') {
                pos += 1;
            }
        }
    }

    if pos < template.len() {
        segments.push(Segment::Text(&template[pos..]));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(parse("<p>Hi</p>").unwrap(), vec![Segment::Text("<p>Hi</p>")]);
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_tag_kinds() {
        let segments = parse("a<% let x = 1; %>b<%= x %>c<%- y %>d<%# note %>e").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Text("a"),
                Segment::Code(" let x = 1; "),
                Segment::Text("b"),
                Segment::Escaped(" x "),
                Segment::Text("c"),
                Segment::Raw(" y "),
                Segment::Text("d"),
                Segment::Text("e"),
            ]
        );
    }

    #[test]
    fn test_literal_open() {
        let segments = parse("use <%% here").unwrap();
        assert_eq!(
            segments,
            vec![Segment::Text("use "), Segment::Text("<%"), Segment::Text(" here")]
        );
    }

    #[test]
    fn test_newline_trim() {
        let segments = parse("<% s.x = 1 -%>\nnext").unwrap();
        assert_eq!(segments, vec![Segment::Code(" s.x = 1 "), Segment::Text("next")]);

        // without the dash the newline stays
        let segments = parse("<% s.x = 1 %>\nnext").unwrap();
        assert_eq!(segments[1], Segment::Text("\nnext"));
    }

    #[test]
    fn test_unclosed_tag() {
        match parse("ok <%= oops") {
            Err(RenderError::Syntax { offset, .. }) => assert_eq!(offset, 3),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }
}
