//! A small Wadler-style document IR: `group`/`softline`/`hardline`
//! primitives over which the line-length rule lays out wrapped
//! constructs, rather than editing wrapped text with regexes.

#[derive(Clone, Debug)]
pub enum Doc {
    Text(String),
    Concat(Vec<Doc>),
    /// Tries to render its contents on one line first; falls back to
    /// breaking every `SoftLine`/`HardLine` inside it into a real newline
    /// when the flat rendering would exceed the configured width.
    Group(Box<Doc>),
    /// A space when flat, a newline (plus the current indent) when broken.
    SoftLine,
    /// Always a newline plus the current indent, regardless of breaking.
    HardLine,
    Indent(Box<Doc>),
}

impl Doc {
    pub fn text(s: impl Into<String>) -> Doc {
        Doc::Text(s.into())
    }

    pub fn concat(parts: Vec<Doc>) -> Doc {
        Doc::Concat(parts)
    }

    pub fn group(inner: Doc) -> Doc {
        Doc::Group(Box::new(inner))
    }

    pub fn indent(inner: Doc) -> Doc {
        Doc::Indent(Box::new(inner))
    }

    /// Join `parts` with `sep` placed between each pair.
    pub fn join(parts: Vec<Doc>, sep: Doc) -> Doc {
        let mut out = Vec::with_capacity(parts.len() * 2);
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                out.push(sep.clone());
            }
            out.push(part);
        }
        Doc::Concat(out)
    }

    fn flat_width(&self) -> usize {
        match self {
            Doc::Text(s) => s.chars().count(),
            Doc::Concat(parts) => parts.iter().map(Doc::flat_width).sum(),
            Doc::Group(inner) | Doc::Indent(inner) => inner.flat_width(),
            Doc::SoftLine => 1,
            Doc::HardLine => 0,
        }
    }
}

/// Renders `doc` into text no wider than `max_width` columns where a
/// group's contents fit flat; groups that don't fit break all of their
/// `SoftLine`s into real newlines. `base_indent` is reproduced at the start
/// of every continuation line (the original line's own leading whitespace),
/// with `indent_unit` repeated per `Doc::Indent` nesting level on top of it.
/// `start_column` seeds the column counter so fit checks account for text
/// already emitted before `doc` (e.g. the unwrapped head of the line).
pub fn print(doc: &Doc, max_width: usize, base_indent: &str, indent_unit: &str, start_column: usize) -> String {
    let mut out = String::new();
    let mut column = start_column;
    render(doc, max_width, base_indent, indent_unit, 0, false, &mut out, &mut column);
    out
}

#[allow(clippy::too_many_arguments)]
fn render(
    doc: &Doc,
    max_width: usize,
    base_indent: &str,
    indent_unit: &str,
    indent_level: usize,
    force_break: bool,
    out: &mut String,
    column: &mut usize,
) {
    match doc {
        Doc::Text(s) => {
            out.push_str(s);
            *column += s.chars().count();
        }
        Doc::Concat(parts) => {
            for part in parts {
                render(part, max_width, base_indent, indent_unit, indent_level, force_break, out, column);
            }
        }
        Doc::Indent(inner) => {
            render(inner, max_width, base_indent, indent_unit, indent_level + 1, force_break, out, column);
        }
        Doc::Group(inner) => {
            let fits = *column + inner.flat_width() <= max_width;
            render(inner, max_width, base_indent, indent_unit, indent_level, !fits, out, column);
        }
        Doc::SoftLine => {
            if force_break {
                newline(base_indent, indent_unit, indent_level, out, column);
            } else {
                out.push(' ');
                *column += 1;
            }
        }
        Doc::HardLine => {
            newline(base_indent, indent_unit, indent_level, out, column);
        }
    }
}

fn newline(base_indent: &str, indent_unit: &str, indent_level: usize, out: &mut String, column: &mut usize) {
    out.push('\n');
    out.push_str(base_indent);
    let prefix = indent_unit.repeat(indent_level);
    out.push_str(&prefix);
    *column = base_indent.chars().count() + prefix.chars().count();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_stays_flat_when_it_fits() {
        let doc = Doc::group(Doc::concat(vec![
            Doc::text("foo("),
            Doc::text("a"),
            Doc::text(", "),
            Doc::text("b"),
            Doc::text(")"),
        ]));
        assert_eq!(print(&doc, 80, "", "  ", 0), "foo(a, b)");
    }

    #[test]
    fn group_breaks_softlines_when_it_does_not_fit() {
        let doc = Doc::group(Doc::concat(vec![
            Doc::text("foo("),
            Doc::indent(Doc::concat(vec![
                Doc::SoftLine,
                Doc::text("aVeryLongArgumentName,"),
                Doc::SoftLine,
                Doc::text("anotherVeryLongOne"),
            ])),
            Doc::SoftLine,
            Doc::text(")"),
        ]));
        let out = print(&doc, 20, "", "  ", 0);
        assert!(out.contains('\n'));
    }
}
