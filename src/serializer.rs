//! Renders node trees back into markup.

use crate::node::{is_raw_text_element, is_void_element, Attribute, Node};

const LEADING_NEWLINE_ELEMENTS: &[&str] = &["listing", "pre", "textarea"];

/// How text is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Sanitized output: every text node is escaped, CDATA is written as
    /// text.
    Sanitized,
    /// The markup as originally written: text inside raw-text elements is
    /// left alone and CDATA keeps its delimiters.
    Literal,
}

/// Serializes a sanitized node list to markup.
///
/// Text is escaped for `&`, `<` and `>`; attribute values for `&` and `"`.
/// Empty attribute values render as a bare name and void elements render
/// only their start tag.
///
/// # Examples
///
/// ```
/// use html_policy::{serialize, Attribute, Node};
///
/// let nodes = vec![Node::element(
///     "video",
///     vec![Attribute::new("controls", ""), Attribute::new("title", "\"a\" & b")],
///     vec![Node::text("x < y")],
/// )];
///
/// assert_eq!(
///     serialize(&nodes),
///     r#"<video controls title="&quot;a&quot; &amp; b">x &lt; y</video>"#
/// );
/// ```
pub fn serialize(nodes: &[Node]) -> String {
    let mut out = String::new();
    write_nodes(&mut out, nodes, Mode::Sanitized);
    out
}

/// Renders a node as the markup it was written as, without escaping the
/// result.
pub(crate) fn render_literal(node: &Node) -> String {
    let mut out = String::new();
    write_nodes(&mut out, std::slice::from_ref(node), Mode::Literal);
    out
}

pub(crate) fn render_start_tag(tag: &str, attributes: &[Attribute]) -> String {
    let mut out = String::new();
    write_start_tag(&mut out, tag, attributes);
    out
}

pub(crate) fn render_end_tag(tag: &str) -> String {
    format!("</{}>", tag)
}

fn write_nodes(out: &mut String, nodes: &[Node], mode: Mode) {
    // Pre-order writes the start tag and queues the end tag behind the
    // children, so nesting depth never grows the call stack.
    enum Step<'a> {
        Open(&'a Node, bool),
        Close(&'a str),
    }

    let mut stack: Vec<Step<'_>> = nodes.iter().rev().map(|n| Step::Open(n, false)).collect();

    while let Some(step) = stack.pop() {
        match step {
            Step::Open(node, raw_parent) => match node {
                Node::Element {
                    tag,
                    attributes,
                    children,
                } => {
                    write_start_tag(out, tag, attributes);
                    if is_void_element(tag) {
                        continue;
                    }
                    // The parser drops one newline right after these start
                    // tags, so a leading newline needs a spare one.
                    if LEADING_NEWLINE_ELEMENTS.contains(&tag.as_str())
                        && matches!(children.first(), Some(Node::Text(data)) if data.starts_with('\n'))
                    {
                        out.push('\n');
                    }
                    stack.push(Step::Close(tag));
                    let raw = is_raw_text_element(tag);
                    stack.extend(children.iter().rev().map(|c| Step::Open(c, raw)));
                }
                Node::Text(data) => {
                    if mode == Mode::Literal && raw_parent {
                        out.push_str(data);
                    } else {
                        escape_text(out, data);
                    }
                }
                Node::Comment(data) => {
                    out.push_str("<!--");
                    out.push_str(data);
                    out.push_str("-->");
                }
                Node::CData(data) => match mode {
                    Mode::Literal => {
                        out.push_str("<![CDATA[");
                        out.push_str(data);
                        out.push_str("]]>");
                    }
                    Mode::Sanitized => escape_text(out, data),
                },
            },
            Step::Close(tag) => {
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

fn write_start_tag(out: &mut String, tag: &str, attributes: &[Attribute]) {
    out.push('<');
    out.push_str(tag);
    for attribute in attributes {
        out.push(' ');
        out.push_str(&attribute.name);
        if !attribute.value.is_empty() {
            out.push_str("=\"");
            escape_attribute(out, &attribute.value);
            out.push('"');
        }
    }
    out.push('>');
}

/// Escapes character data.
pub(crate) fn escape_text(out: &mut String, text: &str) {
    escape_with(out, text, |byte| match byte {
        b'&' => Some("&amp;"),
        b'<' => Some("&lt;"),
        b'>' => Some("&gt;"),
        _ => None,
    })
}

/// Escapes a double-quoted attribute value.
fn escape_attribute(out: &mut String, value: &str) {
    escape_with(out, value, |byte| match byte {
        b'&' => Some("&amp;"),
        b'"' => Some("&quot;"),
        _ => None,
    })
}

fn escape_with(out: &mut String, text: &str, escape: impl Fn(u8) -> Option<&'static str>) {
    let mut offset = 0;
    for (i, byte) in text.bytes().enumerate() {
        if let Some(replacement) = escape(byte) {
            out.push_str(&text[offset..i]);
            out.push_str(replacement);
            offset = i + 1;
        }
    }
    out.push_str(&text[offset..]);
}
