//! HTML5 fragment parsing into [`Node`] trees.
//!
//! Tree construction, including the HTML5 error recovery (stray `</br>`
//! becomes `<br>`, table content is foster-parented, ...), is delegated to
//! `html5ever`. This module only adapts its DOM into owned nodes and keeps
//! CDATA sections, which an HTML5 tokenizer would otherwise turn into bogus
//! comments that end at the first `>`.

use std::borrow::Cow;

use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::node::{Attribute, Node};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Comment placeholder prefix that stands in for an extracted CDATA
/// section. Lengthened per input until the input does not contain it.
const CDATA_MARKER: &str = "\u{fdd0}cdata:";

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Elements whose content is not markup, so `<![CDATA[` inside them is
/// plain text.
const OPAQUE_ELEMENTS: &[&str] = &[
    "iframe",
    "noembed",
    "noframes",
    "noscript",
    "plaintext",
    "script",
    "style",
    "textarea",
    "title",
    "xmp",
];

/// Parses `markup` as the content of a `<body>` element.
///
/// Never fails; malformed markup is recovered the way browsers do.
///
/// # Examples
///
/// ```
/// use html_policy::{parse_fragment, Attribute, Node};
///
/// let nodes = parse_fragment(r#"<p class="x">a<br>b</p><![CDATA[c]]>"#);
///
/// assert_eq!(
///     nodes,
///     vec![
///         Node::element(
///             "p",
///             vec![Attribute::new("class", "x")],
///             vec![Node::text("a"), Node::element("br", vec![], vec![]), Node::text("b")],
///         ),
///         Node::CData("c".to_string()),
///     ]
/// );
/// ```
pub fn parse_fragment(markup: &str) -> Vec<Node> {
    let (markup, sections) = extract_cdata(markup);

    let context = QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from("body"),
    );
    let dom = html5ever::parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new())
        .one(&*markup);

    // Fragment parsing puts the content under a synthetic <html> root.
    let root = dom
        .document
        .children
        .borrow()
        .iter()
        .find(|child| matches!(child.data, NodeData::Element { .. }))
        .cloned();

    match root {
        Some(root) => convert(&root, &sections),
        None => Vec::new(),
    }
}

/// Converts the children of `root` without recursion.
fn convert(root: &Handle, sections: &CdataSections) -> Vec<Node> {
    enum Step {
        Enter(Handle),
        Leave {
            tag: String,
            attributes: Vec<Attribute>,
        },
    }

    let mut steps: Vec<Step> = root
        .children
        .borrow()
        .iter()
        .rev()
        .cloned()
        .map(Step::Enter)
        .collect();
    let mut frames: Vec<Vec<Node>> = vec![Vec::new()];

    while let Some(step) = steps.pop() {
        let node = match step {
            Step::Enter(handle) => match &handle.data {
                NodeData::Element {
                    name,
                    attrs,
                    template_contents,
                    ..
                } => {
                    let attributes = attrs.borrow().iter().map(convert_attribute).collect();
                    let mut children = handle.children.borrow().clone();
                    if let Some(contents) = template_contents.borrow().as_ref() {
                        children.extend(contents.children.borrow().iter().cloned());
                    }

                    frames.push(Vec::with_capacity(children.len()));
                    steps.push(Step::Leave {
                        tag: name.local.to_string(),
                        attributes,
                    });
                    steps.extend(children.into_iter().rev().map(Step::Enter));
                    continue;
                }
                NodeData::Text { contents } => Node::Text(contents.borrow().to_string()),
                NodeData::Comment { contents } => comment_or_cdata(contents, sections),
                NodeData::Document
                | NodeData::Doctype { .. }
                | NodeData::ProcessingInstruction { .. } => continue,
            },
            Step::Leave { tag, attributes } => Node::Element {
                tag,
                attributes,
                children: frames.pop().unwrap_or_default(),
            },
        };

        if let Some(frame) = frames.last_mut() {
            frame.push(node);
        }
    }

    frames.pop().unwrap_or_default()
}

fn convert_attribute(attribute: &html5ever::Attribute) -> Attribute {
    let name = match &attribute.name.prefix {
        Some(prefix) => format!("{}:{}", prefix, attribute.name.local),
        None => attribute.name.local.to_string(),
    };
    Attribute::new(name, attribute.value.to_string())
}

fn comment_or_cdata(contents: &str, sections: &CdataSections) -> Node {
    if let Some(index) = contents.strip_prefix(sections.marker.as_str()) {
        if let Some(section) = index
            .parse::<usize>()
            .ok()
            .and_then(|i| sections.payloads.get(i))
        {
            return Node::CData(section.clone());
        }
    }

    // A CDATA section the pre-scan did not see, tokenized as a bogus comment.
    if let Some(payload) = contents.strip_prefix("[CDATA[") {
        return Node::CData(payload.strip_suffix("]]").unwrap_or(payload).to_string());
    }

    Node::Comment(contents.to_string())
}

/// CDATA payloads pulled out of the markup, by placeholder index.
#[derive(Debug)]
struct CdataSections {
    marker: String,
    payloads: Vec<String>,
}

/// A placeholder prefix that does not occur in `markup`, so no comment in
/// the input can pass for a placeholder.
fn unique_marker(markup: &str) -> String {
    let mut marker = CDATA_MARKER.to_string();
    while markup.contains(&marker) {
        marker.insert(0, '\u{fdd0}');
    }
    marker
}

/// Replaces every CDATA section in text context with a placeholder comment
/// and returns the payloads by placeholder index.
///
/// Tags (with quoted attribute values), comments, bogus comments and the
/// content of opaque elements are skipped, so `<![CDATA[` inside them is
/// left alone. An unterminated section runs to the end of input.
fn extract_cdata(markup: &str) -> (Cow<'_, str>, CdataSections) {
    let mut sections = CdataSections {
        marker: unique_marker(markup),
        payloads: Vec::new(),
    };
    if !markup.contains(CDATA_OPEN) {
        return (Cow::Borrowed(markup), sections);
    }

    let bytes = markup.as_bytes();
    let lowercase = markup.to_ascii_lowercase();
    let mut out = String::with_capacity(markup.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }

        let rest = &markup[i..];
        if rest.starts_with(CDATA_OPEN) {
            let start = i + CDATA_OPEN.len();
            let (end, next) = match markup[start..].find(CDATA_CLOSE) {
                Some(offset) => (start + offset, start + offset + CDATA_CLOSE.len()),
                None => (markup.len(), markup.len()),
            };

            out.push_str(&markup[copied..i]);
            out.push_str("<!--");
            out.push_str(&sections.marker);
            out.push_str(&sections.payloads.len().to_string());
            out.push_str("-->");
            sections.payloads.push(markup[start..end].to_string());

            i = next;
            copied = next;
        } else if rest.starts_with("<!--") {
            i = comment_end(markup, i);
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            i = markup[i..].find('>').map_or(markup.len(), |offset| i + offset + 1);
        } else if let Some(name) = tag_name(rest) {
            let closing = rest.starts_with("</");
            i = tag_end(bytes, i);

            if !closing && OPAQUE_ELEMENTS.contains(&name.to_ascii_lowercase().as_str()) {
                let end_tag = format!("</{}", name.to_ascii_lowercase());
                i = lowercase[i..]
                    .find(&end_tag)
                    .map_or(markup.len(), |offset| i + offset);
            }
        } else {
            i += 1;
        }
    }

    out.push_str(&markup[copied..]);
    (Cow::Owned(out), sections)
}

/// Index just past the comment starting at `start`.
fn comment_end(markup: &str, start: usize) -> usize {
    let body = start + "<!--".len();
    if markup[body..].starts_with('>') {
        return body + 1;
    }
    if markup[body..].starts_with("->") {
        return body + 2;
    }
    markup[body..]
        .find("-->")
        .map_or(markup.len(), |offset| body + offset + "-->".len())
}

/// Name of the start or end tag at the beginning of `rest`, if it is one.
fn tag_name(rest: &str) -> Option<&str> {
    let after = rest
        .strip_prefix("</")
        .or_else(|| rest.strip_prefix('<'))?;
    let end = after
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after.len());
    let name = &after[..end];

    match name.chars().next() {
        Some(first) if first.is_ascii_alphabetic() => Some(name),
        _ => None,
    }
}

/// Index just past the `>` closing the tag at `start`, honoring quoted
/// attribute values.
fn tag_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    let mut after_equals = false;

    while i < bytes.len() {
        match bytes[i] {
            b'>' => return i + 1,
            b'=' => after_equals = true,
            quote @ (b'"' | b'\'') if after_equals => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
                after_equals = false;
            }
            byte if byte.is_ascii_whitespace() => {}
            _ => after_equals = false,
        }
        i += 1;
    }

    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(tag: &str, attributes: &[(&str, &str)], children: Vec<Node>) -> Node {
        Node::element(
            tag,
            attributes
                .iter()
                .map(|(name, value)| Attribute::new(*name, *value))
                .collect(),
            children,
        )
    }

    #[test]
    fn parses_elements_text_and_attributes() {
        assert_eq!(
            parse_fragment(r#"<div unknown="unknown">value</div>"#),
            vec![el("div", &[("unknown", "unknown")], vec![Node::text("value")])]
        );
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(
            parse_fragment("&lt;script&gt;alert(1)&lt;/script&gt;"),
            vec![Node::text("<script>alert(1)</script>")]
        );
    }

    #[test]
    fn keeps_comments() {
        assert_eq!(
            parse_fragment("<!-- #comment -->"),
            vec![Node::Comment(" #comment ".to_string())]
        );
    }

    #[test]
    fn keeps_valueless_attributes_as_empty() {
        assert_eq!(
            parse_fragment("<div data-bool>value</div>"),
            vec![el("div", &[("data-bool", "")], vec![Node::text("value")])]
        );
    }

    #[test]
    fn stray_br_end_tag_becomes_br() {
        assert_eq!(
            parse_fragment("<br></br>"),
            vec![el("br", &[], vec![]), el("br", &[], vec![])]
        );
    }

    #[test]
    fn extracts_cdata_sections() {
        assert_eq!(
            parse_fragment("<![CDATA[ #cdata ]]>"),
            vec![Node::CData(" #cdata ".to_string())]
        );
        assert_eq!(
            parse_fragment(r#"<![CDATA[<any><span data-value="value"></any>*/]]>"#),
            vec![Node::CData(
                r#"<any><span data-value="value"></any>*/"#.to_string()
            )]
        );
    }

    #[test]
    fn unterminated_cdata_runs_to_end() {
        assert_eq!(
            parse_fragment("a<![CDATA[b<c>"),
            vec![Node::text("a"), Node::CData("b<c>".to_string())]
        );
    }

    #[test]
    fn cdata_inside_attribute_is_not_extracted() {
        let (out, sections) = extract_cdata(r#"<p title="<![CDATA[x]]>">y</p>"#);
        assert!(sections.payloads.is_empty());
        assert_eq!(out, r#"<p title="<![CDATA[x]]>">y</p>"#);
    }

    #[test]
    fn cdata_inside_comment_or_script_is_not_extracted() {
        let (_, sections) = extract_cdata("<!-- <![CDATA[x]]> -->");
        assert!(sections.payloads.is_empty());

        let (_, sections) = extract_cdata("<script>var a = '<![CDATA[x]]>';</script>");
        assert!(sections.payloads.is_empty());

        let (_, sections) = extract_cdata("<SCRIPT>x</script><![CDATA[y]]>");
        assert_eq!(sections.payloads, vec!["y".to_string()]);
    }

    #[test]
    fn forged_placeholder_stays_a_comment() {
        let markup = format!("<!--{}7-->", CDATA_MARKER);
        assert_eq!(
            parse_fragment(&markup),
            vec![Node::Comment(format!("{}7", CDATA_MARKER))]
        );
    }

    #[test]
    fn placeholder_spelled_out_in_a_comment_stays_a_comment() {
        let forged = format!("{}0", CDATA_MARKER);
        let markup = format!("<![CDATA[x]]><!--{}-->", forged);

        assert_eq!(
            parse_fragment(&markup),
            vec![Node::CData("x".to_string()), Node::Comment(forged)]
        );
    }

    #[test]
    fn marker_is_lengthened_until_unique() {
        let markup = format!("<!--{}0-->", CDATA_MARKER);
        let marker = unique_marker(&markup);

        assert!(marker.ends_with(CDATA_MARKER));
        assert!(!markup.contains(&marker));
    }

    #[test]
    fn template_contents_become_children() {
        assert_eq!(
            parse_fragment("<template><b>x</b></template>"),
            vec![el(
                "template",
                &[],
                vec![el("b", &[], vec![Node::text("x")])]
            )]
        );
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(parse_fragment("").is_empty());
    }

    #[test]
    fn tag_scanning_helpers() {
        assert_eq!(tag_name("<div class=x>"), Some("div"));
        assert_eq!(tag_name("</Script>"), Some("Script"));
        assert_eq!(tag_name("< div>"), None);
        assert_eq!(tag_name("<1>"), None);

        let markup = br#"<a title="x>y" b='>'>rest"#;
        assert_eq!(&markup[tag_end(markup, 0)..], b"rest");
    }
}
