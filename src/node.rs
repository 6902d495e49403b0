//! The node tree handed from the parser to the walker and serializer.

/// A single `name="value"` pair on an element, in source order.
///
/// Attributes written without a value (`<video controls>`) carry an empty
/// value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name as produced by the parser, including any namespace
    /// prefix (`xlink:href`).
    pub name: String,
    /// Decoded attribute value.
    pub value: String,
}

impl Attribute {
    /// Creates an attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A node of a parsed markup fragment.
///
/// Siblings and attributes keep document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element with its attributes and children.
    Element {
        /// Tag name as produced by the parser.
        tag: String,
        /// Attributes in source order.
        attributes: Vec<Attribute>,
        /// Child nodes in document order.
        children: Vec<Node>,
    },
    /// Character data, already entity-decoded.
    Text(String),
    /// Comment content without its `<!--` and `-->` delimiters.
    Comment(String),
    /// CDATA section payload without its `<![CDATA[` and `]]>` delimiters.
    CData(String),
}

impl Node {
    /// Creates an element node.
    pub fn element(tag: impl Into<String>, attributes: Vec<Attribute>, children: Vec<Node>) -> Self {
        Node::Element {
            tag: tag.into(),
            attributes,
            children,
        }
    }

    /// Creates a text node.
    pub fn text(data: impl Into<String>) -> Self {
        Node::Text(data.into())
    }
}

impl Drop for Node {
    // Children are moved onto a heap stack first, so dropping a deeply
    // nested tree never recurses.
    fn drop(&mut self) {
        let mut stack = match self {
            Node::Element { children, .. } if !children.is_empty() => std::mem::take(children),
            _ => return,
        };
        while let Some(mut node) = stack.pop() {
            if let Node::Element { children, .. } = &mut node {
                stack.append(children);
            }
        }
    }
}

/// Elements that never have an end tag or children.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text content is not entity-escaped when written out.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "iframe",
    "noembed",
    "noframes",
    "noscript",
    "plaintext",
    "script",
    "style",
    "xmp",
];

/// Returns `true` if `tag` names a void element.
pub(crate) fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// Returns `true` if `tag` names an element whose text is written unescaped.
pub(crate) fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|r| r.eq_ignore_ascii_case(tag))
}
