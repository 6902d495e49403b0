//! Policy-driven tree sanitization.
//!
//! The walk is depth-first on an explicit work-stack: entering an allowed
//! element opens a new frame for its sanitized children and queues a
//! `Finish` task behind them, which validates the element's attributes once
//! its children are done.

use std::mem;

use crate::node::{is_void_element, Attribute, Node};
use crate::policy::{AttributeDecision, DisallowedElements, Policy, TagRule};
use crate::serializer::{render_end_tag, render_literal, render_start_tag};

/// Elements whose children the HTML parser foster-parents out unless they
/// are table content.
const TABLE_STRUCTURE: &[&str] = &["table", "thead", "tbody", "tfoot", "tr", "colgroup"];

/// Children a table-structure element keeps in place on reparse.
const TABLE_CONTENT: &[&str] = &[
    "caption", "col", "colgroup", "tbody", "td", "tfoot", "th", "thead", "tr", "script", "style",
    "template",
];

enum Task {
    Visit(Node),
    Finish {
        tag: String,
        attributes: Vec<Attribute>,
    },
    Emit(String),
}

/// Sanitized output under construction: one frame of children per open
/// allowed element, plus the tags of those elements.
struct Output {
    frames: Vec<Vec<Node>>,
    open: Vec<String>,
}

impl Output {
    fn new() -> Self {
        Self {
            frames: vec![Vec::new()],
            open: Vec::new(),
        }
    }

    fn open(&mut self, tag: &str, capacity: usize) {
        self.frames.push(Vec::with_capacity(capacity));
        self.open.push(tag.to_string());
    }

    fn close(&mut self) -> Vec<Node> {
        self.open.pop();
        self.frames.pop().unwrap_or_default()
    }

    /// Appends `node` to the innermost open element.
    ///
    /// Content a parser would foster-parent out of a table goes right
    /// before the enclosing table instead, where a reparse would put it.
    fn emit(&mut self, node: Node) {
        let target = if is_fosterable(&node) {
            self.foster_frame()
        } else {
            None
        };
        let index = target.unwrap_or(self.frames.len().saturating_sub(1));
        if let Some(frame) = self.frames.get_mut(index) {
            frame.push(node);
        }
    }

    /// Frame that will receive the table enclosing the innermost open
    /// element, if that element is table structure.
    fn foster_frame(&self) -> Option<usize> {
        for (depth, tag) in self.open.iter().enumerate().rev() {
            if !TABLE_STRUCTURE.contains(&tag.as_str()) {
                return None;
            }
            if tag == "table" {
                return Some(depth);
            }
        }
        None
    }

    fn finish(mut self) -> Vec<Node> {
        self.frames.pop().unwrap_or_default()
    }
}

fn is_fosterable(node: &Node) -> bool {
    match node {
        Node::Text(data) => !data
            .chars()
            .all(|c| matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{c}')),
        Node::Element { tag, .. } => !TABLE_CONTENT.contains(&tag.as_str()),
        Node::Comment(_) | Node::CData(_) => false,
    }
}

/// Sanitizes a node list against `policy`.
///
/// Never fails: anything the policy does not permit is escaped into text,
/// stripped, or removed.
///
/// # Examples
///
/// ```
/// use html_policy::{sanitize_tree, serialize, Attribute, Node, PolicyBuilder, TagRule};
///
/// let policy = PolicyBuilder::new().tag(TagRule::new("div")).build().expect("valid policy");
/// let tree = vec![Node::element(
///     "div",
///     vec![Attribute::new("onclick", "alert(1)")],
///     vec![Node::element("blink", vec![], vec![Node::text("hi")])],
/// )];
///
/// assert_eq!(
///     serialize(&sanitize_tree(tree, &policy)),
///     "<div>&lt;blink&gt;hi&lt;/blink&gt;</div>"
/// );
/// ```
pub fn sanitize_tree(nodes: Vec<Node>, policy: &Policy) -> Vec<Node> {
    let mut tasks: Vec<Task> = nodes.into_iter().rev().map(Task::Visit).collect();
    let mut out = Output::new();

    while let Some(task) = tasks.pop() {
        match task {
            Task::Visit(mut node) => {
                let allowed = match &node {
                    Node::Element { tag, .. } => policy.is_tag_allowed(tag),
                    _ => true,
                };
                if !allowed {
                    encode_disallowed(policy, node, &mut tasks, &mut out);
                    continue;
                }

                match &mut node {
                    Node::Text(data) => out.emit(Node::Text(mem::take(data))),
                    Node::Comment(data) => {
                        if policy.comments_allowed() && is_inert_comment(data) {
                            out.emit(Node::Comment(mem::take(data)));
                        } else {
                            tracing::trace!("removed comment");
                        }
                    }
                    Node::CData(data) => {
                        let text = data.trim();
                        if !text.is_empty() {
                            out.emit(Node::Text(text.to_string()));
                        }
                    }
                    Node::Element {
                        tag,
                        attributes,
                        children,
                    } => {
                        out.open(tag, children.len());
                        tasks.push(Task::Finish {
                            tag: mem::take(tag),
                            attributes: mem::take(attributes),
                        });
                        tasks.extend(mem::take(children).into_iter().rev().map(Task::Visit));
                    }
                }
            }
            Task::Finish { tag, attributes } => {
                let children = out.close();
                if let Some(element) = finish_element(policy, tag, attributes, children) {
                    out.emit(element);
                }
            }
            Task::Emit(text) => out.emit(Node::Text(text)),
        }
    }

    out.finish()
}

fn encode_disallowed(policy: &Policy, mut node: Node, tasks: &mut Vec<Task>, out: &mut Output) {
    let mode = policy.disallowed_elements();
    if let Node::Element { tag, .. } = &node {
        tracing::debug!(tag = %tag, mode = ?mode, "disallowed element");
    }

    match mode {
        DisallowedElements::EncodeSubtree => out.emit(Node::Text(render_literal(&node))),
        DisallowedElements::EncodeTags => {
            if let Node::Element {
                tag,
                attributes,
                children,
            } = &mut node
            {
                out.emit(Node::Text(render_start_tag(tag, attributes)));
                if !is_void_element(tag) {
                    tasks.push(Task::Emit(render_end_tag(tag)));
                }
                tasks.extend(mem::take(children).into_iter().rev().map(Task::Visit));
            }
        }
        DisallowedElements::Remove => {}
    }
}

/// Filters the attributes of an allowed element.
///
/// Returns `None` when a required attribute fails validation or is missing.
fn finish_element(
    policy: &Policy,
    tag: String,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
) -> Option<Node> {
    let rule: &TagRule = policy.tag_rule(&tag)?;
    let mut kept = Vec::with_capacity(attributes.len());

    for attribute in attributes {
        match policy.decide(rule, &attribute.name, &attribute.value) {
            AttributeDecision::Keep => kept.push(attribute),
            AttributeDecision::KeepTransformed(value) => {
                tracing::trace!(tag = %tag, attribute = %attribute.name, "rewrote attribute");
                kept.push(Attribute {
                    name: attribute.name,
                    value,
                });
            }
            AttributeDecision::Drop if rule.is_required(&attribute.name) => {
                tracing::debug!(
                    tag = %tag,
                    attribute = %attribute.name,
                    reason = "required attribute failed validation",
                    "removed element"
                );
                return None;
            }
            AttributeDecision::Drop => {
                tracing::trace!(tag = %tag, attribute = %attribute.name, "dropped attribute");
            }
        }
    }

    if let Some(missing) = rule.required().iter().find(|required| {
        !kept
            .iter()
            .any(|attribute| attribute.name.eq_ignore_ascii_case(required))
    }) {
        tracing::debug!(
            tag = %tag,
            attribute = %missing,
            reason = "required attribute missing",
            "removed element"
        );
        return None;
    }

    Some(Node::Element {
        tag,
        attributes: kept,
        children,
    })
}

/// A comment is inert when writing it back out cannot end it early.
fn is_inert_comment(data: &str) -> bool {
    !(data.starts_with('>')
        || data.starts_with("->")
        || data.contains("-->")
        || data.contains("--!>")
        || data.ends_with("--")
        || data.ends_with("<!-"))
}
