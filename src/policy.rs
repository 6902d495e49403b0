use std::collections::HashMap;

use crate::error::{PolicyError, PolicyErrorKind};
use crate::uri::UriRule;

/// How an attribute value is validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeRule {
    /// A value-less attribute (`controls`, `reversed`). An empty value or a
    /// value equal to the attribute name passes and is rewritten to empty.
    Boolean,
    /// The value must be one of a fixed set, compared case-insensitively.
    Enumerated(Vec<String>),
    /// Any text. Escaping happens at serialization.
    Freeform,
    /// A single URI reference.
    Uri(UriRule),
    /// A `srcset`-style list of URI candidates with descriptors.
    SourceSet(UriRule),
}

impl AttributeRule {
    /// Shorthand for an [`Enumerated`](Self::Enumerated) rule.
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AttributeRule::Enumerated(values.into_iter().map(Into::into).collect())
    }

    fn decide(&self, name: &str, value: &str) -> AttributeDecision {
        let passes = match self {
            AttributeRule::Boolean => {
                if !value.is_empty() && value.eq_ignore_ascii_case(name) {
                    return AttributeDecision::KeepTransformed(String::new());
                }
                value.is_empty()
            }
            AttributeRule::Enumerated(allowed) => {
                allowed.iter().any(|candidate| candidate.eq_ignore_ascii_case(value))
            }
            AttributeRule::Freeform => true,
            AttributeRule::Uri(rule) => rule.permits(value),
            AttributeRule::SourceSet(rule) => rule.permits_source_set(value),
        };

        if passes {
            AttributeDecision::Keep
        } else {
            AttributeDecision::Drop
        }
    }

    fn validate(&self, name: &str) -> Result<(), PolicyError> {
        match self {
            AttributeRule::Enumerated(allowed) if allowed.is_empty() => Err(PolicyError::new(
                PolicyErrorKind::EmptyEnumeration,
                format!("attribute `{}` has no allowed values", name),
            )),
            AttributeRule::Uri(rule) | AttributeRule::SourceSet(rule) => rule.validate(),
            _ => Ok(()),
        }
    }
}

/// Outcome of validating one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeDecision {
    /// Keep the attribute as written.
    Keep,
    /// Keep the attribute with a rewritten value.
    KeepTransformed(String),
    /// Remove the attribute.
    Drop,
}

/// What happens to an element whose tag the policy does not permit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisallowedElements {
    /// Render the whole element, descendants included, as escaped text.
    /// Permitted descendants are escaped along with it.
    #[default]
    EncodeSubtree,
    /// Render only the element's own start and end tags as escaped text and
    /// sanitize its children independently.
    EncodeTags,
    /// Remove the element and its descendants.
    Remove,
}

/// Attribute rules keyed by exact name or by name prefix (`data-`).
#[derive(Debug, Clone, Default)]
pub(crate) struct AttributeSet {
    exact: HashMap<String, AttributeRule>,
    prefixed: Vec<(String, AttributeRule)>,
}

impl AttributeSet {
    pub(crate) fn insert(&mut self, name: &str, rule: AttributeRule) {
        self.exact.insert(name.to_ascii_lowercase(), rule);
    }

    pub(crate) fn insert_prefix(&mut self, prefix: &str, rule: AttributeRule) {
        let prefix = prefix.to_ascii_lowercase();
        match self.prefixed.iter_mut().find(|(p, _)| *p == prefix) {
            Some(entry) => entry.1 = rule,
            None => self.prefixed.push((prefix, rule)),
        }
    }

    pub(crate) fn merge(&mut self, other: AttributeSet) {
        self.exact.extend(other.exact);
        for (prefix, rule) in other.prefixed {
            self.insert_prefix(&prefix, rule);
        }
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    fn lookup(&self, name: &str) -> Option<&AttributeRule> {
        let name = name.to_ascii_lowercase();
        self.exact.get(&name).or_else(|| {
            self.prefixed
                .iter()
                // A bare prefix (`data-`) is not a name in its own right.
                .find(|(prefix, _)| name.len() > prefix.len() && name.starts_with(prefix.as_str()))
                .map(|(_, rule)| rule)
        })
    }

    pub(crate) fn validate(&self) -> Result<(), PolicyError> {
        for (name, rule) in self.exact.iter().chain(self.prefixed.iter().map(|(p, r)| (p, r))) {
            if name.is_empty() {
                return Err(PolicyError::new(
                    PolicyErrorKind::EmptyName,
                    "attribute name is empty",
                ));
            }
            rule.validate(name)?;
        }
        Ok(())
    }
}

/// A name that can be written into a start tag without ending the name
/// early.
fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(|c| {
            c.is_ascii_whitespace()
                || c.is_control()
                || matches!(c, '"' | '\'' | '<' | '>' | '/' | '=')
        })
}

/// Rules for one permitted tag.
///
/// # Examples
///
/// ```
/// use html_policy::{AttributeRule, TagRule, UriRule};
///
/// let img = TagRule::new("img")
///     .required_attribute("src", AttributeRule::Uri(UriRule::new().schemes(["https"])))
///     .attribute("alt", AttributeRule::Freeform);
///
/// assert_eq!(img.name(), "img");
/// assert!(img.is_required("SRC"));
/// assert!(!img.is_required("alt"));
/// ```
#[derive(Debug, Clone)]
pub struct TagRule {
    name: String,
    pub(crate) attributes: AttributeSet,
    required: Vec<String>,
}

impl TagRule {
    /// Creates a rule for `name` that permits no tag-specific attributes.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_ascii_lowercase(),
            attributes: AttributeSet::default(),
            required: Vec::new(),
        }
    }

    /// Permits an optional attribute. Failing validation removes only the
    /// attribute.
    pub fn attribute(mut self, name: &str, rule: AttributeRule) -> Self {
        self.attributes.insert(name, rule);
        self
    }

    /// Permits every attribute whose name starts with `prefix`.
    pub fn attribute_prefix(mut self, prefix: &str, rule: AttributeRule) -> Self {
        self.attributes.insert_prefix(prefix, rule);
        self
    }

    /// Permits a required attribute. Failing validation, or being absent,
    /// removes the whole element.
    pub fn required_attribute(mut self, name: &str, rule: AttributeRule) -> Self {
        self.attributes.insert(name, rule);
        self.require(name)
    }

    /// Marks an already permitted attribute (tag-specific or global) as
    /// required.
    pub fn require(mut self, name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if !self.required.contains(&name) {
            self.required.push(name);
        }
        self
    }

    /// Returns the lowercased tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if `attribute` is required on this tag.
    pub fn is_required(&self, attribute: &str) -> bool {
        self.required
            .iter()
            .any(|required| required.eq_ignore_ascii_case(attribute))
    }

    /// Returns the required attribute names.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub(crate) fn merge(&mut self, other: TagRule) {
        self.attributes.merge(other.attributes);
        for name in other.required {
            if !self.required.contains(&name) {
                self.required.push(name);
            }
        }
    }
}

/// An immutable, default-deny allow-list of tags, attributes and URI
/// schemes.
///
/// Built once through [`PolicyBuilder`](crate::PolicyBuilder) and shared
/// read-only by any number of sanitize calls, across threads if needed.
///
/// # Examples
///
/// ```
/// use html_policy::{AttributeDecision, AttributeRule, PolicyBuilder, TagRule};
///
/// let policy = PolicyBuilder::new()
///     .tag(TagRule::new("div"))
///     .global_attribute("class", AttributeRule::Freeform)
///     .build()
///     .expect("valid policy");
///
/// assert!(policy.is_tag_allowed("DIV"));
/// assert!(!policy.is_tag_allowed("script"));
/// assert_eq!(policy.attribute_decision("div", "class", "x"), AttributeDecision::Keep);
/// assert_eq!(policy.attribute_decision("div", "onclick", "x"), AttributeDecision::Drop);
/// ```
#[derive(Debug, Clone)]
pub struct Policy {
    pub(crate) tags: HashMap<String, TagRule>,
    pub(crate) global: AttributeSet,
    pub(crate) disallowed_elements: DisallowedElements,
    pub(crate) comments: bool,
}

impl Policy {
    /// Returns `true` if `tag` is permitted.
    pub fn is_tag_allowed(&self, tag: &str) -> bool {
        self.tag_rule(tag).is_some()
    }

    /// Returns the rule for `tag`, if it is permitted.
    pub fn tag_rule(&self, tag: &str) -> Option<&TagRule> {
        self.tags.get(&tag.to_ascii_lowercase())
    }

    /// Decides what happens to attribute `name="value"` on `tag`.
    ///
    /// Unknown tags and attributes without a rule are dropped.
    pub fn attribute_decision(&self, tag: &str, name: &str, value: &str) -> AttributeDecision {
        match self.tag_rule(tag) {
            Some(rule) => self.decide(rule, name, value),
            None => AttributeDecision::Drop,
        }
    }

    pub(crate) fn decide(&self, rule: &TagRule, name: &str, value: &str) -> AttributeDecision {
        if !is_valid_attribute_name(name) {
            return AttributeDecision::Drop;
        }

        rule.attributes
            .lookup(name)
            .or_else(|| self.global.lookup(name))
            .map_or(AttributeDecision::Drop, |attribute| {
                attribute.decide(name, value)
            })
    }

    /// Returns how disallowed elements are handled.
    pub fn disallowed_elements(&self) -> DisallowedElements {
        self.disallowed_elements
    }

    /// Returns `true` if comments are kept.
    pub fn comments_allowed(&self) -> bool {
        self.comments
    }

    /// Returns the number of permitted tags.
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }
}
