use std::collections::HashMap;

use crate::{
    error::{PolicyError, PolicyErrorKind},
    policy::{AttributeRule, AttributeSet, DisallowedElements, Policy, TagRule},
};

/// The policy construction gate.
///
/// `PolicyBuilder` is the only way to construct a [`Policy`]. It collects
/// tag and attribute rules and validates them in [`build`](Self::build)
/// before the policy can be used.
///
/// # Examples
///
/// ```
/// use html_policy::{AttributeRule, PolicyBuilder, TagRule, UriRule};
///
/// let policy = PolicyBuilder::new()
///     .tags(["p", "em", "strong"])
///     .tag(TagRule::new("a").attribute(
///         "href",
///         AttributeRule::Uri(UriRule::new().schemes(["https", "mailto"]).allow_relative(true)),
///     ))
///     .global_attribute("title", AttributeRule::Freeform)
///     .build()
///     .expect("policy should be valid");
///
/// assert!(policy.is_tag_allowed("em"));
/// ```
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    tags: HashMap<String, TagRule>,
    global: AttributeSet,
    disallowed_elements: DisallowedElements,
    comments: bool,
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyBuilder {
    /// Creates a builder that permits nothing and keeps comments.
    pub fn new() -> Self {
        Self {
            tags: HashMap::new(),
            global: AttributeSet::default(),
            disallowed_elements: DisallowedElements::default(),
            comments: true,
        }
    }

    /// Permits a tag with its attribute rules.
    ///
    /// Adding a rule for a tag that is already permitted merges the two
    /// rules rather than replacing the first.
    pub fn tag(mut self, rule: TagRule) -> Self {
        match self.tags.get_mut(rule.name()) {
            Some(existing) => existing.merge(rule),
            None => {
                self.tags.insert(rule.name().to_string(), rule);
            }
        }
        self
    }

    /// Permits several tags that take only the global attributes.
    pub fn tags<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .fold(self, |builder, name| builder.tag(TagRule::new(name)))
    }

    /// Permits an attribute on every permitted tag.
    pub fn global_attribute(mut self, name: &str, rule: AttributeRule) -> Self {
        self.global.insert(name, rule);
        self
    }

    /// Permits every attribute starting with `prefix` on every permitted tag.
    pub fn global_attribute_prefix(mut self, prefix: &str, rule: AttributeRule) -> Self {
        self.global.insert_prefix(prefix, rule);
        self
    }

    /// Sets how disallowed elements are handled.
    pub fn disallowed_elements(mut self, mode: DisallowedElements) -> Self {
        self.disallowed_elements = mode;
        self
    }

    /// Keeps (`true`, the default) or removes comments.
    pub fn comments(mut self, keep: bool) -> Self {
        self.comments = keep;
        self
    }

    /// Validates the collected rules and builds the policy.
    ///
    /// # Errors
    ///
    /// Returns a [`PolicyError`] for the first rule that cannot be enforced:
    /// an empty tag or attribute name, an invalid URI scheme, a forbidden or
    /// orphaned `data:` media type, an empty enumeration, or a required
    /// attribute that no rule permits.
    pub fn build(self) -> Result<Policy, PolicyError> {
        self.validate_all()?;

        tracing::debug!(
            tags = self.tags.len(),
            disallowed_elements = ?self.disallowed_elements,
            comments = self.comments,
            "built sanitizer policy"
        );

        Ok(Policy {
            tags: self.tags,
            global: self.global,
            disallowed_elements: self.disallowed_elements,
            comments: self.comments,
        })
    }

    fn validate_all(&self) -> Result<(), PolicyError> {
        self.global.validate()?;
        for rule in self.tags.values() {
            self.validate_one(rule)?;
        }
        Ok(())
    }

    fn validate_one(&self, rule: &TagRule) -> Result<(), PolicyError> {
        if rule.name().is_empty() {
            return Err(PolicyError::new(
                PolicyErrorKind::EmptyName,
                "tag name is empty",
            ));
        }

        rule.attributes.validate()?;

        if let Some(missing) = rule
            .required()
            .iter()
            .find(|name| !rule.attributes.contains(name) && !self.global.contains(name))
        {
            return Err(PolicyError::new(
                PolicyErrorKind::UnknownRequiredAttribute,
                format!(
                    "attribute `{}` is required on `{}` but has no rule",
                    missing,
                    rule.name()
                ),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uri::UriRule;

    #[test]
    fn empty_builder_denies_everything() {
        let policy = PolicyBuilder::new().build().expect("empty policy is valid");

        assert_eq!(policy.tag_count(), 0);
        assert!(!policy.is_tag_allowed("div"));
        assert!(policy.comments_allowed());
        assert_eq!(
            policy.disallowed_elements(),
            DisallowedElements::EncodeSubtree
        );
    }

    #[test]
    fn repeated_tags_merge() {
        let policy = PolicyBuilder::new()
            .tag(TagRule::new("a").attribute("name", AttributeRule::Freeform))
            .tag(TagRule::new("A").attribute("rel", AttributeRule::Freeform))
            .build()
            .expect("valid policy");

        assert_eq!(policy.tag_count(), 1);
        let rule = policy.tag_rule("a").expect("a is permitted");
        assert!(rule.attributes.contains("name"));
        assert!(rule.attributes.contains("rel"));
    }

    #[test]
    fn knobs_are_carried_into_policy() {
        let policy = PolicyBuilder::new()
            .disallowed_elements(DisallowedElements::Remove)
            .comments(false)
            .build()
            .expect("valid policy");

        assert_eq!(policy.disallowed_elements(), DisallowedElements::Remove);
        assert!(!policy.comments_allowed());
    }

    #[test]
    fn rejects_empty_tag_name() {
        let err = PolicyBuilder::new()
            .tag(TagRule::new(""))
            .build()
            .unwrap_err();

        assert_eq!(err.kind(), PolicyErrorKind::EmptyName);
    }

    #[test]
    fn rejects_empty_attribute_name() {
        let err = PolicyBuilder::new()
            .global_attribute("", AttributeRule::Freeform)
            .build()
            .unwrap_err();

        assert_eq!(err.kind(), PolicyErrorKind::EmptyName);
    }

    #[test]
    fn rejects_html_data_uris() {
        let err = PolicyBuilder::new()
            .tag(TagRule::new("iframe").attribute(
                "src",
                AttributeRule::Uri(
                    UriRule::new()
                        .schemes(["data"])
                        .data_media_types(["text/html"]),
                ),
            ))
            .build()
            .unwrap_err();

        assert_eq!(err.kind(), PolicyErrorKind::ForbiddenMediaType);
    }

    #[test]
    fn rejects_empty_enumeration() {
        let err = PolicyBuilder::new()
            .tag(TagRule::new("ol").attribute("type", AttributeRule::Enumerated(Vec::new())))
            .build()
            .unwrap_err();

        assert_eq!(err.kind(), PolicyErrorKind::EmptyEnumeration);
    }

    #[test]
    fn rejects_required_attribute_without_rule() {
        let err = PolicyBuilder::new()
            .tag(TagRule::new("img").require("src"))
            .build()
            .unwrap_err();

        assert_eq!(err.kind(), PolicyErrorKind::UnknownRequiredAttribute);
        assert!(err.message().contains("src"));
    }

    #[test]
    fn required_attribute_may_be_global() {
        let policy = PolicyBuilder::new()
            .global_attribute("itemprop", AttributeRule::Freeform)
            .tag(TagRule::new("meta").require("itemprop"))
            .build();

        assert!(policy.is_ok());
    }

    #[test]
    fn error_message_names_the_scheme() {
        let err = PolicyBuilder::new()
            .tag(TagRule::new("a").attribute(
                "href",
                AttributeRule::Uri(UriRule::new().schemes(["java script"])),
            ))
            .build()
            .unwrap_err();

        assert_eq!(err.kind(), PolicyErrorKind::InvalidScheme);
        assert!(err.message().contains("java script"));
    }
}
