use crate::{
    node::Node, parser::parse_fragment, policy::Policy, safe_html::SafeHtml,
    serializer::serialize, walker::sanitize_tree,
};

/// Sanitizes untrusted markup against a [`Policy`].
///
/// A `Sanitizer` owns its policy and is `Send + Sync`; build it once and
/// share it (by reference or behind an `Arc`) across any number of calls and
/// threads.
///
/// # Security Properties
///
/// - Default-deny: tags, attributes and URI schemes the policy does not
///   list never survive as live markup
/// - Total: every input produces output, there is no error path that a
///   caller could fall back from
/// - Idempotent: sanitizing already sanitized output returns it unchanged
///
/// # Examples
///
/// ```
/// use html_policy::{PolicyBuilder, Sanitizer};
///
/// let sanitizer = Sanitizer::new(PolicyBuilder::common().build().expect("preset is valid"));
///
/// assert_eq!(
///     sanitizer.sanitize(r#"<unknown unknown="unknown">value</unknown>"#),
///     r#"&lt;unknown unknown="unknown"&gt;value&lt;/unknown&gt;"#
/// );
/// assert_eq!(sanitizer.sanitize(r#"<img src="mailto:user@example.org" onerror="alert(1)">"#), "");
/// ```
#[derive(Debug, Clone)]
pub struct Sanitizer {
    policy: Policy,
}

impl Sanitizer {
    /// Creates a sanitizer enforcing `policy`.
    pub fn new(policy: Policy) -> Self {
        Self { policy }
    }

    /// Returns the enforced policy.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Sanitizes `markup` and returns the resulting markup.
    ///
    /// Returns an empty string when nothing survives.
    pub fn sanitize(&self, markup: &str) -> String {
        let nodes = parse_fragment(markup);
        serialize(&self.sanitize_tree(nodes))
    }

    /// Sanitizes `markup` and wraps the result as [`SafeHtml`].
    pub fn clean(&self, markup: &str) -> SafeHtml {
        SafeHtml::new_unchecked(self.sanitize(markup))
    }

    /// Sanitizes an already parsed node list.
    pub fn sanitize_tree(&self, nodes: Vec<Node>) -> Vec<Node> {
        sanitize_tree(nodes, &self.policy)
    }
}
