//! URI reference classification and scheme allow-lists.
//!
//! Values are never resolved against a base. Classification only answers
//! which scheme a browser would pick for the reference, whether the
//! reference borrows its scheme from the page (`//host/path`), and for
//! `data:` URIs which media type the payload claims.

use crate::error::{PolicyError, PolicyErrorKind};

/// The media type that can never be allowed in a `data:` URI.
const HTML_MEDIA_TYPE: &str = "text/html";

/// Result of [`classify_uri`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriClass {
    /// Lowercased scheme, or `None` for relative references.
    pub scheme: Option<String>,
    /// `true` for references starting with `//`.
    pub is_protocol_relative: bool,
    /// Lowercased media type of a `data:` URI, if one is declared.
    pub media_type: Option<String>,
}

/// Classifies a URI reference the way a browser would see it.
///
/// Leading and trailing control characters and spaces are ignored and
/// ASCII tabs and newlines are removed before looking at the value, so
/// `" java\tscript:alert(1)"` classifies as scheme `javascript`. A
/// backslash counts as a slash when detecting protocol-relative references.
///
/// # Examples
///
/// ```
/// use html_policy::classify_uri;
///
/// let class = classify_uri("data:image/png;base64,iVBORw0KGgo=");
/// assert_eq!(class.scheme.as_deref(), Some("data"));
/// assert_eq!(class.media_type.as_deref(), Some("image/png"));
///
/// let class = classify_uri("//example.org/logo.svg");
/// assert_eq!(class.scheme, None);
/// assert!(class.is_protocol_relative);
/// ```
pub fn classify_uri(value: &str) -> UriClass {
    let normalized = normalize(value);

    let scheme = normalized
        .split_once(':')
        .filter(|(candidate, _)| is_valid_scheme(candidate))
        .map(|(candidate, _)| candidate.to_ascii_lowercase());

    let is_protocol_relative = scheme.is_none() && {
        let mut chars = normalized.chars();
        matches!(
            (chars.next(), chars.next()),
            (Some('/' | '\\'), Some('/' | '\\'))
        )
    };

    let media_type = match scheme.as_deref() {
        Some("data") => normalized
            .split_once(':')
            .and_then(|(_, payload)| data_media_type(payload)),
        _ => None,
    };

    UriClass {
        scheme,
        is_protocol_relative,
        media_type,
    }
}

fn normalize(value: &str) -> String {
    value
        .trim_matches(|c: char| c <= ' ')
        .chars()
        .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

/// Media type of a `data:` payload: everything up to the first `;` or `,`.
fn data_media_type(payload: &str) -> Option<String> {
    let end = payload
        .find(|c| c == ';' || c == ',')
        .unwrap_or(payload.len());
    let media_type = payload[..end].trim();

    if media_type.is_empty() {
        None
    } else {
        Some(media_type.to_ascii_lowercase())
    }
}

/// `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`
pub(crate) fn is_valid_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

/// Validation rule for a URI-bearing attribute.
///
/// A value passes when its scheme is allowed, or when it has no scheme and
/// relative references are allowed. Protocol-relative references pass only
/// with [`allow_protocol_relative`](Self::allow_protocol_relative).
/// `data:` URIs additionally need an allowed media type; `text/html` never
/// passes.
///
/// # Examples
///
/// ```
/// use html_policy::UriRule;
///
/// let rule = UriRule::new()
///     .schemes(["http", "https", "data"])
///     .data_media_types(["image/png"])
///     .allow_relative(true);
///
/// assert!(rule.permits("https://example.org/logo.png"));
/// assert!(rule.permits("/logo.png"));
/// assert!(rule.permits("data:image/png;base64,AAAA"));
/// assert!(!rule.permits("data:text/html,<script>alert(1)</script>"));
/// assert!(!rule.permits("javascript:alert(1)"));
/// assert!(!rule.permits("//example.org/logo.png"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriRule {
    schemes: Vec<String>,
    data_media_types: Vec<String>,
    allow_relative: bool,
    allow_protocol_relative: bool,
}

impl UriRule {
    /// Creates a rule that rejects every value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds allowed schemes. Matching is case-insensitive.
    pub fn schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for scheme in schemes {
            let scheme = scheme.as_ref().to_ascii_lowercase();
            if !self.schemes.contains(&scheme) {
                self.schemes.push(scheme);
            }
        }
        self
    }

    /// Adds media types accepted in `data:` URIs.
    pub fn data_media_types<I, S>(mut self, media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for media_type in media_types {
            let media_type = media_type.as_ref().trim().to_ascii_lowercase();
            if !self.data_media_types.contains(&media_type) {
                self.data_media_types.push(media_type);
            }
        }
        self
    }

    /// Allows references without a scheme (`/path`, `page.html`, `#anchor`).
    pub fn allow_relative(mut self, allow: bool) -> Self {
        self.allow_relative = allow;
        self
    }

    /// Allows references starting with `//`, which inherit the page's scheme.
    pub fn allow_protocol_relative(mut self, allow: bool) -> Self {
        self.allow_protocol_relative = allow;
        self
    }

    /// Returns `true` if `value` passes this rule.
    pub fn permits(&self, value: &str) -> bool {
        let class = classify_uri(value);

        match class.scheme {
            Some(scheme) if !self.schemes.contains(&scheme) => false,
            Some(scheme) if scheme == "data" => match class.media_type {
                Some(media_type) => {
                    media_type != HTML_MEDIA_TYPE && self.data_media_types.contains(&media_type)
                }
                None => false,
            },
            Some(_) => true,
            None if class.is_protocol_relative => self.allow_protocol_relative,
            None => self.allow_relative,
        }
    }

    /// Returns `true` if every candidate URL of a `srcset`-style value
    /// passes this rule.
    pub fn permits_source_set(&self, value: &str) -> bool {
        source_set_urls(value).into_iter().all(|url| self.permits(url))
    }

    pub(crate) fn validate(&self) -> Result<(), PolicyError> {
        if let Some(scheme) = self.schemes.iter().find(|s| !is_valid_scheme(s)) {
            return Err(PolicyError::new(
                PolicyErrorKind::InvalidScheme,
                format!("scheme `{}` is not a valid URI scheme", scheme),
            ));
        }

        if !self.data_media_types.is_empty() && !self.schemes.iter().any(|s| s == "data") {
            return Err(PolicyError::new(
                PolicyErrorKind::MediaTypesWithoutData,
                "data media types are configured but `data` is not an allowed scheme",
            ));
        }

        if let Some(media_type) = self
            .data_media_types
            .iter()
            .find(|m| m.is_empty() || m.as_str() == HTML_MEDIA_TYPE)
        {
            return Err(PolicyError::new(
                PolicyErrorKind::ForbiddenMediaType,
                format!("media type `{}` cannot be allowed in data URIs", media_type),
            ));
        }

        Ok(())
    }
}

/// Splits a `srcset` value into its candidate URLs.
///
/// A URL runs up to the next whitespace, so commas inside `data:` URIs stay
/// part of the URL; descriptors (`2x`, `800w`) run up to the next comma.
fn source_set_urls(value: &str) -> Vec<&str> {
    let mut urls = Vec::new();
    let mut rest = value;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }

        let end = rest
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(rest.len());
        let (url, tail) = rest.split_at(end);
        let trimmed = url.trim_end_matches(',');
        urls.push(trimmed);

        rest = if trimmed.len() != url.len() {
            tail
        } else {
            match tail.find(',') {
                Some(comma) => &tail[comma + 1..],
                None => "",
            }
        };
    }

    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link_rule() -> UriRule {
        UriRule::new()
            .schemes(["http", "https", "mailto", "tel", "xmpp", "mid", "git"])
            .allow_relative(true)
    }

    fn image_rule() -> UriRule {
        UriRule::new()
            .schemes(["http", "https", "cid", "data"])
            .data_media_types(["image/png", "image/svg+xml"])
            .allow_relative(true)
    }

    #[test]
    fn classifies_absolute_uri() {
        let class = classify_uri("HTTPS://example.org/");
        assert_eq!(class.scheme.as_deref(), Some("https"));
        assert!(!class.is_protocol_relative);
        assert_eq!(class.media_type, None);
    }

    #[test]
    fn classifies_relative_references() {
        for value in ["/logo.svg", "logo.svg", "#anchor", "?q=1", "a/b:c", ""] {
            let class = classify_uri(value);
            assert_eq!(class.scheme, None, "{}", value);
            assert!(!class.is_protocol_relative, "{}", value);
        }
    }

    #[test]
    fn classifies_protocol_relative_references() {
        for value in ["//example.org", "\\\\example.org", "/\\example.org", " //example.org"] {
            assert!(classify_uri(value).is_protocol_relative, "{}", value);
        }
    }

    #[test]
    fn extracts_data_media_type() {
        assert_eq!(
            classify_uri("data:image/png,...").media_type.as_deref(),
            Some("image/png")
        );
        assert_eq!(
            classify_uri("data:image/png;,...").media_type.as_deref(),
            Some("image/png")
        );
        assert_eq!(
            classify_uri("DATA:Image/SVG+XML;base64,...").media_type.as_deref(),
            Some("image/svg+xml")
        );
        assert_eq!(classify_uri("data:,hello").media_type, None);
    }

    #[test]
    fn normalizes_whitespace_tricks() {
        assert_eq!(
            classify_uri(" java\tscript:alert(1)").scheme.as_deref(),
            Some("javascript")
        );
        assert_eq!(
            classify_uri("\u{1}javas\ncript:alert(1)").scheme.as_deref(),
            Some("javascript")
        );
    }

    #[test]
    fn invalid_scheme_characters_mean_relative() {
        assert_eq!(classify_uri("java script:alert(1)").scheme, None);
        assert_eq!(classify_uri("1http://example.org").scheme, None);
    }

    #[test]
    fn link_rule_accepts_configured_schemes() {
        let rule = link_rule();
        assert!(rule.permits("https://example.org/"));
        assert!(rule.permits("git://github.com/example/repo"));
        assert!(rule.permits("tel:123456789"));
        assert!(rule.permits("xmpp:user@example.org?message"));
        assert!(rule.permits("mid:1234@example.test/5678@example.test"));
        assert!(rule.permits("#anchor"));
    }

    #[test]
    fn link_rule_rejects_other_schemes() {
        let rule = link_rule();
        assert!(!rule.permits("javascript:alert(1)"));
        assert!(!rule.permits("ssh://example.org/"));
        assert!(!rule.permits("data:text/html;..."));
        assert!(!rule.permits("//example.org/"));
    }

    #[test]
    fn image_rule_checks_media_types() {
        let rule = image_rule();
        assert!(rule.permits("data:image/png;base64,..."));
        assert!(rule.permits("data:image/svg+xml;base64,..."));
        assert!(!rule.permits("data:image/gif;base64,..."));
        assert!(!rule.permits("data:,..."));
        assert!(rule.permits("cid:DC117C9322DEB502C3B16769A8A64E08@example.test"));
        assert!(!rule.permits("mailto:user@example.org"));
    }

    #[test]
    fn text_html_is_never_permitted() {
        // Bypasses validate() on purpose: the check still holds at match time.
        let rule = UriRule {
            schemes: vec!["data".to_string()],
            data_media_types: vec!["text/html".to_string()],
            allow_relative: false,
            allow_protocol_relative: false,
        };
        assert!(!rule.permits("data:text/html,<script>alert(1)</script>"));
    }

    #[test]
    fn protocol_relative_needs_opt_in() {
        let rule = UriRule::new().allow_relative(true).allow_protocol_relative(true);
        assert!(rule.permits("//example.org/logo.svg"));
    }

    #[test]
    fn source_set_candidates() {
        assert_eq!(source_set_urls("/logo-800.png"), vec!["/logo-800.png"]);
        assert_eq!(
            source_set_urls("a.png 1x, b.png 2x"),
            vec!["a.png", "b.png"]
        );
        assert_eq!(
            source_set_urls("data:image/png;base64,AAAA 1x,b.png"),
            vec!["data:image/png;base64,AAAA", "b.png"]
        );
        assert_eq!(source_set_urls("a.png,b.png"), vec!["a.png", "b.png"]);
        assert!(source_set_urls(" , ").is_empty());
    }

    #[test]
    fn source_set_rejects_any_bad_candidate() {
        let rule = image_rule();
        assert!(rule.permits_source_set("/a.png 1x, https://example.org/b.png 2x"));
        assert!(!rule.permits_source_set("/a.png 1x, javascript:alert(1) 2x"));
    }

    #[test]
    fn validate_reports_misconfiguration() {
        let err = UriRule::new().schemes(["ht tp"]).validate().unwrap_err();
        assert_eq!(err.kind(), PolicyErrorKind::InvalidScheme);

        let err = UriRule::new()
            .schemes(["https"])
            .data_media_types(["image/png"])
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), PolicyErrorKind::MediaTypesWithoutData);

        let err = UriRule::new()
            .schemes(["data"])
            .data_media_types(["Text/HTML"])
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), PolicyErrorKind::ForbiddenMediaType);

        assert!(image_rule().validate().is_ok());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: classification never panics and schemes are lowercase
            #[test]
            fn proptest_classify_is_total(value in ".{0,64}") {
                let class = classify_uri(&value);
                if let Some(scheme) = class.scheme {
                    prop_assert!(is_valid_scheme(&scheme));
                    prop_assert_eq!(scheme.clone(), scheme.to_ascii_lowercase());
                    prop_assert!(!class.is_protocol_relative);
                }
            }

            /// Property: a rule without schemes only admits relative references
            #[test]
            fn proptest_relative_only_rule(value in "[a-z]{1,8}:[a-z/]{0,16}") {
                let rule = UriRule::new().allow_relative(true);
                prop_assert!(!rule.permits(&value));
            }
        }
    }
}
