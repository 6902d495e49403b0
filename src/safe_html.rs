use std::fmt;

/// Markup produced by a [`Sanitizer`](crate::Sanitizer).
///
/// `SafeHtml` is proof that a string went through sanitization and may be
/// embedded in a trusted rendering context.
///
/// # Construction Invariants
///
/// There is no public constructor and no `From<String>`; only the
/// sanitizer creates values through the crate-internal `new_unchecked`.
///
/// ```compile_fail
/// use html_policy::SafeHtml;
///
/// // This will not compile - no public constructor:
/// let html = SafeHtml::new_unchecked("<script>alert(1)</script>".to_string());
/// ```
///
/// # Access
///
/// - [`as_str`](Self::as_str) / [`AsRef<str>`]: borrow the markup
/// - [`into_inner`](Self::into_inner): consume and extract it
/// - [`Display`](fmt::Display): write it out unchanged
///
/// # Examples
///
/// ```
/// use html_policy::{PolicyBuilder, Sanitizer};
///
/// let sanitizer = Sanitizer::new(PolicyBuilder::common().build().expect("preset is valid"));
/// let html = sanitizer.clean("<b onclick=\"alert(1)\">bold</b>");
///
/// assert_eq!(html.as_str(), "<b>bold</b>");
/// assert_eq!(format!("<p>{}</p>", html), "<p><b>bold</b></p>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafeHtml {
    inner: String,
}

impl SafeHtml {
    /// Wraps sanitizer output.
    ///
    /// This is `pub(crate)`; callers outside the crate must go through the
    /// sanitizer.
    pub(crate) fn new_unchecked(inner: String) -> Self {
        Self { inner }
    }

    /// Borrows the markup.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Returns `true` if nothing survived sanitization.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Consumes the wrapper and returns the markup.
    pub fn into_inner(self) -> String {
        self.inner
    }
}

impl AsRef<str> for SafeHtml {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}
