use std::fmt;

/// Error returned when a [`PolicyBuilder`](crate::PolicyBuilder) describes a
/// policy that cannot be enforced.
///
/// This is the only error the crate produces. It surfaces at construction
/// time, before any markup is sanitized; sanitizing itself never fails.
///
/// # Examples
///
/// ```
/// use html_policy::{PolicyError, PolicyErrorKind};
///
/// let error = PolicyError::new(PolicyErrorKind::InvalidScheme, "scheme `1http` is not valid");
/// assert_eq!(error.kind(), PolicyErrorKind::InvalidScheme);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyError {
    kind: PolicyErrorKind,
    message: String,
}

impl PolicyError {
    /// Creates a new policy error.
    pub fn new(kind: PolicyErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> PolicyErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid policy ({}): {}", self.kind, self.message)
    }
}

impl std::error::Error for PolicyError {}

/// Kind of policy misconfiguration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyErrorKind {
    /// A tag or attribute name is empty.
    EmptyName,
    /// A URI scheme is not syntactically a scheme.
    InvalidScheme,
    /// A `data:` media type is empty or can never be allowed (`text/html`).
    ForbiddenMediaType,
    /// Media types are configured but `data` is not an allowed scheme.
    MediaTypesWithoutData,
    /// A required attribute has no rule on its tag.
    UnknownRequiredAttribute,
    /// An enumerated attribute rule lists no values.
    EmptyEnumeration,
}

impl fmt::Display for PolicyErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "empty name"),
            Self::InvalidScheme => write!(f, "invalid scheme"),
            Self::ForbiddenMediaType => write!(f, "forbidden media type"),
            Self::MediaTypesWithoutData => write!(f, "media types without data scheme"),
            Self::UnknownRequiredAttribute => write!(f, "unknown required attribute"),
            Self::EmptyEnumeration => write!(f, "empty enumeration"),
        }
    }
}
