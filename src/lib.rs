//! Policy-driven, default-deny HTML sanitization.
//!
//! This crate turns untrusted markup into markup that is safe to embed in a
//! trusted page by enforcing an allow-list of:
//! - **Tags**: anything not listed is escaped into inert text (or removed)
//! - **Attributes**: per tag plus a global set, each with a value rule
//! - **URI schemes**: per attribute, with `data:` media types and explicit
//!   opt-ins for relative and protocol-relative references
//!
//! # Core Types
//!
//! - [`Policy`]: Immutable allow-list, built once and shared by every call
//! - [`PolicyBuilder`]: The only way to build a policy; validates it
//! - [`TagRule`] / [`AttributeRule`] / [`UriRule`]: The rules a policy holds
//! - [`Sanitizer`]: Parses, sanitizes and serializes markup
//! - [`SafeHtml`]: Proof that a string came out of a sanitizer
//!
//! The pipeline is also available in pieces: [`parse_fragment`] builds a
//! [`Node`] tree, [`sanitize_tree`] applies a policy to it and
//! [`serialize`] writes it back out.
//!
//! # Examples
//!
//! ```
//! use html_policy::{PolicyBuilder, Sanitizer};
//!
//! let policy = PolicyBuilder::common().build().expect("preset is valid");
//! let sanitizer = Sanitizer::new(policy);
//!
//! // Unknown attributes are dropped, permitted ones kept
//! assert_eq!(
//!     sanitizer.sanitize(r#"<div unknown="unknown">value</div>"#),
//!     "<div>value</div>"
//! );
//!
//! // An image without an acceptable source is removed entirely
//! assert_eq!(
//!     sanitizer.sanitize(r#"<img src="mailto:user@example.org" onerror="alert(1)">"#),
//!     ""
//! );
//!
//! // Disallowed elements become text
//! assert_eq!(
//!     sanitizer.sanitize("<script>alert(1)</script>"),
//!     "&lt;script&gt;alert(1)&lt;/script&gt;"
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod error;
mod node;
mod parser;
mod policy;
mod presets;
mod safe_html;
mod sanitizer;
mod serializer;
mod uri;
mod walker;

#[cfg(test)]
mod test_utils;

pub use builder::PolicyBuilder;
pub use error::{PolicyError, PolicyErrorKind};
pub use node::{Attribute, Node};
pub use parser::parse_fragment;
pub use policy::{AttributeDecision, AttributeRule, DisallowedElements, Policy, TagRule};
pub use safe_html::SafeHtml;
pub use sanitizer::Sanitizer;
pub use serializer::serialize;
pub use uri::{classify_uri, UriClass, UriRule};
pub use walker::sanitize_tree;
