//! Shared fixtures and proptest strategies for unit tests.

use proptest::prelude::*;

use crate::{PolicyBuilder, Sanitizer};

/// A sanitizer enforcing the common preset.
pub(crate) fn common_sanitizer() -> Sanitizer {
    Sanitizer::new(PolicyBuilder::common().build().expect("preset is valid"))
}

/// Text that is safe to place between tags as-is.
fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[a-zA-Z0-9 ]{1,8}").unwrap(),
        Just("&lt;b&gt;".to_string()),
        Just("x < y & z".to_string()),
        Just("&amp;&quot;".to_string()),
    ]
}

fn arb_uri() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("https://example.org/a.png"),
        Just("/a.png"),
        Just("a.png"),
        Just("//example.org/a.png"),
        Just("javascript:alert(1)"),
        Just("data:image/png;base64,AAAA"),
        Just("data:text/html,<script>alert(1)</script>"),
        Just("mailto:user@example.org"),
    ]
}

fn arb_leaf() -> impl Strategy<Value = String> {
    prop_oneof![
        arb_text(),
        Just("<!-- comment -->".to_string()),
        Just("<![CDATA[ x<y ]]>".to_string()),
        Just("<br>".to_string()),
        Just("<pre>\n\nx</pre>".to_string()),
        Just("<script>alert(1)</script>".to_string()),
        arb_uri().prop_map(|uri| format!(r#"<img src="{}" onerror="alert(1)">"#, uri)),
        (arb_uri(), arb_text()).prop_map(|(uri, text)| {
            format!(r#"<a href="{}" role="button">{}</a>"#, uri, text)
        }),
        arb_text().prop_map(|text| format!("<p>{}</p>", text)),
    ]
}

/// Well-nested markup mixing permitted and disallowed elements, tables,
/// hostile attributes, comments and CDATA.
pub(crate) fn arb_markup() -> impl Strategy<Value = String> {
    let tag = prop_oneof![
        Just("div"),
        Just("span"),
        Just("b"),
        Just("em"),
        Just("unknown"),
        Just("blink"),
        Just("table"),
        Just("td"),
    ];
    let attributes = prop_oneof![
        Just(""),
        Just(r#" class="c""#),
        Just(r#" onclick="alert(1)""#),
        Just(r#" title="a &amp; &quot;b&quot;""#),
        Just(" data-bool"),
    ];

    arb_leaf().prop_recursive(4, 32, 4, move |inner| {
        (
            tag.clone(),
            attributes.clone(),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(tag, attributes, children)| {
                format!("<{}{}>{}</{}>", tag, attributes, children.concat(), tag)
            })
    })
}
