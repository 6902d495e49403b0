//! Ready-made policies.

use crate::{
    builder::PolicyBuilder,
    policy::{AttributeRule, TagRule},
    uri::UriRule,
};

const IMAGE_MEDIA_TYPES: &[&str] = &[
    "image/avif",
    "image/bmp",
    "image/gif",
    "image/jpeg",
    "image/png",
    "image/svg+xml",
    "image/webp",
];

/// Tags that take only the global attributes.
const PLAIN_TAGS: &[&str] = &[
    "abbr", "acronym", "address", "article", "aside", "b", "bdi", "big", "br", "center", "cite",
    "code", "dd", "dfn", "div", "dl", "dt", "em", "figcaption", "figure", "footer", "h1", "h2",
    "h3", "h4", "h5", "h6", "header", "hr", "i", "kbd", "legend", "main", "mark", "nav", "nobr",
    "p", "picture", "pre", "rp", "rt", "ruby", "s", "samp", "section", "small", "span", "strike",
    "strong", "sub", "summary", "sup", "tt", "u", "ul", "var", "wbr",
];

fn link_uri() -> UriRule {
    UriRule::new()
        .schemes([
            "http", "https", "ftp", "ftps", "mailto", "tel", "xmpp", "mid", "git",
        ])
        .allow_relative(true)
}

fn image_uri() -> UriRule {
    UriRule::new()
        .schemes(["http", "https", "cid", "data"])
        .data_media_types(IMAGE_MEDIA_TYPES)
        .allow_relative(true)
}

fn media_uri() -> UriRule {
    UriRule::new().schemes(["http", "https"]).allow_relative(true)
}

fn freeform(rule: TagRule, names: &[&str]) -> TagRule {
    names
        .iter()
        .fold(rule, |rule, name| rule.attribute(name, AttributeRule::Freeform))
}

fn table_cell_alignment(rule: TagRule) -> TagRule {
    freeform(rule, &["align", "valign", "bgcolor"])
}

fn media_element(name: &str) -> TagRule {
    freeform(
        TagRule::new(name)
            .attribute("src", AttributeRule::Uri(media_uri()))
            .attribute("controls", AttributeRule::Boolean)
            .attribute("autoplay", AttributeRule::Boolean)
            .attribute("loop", AttributeRule::Boolean)
            .attribute("muted", AttributeRule::Boolean)
            .attribute("preload", AttributeRule::one_of(["none", "metadata", "auto", ""])),
        &["width", "height"],
    )
}

impl PolicyBuilder {
    /// A builder preloaded with a policy for common formatted content:
    /// text-level and sectioning markup, lists, tables, images, figures and
    /// media, links to web, mail, phone, chat and message-id URIs, and
    /// microdata.
    ///
    /// The builder can be extended before calling
    /// [`build`](PolicyBuilder::build).
    ///
    /// # Examples
    ///
    /// ```
    /// use html_policy::{PolicyBuilder, Sanitizer};
    ///
    /// let policy = PolicyBuilder::common().build().expect("preset is valid");
    /// let sanitizer = Sanitizer::new(policy);
    ///
    /// assert_eq!(
    ///     sanitizer.sanitize(r#"<a href="javascript:alert(1)" role="button">value</a>"#),
    ///     r#"<a role="button">value</a>"#
    /// );
    /// ```
    pub fn common() -> Self {
        let builder = PolicyBuilder::new()
            .global_attribute("class", AttributeRule::Freeform)
            .global_attribute("id", AttributeRule::Freeform)
            .global_attribute("dir", AttributeRule::one_of(["ltr", "rtl", "auto"]))
            .global_attribute("lang", AttributeRule::Freeform)
            .global_attribute("role", AttributeRule::Freeform)
            .global_attribute("title", AttributeRule::Freeform)
            .global_attribute("translate", AttributeRule::one_of(["yes", "no", ""]))
            .global_attribute("itemid", AttributeRule::Freeform)
            .global_attribute("itemprop", AttributeRule::Freeform)
            .global_attribute("itemref", AttributeRule::Freeform)
            .global_attribute("itemscope", AttributeRule::Boolean)
            .global_attribute("itemtype", AttributeRule::Freeform)
            .global_attribute_prefix("data-", AttributeRule::Freeform)
            .global_attribute_prefix("aria-", AttributeRule::Freeform)
            .tags(PLAIN_TAGS);

        builder
            .tag(freeform(
                TagRule::new("a").attribute("href", AttributeRule::Uri(link_uri())),
                &["name", "rel", "target", "hreflang", "type"],
            ))
            .tag(TagRule::new("bdo").attribute("dir", AttributeRule::one_of(["ltr", "rtl"])))
            .tag(TagRule::new("blockquote").attribute("cite", AttributeRule::Uri(media_uri())))
            .tag(TagRule::new("q").attribute("cite", AttributeRule::Uri(media_uri())))
            .tag(freeform(
                TagRule::new("del").attribute("cite", AttributeRule::Uri(media_uri())),
                &["datetime"],
            ))
            .tag(freeform(
                TagRule::new("ins").attribute("cite", AttributeRule::Uri(media_uri())),
                &["datetime"],
            ))
            .tag(TagRule::new("details").attribute("open", AttributeRule::Boolean))
            .tag(freeform(TagRule::new("font"), &["color", "face", "size"]))
            .tag(TagRule::new("label").attribute("for", AttributeRule::Freeform))
            .tag(TagRule::new("time").attribute("datetime", AttributeRule::Freeform))
            .tag(
                TagRule::new("meta")
                    .attribute("content", AttributeRule::Freeform)
                    .require("itemprop"),
            )
            .tag(freeform(
                TagRule::new("img")
                    .required_attribute("src", AttributeRule::Uri(image_uri()))
                    .attribute("srcset", AttributeRule::SourceSet(image_uri()))
                    .attribute("loading", AttributeRule::one_of(["lazy", "eager"]))
                    .attribute("decoding", AttributeRule::one_of(["sync", "async", "auto"]))
                    .attribute("fetchpriority", AttributeRule::one_of(["high", "low", "auto"])),
                &[
                    "alt", "width", "height", "sizes", "name", "align", "border", "hspace",
                    "vspace",
                ],
            ))
            .tag(freeform(
                TagRule::new("source")
                    .attribute("src", AttributeRule::Uri(media_uri()))
                    .attribute("srcset", AttributeRule::SourceSet(image_uri())),
                &["media", "type", "sizes", "width", "height"],
            ))
            .tag(freeform(
                TagRule::new("track")
                    .attribute("src", AttributeRule::Uri(media_uri()))
                    .attribute("default", AttributeRule::Boolean)
                    .attribute(
                        "kind",
                        AttributeRule::one_of([
                            "subtitles",
                            "captions",
                            "descriptions",
                            "chapters",
                            "metadata",
                        ]),
                    ),
                &["srclang", "label"],
            ))
            .tag(
                media_element("video")
                    .attribute("poster", AttributeRule::Uri(image_uri()))
                    .attribute("playsinline", AttributeRule::Boolean),
            )
            .tag(media_element("audio"))
            .tag(freeform(
                TagRule::new("ol")
                    .attribute("reversed", AttributeRule::Boolean)
                    .attribute("type", AttributeRule::one_of(["1", "a", "i"])),
                &["start"],
            ))
            .tag(freeform(TagRule::new("li"), &["value"]))
            .tag(freeform(
                TagRule::new("table"),
                &[
                    "align",
                    "border",
                    "cellpadding",
                    "cellspacing",
                    "summary",
                    "width",
                    "bgcolor",
                ],
            ))
            .tag(freeform(TagRule::new("caption"), &["align"]))
            .tag(table_cell_alignment(TagRule::new("thead")))
            .tag(table_cell_alignment(TagRule::new("tbody")))
            .tag(table_cell_alignment(TagRule::new("tfoot")))
            .tag(table_cell_alignment(TagRule::new("tr")))
            .tag(freeform(
                table_cell_alignment(TagRule::new("col")),
                &["span", "width"],
            ))
            .tag(freeform(
                table_cell_alignment(TagRule::new("colgroup")),
                &["span", "width"],
            ))
            .tag(freeform(
                table_cell_alignment(TagRule::new("td")),
                &[
                    "abbr", "axis", "colspan", "headers", "rowspan", "scope", "width", "height",
                ],
            ))
            .tag(freeform(
                table_cell_alignment(TagRule::new("th")),
                &[
                    "abbr", "axis", "colspan", "headers", "rowspan", "scope", "width", "height",
                ],
            ))
    }
}
