use super::element;
use crate::html::optional_attributes;
use crate::plugin::SchemaPlugin;
use quire_model::NodeSpec;

const IMG_ATTRIBUTES: &[&str] = &[
    "alt",
    "crossorigin",
    "decoding",
    "elementtiming",
    "fetchpriority",
    "height",
    "ismap",
    "loading",
    "referrerpolicy",
    "sizes",
    "src",
    "srcset",
    "usemap",
    "width",
];

const AUDIO_ATTRIBUTES: &[&str] = &[
    "autoplay",
    "controls",
    "crossorigin",
    "disableremoteplayback",
    "loop",
    "muted",
    "preload",
    "src",
];

const VIDEO_ATTRIBUTES: &[&str] = &[
    "autoplay",
    "controls",
    "crossorigin",
    "disablepictureinpicture",
    "disableremoteplayback",
    "height",
    "loop",
    "muted",
    "playsinline",
    "poster",
    "preload",
    "src",
    "width",
];

const IFRAME_ATTRIBUTES: &[&str] = &[
    "allow",
    "allowfullscreen",
    "allowpaymentrequest",
    "credentialless",
    "csp",
    "height",
    "loading",
    "name",
    "referrerpolicy",
    "sandbox",
    "src",
    "srcdoc",
    "width",
];

const SCRIPT_ATTRIBUTES: &[&str] = &[
    "async",
    "crossorigin",
    "defer",
    "fetchpriority",
    "integrity",
    "nomodule",
    "referrerpolicy",
    "src",
    "type",
    "blocking",
];

fn with(group: &str, attributes: &[&str]) -> NodeSpec {
    NodeSpec::new().group(group).attrs(optional_attributes(attributes))
}

/// Images, audio, video, embedded documents and script containers
pub struct MediaPlugin;

impl SchemaPlugin for MediaPlugin {
    fn name(&self) -> &str {
        "media"
    }

    fn nodes(&self) -> Vec<(String, NodeSpec)> {
        vec![
            element("img", with("flow embedded palpable interactive", IMG_ATTRIBUTES)),
            element(
                "source",
                NodeSpec::new().attrs(optional_attributes(&[
                    "type", "src", "srcset", "sizes", "media", "height", "width",
                ])),
            ),
            element(
                "track",
                NodeSpec::new().attrs(optional_attributes(&["default", "kind", "label", "src", "srclang"])),
            ),
            element(
                "picture",
                NodeSpec::new()
                    .group("flow embedded")
                    .content("(source | scriptsupporting)* img"),
            ),
            element(
                "audio",
                with("flow embedded interactive palpable", AUDIO_ATTRIBUTES).content("(source | track)* flow*"),
            ),
            element(
                "video",
                with("flow embedded interactive palpable", VIDEO_ATTRIBUTES).content("(source | track)* flow*"),
            ),
            // `data` is left out: it is the structured data-* attribute map
            element(
                "object",
                with(
                    "flow embedded palpable interactive listed submittable formassociated",
                    &["form", "height", "name", "type", "usemap", "width"],
                )
                .content("flow*"),
            ),
            element(
                "embed",
                with("flow embedded interactive palpable", &["height", "src", "type", "width"]),
            ),
            element("iframe", with("flow embedded interactive palpable", IFRAME_ATTRIBUTES)),
            element("portal", with("flow embedded", &["referrerpolicy", "src"])),
            element(
                "script",
                with("flow metadata scriptsupporting", SCRIPT_ATTRIBUTES)
                    .content("text?")
                    .code()
                    .whitespace_pre(),
            ),
            element(
                "style",
                with("flow metadata", &["media", "blocking"])
                    .content("text?")
                    .code()
                    .whitespace_pre(),
            ),
            element(
                "template",
                NodeSpec::new().group("flow metadata scriptsupporting").content("flow*"),
            ),
            element("slot", with("flow", &["name"]).content("flow*")),
            element("noscript", NodeSpec::new().group("flow metadata").content("flow*")),
        ]
    }
}
