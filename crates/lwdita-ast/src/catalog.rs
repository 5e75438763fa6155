//! The bundled lightweight DITA (XDITA) element set.
//!
//! Everything here goes through the public [`RegistryBuilder`] surface, so
//! callers can start from [`lwdita_registry_builder`] and register their own
//! element types on top.

use crate::attributes::PropValue;
use crate::attributes::traits::{
    BOOLEAN_FIELD, CLASS, DISPLAY, FILTERS, FN_REUSE, LOCALIZATION, REFERENCE_CONTENT, REUSE,
    SIZE, VARIABLE_CONTENT,
};
use crate::attributes::values::{is_cdata, is_nmtoken, is_one_of, or_absent};
use crate::registry::{ElementSpec, NodeRegistry, RegistryBuilder};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Allowed `type` values on `<note>`, taken from the XDITA DTD. Any other
/// value fails attribute validation even though it is plain CDATA.
pub const NOTE_TYPES: &[&str] = &[
    "note",
    "tip",
    "fastpath",
    "restriction",
    "important",
    "remember",
    "attention",
    "caution",
    "notice",
    "danger",
    "warning",
    "trouble",
    "other",
];

pub const TRACK_KINDS: &[&str] = &["subtitles", "captions", "descriptions", "chapters", "metadata"];

const PH: &[&str] = &["ph", "b", "i", "u", "sub", "sup"];
const DATA: &[&str] = &["data"];
const SIMPLE_BLOCKS: &[&str] = &["p", "ul", "ol", "dl", "pre", "audio", "video", "example", "simpletable"];
const FN_BLOCKS: &[&str] = &["p", "ul", "ol", "dl"];
const ALL_BLOCKS: &[&str] = &[
    "p", "ul", "ol", "dl", "pre", "audio", "video", "example", "simpletable", "fig", "note",
];
const FIG_BLOCKS: &[&str] = &["p", "ul", "ol", "dl", "pre", "audio", "video", "example", "simpletable"];
const EXAMPLE_BLOCKS: &[&str] = &["p", "ul", "ol", "dl", "pre", "audio", "video", "simpletable", "fig", "note"];
const FALLBACK_BLOCKS: &[&str] = &["image", "alt", "p", "ul", "ol", "dl", "pre", "note"];

/// Groups as flat tag sets; nested entity references are expanded here.
fn groups(builder: RegistryBuilder) -> RegistryBuilder {
    let common_inline: Vec<&str> = ["text"]
        .into_iter()
        .chain(PH.iter().copied())
        .chain(["image"])
        .chain(DATA.iter().copied())
        .collect();
    let all_inline: Vec<&str> = common_inline.iter().copied().chain(["xref"]).collect();

    builder
        .group("ph", PH.iter().copied())
        .group("data", DATA.iter().copied())
        .group("common-inline", common_inline)
        .group("all-inline", all_inline)
        .group("simple-blocks", SIMPLE_BLOCKS.iter().copied())
        .group("fn-blocks", FN_BLOCKS.iter().copied())
        .group("all-blocks", ALL_BLOCKS.iter().copied())
        .group("list-blocks", ALL_BLOCKS.iter().copied())
        .group("fig-blocks", FIG_BLOCKS.iter().copied())
        .group("example-blocks", EXAMPLE_BLOCKS.iter().copied())
        .group("fallback-blocks", FALLBACK_BLOCKS.iter().copied())
}

fn topic_field(field: &str, value: Option<&PropValue>) -> bool {
    match field {
        "id" => value.is_some_and(is_nmtoken),
        "xmlns:ditaarch" | "ditaarch:DITAArchVersion" | "domains" => or_absent(value, is_cdata),
        _ => false,
    }
}

fn note_field(field: &str, value: Option<&PropValue>) -> bool {
    field == "type" && or_absent(value, |v| is_one_of(v, NOTE_TYPES))
}

fn media_track_field(field: &str, value: Option<&PropValue>) -> bool {
    match field {
        "kind" => or_absent(value, |v| is_one_of(v, TRACK_KINDS)),
        "srclang" | "name" | "value" => or_absent(value, is_cdata),
        _ => false,
    }
}

fn pre_field(field: &str, value: Option<&PropValue>) -> bool {
    field == "xml:space" && or_absent(value, |v| is_one_of(v, &["preserve"]))
}

/// Common shape of the block elements: filters, localization, reuse, class.
fn block(content: &[&str]) -> ElementSpec {
    ElementSpec::new()
        .traits(&[FILTERS, LOCALIZATION, REUSE, CLASS])
        .content(content.iter().copied())
}

/// Common shape of the highlighting phrases.
fn phrase() -> ElementSpec {
    ElementSpec::new()
        .traits(&[LOCALIZATION, VARIABLE_CONTENT, CLASS])
        .content(["%all-inline*"])
}

fn media(poster: bool) -> ElementSpec {
    let mut content = vec!["desc?", "fallback?"];
    if poster {
        content.push("video-poster?");
    }
    content.extend([
        "media-controls?",
        "media-autoplay?",
        "media-loop?",
        "media-muted?",
        "media-source*",
        "media-track*",
    ]);
    let spec = ElementSpec::new().traits(&[FILTERS, LOCALIZATION, REUSE, CLASS]);
    let spec = if poster { spec.traits(&[SIZE]) } else { spec };
    spec.content(content)
}

fn media_flag() -> ElementSpec {
    ElementSpec::new().traits(&[LOCALIZATION, BOOLEAN_FIELD, CLASS])
}

/// Registry builder preloaded with the XDITA element set.
pub fn lwdita_registry_builder() -> RegistryBuilder {
    groups(NodeRegistry::builder())
        .document_content(["topic"])
        .register(
            "topic",
            ElementSpec::new()
                .traits(&[LOCALIZATION, CLASS])
                .fields(["id", "xmlns:ditaarch", "ditaarch:DITAArchVersion", "domains"])
                .validator(topic_field)
                .content(["title", "shortdesc?", "prolog?", "body?"]),
        )
        .register(
            "title",
            ElementSpec::new()
                .traits(&[LOCALIZATION, CLASS])
                .content(["%common-inline*"]),
        )
        .register(
            "shortdesc",
            ElementSpec::new()
                .traits(&[FILTERS, LOCALIZATION, CLASS])
                .content(["%all-inline*"]),
        )
        .register(
            "prolog",
            ElementSpec::new()
                .traits(&[FILTERS, LOCALIZATION])
                .fields(["class"])
                .content(["%data*"]),
        )
        .register(
            "data",
            ElementSpec::new()
                .traits(&[FILTERS, LOCALIZATION, VARIABLE_CONTENT, REFERENCE_CONTENT, CLASS])
                .fields(["name", "value"])
                .content(["(text|%data)*"]),
        )
        .register(
            "body",
            ElementSpec::new()
                .traits(&[LOCALIZATION, CLASS])
                .content(["%list-blocks*", "section*", "fn*"]),
        )
        .register("section", block(&["title?", "%all-blocks*"]))
        .register("p", block(&["%all-inline*"]))
        .register("ul", block(&["li+"]))
        .register("ol", block(&["li+"]))
        .register(
            "li",
            ElementSpec::new()
                .traits(&[LOCALIZATION, FILTERS, REUSE, CLASS])
                .content(["%list-blocks*"]),
        )
        .register("dl", block(&["dlentry+"]))
        .register("dlentry", block(&["dt", "dd"]))
        .register("dt", block(&["%all-inline*"]))
        .register("dd", block(&["%list-blocks*"]))
        .register(
            "pre",
            block(&["(text|%ph|xref)*"])
                .fields(["xml:space"])
                .validator(pre_field),
        )
        .register(
            "note",
            block(&["%simple-blocks*"])
                .fields(["type"])
                .validator(note_field),
        )
        .register(
            "fig",
            block(&["title?", "desc?", "(%fig-blocks|image|xref)*"]).traits(&[DISPLAY]),
        )
        .register(
            "image",
            ElementSpec::new()
                .traits(&[REFERENCE_CONTENT, SIZE, LOCALIZATION, FILTERS, VARIABLE_CONTENT, CLASS])
                .content(["alt?"]),
        )
        .register(
            "alt",
            ElementSpec::new()
                .traits(&[LOCALIZATION, VARIABLE_CONTENT, CLASS])
                .content(["text*"]),
        )
        .register(
            "desc",
            ElementSpec::new()
                .traits(&[FILTERS, LOCALIZATION, CLASS])
                .content(["%common-inline*"]),
        )
        .register(
            "xref",
            ElementSpec::new()
                .traits(&[FILTERS, LOCALIZATION, CLASS, REFERENCE_CONTENT, VARIABLE_CONTENT])
                .content(["%common-inline*"]),
        )
        .register("ph", phrase())
        .register("b", phrase())
        .register("i", phrase())
        .register("u", phrase())
        .register("sub", phrase())
        .register("sup", phrase())
        .register("simpletable", block(&["sthead?", "strow+"]))
        .register("sthead", block(&["stentry+"]))
        .register("strow", block(&["stentry*"]))
        .register("stentry", block(&["%simple-blocks*"]))
        .register("example", block(&["title?", "%example-blocks*"]))
        .register(
            "fn",
            ElementSpec::new()
                .traits(&[FILTERS, LOCALIZATION, FN_REUSE, CLASS])
                .fields(["id", "callout"])
                .content(["%fn-blocks*"]),
        )
        .register("audio", media(false))
        .register("video", media(true))
        .register(
            "fallback",
            ElementSpec::new()
                .traits(&[FILTERS, LOCALIZATION, CLASS])
                .content(["%fallback-blocks*"]),
        )
        .register(
            "video-poster",
            ElementSpec::new()
                .traits(&[LOCALIZATION, CLASS])
                .fields(["name", "value"]),
        )
        .register(
            "media-source",
            ElementSpec::new()
                .traits(&[LOCALIZATION, CLASS])
                .fields(["name", "value"]),
        )
        .register(
            "media-track",
            ElementSpec::new()
                .traits(&[LOCALIZATION, CLASS])
                .fields(["srclang", "kind", "name", "value"])
                .validator(media_track_field),
        )
        .register("media-controls", media_flag())
        .register("media-autoplay", media_flag())
        .register("media-loop", media_flag())
        .register("media-muted", media_flag())
}

static LWDITA: Lazy<Arc<NodeRegistry>> = Lazy::new(|| {
    // The table above is fixed; a failure here is a programming error
    // caught by the catalogue tests.
    Arc::new(
        lwdita_registry_builder()
            .build()
            .expect("bundled XDITA catalogue is well-formed"),
    )
});

/// The shared, strict XDITA registry.
pub fn lwdita_registry() -> Arc<NodeRegistry> {
    Arc::clone(&LWDITA)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_model::TEXT_NODE_NAME;
    use serde_json::json;

    #[test]
    fn test_catalogue_builds() {
        let registry = lwdita_registry_builder().build().unwrap();
        assert!(registry.is_strict());
        assert_eq!(registry.registered_tags().count(), 44);
        assert_eq!(registry.document_model().to_string(), "topic");
    }

    #[test]
    fn test_body_fields_and_model() {
        let registry = lwdita_registry();
        let body = registry.get("body").unwrap();
        assert_eq!(
            body.attributes().fields(),
            &["dir", "xml:lang", "translate", "outputclass", "class"]
        );
        assert_eq!(
            body.content_model().to_string(),
            "%list-blocks*, section*, fn*"
        );
    }

    #[test]
    fn test_li_fields() {
        let registry = lwdita_registry();
        assert_eq!(
            registry.get("li").unwrap().attributes().fields(),
            &[
                "dir",
                "xml:lang",
                "translate",
                "props",
                "id",
                "conref",
                "outputclass",
                "class"
            ]
        );
    }

    #[test]
    fn test_phrase_fields() {
        let registry = lwdita_registry();
        for tag in ["b", "sup"] {
            assert_eq!(
                registry.get(tag).unwrap().attributes().fields(),
                &["dir", "xml:lang", "translate", "keyref", "outputclass", "class"]
            );
        }
    }

    #[test]
    fn test_image_accepts_alt_once() {
        let registry = lwdita_registry();
        let image = registry.get("image").unwrap();
        let child = image
            .content_model()
            .accepts("alt", registry.groups())
            .unwrap();
        assert!(child.single && !child.required);
    }

    #[test]
    fn test_text_is_inline() {
        let registry = lwdita_registry();
        let groups = registry.groups();
        assert!(groups.contains("common-inline", TEXT_NODE_NAME));
        assert!(groups.contains("all-inline", "xref"));
        assert!(!groups.contains("common-inline", "xref"));
    }

    #[test]
    fn test_topic_id_is_required() {
        let registry = lwdita_registry();
        let topic = registry.get("topic").unwrap().attributes();
        assert!(!topic.is_valid_field("id", None));
        assert!(topic.is_valid_field("id", Some(&json!("t1"))));
    }

    #[test]
    fn test_note_type() {
        let registry = lwdita_registry();
        let note = registry.get("note").unwrap().attributes();
        assert!(note.is_valid_field("type", Some(&json!("warning"))));
        assert!(!note.is_valid_field("type", Some(&json!("shout"))));
    }
}
