//! The attribute traits shared by the XDITA element set.

use super::values::{is_boolean, is_cdata, is_nmtoken, is_one_of, or_absent};
use super::{AttributeTrait, PropValue};

pub const DIRECTIONS: &[&str] = &["ltr", "rtl", "lro", "rlo"];
pub const YES_NO: &[&str] = &["yes", "no"];
pub const SCOPES: &[&str] = &["local", "peer", "external"];
pub const SCALES: &[&str] = &[
    "50", "60", "70", "80", "90", "100", "110", "120", "140", "160", "180", "200",
];
pub const FRAMES: &[&str] = &["all", "bottom", "none", "sides", "top", "topbot"];
pub const EXPANSES: &[&str] = &["column", "page", "spread", "textline"];

/// `dir`, `xml:lang`, `translate`
pub const LOCALIZATION: AttributeTrait = AttributeTrait::new(
    "localization",
    &["dir", "xml:lang", "translate"],
    localization,
);

/// `props`
pub const FILTERS: AttributeTrait = AttributeTrait::new("filters", &["props"], filters);

/// `outputclass`, `class`
pub const CLASS: AttributeTrait = AttributeTrait::new("class", &["outputclass", "class"], class);

/// `id`, `conref`
pub const REUSE: AttributeTrait = AttributeTrait::new("reuse", &["id", "conref"], reuse);

/// `conref` only; footnotes carry their id separately.
pub const FN_REUSE: AttributeTrait = AttributeTrait::new("fn-reuse", &["conref"], fn_reuse);

/// `keyref`
pub const VARIABLE_CONTENT: AttributeTrait =
    AttributeTrait::new("variable-content", &["keyref"], variable_content);

/// `href`, `format`, `scope`
pub const REFERENCE_CONTENT: AttributeTrait = AttributeTrait::new(
    "reference-content",
    &["href", "format", "scope"],
    reference_content,
);

/// `width`, `height`
pub const SIZE: AttributeTrait = AttributeTrait::new("size", &["width", "height"], size);

/// `scale`, `frame`, `expanse`
pub const DISPLAY: AttributeTrait =
    AttributeTrait::new("display", &["scale", "frame", "expanse"], display);

/// `name`, `value` of media flags such as `<media-loop>`.
pub const BOOLEAN_FIELD: AttributeTrait =
    AttributeTrait::new("boolean-field", &["name", "value"], boolean_field);

fn localization(field: &str, value: Option<&PropValue>) -> bool {
    match field {
        "dir" => or_absent(value, |v| is_one_of(v, DIRECTIONS)),
        "xml:lang" => or_absent(value, is_cdata),
        "translate" => or_absent(value, |v| is_one_of(v, YES_NO)),
        _ => false,
    }
}

fn filters(field: &str, value: Option<&PropValue>) -> bool {
    field == "props" && or_absent(value, is_cdata)
}

fn class(field: &str, value: Option<&PropValue>) -> bool {
    matches!(field, "outputclass" | "class") && or_absent(value, is_cdata)
}

fn reuse(field: &str, value: Option<&PropValue>) -> bool {
    match field {
        "id" => or_absent(value, is_nmtoken),
        "conref" => or_absent(value, is_cdata),
        _ => false,
    }
}

fn fn_reuse(field: &str, value: Option<&PropValue>) -> bool {
    field == "conref" && or_absent(value, is_cdata)
}

fn variable_content(field: &str, value: Option<&PropValue>) -> bool {
    field == "keyref" && or_absent(value, is_cdata)
}

fn reference_content(field: &str, value: Option<&PropValue>) -> bool {
    match field {
        "href" | "format" => or_absent(value, is_cdata),
        "scope" => or_absent(value, |v| is_one_of(v, SCOPES)),
        _ => false,
    }
}

fn size(field: &str, value: Option<&PropValue>) -> bool {
    matches!(field, "width" | "height") && or_absent(value, is_nmtoken)
}

fn display(field: &str, value: Option<&PropValue>) -> bool {
    match field {
        "scale" => or_absent(value, |v| is_one_of(v, SCALES)),
        "frame" => or_absent(value, |v| is_one_of(v, FRAMES)),
        "expanse" => or_absent(value, |v| is_one_of(v, EXPANSES)),
        _ => false,
    }
}

fn boolean_field(field: &str, value: Option<&PropValue>) -> bool {
    match field {
        "name" => or_absent(value, is_cdata),
        "value" => or_absent(value, is_boolean),
        _ => false,
    }
}
