//! Error types for node creation, tree mutation and attribute validation.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type alias for tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by [`Document`](crate::Document) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The registry has no node type for a tag (strict registries only).
    #[error(transparent)]
    UnknownTag(#[from] UnknownTagError),

    /// A child was rejected by its parent's content model.
    #[error(transparent)]
    ContentModel(#[from] ContentModelViolation),

    /// An explicit attribute validation failed.
    #[error(transparent)]
    AttributeValidation(#[from] AttributeValidationFailure),

    /// The child already has a parent. Nodes are never reparented.
    #[error("<{child}> is already attached to <{parent}>")]
    AlreadyAttached { child: String, parent: String },

    /// The attachment is structurally impossible (root as child, cycles).
    #[error("cannot attach <{child}> to <{parent}>: {reason}")]
    InvalidAttachment {
        child: String,
        parent: String,
        reason: &'static str,
    },

    /// A property write named a field the node type does not declare.
    #[error("<{tag}> has no attribute '{field}'")]
    UnknownField { tag: String, field: String },

    /// A plain-object projection could not be turned back into a tree.
    #[error("invalid node projection: {0}")]
    InvalidProjection(String),
}

/// A tag name with no registered node type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no node type registered for <{tag}>")]
pub struct UnknownTagError {
    pub tag: String,
}

/// How a child violated its parent's content model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// No particle of the content model matches the child.
    NotAllowed,
    /// The matching particle allows at most one occurrence and one is present.
    TooMany,
    /// A required particle had no match when the parent was finalized.
    MissingRequired,
}

/// A content-model violation between a parent and a (proposed) child.
///
/// For [`ViolationKind::MissingRequired`], `child_tag` holds the rendered
/// particle that is missing (e.g. `title` or `(dt|dd)+`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentModelViolation {
    pub parent_tag: String,
    pub child_tag: String,
    pub kind: ViolationKind,
    /// The parent's content model, rendered.
    pub context: String,
}

impl fmt::Display for ContentModelViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ViolationKind::NotAllowed => write!(
                f,
                "<{}> is not allowed in <{}>",
                self.child_tag, self.parent_tag
            )?,
            ViolationKind::TooMany => write!(
                f,
                "<{}> may appear at most once in <{}>",
                self.child_tag, self.parent_tag
            )?,
            ViolationKind::MissingRequired => write!(
                f,
                "<{}> is missing required content {}",
                self.parent_tag, self.child_tag
            )?,
        }
        if self.context.is_empty() {
            write!(f, " (content model: EMPTY)")
        } else {
            write!(f, " (content model: {})", self.context)
        }
    }
}

impl std::error::Error for ContentModelViolation {}

/// An attribute value rejected by every validator of its node type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid value {} for attribute '{field}' on <{tag}>", .value.as_ref().map_or_else(|| "(absent)".to_string(), |v| v.to_string()))]
pub struct AttributeValidationFailure {
    pub tag: String,
    pub field: String,
    pub value: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_display_not_allowed() {
        let violation = ContentModelViolation {
            parent_tag: "body".to_string(),
            child_tag: "bogus".to_string(),
            kind: ViolationKind::NotAllowed,
            context: "%list-blocks*, section*, fn*".to_string(),
        };
        assert_eq!(
            violation.to_string(),
            "<bogus> is not allowed in <body> (content model: %list-blocks*, section*, fn*)"
        );
    }

    #[test]
    fn test_violation_display_missing_required() {
        let violation = ContentModelViolation {
            parent_tag: "topic".to_string(),
            child_tag: "title".to_string(),
            kind: ViolationKind::MissingRequired,
            context: "title, shortdesc?".to_string(),
        };
        assert_eq!(
            violation.to_string(),
            "<topic> is missing required content title (content model: title, shortdesc?)"
        );
    }

    #[test]
    fn test_attribute_failure_display() {
        let failure = AttributeValidationFailure {
            tag: "topic".to_string(),
            field: "id".to_string(),
            value: None,
        };
        assert_eq!(
            failure.to_string(),
            "invalid value (absent) for attribute 'id' on <topic>"
        );

        let failure = AttributeValidationFailure {
            tag: "p".to_string(),
            field: "dir".to_string(),
            value: Some(serde_json::Value::String("sideways".to_string())),
        };
        assert_eq!(
            failure.to_string(),
            "invalid value \"sideways\" for attribute 'dir' on <p>"
        );
    }

    #[test]
    fn test_unknown_tag_converts() {
        let err: Error = UnknownTagError {
            tag: "bogus".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "no node type registered for <bogus>");
    }
}
