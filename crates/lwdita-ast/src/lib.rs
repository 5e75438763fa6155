//! Typed document trees for lightweight DITA.
//!
//! This crate holds everything that does not touch XML text:
//!
//! - [`content_model`]: the compact content-model grammar and its matcher
//! - [`attributes`]: attribute traits and their composition per node type
//! - [`registry`]: the node type registry, built once and shared read-only
//! - [`Document`]: an arena tree whose `add` validates every attachment
//! - [`catalog`]: the bundled XDITA element set
//!
//! Parsing and serialization live in `lwdita-xml`.
//!
//! # Example
//!
//! ```
//! use lwdita_ast::{Document, catalog::lwdita_registry};
//!
//! let mut doc = Document::new(lwdita_registry());
//! let topic = doc.create_element("topic", &[("id".into(), "t1".into())]).unwrap();
//! let title = doc.create_element("title", &[]).unwrap();
//! let text = doc.create_text("Hi");
//! doc.add(Document::ROOT, topic, true).unwrap();
//! doc.add(topic, title, true).unwrap();
//! doc.add(title, text, true).unwrap();
//! assert!(doc.check_required(topic).is_ok());
//! ```

pub mod attributes;
pub mod catalog;
pub mod content_model;
pub mod document;
pub mod error;
pub mod json;
pub mod node;
pub mod registry;

pub use attributes::{AttributeTrait, ComposedNodeType, PropValue, Props, compose};
pub use content_model::{
    ChildType, ContentModel, ContentModelError, NodeGroups, TEXT_NODE_NAME, accepts,
    parse_content_model,
};
pub use document::{Attachment, Document};
pub use error::{
    AttributeValidationFailure, ContentModelViolation, Error, Result, UnknownTagError,
    ViolationKind,
};
pub use json::JsonNode;
pub use node::{Node, NodeId, NodeKind};
pub use registry::{
    DOCUMENT_NODE_NAME, ElementSpec, NodeRegistry, NodeType, NodeTypeId, RawNode, RegistryBuilder,
    RegistryError,
};
