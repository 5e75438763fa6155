//! Node type registry.
//!
//! Node types are declared through [`RegistryBuilder`] during an explicit
//! initialization phase. [`RegistryBuilder::build`] composes every type's
//! attribute traits, parses its content model and checks that each group it
//! references is defined. The resulting [`NodeRegistry`] is read-only and
//! meant to be shared behind an `Arc`.

use crate::attributes::{AttributeTrait, ComposedNodeType, FieldValidator, NodeShape, Props, compose};
use crate::content_model::{ContentModel, ContentModelError, NodeGroups, TEXT_NODE_NAME};
use crate::error::UnknownTagError;
use crate::node::{Node, NodeKind};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Name reported for the document root.
pub const DOCUMENT_NODE_NAME: &str = "document";

/// Errors raised while building a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("node type <{0}> is registered twice")]
    DuplicateTag(String),

    #[error("'{0}' is reserved and cannot be registered as a tag")]
    ReservedTag(String),

    #[error("invalid content model for <{tag}>: {source}")]
    ContentModel {
        tag: String,
        #[source]
        source: ContentModelError,
    },

    #[error("content model of <{tag}> references undefined group %{group}")]
    UndefinedGroup { tag: String, group: String },
}

/// Index of a node type inside its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeTypeId(u32);

impl NodeTypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Declarative description of one element type.
#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    traits: Vec<AttributeTrait>,
    shape: NodeShape,
    content: Vec<String>,
}

impl ElementSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute traits, in field order.
    pub fn traits(mut self, traits: &[AttributeTrait]) -> Self {
        self.traits.extend_from_slice(traits);
        self
    }

    /// Node-specific fields, placed after the trait fields.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shape = self.shape.with_fields(fields);
        self
    }

    /// Validator for the node-specific fields.
    pub fn validator(mut self, validator: FieldValidator) -> Self {
        self.shape = self.shape.with_validator(validator);
        self
    }

    /// Content-model tokens.
    pub fn content<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.content.extend(tokens.into_iter().map(Into::into));
        self
    }
}

/// A registered element type.
#[derive(Debug, Clone)]
pub struct NodeType {
    tag: String,
    attributes: ComposedNodeType,
    content_model: ContentModel,
}

impl NodeType {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attributes(&self) -> &ComposedNodeType {
        &self.attributes
    }

    pub fn content_model(&self) -> &ContentModel {
        &self.content_model
    }
}

/// Collects node types and groups before they are frozen into a registry.
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    specs: Vec<(String, ElementSpec)>,
    groups: NodeGroups,
    document_content: Vec<String>,
    strict: bool,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            specs: Vec::new(),
            groups: NodeGroups::new(),
            document_content: Vec::new(),
            strict: true,
        }
    }

    pub fn register(mut self, tag: impl Into<String>, spec: ElementSpec) -> Self {
        self.specs.push((tag.into(), spec));
        self
    }

    pub fn group<I, S>(mut self, name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.insert(name, members);
        self
    }

    /// Content model of the document root.
    pub fn document_content<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.document_content = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Strict registries (the default) refuse unregistered tags.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn build(self) -> Result<NodeRegistry, RegistryError> {
        let mut types = Vec::with_capacity(self.specs.len());
        let mut by_tag = HashMap::with_capacity(self.specs.len());

        for (tag, spec) in self.specs {
            if tag == TEXT_NODE_NAME || tag == DOCUMENT_NODE_NAME {
                return Err(RegistryError::ReservedTag(tag));
            }
            if by_tag.contains_key(&tag) {
                return Err(RegistryError::DuplicateTag(tag));
            }
            let content_model = parse_model(&tag, &spec.content, &self.groups)?;
            let attributes = compose(spec.shape, &spec.traits);
            by_tag.insert(tag.clone(), NodeTypeId(types.len() as u32));
            types.push(NodeType {
                tag,
                attributes,
                content_model,
            });
        }

        let document_model =
            parse_model(DOCUMENT_NODE_NAME, &self.document_content, &self.groups)?;

        debug!(
            types = types.len(),
            groups = self.groups.len(),
            strict = self.strict,
            "node registry built"
        );
        Ok(NodeRegistry {
            types,
            by_tag,
            groups: self.groups,
            document_model,
            strict: self.strict,
        })
    }
}

fn parse_model(tag: &str, tokens: &[String], groups: &NodeGroups) -> Result<ContentModel, RegistryError> {
    let model = ContentModel::parse(tokens).map_err(|source| RegistryError::ContentModel {
        tag: tag.to_string(),
        source,
    })?;
    if let Some(group) = model.group_references().find(|g| !groups.is_defined(g)) {
        return Err(RegistryError::UndefinedGroup {
            tag: tag.to_string(),
            group: group.to_string(),
        });
    }
    Ok(model)
}

/// Raw input for node creation.
#[derive(Debug, Clone, Copy)]
pub enum RawNode<'a> {
    /// Literal character content.
    Text(&'a str),
    /// A tag with its attributes in source order.
    Element {
        tag: &'a str,
        attributes: &'a [(String, String)],
    },
}

/// Read-only table of node types, groups and the document model.
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    types: Vec<NodeType>,
    by_tag: HashMap<String, NodeTypeId>,
    groups: NodeGroups,
    document_model: ContentModel,
    strict: bool,
}

impl NodeRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Exact-name lookup.
    pub fn lookup(&self, tag: &str) -> Option<NodeTypeId> {
        self.by_tag.get(tag).copied()
    }

    pub fn get(&self, tag: &str) -> Option<&NodeType> {
        self.lookup(tag).map(|id| self.node_type(id))
    }

    /// # Panics
    ///
    /// Panics if `id` comes from another registry.
    pub fn node_type(&self, id: NodeTypeId) -> &NodeType {
        &self.types[id.index()]
    }

    pub fn groups(&self) -> &NodeGroups {
        &self.groups
    }

    pub fn document_model(&self) -> &ContentModel {
        &self.document_model
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn registered_tags(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.tag.as_str())
    }

    /// Build a detached node.
    pub fn create(&self, raw: RawNode<'_>) -> Result<Node, UnknownTagError> {
        match raw {
            RawNode::Text(content) => Ok(self.create_text(content)),
            RawNode::Element { tag, attributes } => self.create_element(tag, attributes),
        }
    }

    pub fn create_text(&self, content: &str) -> Node {
        Node::new(NodeKind::Text(content.to_string()), Props::new(), 0)
    }

    pub fn create_element(
        &self,
        tag: &str,
        attributes: &[(String, String)],
    ) -> Result<Node, UnknownTagError> {
        match self.lookup(tag) {
            Some(id) => {
                let node_type = self.node_type(id);
                let props = node_type.attributes.attributes_to_props(tag, attributes);
                Ok(Node::new(
                    NodeKind::Element(id),
                    props,
                    node_type.content_model.particles().len(),
                ))
            }
            None if self.strict => Err(UnknownTagError {
                tag: tag.to_string(),
            }),
            None => {
                debug!(tag, "creating unknown element");
                let props = attributes
                    .iter()
                    .map(|(name, value)| (name.clone(), serde_json::Value::String(value.clone())))
                    .collect();
                Ok(Node::new(NodeKind::Unknown(tag.to_string()), props, 0))
            }
        }
    }
}
