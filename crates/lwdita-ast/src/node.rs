//! Arena node representation.

use crate::attributes::Props;
use crate::registry::NodeTypeId;
use std::fmt;

/// Index of a node inside its [`Document`](crate::Document).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The synthetic root owning the whole tree.
    Document,
    /// Literal character content.
    Text(String),
    /// An element with a registered node type.
    Element(NodeTypeId),
    /// An element a non-strict registry does not know; accepts no children.
    Unknown(String),
}

/// One node of a document tree.
///
/// Children are owned by the node; `parent` is a back-reference set exactly
/// once, when the node is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) props: Props,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    /// Running match count per content-model particle.
    pub(crate) counts: Vec<u32>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, props: Props, particles: usize) -> Self {
        Self {
            kind,
            props,
            children: Vec::new(),
            parent: None,
            counts: vec![0; particles],
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(content) => Some(content),
            _ => None,
        }
    }
}
