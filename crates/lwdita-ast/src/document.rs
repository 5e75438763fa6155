//! Arena document tree and its validated attach operation.

use crate::attributes::{ComposedNodeType, PropValue, Props};
use crate::content_model::{ContentModel, TEXT_NODE_NAME};
use crate::error::{ContentModelViolation, Error, Result, ViolationKind};
use crate::json::JsonNode;
use crate::node::{Node, NodeId, NodeKind};
use crate::registry::{DOCUMENT_NODE_NAME, NodeRegistry, RawNode};
use std::sync::Arc;
use tracing::{trace, warn};

static NO_CONTENT: ContentModel = ContentModel::EMPTY;

/// Outcome of a successful [`Document::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// The parent's content model accepted the child.
    Accepted,
    /// The child was attached despite a content-model violation.
    Tolerated(ContentModelViolation),
}

impl Attachment {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Attachment::Accepted)
    }

    pub fn violation(&self) -> Option<&ContentModelViolation> {
        match self {
            Attachment::Accepted => None,
            Attachment::Tolerated(violation) => Some(violation),
        }
    }
}

/// A document tree.
///
/// All nodes live in one arena owned by the document; the node at
/// [`Document::ROOT`] owns the tree. Nodes may be created and left
/// detached, but once attached they are never moved.
#[derive(Debug, Clone)]
pub struct Document {
    registry: Arc<NodeRegistry>,
    nodes: Vec<Node>,
}

impl Document {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        let particles = registry.document_model().particles().len();
        Self {
            registry,
            nodes: vec![Node::new(NodeKind::Document, Props::new(), particles)],
        }
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached node from raw input.
    pub fn create(&mut self, raw: RawNode<'_>) -> Result<NodeId> {
        let node = self.registry.create(raw)?;
        Ok(self.insert(node))
    }

    pub fn create_element(&mut self, tag: &str, attributes: &[(String, String)]) -> Result<NodeId> {
        self.create(RawNode::Element { tag, attributes })
    }

    pub fn create_text(&mut self, content: &str) -> NodeId {
        let node = self.registry.create_text(content);
        self.insert(node)
    }

    /// Attach `child` as the last child of `parent`.
    ///
    /// Structural rules hold in every mode: a node is attached at most once,
    /// the root is never a child, text nodes have no children and no cycles
    /// are formed. Content-model violations fail with `abort_on_error` and
    /// are attached anyway, as [`Attachment::Tolerated`], without it.
    pub fn add(&mut self, parent: NodeId, child: NodeId, abort_on_error: bool) -> Result<Attachment> {
        self.check_structure(parent, child)?;

        let child_name = self.node_name(child).to_string();
        let model = self.content_model(parent);
        let outcome = match model.position(&child_name, self.registry.groups()) {
            Some((index, _)) => {
                let particle = &model.particles()[index];
                let seen = self.nodes[parent.index()].counts[index];
                let kind = (particle.single() && seen > 0).then_some(ViolationKind::TooMany);
                (Some(index), kind)
            }
            None => (None, Some(ViolationKind::NotAllowed)),
        };

        let attachment = match outcome {
            (_, None) => Attachment::Accepted,
            (_, Some(kind)) => {
                let violation = self.violation(parent, child_name, kind);
                if abort_on_error {
                    return Err(violation.into());
                }
                Attachment::Tolerated(violation)
            }
        };

        let parent_node = &mut self.nodes[parent.index()];
        if let (Some(index), _) = outcome {
            parent_node.counts[index] += 1;
        }
        parent_node.children.push(child);
        self.nodes[child.index()].parent = Some(parent);
        trace!(parent = %parent, child = %child, "attached");
        Ok(attachment)
    }

    fn check_structure(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let invalid = |reason| Error::InvalidAttachment {
            child: self.display_name(child),
            parent: self.display_name(parent),
            reason,
        };
        if parent.index() >= self.nodes.len() || child.index() >= self.nodes.len() {
            return Err(invalid("node does not belong to this document"));
        }
        if child == Self::ROOT {
            return Err(invalid("the document root cannot be a child"));
        }
        if let Some(current) = self.nodes[child.index()].parent {
            return Err(Error::AlreadyAttached {
                child: self.node_name(child).to_string(),
                parent: self.node_name(current).to_string(),
            });
        }
        if self.nodes[parent.index()].is_text() {
            return Err(invalid("text nodes cannot have children"));
        }
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(invalid("the child is an ancestor of the parent"));
            }
            cursor = self.nodes[id.index()].parent;
        }
        Ok(())
    }

    fn display_name(&self, id: NodeId) -> String {
        self.nodes
            .get(id.index())
            .map_or_else(|| id.to_string(), |_| self.node_name(id).to_string())
    }

    fn violation(&self, parent: NodeId, child_tag: String, kind: ViolationKind) -> ContentModelViolation {
        ContentModelViolation {
            parent_tag: self.node_name(parent).to_string(),
            child_tag,
            kind,
            context: self.content_model(parent).to_string(),
        }
    }

    /// # Panics
    ///
    /// Panics if `id` was not created by this document.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// The name a node is matched under: its tag, `text` or `document`.
    pub fn node_name(&self, id: NodeId) -> &str {
        match &self.node(id).kind {
            NodeKind::Document => DOCUMENT_NODE_NAME,
            NodeKind::Text(_) => TEXT_NODE_NAME,
            NodeKind::Element(type_id) => self.registry.node_type(*type_id).tag(),
            NodeKind::Unknown(tag) => tag,
        }
    }

    pub fn content_model(&self, id: NodeId) -> &ContentModel {
        match &self.node(id).kind {
            NodeKind::Document => self.registry.document_model(),
            NodeKind::Element(type_id) => self.registry.node_type(*type_id).content_model(),
            NodeKind::Text(_) | NodeKind::Unknown(_) => &NO_CONTENT,
        }
    }

    /// Attribute descriptor of a registered element.
    pub fn attributes(&self, id: NodeId) -> Option<&ComposedNodeType> {
        match &self.node(id).kind {
            NodeKind::Element(type_id) => Some(self.registry.node_type(*type_id).attributes()),
            _ => None,
        }
    }

    /// Whether text may be attached under `id`.
    pub fn accepts_text(&self, id: NodeId) -> bool {
        self.content_model(id)
            .accepts(TEXT_NODE_NAME, self.registry.groups())
            .is_some()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).text()
    }

    pub fn props(&self, id: NodeId) -> &Props {
        &self.node(id).props
    }

    pub fn prop(&self, id: NodeId, name: &str) -> Option<&PropValue> {
        self.node(id).props.get(name)
    }

    /// Set a declared property, keeping the bag in field order.
    ///
    /// Unknown elements accept any name.
    pub fn set_prop(&mut self, id: NodeId, name: &str, value: PropValue) -> Result<Option<PropValue>> {
        let position = match &self.node(id).kind {
            NodeKind::Element(type_id) => {
                let fields = self.registry.node_type(*type_id).attributes().fields();
                let Some(rank) = fields.iter().position(|f| f == name) else {
                    return Err(self.unknown_field(id, name));
                };
                let props = &self.node(id).props;
                Some(
                    props
                        .keys()
                        .take_while(|k| fields.iter().position(|f| f == *k) < Some(rank))
                        .count(),
                )
            }
            NodeKind::Unknown(_) => None,
            NodeKind::Document | NodeKind::Text(_) => return Err(self.unknown_field(id, name)),
        };

        let props = &mut self.nodes[id.index()].props;
        if let Some(slot) = props.get_mut(name) {
            return Ok(Some(std::mem::replace(slot, value)));
        }
        match position {
            Some(index) => {
                props.shift_insert(index, name.to_string(), value);
            }
            None => {
                props.insert(name.to_string(), value);
            }
        }
        Ok(None)
    }

    pub fn remove_prop(&mut self, id: NodeId, name: &str) -> Option<PropValue> {
        self.nodes[id.index()].props.shift_remove(name)
    }

    fn unknown_field(&self, id: NodeId, name: &str) -> Error {
        Error::UnknownField {
            tag: self.node_name(id).to_string(),
            field: name.to_string(),
        }
    }

    /// Required particles of `id` that have no match yet.
    pub fn missing_required(&self, id: NodeId) -> Vec<ContentModelViolation> {
        let model = self.content_model(id);
        model
            .missing_required(&self.node(id).counts)
            .map(|particle| self.violation(id, particle.to_string(), ViolationKind::MissingRequired))
            .collect()
    }

    /// Finalize `id`: fail on the first required particle with no match.
    pub fn check_required(&self, id: NodeId) -> Result<()> {
        match self.missing_required(id).into_iter().next() {
            Some(violation) => Err(violation.into()),
            None => Ok(()),
        }
    }

    /// Run the composed validator of `id` over every declared field.
    pub fn validate_attributes(&self, id: NodeId) -> Result<()> {
        if let Some(attributes) = self.attributes(id) {
            attributes.validate(self.node_name(id), self.props(id))?;
        }
        Ok(())
    }

    /// Validate the attributes of every attached node, in document order.
    pub fn validate(&self) -> Result<()> {
        self.descendants(Self::ROOT)
            .try_for_each(|id| self.validate_attributes(id))
    }

    /// Pre-order traversal starting at (and including) `id`.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            document: self,
            stack: vec![id],
        }
    }

    /// Concatenated text of every text node under `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id).filter_map(|n| self.text(n)).collect()
    }

    /// Plain nested projection of the subtree at `id`.
    pub fn json(&self, id: NodeId) -> JsonNode {
        let node = self.node(id);
        let mut json = JsonNode::new(self.node_name(id));
        match &node.kind {
            NodeKind::Text(content) => {
                let mut attributes = Props::new();
                attributes.insert("content".to_string(), PropValue::String(content.clone()));
                json.attributes = Some(attributes);
            }
            NodeKind::Element(_) | NodeKind::Unknown(_) if !node.props.is_empty() => {
                json.attributes = Some(node.props.clone());
            }
            _ => {}
        }
        if !node.children.is_empty() {
            json.children = Some(node.children.iter().map(|c| self.json(*c)).collect());
        }
        json
    }

    /// Projection of the whole document.
    pub fn to_json(&self) -> JsonNode {
        self.json(Self::ROOT)
    }

    /// Rebuild a document from its projection through [`Document::add`].
    ///
    /// A root named `document` contributes its children; any other root is
    /// attached as the single child of a new document.
    pub fn from_json(registry: Arc<NodeRegistry>, json: &JsonNode, abort_on_error: bool) -> Result<Self> {
        let mut document = Document::new(registry);
        if json.node_name == DOCUMENT_NODE_NAME {
            for child in json.children() {
                document.attach_json(Self::ROOT, child, abort_on_error)?;
            }
        } else {
            document.attach_json(Self::ROOT, json, abort_on_error)?;
        }
        if abort_on_error {
            document.check_required(Self::ROOT)?;
        }
        Ok(document)
    }

    fn attach_json(&mut self, parent: NodeId, json: &JsonNode, abort_on_error: bool) -> Result<()> {
        let id = if json.node_name == TEXT_NODE_NAME {
            let content = json
                .attributes
                .as_ref()
                .and_then(|a| a.get("content"))
                .and_then(PropValue::as_str)
                .ok_or_else(|| Error::InvalidProjection("text node without string content".to_string()))?;
            self.create_text(content)
        } else {
            let id = match self.create_element(&json.node_name, &[]) {
                Ok(id) => id,
                Err(Error::UnknownTag(error)) if !abort_on_error => {
                    warn!(%error, "skipping element from projection");
                    for child in json.children() {
                        self.attach_json(parent, child, abort_on_error)?;
                    }
                    return Ok(());
                }
                Err(err) => return Err(err),
            };
            for (name, value) in json.attributes.iter().flatten() {
                match self.set_prop(id, name, value.clone()) {
                    Ok(_) => {}
                    Err(Error::UnknownField { tag, field }) => {
                        warn!(tag = %tag, field = %field, "dropping undeclared attribute from projection");
                    }
                    Err(err) => return Err(err),
                }
            }
            id
        };

        if let Attachment::Tolerated(violation) = self.add(parent, id, abort_on_error)? {
            warn!(%violation, "tolerated content-model violation");
        }
        for child in json.children() {
            self.attach_json(id, child, abort_on_error)?;
        }
        if abort_on_error {
            self.check_required(id)?;
        }
        Ok(())
    }
}

/// Iterator returned by [`Document::descendants`].
pub struct Descendants<'a> {
    document: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.document.children(id).iter().rev().copied());
        Some(id)
    }
}
