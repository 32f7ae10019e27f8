use std::collections::HashMap;

use crate::error::{DomError, LocatorError};
use crate::locator;

use super::types::{BackendNodeId, ComputedStyle, DOMRect, LayoutData, NodeId};
use super::DomView;

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub tag_name: String,
    pub attributes: Vec<(String, String)>,
    pub svg: bool,
    pub layout: Option<LayoutData>,
    pub shadow_root: Option<NodeId>,
    pub content_document: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    /// Top-level document, or an iframe's content document when
    /// `frame_owner` is set
    Document { frame_owner: Option<NodeId> },
    ShadowRoot { host: NodeId },
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub backend_id: Option<BackendNodeId>,
}

/// Arena-backed DOM.
///
/// Node 0 is always the top-level document. Shadow roots and iframe
/// documents are separate trees linked to their host/owner element, so a
/// plain `//tag` query never crosses into them.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    /// When set, elements without layout are treated as not rendered
    /// (a captured snapshot only lists boxes that exist)
    snapshot_layout: bool,
    backend_index: HashMap<BackendNodeId, NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document { frame_owner: None },
                parent: None,
                children: Vec::new(),
                backend_id: None,
            }],
            snapshot_layout: false,
            backend_index: HashMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// First `<body>` element of the top-level document
    pub fn body(&self) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|&n| self.tag_name(n) == "body")
    }

    /// First connected element of the top-level document with this id
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|&n| self.attribute(n, "id") == Some(id))
    }

    pub fn node_by_backend_id(&self, backend_id: BackendNodeId) -> Option<NodeId> {
        self.backend_index.get(&backend_id).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    // ---- construction -------------------------------------------------

    pub fn append_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let tag = tag.to_lowercase();
        let svg = tag == "svg" || (self.is_svg(parent) && self.tag_name(parent) != "foreignobject");
        let attributes = attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        self.append_element_ns(parent, tag, attributes, svg)
    }

    pub(crate) fn append_element_ns(
        &mut self,
        parent: NodeId,
        tag: String,
        attributes: Vec<(String, String)>,
        svg: bool,
    ) -> NodeId {
        let id = self.push(NodeKind::Element(ElementData {
            tag_name: tag.to_lowercase(),
            attributes,
            svg,
            layout: None,
            shadow_root: None,
            content_document: None,
        }));
        self.append_child(parent, id);
        id
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.push(NodeKind::Text(text.to_string()));
        self.append_child(parent, id);
        id
    }

    /// Element that is not attached anywhere yet
    pub fn create_element(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        self.push(NodeKind::Element(ElementData {
            tag_name: tag.to_lowercase(),
            attributes: attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            svg: tag.eq_ignore_ascii_case("svg"),
            layout: None,
            shadow_root: None,
            content_document: None,
        }))
    }

    /// Move `child` to the end of `parent`'s children
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    /// Attach an open shadow root to `host` and return it
    pub fn attach_shadow(&mut self, host: NodeId) -> NodeId {
        let root = self.push(NodeKind::ShadowRoot { host });
        if let NodeKind::Element(el) = &mut self.nodes[host.0].kind {
            el.shadow_root = Some(root);
        }
        root
    }

    /// Create the content document of an `<iframe>`/`<frame>` owner
    pub fn attach_content_document(&mut self, owner: NodeId) -> NodeId {
        let doc = self.push(NodeKind::Document { frame_owner: Some(owner) });
        if let NodeKind::Element(el) = &mut self.nodes[owner.0].kind {
            el.content_document = Some(doc);
        }
        doc
    }

    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        match &self.nodes.get(host.0)?.kind {
            NodeKind::Element(el) => el.shadow_root,
            _ => None,
        }
    }

    pub fn content_document(&self, owner: NodeId) -> Option<NodeId> {
        match &self.nodes.get(owner.0)?.kind {
            NodeKind::Element(el) => el.content_document,
            _ => None,
        }
    }

    pub fn set_layout(&mut self, node: NodeId, layout: LayoutData) {
        if let NodeKind::Element(el) = &mut self.nodes[node.0].kind {
            el.layout = Some(layout);
        }
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeKind::Element(el) = &mut self.nodes[node.0].kind {
            match el.attributes.iter_mut().find(|(k, _)| k == name) {
                Some(slot) => slot.1 = value.to_string(),
                None => el.attributes.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub(crate) fn set_backend_id(&mut self, node: NodeId, backend_id: BackendNodeId) {
        self.nodes[node.0].backend_id = Some(backend_id);
        self.backend_index.insert(backend_id, node);
    }

    pub(crate) fn set_snapshot_layout(&mut self, enabled: bool) {
        self.snapshot_layout = enabled;
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData { kind, parent: None, children: Vec::new(), backend_id: None });
        id
    }

    // ---- raw access for the locator engine ----------------------------

    pub(crate) fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(node.0).map(|n| &n.kind)
    }

    pub(crate) fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    pub(crate) fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(node.0).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub(crate) fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Attribute at `index`, used by the XPath attribute axis
    pub(crate) fn attribute_at(&self, node: NodeId, index: usize) -> Option<(&str, &str)> {
        self.element(node)?
            .attributes
            .get(index)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Preorder position of every node reachable from `root`
    pub(crate) fn document_order(&self, root: NodeId) -> HashMap<NodeId, usize> {
        let mut order = HashMap::new();
        let mut stack = vec![root];
        while let Some(n) = stack.pop() {
            order.insert(n, order.len());
            stack.extend(self.children(n).iter().rev().copied());
        }
        order
    }

    fn topmost(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Whether this element or one of its flat-tree ancestors is explicitly
    /// hidden through inline style or the `hidden` attribute
    fn hidden_by_markup(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if let Some(el) = self.element(n) {
                if self.inline_style(el).is_display_none() {
                    return true;
                }
            }
            current = self.parent(n).or_else(|| match self.kind(n) {
                Some(NodeKind::ShadowRoot { host }) => Some(*host),
                Some(NodeKind::Document { frame_owner }) => *frame_owner,
                _ => None,
            });
        }
        false
    }

    fn inline_style(&self, el: &ElementData) -> ComputedStyle {
        let mut style = el
            .attributes
            .iter()
            .find(|(k, _)| k == "style")
            .map(|(_, v)| ComputedStyle::from_inline(v))
            .unwrap_or_default();
        if style.display.is_none() && el.attributes.iter().any(|(k, _)| k == "hidden") {
            style.display = Some("none".to_string());
        }
        style
    }
}

impl DomView for Document {
    type Node = NodeId;

    fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    fn tag_name(&self, node: NodeId) -> &str {
        self.element(node).map(|el| el.tag_name.as_str()).unwrap_or("")
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn attributes(&self, node: NodeId) -> Vec<(&str, &str)> {
        self.element(node)
            .map(|el| el.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect())
            .unwrap_or_default()
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut text = String::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            match self.kind(n) {
                Some(NodeKind::Text(t)) => text.push_str(t),
                _ => stack.extend(self.children(n).iter().rev().copied()),
            }
        }
        text
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node).filter(|&p| self.is_element(p))
    }

    fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
            .collect()
    }

    fn is_connected(&self, node: NodeId) -> bool {
        let root = self.topmost(node);
        match self.kind(root) {
            Some(NodeKind::Document { frame_owner: None }) => root == self.root(),
            Some(NodeKind::Document { frame_owner: Some(owner) }) => self.is_connected(*owner),
            Some(NodeKind::ShadowRoot { host }) => self.is_connected(*host),
            _ => false,
        }
    }

    fn is_svg(&self, node: NodeId) -> bool {
        self.element(node).map(|el| el.svg).unwrap_or(false)
    }

    fn tree_root(&self, node: NodeId) -> NodeId {
        self.topmost(node)
    }

    fn shadow_host(&self, node: NodeId) -> Option<NodeId> {
        match self.kind(self.topmost(node)) {
            Some(NodeKind::ShadowRoot { host }) => Some(*host),
            _ => None,
        }
    }

    fn in_iframe(&self, node: NodeId) -> bool {
        let mut root = self.topmost(node);
        loop {
            match self.kind(root) {
                Some(NodeKind::Document { frame_owner: Some(_) }) => return true,
                Some(NodeKind::ShadowRoot { host }) => root = self.topmost(*host),
                _ => return false,
            }
        }
    }

    fn computed_style(&self, node: NodeId) -> Result<ComputedStyle, DomError> {
        let el = self.element(node).ok_or(DomError::NotAnElement)?;
        if let Some(layout) = &el.layout {
            return Ok(layout.style.clone());
        }
        if self.snapshot_layout {
            return Ok(ComputedStyle::default());
        }

        let mut style = self.inline_style(el);
        if style.visibility.is_none() {
            // visibility inherits
            let mut ancestor = self.parent_element(node);
            while let Some(a) = ancestor {
                if let Some(ael) = self.element(a) {
                    if let Some(v) = self.inline_style(ael).visibility {
                        style.visibility = Some(v);
                        break;
                    }
                }
                ancestor = self.parent_element(a);
            }
        }
        Ok(style)
    }

    fn bounding_box(&self, node: NodeId) -> Result<DOMRect, DomError> {
        let el = self.element(node).ok_or(DomError::NotAnElement)?;
        if let Some(layout) = &el.layout {
            return Ok(layout.bounds);
        }
        if self.snapshot_layout || !self.is_connected(node) || self.hidden_by_markup(node) {
            return Ok(DOMRect::default());
        }
        Err(DomError::LayoutUnavailable)
    }

    fn evaluate_xpath(&self, context: NodeId, expr: &str) -> Result<Vec<NodeId>, LocatorError> {
        locator::eval::evaluate(self, context, expr)
    }

    fn query_css(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, LocatorError> {
        locator::css::query(self, scope, selector)
    }
}
