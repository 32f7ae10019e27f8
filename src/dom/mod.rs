//! Read-only DOM access used by the selector engine.
//!
//! The engine never touches a concrete DOM directly; it goes through
//! [`DomView`], which the in-memory [`Document`] implements. A live-browser
//! adapter only has to provide the same handful of queries.

pub(crate) mod document;
mod html;
pub mod types;

use std::fmt::Debug;
use std::hash::Hash;

use crate::error::{DomError, LocatorError};

pub use document::Document;
pub use types::{BackendNodeId, ComputedStyle, DOMRect, LayoutData, NodeId};

/// Narrow capability interface over a DOM tree
pub trait DomView {
    type Node: Copy + Eq + Hash + Debug;

    fn is_element(&self, node: Self::Node) -> bool;

    /// Lowercase tag name, empty for non-elements
    fn tag_name(&self, node: Self::Node) -> &str;

    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;

    /// All attributes in source order
    fn attributes(&self, node: Self::Node) -> Vec<(&str, &str)>;

    /// Concatenated text of all descendant text nodes
    fn text_content(&self, node: Self::Node) -> String;

    fn parent_element(&self, node: Self::Node) -> Option<Self::Node>;

    fn element_children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Whether the node is reachable from the top-level document,
    /// through shadow hosts and frame owners
    fn is_connected(&self, node: Self::Node) -> bool;

    fn is_svg(&self, node: Self::Node) -> bool;

    /// The root of the tree containing `node`: a document, a shadow root,
    /// or a detached subtree's topmost node
    fn tree_root(&self, node: Self::Node) -> Self::Node;

    /// Host element when `node` lives inside a shadow root
    fn shadow_host(&self, node: Self::Node) -> Option<Self::Node>;

    /// Whether `node` belongs to a nested (iframe) document
    fn in_iframe(&self, node: Self::Node) -> bool;

    fn computed_style(&self, node: Self::Node) -> Result<ComputedStyle, DomError>;

    fn bounding_box(&self, node: Self::Node) -> Result<DOMRect, DomError>;

    /// Evaluate an XPath expression with `context` as the context node.
    /// Absolute paths resolve against the tree containing `context`.
    fn evaluate_xpath(&self, context: Self::Node, expr: &str)
        -> Result<Vec<Self::Node>, LocatorError>;

    /// Elements under `scope` matching a CSS selector, in document order
    fn query_css(&self, scope: Self::Node, selector: &str)
        -> Result<Vec<Self::Node>, LocatorError>;

    fn id(&self, node: Self::Node) -> Option<&str> {
        self.attribute(node, "id").filter(|id| !id.is_empty())
    }

    fn class_name(&self, node: Self::Node) -> Option<&str> {
        self.attribute(node, "class").filter(|c| !c.trim().is_empty())
    }

    fn previous_element_sibling(&self, node: Self::Node) -> Option<Self::Node> {
        let parent = self.parent_element(node)?;
        let siblings = self.element_children(parent);
        let pos = siblings.iter().position(|&n| n == node)?;
        pos.checked_sub(1).map(|i| siblings[i])
    }

    fn next_element_sibling(&self, node: Self::Node) -> Option<Self::Node> {
        let parent = self.parent_element(node)?;
        let siblings = self.element_children(parent);
        let pos = siblings.iter().position(|&n| n == node)?;
        siblings.get(pos + 1).copied()
    }

    /// Nearest inclusive ancestor element matching `pred`
    fn closest(&self, node: Self::Node, pred: &dyn Fn(Self::Node) -> bool) -> Option<Self::Node> {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.is_element(n) && pred(n) {
                return Some(n);
            }
            current = self.parent_element(n);
        }
        None
    }

    /// Descendant elements in document (preorder) order, excluding `node`
    fn descendants(&self, node: Self::Node) -> Vec<Self::Node> {
        let mut out = Vec::new();
        let mut stack: Vec<Self::Node> = self.element_children(node).into_iter().rev().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.element_children(n).into_iter().rev());
        }
        out
    }
}
