//! CSS lookups scoped to a shadow root or document.
//!
//! Selectors are parsed with `scraper`'s selector grammar and matched by the
//! `selectors` engine through an [`Element`] view over the arena DOM.
//! Pseudo-classes that need live state (`:hover`, `:checked`, ...) are
//! rejected at parse time.

use std::fmt;

use cssparser::{Parser as CssParser, ParserInput};
use scraper::selector::{CssLocalName, CssString, NonTSPseudoClass, Parser, PseudoElement, Simple};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::bloom::BloomFilter;
use selectors::matching::{
    self, ElementSelectorFlags, MatchingContext, MatchingForInvalidation, MatchingMode, NeedsSelectorFlags,
    QuirksMode, SelectorCaches,
};
use selectors::parser::ParseRelative;
use selectors::{Element, OpaqueElement, SelectorImpl, SelectorList};

use crate::dom::document::{ElementData, NodeKind};
use crate::dom::{Document, DomView, NodeId};
use crate::error::LocatorError;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Elements under `scope` (exclusive) matching `selector`, in document order
pub fn query(doc: &Document, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, LocatorError> {
    let list = parse(selector)?;
    let mut caches = SelectorCaches::default();
    let mut context = MatchingContext::new(
        MatchingMode::Normal,
        None,
        &mut caches,
        QuirksMode::NoQuirks,
        NeedsSelectorFlags::No,
        MatchingForInvalidation::No,
    );

    Ok(doc
        .descendants(scope)
        .into_iter()
        .filter_map(|id| DomElement::new(doc, id))
        .filter(|el| matching::matches_selector_list(&list, el, &mut context))
        .map(|el| el.id)
        .collect())
}

fn parse(selector: &str) -> Result<SelectorList<Simple>, LocatorError> {
    let mut input = ParserInput::new(selector);
    let mut parser = CssParser::new(&mut input);
    SelectorList::parse(&Parser, &mut parser, ParseRelative::No)
        .map_err(|e| LocatorError::Unsupported(format!("{} ({:?})", selector, e.kind)))
}

/// An element node of a [`Document`] as seen by the selector engine
#[derive(Clone, Copy)]
struct DomElement<'a> {
    doc: &'a Document,
    id: NodeId,
    data: &'a ElementData,
}

impl fmt::Debug for DomElement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomElement")
            .field("id", &self.id)
            .field("tag", &self.data.tag_name)
            .finish()
    }
}

impl<'a> DomElement<'a> {
    fn new(doc: &'a Document, id: NodeId) -> Option<Self> {
        doc.element(id).map(|data| Self { doc, id, data })
    }

    fn attr(&self, name: &str) -> Option<&'a str> {
        self.data
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Element siblings including self. Children of a shadow root or
    /// document count too, unlike `DomView::element_children`.
    fn sibling_elements(&self) -> Vec<NodeId> {
        match self.doc.parent(self.id) {
            Some(parent) => self
                .doc
                .children(parent)
                .iter()
                .copied()
                .filter(|&c| self.doc.is_element(c))
                .collect(),
            None => vec![self.id],
        }
    }

    fn sibling(&self, offset: isize) -> Option<Self> {
        let siblings = self.sibling_elements();
        let pos = siblings.iter().position(|&n| n == self.id)? as isize + offset;
        let id = *siblings.get(usize::try_from(pos).ok()?)?;
        Self::new(self.doc, id)
    }
}

impl Element for DomElement<'_> {
    type Impl = Simple;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self.data)
    }

    fn parent_element(&self) -> Option<Self> {
        self.doc
            .parent_element(self.id)
            .and_then(|p| Self::new(self.doc, p))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        matches!(
            self.doc.parent(self.id).and_then(|p| self.doc.kind(p)),
            Some(NodeKind::ShadowRoot { .. })
        )
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        self.doc
            .shadow_host(self.id)
            .and_then(|host| Self::new(self.doc, host))
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.sibling(-1)
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.sibling(1)
    }

    fn first_element_child(&self) -> Option<Self> {
        self.doc
            .element_children(self.id)
            .first()
            .and_then(|&c| Self::new(self.doc, c))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        !self.data.svg
    }

    fn has_local_name(&self, local_name: &CssLocalName) -> bool {
        &*local_name.0 == self.data.tag_name.as_str()
    }

    fn has_namespace(&self, ns: &<Simple as SelectorImpl>::BorrowedNamespaceUrl) -> bool {
        let own = if self.data.svg { SVG_NAMESPACE } else { HTML_NAMESPACE };
        &**ns == own
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.data.tag_name == other.data.tag_name && self.data.svg == other.data.svg
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&<Simple as SelectorImpl>::NamespaceUrl>,
        local_name: &CssLocalName,
        operation: &AttrSelectorOperation<&CssString>,
    ) -> bool {
        // attributes are stored without namespaces
        if let NamespaceConstraint::Specific(url) = ns {
            if !url.is_empty() {
                return false;
            }
        }
        self.attr(&local_name.0).is_some_and(|value| operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(&self, _pc: &NonTSPseudoClass, _context: &mut MatchingContext<'_, Simple>) -> bool {
        false
    }

    fn match_pseudo_element(&self, _pe: &PseudoElement, _context: &mut MatchingContext<'_, Simple>) -> bool {
        false
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        matches!(self.data.tag_name.as_str(), "a" | "area" | "link") && self.attr("href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        self.data.tag_name == "slot"
    }

    fn has_id(&self, id: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.attr("id")
            .is_some_and(|value| case_sensitivity.eq(id.0.as_bytes(), value.as_bytes()))
    }

    fn has_class(&self, name: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.attr("class").is_some_and(|classes| {
            classes
                .split_whitespace()
                .any(|class| case_sensitivity.eq(name.0.as_bytes(), class.as_bytes()))
        })
    }

    fn has_custom_state(&self, _name: &CssLocalName) -> bool {
        false
    }

    fn imported_part(&self, _name: &CssLocalName) -> Option<CssLocalName> {
        None
    }

    fn is_part(&self, _name: &CssLocalName) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        !self.doc.children(self.id).iter().any(|&c| match self.doc.kind(c) {
            Some(NodeKind::Element(_)) => true,
            Some(NodeKind::Text(text)) => !text.is_empty(),
            _ => false,
        })
    }

    fn is_root(&self) -> bool {
        matches!(
            self.doc.parent(self.id).and_then(|p| self.doc.kind(p)),
            Some(NodeKind::Document { .. })
        )
    }

    fn add_element_unique_hashes(&self, _filter: &mut BloomFilter) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shadow_page() -> (Document, NodeId) {
        let doc = Document::parse_html(
            r#"<body><x-app id="app"><template shadowrootmode="open">
                <div id="wrap"><span>one</span><button name="go" class="btn primary">Go</button></div>
                <div class="list"><button>Again</button></div>
            </template></x-app></body>"#,
        );
        let host = doc.find_by_id("app").unwrap();
        let shadow = doc.shadow_root(host).unwrap();
        (doc, shadow)
    }

    #[test]
    fn test_simple_selectors() {
        let (doc, shadow) = shadow_page();
        assert_eq!(query(&doc, shadow, "#wrap").unwrap().len(), 1);
        assert_eq!(query(&doc, shadow, "button").unwrap().len(), 2);
        assert_eq!(query(&doc, shadow, "button[name='go']").unwrap().len(), 1);
        assert_eq!(query(&doc, shadow, ".btn.primary").unwrap().len(), 1);
        assert_eq!(query(&doc, shadow, "[name]").unwrap().len(), 1);
        assert_eq!(query(&doc, shadow, "[class~=primary]").unwrap().len(), 1);
    }

    #[test]
    fn test_combinators_and_nth_child() {
        let (doc, shadow) = shadow_page();
        assert_eq!(query(&doc, shadow, "#wrap > :nth-child(2)").unwrap().len(), 1);
        assert_eq!(query(&doc, shadow, ".list button").unwrap().len(), 1);
        // children of the shadow root take part in sibling counting
        assert_eq!(query(&doc, shadow, "div:nth-child(2)").unwrap().len(), 1);
        assert_eq!(query(&doc, shadow, ":nth-child(1) > :nth-child(1)").unwrap().len(), 1);
        assert_eq!(query(&doc, shadow, "span, .list > button").unwrap().len(), 2);
    }

    #[test]
    fn test_queries_do_not_leave_the_shadow_root() {
        let (doc, shadow) = shadow_page();
        // the host lives in the light tree
        assert!(query(&doc, shadow, "x-app button").unwrap().is_empty());
        assert!(query(&doc, doc.root(), "button").unwrap().is_empty());
    }

    #[test]
    fn test_escapes() {
        let mut doc = Document::new();
        let el = doc.append_element(doc.root(), "div", &[("id", "a.b:c"), ("data-x", "it's")]);
        let digit = doc.append_element(doc.root(), "div", &[("id", "1st")]);
        assert_eq!(query(&doc, doc.root(), r"#a\.b\:c").unwrap(), vec![el]);
        assert_eq!(query(&doc, doc.root(), r"div[data-x='it\'s']").unwrap(), vec![el]);
        assert_eq!(query(&doc, doc.root(), r"#\31 st").unwrap(), vec![digit]);
    }

    #[test]
    fn test_invalid_selectors() {
        let (doc, shadow) = shadow_page();
        assert!(query(&doc, shadow, "div[").is_err());
        assert!(query(&doc, shadow, "div:hover").is_err());
        assert!(query(&doc, shadow, "").is_err());
    }
}
