use crate::dom::DomView;
use crate::locator::escape_css;

const SHADOW_STABLE_ATTRIBUTES: &[&str] =
    &["data-testid", "data-cy", "name", "role", "aria-label", "placeholder", "title"];

const MAX_ANCHOR_PARENTS: usize = 5;

/// CSS selector for an element inside a shadow root, evaluated against
/// that root: unique `#id`, then a stable attribute, then an `:nth-child`
/// path from a uniquely identifiable parent, then the full `:nth-child`
/// path. Elements outside shadow DOM just get their tag name.
pub fn shadow_css_selector<D: DomView>(dom: &D, element: D::Node) -> String {
    let tag = dom.tag_name(element).to_string();
    if dom.shadow_host(element).is_none() {
        return tag;
    }
    let root = dom.tree_root(element);
    let first_match = |selector: &str| -> Option<D::Node> {
        dom.query_css(root, selector).ok().and_then(|found| found.first().copied())
    };

    if let Some(id) = dom.id(element) {
        let selector = format!("#{}", escape_css(id));
        if first_match(&selector) == Some(element) {
            return selector;
        }
    }

    for attr in SHADOW_STABLE_ATTRIBUTES {
        if let Some(value) = dom.attribute(element, attr).filter(|v| !v.is_empty()) {
            let selector = format!("{}[{}='{}']", tag, attr, escape_css(value));
            if first_match(&selector) == Some(element) {
                return selector;
            }
        }
    }

    let mut parent = dom.parent_element(element);
    for _ in 0..MAX_ANCHOR_PARENTS {
        let Some(p) = parent else { break };
        if let Some(parent_selector) = anchor_selector(dom, p) {
            let unique = dom.query_css(root, &parent_selector).map(|found| found.len() == 1).unwrap_or(false);
            if unique {
                return format!("{} {}", parent_selector, child_path(dom, element, Some(p)));
            }
        }
        parent = dom.parent_element(p);
    }

    let path = child_path(dom, element, None);
    path.strip_prefix("> ").unwrap_or(&path).to_string()
}

fn anchor_selector<D: DomView>(dom: &D, node: D::Node) -> Option<String> {
    if let Some(id) = dom.id(node) {
        return Some(format!("#{}", escape_css(id)));
    }
    SHADOW_STABLE_ATTRIBUTES.iter().find_map(|attr| {
        dom.attribute(node, attr)
            .filter(|v| !v.is_empty())
            .map(|v| format!("{}[{}='{}']", dom.tag_name(node), attr, escape_css(v)))
    })
}

/// `> :nth-child(a) > :nth-child(b)` from `stop` (exclusive) down to
/// `element`; up to the shadow root when `stop` is `None`
fn child_path<D: DomView>(dom: &D, element: D::Node, stop: Option<D::Node>) -> String {
    let mut segments = Vec::new();
    let mut current = element;
    loop {
        if Some(current) == stop {
            break;
        }
        segments.push(format!("> :nth-child({})", sibling_index(dom, current)));
        match dom.parent_element(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    segments.reverse();
    segments.join(" ")
}

/// 1-based index among all element siblings, shadow-root children included
fn sibling_index<D: DomView>(dom: &D, node: D::Node) -> usize {
    // top-level shadow children have no parent element
    let parent = dom.parent_element(node).unwrap_or_else(|| dom.tree_root(node));
    dom.element_children(parent).iter().position(|&c| c == node).map(|i| i + 1).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, NodeId};

    fn shadow_page() -> (Document, NodeId) {
        let mut doc = Document::new();
        let body = doc.append_element(doc.root(), "body", &[]);
        let host = doc.append_element(body, "my-widget", &[]);
        let shadow = doc.attach_shadow(host);
        (doc, shadow)
    }

    #[test]
    fn test_unique_id() {
        let (mut doc, shadow) = shadow_page();
        let button = doc.append_element(shadow, "button", &[("id", "ok")]);
        assert_eq!(shadow_css_selector(&doc, button), "#ok");
    }

    #[test]
    fn test_stable_attribute() {
        let (mut doc, shadow) = shadow_page();
        doc.append_element(shadow, "input", &[("name", "first")]);
        let input = doc.append_element(shadow, "input", &[("name", "last"), ("placeholder", "Last")]);
        assert_eq!(shadow_css_selector(&doc, input), "input[name='last']");
    }

    #[test]
    fn test_parent_anchored_path() {
        let (mut doc, shadow) = shadow_page();
        let panel = doc.append_element(shadow, "div", &[("role", "dialog")]);
        doc.append_element(panel, "span", &[]);
        let inner = doc.append_element(panel, "div", &[]);
        let target = doc.append_element(inner, "span", &[]);
        assert_eq!(
            shadow_css_selector(&doc, target),
            "div[role='dialog'] > :nth-child(2) > :nth-child(1)"
        );
        let found = doc.query_css(shadow, &shadow_css_selector(&doc, target)).unwrap();
        assert_eq!(found, vec![target]);
    }

    #[test]
    fn test_full_path() {
        let (mut doc, shadow) = shadow_page();
        doc.append_element(shadow, "style", &[]);
        let wrapper = doc.append_element(shadow, "div", &[]);
        let target = doc.append_element(wrapper, "b", &[]);
        assert_eq!(shadow_css_selector(&doc, target), ":nth-child(2) > :nth-child(1)");
    }

    #[test]
    fn test_light_dom_element_gets_tag() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p", &[("id", "x")]);
        assert_eq!(shadow_css_selector(&doc, p), "p");
    }
}
