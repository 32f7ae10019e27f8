use scraper::{ElementRef, Html};

use super::document::Document;
use super::types::NodeId;

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

impl Document {
    /// Load an HTML page.
    ///
    /// Besides regular markup this understands declarative shadow roots
    /// (`<template shadowrootmode="open">`) and `<iframe srcdoc>`, so shadow
    /// and frame content can be described in a single file. There is no
    /// layout engine behind it: boxes are only known for elements hidden
    /// through inline style or the `hidden` attribute.
    pub fn parse_html(source: &str) -> Self {
        let html = Html::parse_document(source);
        let mut doc = Document::new();
        let root = doc.root();
        import_element(&mut doc, root, html.root_element());
        doc
    }
}

fn import_element(doc: &mut Document, parent: NodeId, element: ElementRef<'_>) {
    let el = element.value();
    let tag = el.name().to_string();
    let attributes: Vec<(String, String)> = el
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    if tag == "template" && attributes.iter().any(|(k, _)| k == "shadowrootmode") {
        let shadow = doc.attach_shadow(parent);
        import_children(doc, shadow, element);
        return;
    }

    let svg = &*el.name.ns == SVG_NAMESPACE;
    let srcdoc = attributes
        .iter()
        .find(|(k, _)| k == "srcdoc")
        .map(|(_, v)| v.clone());
    let id = doc.append_element_ns(parent, tag.clone(), attributes, svg);

    if tag == "iframe" {
        if let Some(srcdoc) = srcdoc {
            let frame_doc = doc.attach_content_document(id);
            let inner = Html::parse_document(&srcdoc);
            import_element(doc, frame_doc, inner.root_element());
        }
    }

    import_children(doc, id, element);
}

fn import_children(doc: &mut Document, parent: NodeId, element: ElementRef<'_>) {
    // template content sits under a document fragment
    let children = element.children().flat_map(|child| {
        if child.value().is_fragment() {
            child.children().collect::<Vec<_>>()
        } else {
            vec![child]
        }
    });
    for child in children {
        if let Some(child_el) = ElementRef::wrap(child) {
            import_element(doc, parent, child_el);
        } else if let Some(text) = child.value().as_text() {
            doc.append_text(parent, text);
        }
    }
}
