use std::collections::HashMap;

use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::dom::{BackendNodeId, ComputedStyle, DOMRect, Document, LayoutData, NodeId};

use super::types::{node_type, RawCdpTrees};

/// Build a [`Document`] from raw CDP data.
///
/// Shadow roots and iframe documents become separate trees linked to their
/// host/owner, exactly like parsed HTML. When a snapshot is present every
/// element gets its layout from it, and elements missing from the snapshot
/// are treated as not rendered.
pub fn build_document(raw: &RawCdpTrees) -> Result<Document> {
    let root_type = raw.dom_root.get("nodeType").and_then(|v| v.as_i64()).unwrap_or(0);
    if root_type != node_type::DOCUMENT {
        return Err(anyhow!("DOM root is not a document (nodeType {})", root_type));
    }

    let layouts = raw.snapshot.as_ref().map(build_layout_lookup).unwrap_or_default();

    let mut doc = Document::new();
    let root = doc.root();
    if let Some(backend_id) = backend_node_id(&raw.dom_root) {
        doc.set_backend_id(root, backend_id);
    }
    import_children(&mut doc, root, &raw.dom_root, &layouts);

    if raw.snapshot.is_some() {
        doc.set_snapshot_layout(true);
    }
    tracing::debug!("Built document with {} nodes ({} with layout)", doc.len(), layouts.len());
    Ok(doc)
}

fn backend_node_id(json: &Value) -> Option<BackendNodeId> {
    json.get("backendNodeId").and_then(|v| v.as_i64()).filter(|&id| id > 0)
}

fn import_children(doc: &mut Document, parent: NodeId, json: &Value, layouts: &HashMap<BackendNodeId, LayoutData>) {
    if let Some(children) = json.get("children").and_then(|c| c.as_array()) {
        for child in children {
            import_node(doc, parent, child, layouts);
        }
    }
}

fn import_node(doc: &mut Document, parent: NodeId, json: &Value, layouts: &HashMap<BackendNodeId, LayoutData>) {
    match json.get("nodeType").and_then(|v| v.as_i64()).unwrap_or(0) {
        node_type::ELEMENT => import_element(doc, parent, json, layouts),
        node_type::TEXT => {
            let text = json.get("nodeValue").and_then(|v| v.as_str()).unwrap_or("");
            doc.append_text(parent, text);
        }
        // comments, doctypes, processing instructions
        _ => {}
    }
}

fn import_element(doc: &mut Document, parent: NodeId, json: &Value, layouts: &HashMap<BackendNodeId, LayoutData>) {
    let tag = json
        .get("localName")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .or_else(|| json.get("nodeName").and_then(|v| v.as_str()))
        .unwrap_or("")
        .to_string();
    let svg = json.get("isSVG").and_then(|v| v.as_bool()).unwrap_or(false);

    // attributes arrive as a flat [name, value, name, value, ...] list
    let mut attributes = Vec::new();
    if let Some(attrs) = json.get("attributes").and_then(|a| a.as_array()) {
        for chunk in attrs.chunks(2) {
            if chunk.len() == 2 {
                let key = chunk[0].as_str().unwrap_or("");
                let value = chunk[1].as_str().unwrap_or("");
                attributes.push((key.to_string(), value.to_string()));
            }
        }
    }

    let id = doc.append_element_ns(parent, tag, attributes, svg);
    if let Some(backend_id) = backend_node_id(json) {
        doc.set_backend_id(id, backend_id);
        if let Some(layout) = layouts.get(&backend_id) {
            doc.set_layout(id, layout.clone());
        }
    }

    if let Some(shadow_roots) = json.get("shadowRoots").and_then(|s| s.as_array()) {
        for shadow in shadow_roots {
            // built-in control internals are not addressable from the page
            if shadow.get("shadowRootType").and_then(|t| t.as_str()) == Some("user-agent") {
                continue;
            }
            let root = doc.attach_shadow(id);
            if let Some(backend_id) = backend_node_id(shadow) {
                doc.set_backend_id(root, backend_id);
            }
            import_children(doc, root, shadow, layouts);
        }
    }

    if let Some(content) = json.get("contentDocument") {
        let frame_doc = doc.attach_content_document(id);
        if let Some(backend_id) = backend_node_id(content) {
            doc.set_backend_id(frame_doc, backend_id);
        }
        import_children(doc, frame_doc, content, layouts);
    }

    import_children(doc, id, json, layouts);
}

/// Layout per backend node id from a `DOMSnapshot.captureSnapshot` result.
///
/// Each snapshot document correlates its arrays by index: `layout.nodeIndex`
/// maps a layout entry to a node, `nodes.backendNodeId` maps that node to
/// its backend id, and `layout.styles` holds indices into the top-level
/// `strings` table.
fn build_layout_lookup(snapshot: &Value) -> HashMap<BackendNodeId, LayoutData> {
    let mut lookup = HashMap::new();
    let strings = snapshot.get("strings").and_then(|s| s.as_array());
    let string_at = |index: Option<&Value>| -> Option<String> {
        let index = index?.as_i64().filter(|&i| i >= 0)? as usize;
        strings?.get(index)?.as_str().map(|s| s.to_string())
    };

    let Some(documents) = snapshot.get("documents").and_then(|d| d.as_array()) else {
        return lookup;
    };

    for document in documents {
        let backend_ids = document.get("nodes").and_then(|n| n.get("backendNodeId")).and_then(|b| b.as_array());
        let layout = document.get("layout");
        let node_indices = layout.and_then(|l| l.get("nodeIndex")).and_then(|n| n.as_array());
        let bounds = layout.and_then(|l| l.get("bounds")).and_then(|b| b.as_array());
        let styles = layout.and_then(|l| l.get("styles")).and_then(|s| s.as_array());

        let (Some(backend_ids), Some(node_indices)) = (backend_ids, node_indices) else {
            continue;
        };

        for (layout_index, node_index) in node_indices.iter().enumerate() {
            let Some(node_index) = node_index.as_u64() else { continue };
            let Some(backend_id) = backend_ids.get(node_index as usize).and_then(|b| b.as_i64()) else {
                continue;
            };

            let mut data = LayoutData::default();

            // Rectangle is [x, y, width, height]
            if let Some(rect) = bounds.and_then(|b| b.get(layout_index)).and_then(|r| r.as_array()) {
                if rect.len() == 4 {
                    data.bounds = DOMRect::new(
                        rect[0].as_f64().unwrap_or(0.0),
                        rect[1].as_f64().unwrap_or(0.0),
                        rect[2].as_f64().unwrap_or(0.0),
                        rect[3].as_f64().unwrap_or(0.0),
                    );
                }
            }

            if let Some(values) = styles.and_then(|s| s.get(layout_index)).and_then(|s| s.as_array()) {
                data.style = ComputedStyle {
                    display: string_at(values.first()),
                    visibility: string_at(values.get(1)),
                    opacity: string_at(values.get(2)),
                };
            }

            lookup.insert(backend_id, data);
        }
    }

    lookup
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomView;
    use serde_json::json;

    fn element(backend: i64, name: &str, attrs: Vec<&str>, children: Vec<Value>) -> Value {
        json!({
            "nodeType": 1,
            "backendNodeId": backend,
            "nodeName": name.to_uppercase(),
            "localName": name,
            "attributes": attrs,
            "children": children,
        })
    }

    fn text(value: &str) -> Value {
        json!({"nodeType": 3, "nodeName": "#text", "nodeValue": value})
    }

    fn sample_root() -> Value {
        json!({
            "nodeType": 9,
            "backendNodeId": 1,
            "nodeName": "#document",
            "children": [
                {"nodeType": 10, "nodeName": "html"},
                element(2, "html", vec![], vec![
                    element(3, "body", vec![], vec![
                        element(4, "button", vec!["id", "go", "class", "btn"], vec![text("Go")]),
                        json!({
                            "nodeType": 1, "backendNodeId": 5, "nodeName": "MY-CARD", "localName": "my-card",
                            "attributes": [],
                            "shadowRoots": [{
                                "nodeType": 11, "backendNodeId": 6, "nodeName": "#document-fragment",
                                "shadowRootType": "open",
                                "children": [element(7, "span", vec!["data-testid", "inner"], vec![text("Inner")])]
                            }]
                        }),
                        json!({
                            "nodeType": 1, "backendNodeId": 8, "nodeName": "INPUT", "localName": "input",
                            "attributes": ["name", "q"],
                            "shadowRoots": [{"nodeType": 11, "backendNodeId": 9, "shadowRootType": "user-agent", "children": []}]
                        }),
                        json!({
                            "nodeType": 1, "backendNodeId": 10, "nodeName": "IFRAME", "localName": "iframe",
                            "attributes": ["id", "frame"],
                            "contentDocument": {
                                "nodeType": 9, "backendNodeId": 11, "nodeName": "#document",
                                "children": [element(12, "html", vec![], vec![
                                    element(13, "body", vec![], vec![element(14, "a", vec!["href", "/x"], vec![text("X")])])
                                ])]
                            }
                        }),
                    ])
                ]),
            ]
        })
    }

    fn sample_snapshot() -> Value {
        json!({
            "strings": ["block", "visible", "1", "none", "hidden"],
            "documents": [{
                "nodes": {"backendNodeId": [1, 2, 3, 4, 99, 8]},
                "layout": {
                    "nodeIndex": [2, 3, 4, 5],
                    "bounds": [[0, 0, 800, 600], [10, 10, 80, 20], [12, 12, 20, 10], [0, 0, 0, 0]],
                    "styles": [[0, 1, 2], [0, 1, 2], [0, 1, 2], [3, 4, -1]]
                }
            }]
        })
    }

    #[test]
    fn test_build_tree_structure() {
        let raw = RawCdpTrees { dom_root: sample_root(), snapshot: None, url: None };
        let doc = build_document(&raw).unwrap();

        let button = doc.find_by_id("go").unwrap();
        assert_eq!(doc.tag_name(button), "button");
        assert_eq!(doc.class_name(button), Some("btn"));
        assert_eq!(doc.text_content(button), "Go");
        assert_eq!(doc.node_by_backend_id(4), Some(button));

        let card = doc.node_by_backend_id(5).unwrap();
        let shadow = doc.shadow_root(card).unwrap();
        let span = doc.node_by_backend_id(7).unwrap();
        assert_eq!(doc.shadow_host(span), Some(card));
        assert_eq!(doc.tree_root(span), shadow);

        let input = doc.node_by_backend_id(8).unwrap();
        assert_eq!(doc.shadow_root(input), None);

        let link = doc.node_by_backend_id(14).unwrap();
        assert!(doc.in_iframe(link));
        assert!(doc.is_connected(link));
    }

    #[test]
    fn test_snapshot_layout_is_applied() {
        let raw = RawCdpTrees { dom_root: sample_root(), snapshot: Some(sample_snapshot()), url: None };
        let doc = build_document(&raw).unwrap();

        let button = doc.node_by_backend_id(4).unwrap();
        assert_eq!(doc.bounding_box(button).unwrap(), DOMRect::new(10.0, 10.0, 80.0, 20.0));
        assert_eq!(doc.computed_style(button).unwrap().display.as_deref(), Some("block"));

        let input = doc.node_by_backend_id(8).unwrap();
        let style = doc.computed_style(input).unwrap();
        assert!(style.is_display_none());
        assert!(style.is_visibility_hidden());
        assert_eq!(style.opacity, None);

        // not in the snapshot: no box
        let link = doc.node_by_backend_id(14).unwrap();
        assert!(doc.bounding_box(link).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_non_document_root() {
        let raw = RawCdpTrees { dom_root: element(1, "div", vec![], vec![]), snapshot: None, url: None };
        assert!(build_document(&raw).is_err());
    }

    #[test]
    fn test_raw_trees_round_trip_through_json() {
        let raw = RawCdpTrees { dom_root: sample_root(), snapshot: Some(sample_snapshot()), url: Some("https://example.com".into()) };
        let stored = serde_json::to_string(&raw).unwrap();
        let loaded: RawCdpTrees = serde_json::from_str(&stored).unwrap();
        let doc = build_document(&loaded).unwrap();
        assert!(doc.find_by_id("go").is_some());
    }
}
