//! Simple structural fallback: positional paths with a couple of
//! attribute variants. Used when enhanced generation is disabled or
//! produces nothing.

use crate::config::SelectorSettings;
use crate::dom::DomView;
use crate::error::SelectorError;
use crate::locator::{escape_xpath_value, xpath_tag};

use super::oracle::UniquenessOracle;
use super::strategies::same_tag_position;
use super::SelectorResult;

const MAX_PATH_SEGMENTS: usize = 5;
const MAX_FALLBACK_ALTERNATIVES: usize = 10;

pub fn simple_structural_fallback<D: DomView>(
    dom: &D,
    element: D::Node,
    oracle: &dyn UniquenessOracle<D::Node>,
    settings: &SelectorSettings,
) -> Result<SelectorResult, SelectorError> {
    if !dom.is_element(element) {
        return Err(SelectorError::InvalidElement(format!("{:?}", element)));
    }
    let tag = xpath_tag(dom, element);

    let mut segments: Vec<String> = Vec::new();
    let mut current = element;
    while let Some(parent) = dom.parent_element(current) {
        if segments.len() >= MAX_PATH_SEGMENTS {
            break;
        }
        let (index, _) = same_tag_position(dom, current);
        segments.insert(0, format!("{}[{}]", xpath_tag(dom, current), index));
        current = parent;
    }

    let mut variants: Vec<String> = Vec::new();
    if !segments.is_empty() {
        variants.push(format!("//{}", segments.join("/")));
        if segments.len() > 2 {
            variants.push(format!("//{}", segments[segments.len() - 2..].join("/")));
        }
        if segments.len() > 1 {
            variants.push(format!("//{}", segments[segments.len() - 1]));
        }
    }

    let same_tag = dom.tag_name(element);
    if let Some(global) = dom
        .descendants(dom.tree_root(element))
        .into_iter()
        .filter(|&n| dom.tag_name(n) == same_tag)
        .position(|n| n == element)
    {
        variants.push(format!("(//{})[{}]", tag, global + 1));
    }
    if let Some(id) = dom.id(element) {
        variants.push(format!("//{}[@id={}]", tag, escape_xpath_value(id)));
    }
    if let Some(first) = dom.class_name(element).and_then(|c| c.split_whitespace().next()) {
        variants.push(format!("//{}[contains(@class, {})]", tag, escape_xpath_value(first)));
    }

    let mut unique: Vec<String> = Vec::new();
    for variant in variants {
        if !unique.contains(&variant) {
            unique.push(variant);
        }
    }
    let verified: Vec<String> = unique
        .iter()
        .filter(|v| oracle.identifies(v, element))
        .cloned()
        .collect();
    let mut alternatives = if verified.is_empty() { unique } else { verified };
    alternatives.truncate(MAX_FALLBACK_ALTERNATIVES);

    if settings.debug_mode {
        tracing::debug!("Fallback generated {} alternative(s): {:?}", alternatives.len(), alternatives);
    }
    Ok(SelectorResult::from_alternatives(alternatives).unwrap_or_else(|| SelectorResult::single(format!("//{tag}"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::selectors::oracle::DocumentOracle;

    fn fallback(doc: &Document, element: crate::dom::NodeId) -> SelectorResult {
        let oracle = DocumentOracle::new(doc, element, false);
        simple_structural_fallback(doc, element, &oracle, &SelectorSettings::default()).unwrap()
    }

    #[test]
    fn test_positional_variants() {
        let doc = Document::parse_html(
            r#"<body><div><p>a</p><span>s</span><p id="t" class="note big">b</p></div></body>"#,
        );
        let p = doc.find_by_id("t").unwrap();
        let result = fallback(&doc, p);
        assert_eq!(
            result.alternatives,
            vec![
                "//body[1]/div[1]/p[2]",
                "//div[1]/p[2]",
                "//p[2]",
                "(//p)[2]",
                "//p[@id='t']",
                "//p[contains(@class, 'note')]",
            ]
        );
        assert_eq!(result.best, result.alternatives[0]);
    }

    #[test]
    fn test_detached_element_falls_back_to_tag() {
        let mut doc = Document::new();
        let div = doc.append_element(doc.root(), "div", &[]);
        let b = doc.append_element(div, "b", &[]);
        doc.detach(b);
        assert_eq!(fallback(&doc, b), SelectorResult::single("//b"));
    }

    #[test]
    fn test_non_element_is_rejected() {
        let mut doc = Document::new();
        let div = doc.append_element(doc.root(), "div", &[]);
        let text = doc.append_text(div, "hello");
        let oracle = DocumentOracle::new(&doc, div, false);
        assert!(simple_structural_fallback(&doc, text, &oracle, &SelectorSettings::default()).is_err());
    }
}
