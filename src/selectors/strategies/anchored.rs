use crate::dom::DomView;
use crate::error::SelectorError;
use crate::locator::{escape_xpath_value, xpath_tag};
use crate::selectors::classifier::{clean_text_content, is_dynamic_attribute};
use crate::selectors::{Candidate, ContextFlags, StrategyKind};

use super::{char_len, Strategy, StrategyContext};

const ANCHOR_TEST_ATTRIBUTES: &[&str] = &["data-testid", "data-cy"];
const MAX_ANCHOR_CHILDREN: usize = 3;
const MAX_CHILD_TEXT: usize = 30;

/// Locators scoped under the nearest context ancestor that carries a
/// stable test id or id
pub struct ParentAnchoredStrategy;

impl<D: DomView> Strategy<D> for ParentAnchoredStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ParentAnchored
    }

    fn generate(&self, ctx: &StrategyContext<'_, D>) -> Result<Vec<Candidate>, SelectorError> {
        let Some(anchor) = ctx
            .context_ancestors
            .iter()
            .find_map(|&parent| stable_anchor(ctx.dom, parent))
        else {
            return Ok(Vec::new());
        };

        let flags = ContextFlags { is_parent_anchored: true, ..Default::default() };
        let mut out = Vec::new();

        if !ctx.text.is_empty() && ctx.text_len() <= ctx.settings.max_text_length {
            let locator = format!(
                "{}//{}[normalize-space()={}]",
                anchor,
                ctx.tag,
                escape_xpath_value(&ctx.text)
            );
            out.extend(ctx.verified(locator, StrategyKind::ParentAnchored, flags, 20));
        }

        let generic = format!("{}//{}", anchor, ctx.tag);
        out.extend(ctx.verified(generic, StrategyKind::ParentAnchored, flags, 10));
        Ok(out)
    }
}

/// `//*[@data-testid='…']` or `//*[@id='…']` for an ancestor, test ids first
pub(super) fn stable_anchor<D: DomView>(dom: &D, node: D::Node) -> Option<String> {
    for attr in ANCHOR_TEST_ATTRIBUTES {
        if let Some(value) = dom.attribute(node, attr).filter(|v| !v.is_empty()) {
            if !is_dynamic_attribute(attr, value) {
                return Some(format!("//*[@{}={}]", attr, escape_xpath_value(value)));
            }
        }
    }
    dom.id(node)
        .filter(|id| !is_dynamic_attribute("id", id))
        .map(|id| format!("//*[@id={}]", escape_xpath_value(id)))
}

/// "The element that contains this child": uses up to three descendants
/// with short text or a stable id
pub struct ChildAnchoredStrategy;

impl<D: DomView> Strategy<D> for ChildAnchoredStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ChildAnchored
    }

    fn generate(&self, ctx: &StrategyContext<'_, D>) -> Result<Vec<Candidate>, SelectorError> {
        let flags = ContextFlags { is_child_anchored: true, ..Default::default() };
        let mut out = Vec::new();

        let children = ctx
            .dom
            .descendants(ctx.element)
            .into_iter()
            .filter_map(|child| {
                let text = clean_text_content(&ctx.dom.text_content(child));
                let short_text = (!text.is_empty() && char_len(&text) < MAX_CHILD_TEXT).then_some(text);
                let stable_id = ctx.dom.id(child).filter(|id| !is_dynamic_attribute("id", id));
                if short_text.is_none() && stable_id.is_none() {
                    return None;
                }
                Some((child, short_text, stable_id))
            })
            .take(MAX_ANCHOR_CHILDREN);

        for (child, text, id) in children {
            if let Some(text) = text {
                let locator = format!(
                    "//{}[.//{}[contains(text(), {})]]",
                    ctx.tag,
                    xpath_tag(ctx.dom, child),
                    escape_xpath_value(&text)
                );
                out.extend(ctx.verified(locator, StrategyKind::ChildAnchored, flags, 0));
            }
            if let Some(id) = id {
                let locator = format!("//{}[.//*[@id={}]]", ctx.tag, escape_xpath_value(id));
                out.extend(ctx.verified(locator, StrategyKind::ChildAnchored, flags, 0));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::selectors::strategies::test_support::{run, scored};

    fn two_lists() -> Document {
        Document::parse_html(
            r#"<body>
                <ul id="parentA"><li>Item</li></ul>
                <ul id="parentB"><li>Item</li></ul>
            </body>"#,
        )
    }

    fn items(doc: &Document) -> Vec<crate::dom::NodeId> {
        doc.descendants(doc.root()).into_iter().filter(|&n| doc.tag_name(n) == "li").collect()
    }

    #[test]
    fn test_parent_anchored_by_id() {
        let doc = two_lists();
        let li = items(&doc);
        let candidates = scored(&ParentAnchoredStrategy, &doc, li[0]);
        assert_eq!(candidates[0].locator, "//*[@id='parentA']//li[normalize-space()='Item']");
        assert_eq!(candidates[0].score, 157);
        assert_eq!(candidates[1].locator, "//*[@id='parentA']//li");

        assert_eq!(
            run(&ParentAnchoredStrategy, &doc, li[1])[0],
            "//*[@id='parentB']//li[normalize-space()='Item']"
        );
    }

    #[test]
    fn test_test_id_preferred_over_id() {
        let doc = Document::parse_html(
            r#"<body><form id="f" data-testid="login"><button id="t">Go</button></form></body>"#,
        );
        let button = doc.find_by_id("t").unwrap();
        assert_eq!(
            run(&ParentAnchoredStrategy, &doc, button)[0],
            "//*[@data-testid='login']//button[normalize-space()='Go']"
        );
    }

    #[test]
    fn test_no_stable_ancestor() {
        let doc = Document::parse_html(r#"<body><div><span id="t">x</span></div></body>"#);
        let span = doc.find_by_id("t").unwrap();
        assert!(run(&ParentAnchoredStrategy, &doc, span).is_empty());
    }

    #[test]
    fn test_child_anchored() {
        let doc = Document::parse_html(
            r#"<body>
                <div class="card" id="t"><h3>Pricing</h3><a id="buy-now" href="/buy">Buy</a></div>
                <div class="card"><h3>Support</h3></div>
            </body>"#,
        );
        let card = doc.find_by_id("t").unwrap();
        let locators = run(&ChildAnchoredStrategy, &doc, card);
        assert_eq!(
            locators,
            vec![
                "//div[.//h3[contains(text(), 'Pricing')]]",
                "//div[.//a[contains(text(), 'Buy')]]",
                "//div[.//*[@id='buy-now']]",
            ]
        );
        let scored = scored(&ChildAnchoredStrategy, &doc, card);
        assert!(scored.iter().all(|c| c.flags.is_child_anchored));
    }
}
