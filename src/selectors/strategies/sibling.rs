use crate::dom::DomView;
use crate::error::SelectorError;
use crate::locator::{escape_xpath_value, xpath_tag};
use crate::selectors::classifier::{clean_text_content, is_dynamic_attribute};
use crate::selectors::{Candidate, ContextFlags, StrategyKind};

use super::{char_len, Strategy, StrategyContext};

const MAX_SPECIFIC_SIBLING_TEXT: usize = 30;

/// `//h2[contains(text(), 'Billing')]//following::button` from any nearby
/// sibling with short text or a stable id
pub struct FlexibleSiblingStrategy;

impl<D: DomView> Strategy<D> for FlexibleSiblingStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FlexibleSibling
    }

    fn generate(&self, ctx: &StrategyContext<'_, D>) -> Result<Vec<Candidate>, SelectorError> {
        let Some(parent) = ctx.dom.parent_element(ctx.element) else {
            return Ok(Vec::new());
        };
        let flags = ContextFlags { is_flexible: true, ..Default::default() };
        let mut out = Vec::new();

        let siblings = ctx
            .dom
            .element_children(parent)
            .into_iter()
            .filter(|&s| s != ctx.element)
            .take(ctx.settings.max_sibling_distance);

        for sibling in siblings {
            let text = clean_text_content(&ctx.dom.text_content(sibling));
            let len = char_len(&text);
            if len > 3 && len < 40 {
                let locator = format!(
                    "//{}[contains(text(), {})]//following::{}",
                    xpath_tag(ctx.dom, sibling),
                    escape_xpath_value(&text),
                    ctx.tag
                );
                out.extend(ctx.verified(locator, StrategyKind::FlexibleSibling, flags, 0));
            }
            if let Some(id) = ctx.dom.id(sibling).filter(|id| !is_dynamic_attribute("id", id)) {
                let locator = format!("//*[@id={}]//following::{}", escape_xpath_value(id), ctx.tag);
                out.extend(ctx.verified(locator, StrategyKind::FlexibleSibling, flags, 0));
            }
        }
        Ok(out)
    }
}

/// Immediate neighbours: `following-sibling::tag[1]` from the previous
/// sibling, `preceding-sibling::tag[1]` from the next one
pub struct SpecificSiblingStrategy;

impl<D: DomView> Strategy<D> for SpecificSiblingStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SpecificSibling
    }

    fn generate(&self, ctx: &StrategyContext<'_, D>) -> Result<Vec<Candidate>, SelectorError> {
        let flags = ContextFlags::default();
        let mut out = Vec::new();

        let neighbours = [
            (ctx.dom.previous_element_sibling(ctx.element), "following-sibling", -5),
            (ctx.dom.next_element_sibling(ctx.element), "preceding-sibling", -8),
        ];
        for (sibling, axis, adjustment) in neighbours {
            let Some(sibling) = sibling else { continue };
            let text = clean_text_content(&ctx.dom.text_content(sibling));
            if text.is_empty() || char_len(&text) >= MAX_SPECIFIC_SIBLING_TEXT {
                continue;
            }
            let locator = format!(
                "//{}[contains(text(), {})]/{}::{}[1]",
                xpath_tag(ctx.dom, sibling),
                escape_xpath_value(&text),
                axis,
                ctx.tag
            );
            out.extend(ctx.verified(locator, StrategyKind::SpecificSibling, flags, adjustment));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::selectors::strategies::test_support::{run, scored};

    #[test]
    fn test_flexible_sibling() {
        let doc = Document::parse_html(
            r#"<body><section><h2 id="billing">Billing</h2><button id="t">Edit</button></section></body>"#,
        );
        let button = doc.find_by_id("t").unwrap();
        let candidates = scored(&FlexibleSiblingStrategy, &doc, button);
        let locators: Vec<&str> = candidates.iter().map(|c| c.locator.as_str()).collect();
        assert_eq!(
            locators,
            vec![
                "//h2[contains(text(), 'Billing')]//following::button",
                "//*[@id='billing']//following::button",
            ]
        );
        assert!(candidates.iter().all(|c| c.flags.is_flexible));
    }

    #[test]
    fn test_flexible_sibling_requires_uniqueness() {
        let doc = Document::parse_html(
            r#"<body><div><h2>Billing</h2><button id="t">Edit</button></div><button>Other</button></body>"#,
        );
        let button = doc.find_by_id("t").unwrap();
        assert!(run(&FlexibleSiblingStrategy, &doc, button).is_empty());
    }

    #[test]
    fn test_specific_siblings() {
        let doc = Document::parse_html(
            r#"<body><div><span>Qty</span><input id="t"><em>units</em></div></body>"#,
        );
        let input = doc.find_by_id("t").unwrap();
        let candidates = scored(&SpecificSiblingStrategy, &doc, input);
        let locators: Vec<&str> = candidates.iter().map(|c| c.locator.as_str()).collect();
        assert_eq!(
            locators,
            vec![
                "//span[contains(text(), 'Qty')]/following-sibling::input[1]",
                "//em[contains(text(), 'units')]/preceding-sibling::input[1]",
            ]
        );
        assert!(candidates[0].score > candidates[1].score);
    }
}
