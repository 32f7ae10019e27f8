use crate::dom::DomView;
use crate::error::SelectorError;
use crate::locator::{escape_xpath_value, xpath_tag};
use crate::selectors::classifier::clean_text_content;
use crate::selectors::{Candidate, ContextFlags, StrategyKind};

use super::{char_len, Strategy, StrategyContext};

/// How many preceding siblings are considered as visible labels
const LABEL_SEARCH_DEPTH: usize = 3;

/// Anchor on a short preceding sibling acting as a visible label:
/// `//span[normalize-space()='Email']/following-sibling::input[1]`
pub struct ContextualLabelStrategy;

impl<D: DomView> Strategy<D> for ContextualLabelStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ContextualLabel
    }

    fn generate(&self, ctx: &StrategyContext<'_, D>) -> Result<Vec<Candidate>, SelectorError> {
        let flags = ContextFlags { is_flexible: true, ..Default::default() };
        let mut out = Vec::new();
        let mut preceding = ctx.dom.previous_element_sibling(ctx.element);

        for _ in 0..LABEL_SEARCH_DEPTH {
            let Some(sibling) = preceding else { break };
            let label = clean_text_content(&ctx.dom.text_content(sibling));
            let len = char_len(&label);
            if len > 2 && len < 50 && label != ctx.text {
                let locator = format!(
                    "//{}[normalize-space()={}]/following-sibling::{}[1]",
                    xpath_tag(ctx.dom, sibling),
                    escape_xpath_value(&label),
                    ctx.tag
                );
                out.extend(ctx.verified(locator, StrategyKind::ContextualLabel, flags, 15));
            }
            preceding = ctx.dom.previous_element_sibling(sibling);
        }
        Ok(out)
    }
}
