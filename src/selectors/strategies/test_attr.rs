use crate::dom::DomView;
use crate::error::SelectorError;
use crate::locator::escape_xpath_value;
use crate::selectors::classifier::is_dynamic_attribute;
use crate::selectors::{Candidate, ContextFlags, StrategyKind};

use super::{Strategy, StrategyContext};

const TEST_ATTRIBUTES: &[&str] = &["data-testid", "data-cy", "data-test"];

/// First unique test hook among `data-testid`, `data-cy`, `data-test`
pub struct TestAttributeStrategy;

impl<D: DomView> Strategy<D> for TestAttributeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TestAttribute
    }

    fn generate(&self, ctx: &StrategyContext<'_, D>) -> Result<Vec<Candidate>, SelectorError> {
        let flags = ContextFlags::default();
        for attr in TEST_ATTRIBUTES {
            let Some(value) = ctx.dom.attribute(ctx.element, attr) else { continue };
            if value.is_empty() || is_dynamic_attribute(attr, value) {
                continue;
            }
            let locator = format!("//{}[@{}={}]", ctx.tag, attr, escape_xpath_value(value));
            if let Some(candidate) = ctx.verified(locator, StrategyKind::TestAttribute, flags, 0) {
                return Ok(vec![candidate]);
            }
        }
        Ok(Vec::new())
    }
}
