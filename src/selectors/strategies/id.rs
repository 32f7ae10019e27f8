use crate::dom::DomView;
use crate::error::SelectorError;
use crate::locator::escape_xpath_value;
use crate::selectors::classifier::is_dynamic_attribute;
use crate::selectors::{Candidate, ContextFlags, StrategyKind};

use super::{Strategy, StrategyContext};

/// `//tag[@id='…']` for a non-dynamic id
pub struct StableIdStrategy;

impl<D: DomView> Strategy<D> for StableIdStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::StableId
    }

    fn generate(&self, ctx: &StrategyContext<'_, D>) -> Result<Vec<Candidate>, SelectorError> {
        let Some(id) = ctx.dom.id(ctx.element) else {
            return Ok(Vec::new());
        };
        if is_dynamic_attribute("id", id) {
            return Ok(Vec::new());
        }

        let locator = format!("//{}[@id={}]", ctx.tag, escape_xpath_value(id));
        Ok(ctx.verified(locator, StrategyKind::StableId, ContextFlags::default(), 0).into_iter().collect())
    }
}
