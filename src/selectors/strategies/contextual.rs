use crate::dom::DomView;
use crate::error::SelectorError;
use crate::locator::escape_xpath_value;
use crate::selectors::classifier::is_dynamic_attribute;
use crate::selectors::glob::semantic_classes;
use crate::selectors::{Candidate, ContextFlags, StrategyKind};

use super::{same_tag_position, Strategy, StrategyContext};

/// Table cells addressed by row and column inside an identifiable table:
/// `//table[@id='orders']//tr[2]//td[3]`
pub struct ContextualStrategy;

impl<D: DomView> Strategy<D> for ContextualStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Contextual
    }

    fn generate(&self, ctx: &StrategyContext<'_, D>) -> Result<Vec<Candidate>, SelectorError> {
        if !matches!(ctx.dom.tag_name(ctx.element), "td" | "th") {
            return Ok(Vec::new());
        }
        let dom = ctx.dom;
        let Some(row) = dom.closest(ctx.element, &|n| dom.tag_name(n) == "tr") else {
            return Ok(Vec::new());
        };
        let Some(table) = dom.closest(row, &|n| dom.tag_name(n) == "table") else {
            return Ok(Vec::new());
        };
        let Some(table_locator) = table_locator(ctx, table) else {
            return Ok(Vec::new());
        };

        let (row_index, _) = same_tag_position(dom, row);
        let (cell_index, _) = same_tag_position(dom, ctx.element);
        let locator = format!("{}//tr[{}]//{}[{}]", table_locator, row_index, ctx.tag, cell_index);
        let flags = ContextFlags::default();
        Ok(ctx.verified(locator, StrategyKind::Contextual, flags, 0).into_iter().collect())
    }
}

fn table_locator<D: DomView>(ctx: &StrategyContext<'_, D>, table: D::Node) -> Option<String> {
    if let Some(id) = ctx.dom.id(table).filter(|id| !is_dynamic_attribute("id", id)) {
        return Some(format!("//table[@id={}]", escape_xpath_value(id)));
    }
    let class = semantic_classes(ctx.dom.class_name(table)?, ctx.settings).into_iter().next()?;
    Some(format!("//table[contains(@class, {})]", escape_xpath_value(&class)))
}
