use crate::dom::DomView;
use crate::error::SelectorError;
use crate::locator::escape_xpath_value;
use crate::selectors::glob::semantic_classes;
use crate::selectors::{Candidate, ContextFlags, StrategyKind};

use super::{Strategy, StrategyContext};

const MAX_SINGLE_CLASSES: usize = 3;

/// `contains(@class, …)` locators on semantic classes. The two-class
/// combination is only tried when no single class is unique.
pub struct ClassBasedStrategy;

impl<D: DomView> Strategy<D> for ClassBasedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ClassBased
    }

    fn generate(&self, ctx: &StrategyContext<'_, D>) -> Result<Vec<Candidate>, SelectorError> {
        let Some(class_name) = ctx.dom.class_name(ctx.element) else {
            return Ok(Vec::new());
        };
        let classes = semantic_classes(class_name, ctx.settings);
        let flags = ContextFlags::default();

        let mut out: Vec<Candidate> = classes
            .iter()
            .take(MAX_SINGLE_CLASSES)
            .filter_map(|class| {
                let locator = format!("//{}[{}]", ctx.tag, contains_class(class));
                ctx.verified(locator, StrategyKind::ClassBased, flags, 0)
            })
            .collect();

        if out.is_empty() && classes.len() > 1 {
            let locator = format!(
                "//{}[{} and {}]",
                ctx.tag,
                contains_class(&classes[0]),
                contains_class(&classes[1])
            );
            out.extend(ctx.verified(locator, StrategyKind::ClassBased, flags, -5));
        }
        Ok(out)
    }
}

fn contains_class(class: &str) -> String {
    format!("contains(@class, {})", escape_xpath_value(class))
}
