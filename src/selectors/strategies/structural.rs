use crate::dom::DomView;
use crate::error::SelectorError;
use crate::locator::xpath_tag;
use crate::selectors::{Candidate, ContextFlags, StrategyKind};

use super::anchored::stable_anchor;
use super::{same_tag_position, Strategy, StrategyContext};

/// Tag/index path built upward from the element. Any ancestor with a
/// stable id or test id on the way yields an anchored variant; the bare
/// path is the heavily penalized last resort.
pub struct OptimizedStructuralStrategy;

impl<D: DomView> Strategy<D> for OptimizedStructuralStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::OptimizedStructural
    }

    fn generate(&self, ctx: &StrategyContext<'_, D>) -> Result<Vec<Candidate>, SelectorError> {
        let flags = ContextFlags::default();
        let mut out = Vec::new();
        let mut segments: Vec<String> = Vec::new();
        let mut current = ctx.element;

        while let Some(parent) = ctx.dom.parent_element(current) {
            segments.insert(0, path_segment(ctx.dom, current));
            current = parent;

            if let Some(anchor) = stable_anchor(ctx.dom, parent) {
                let locator = format!("{}//{}", anchor, segments.join("/"));
                out.extend(ctx.verified(locator, StrategyKind::OptimizedStructural, flags, 0));
            }
            if segments.len() >= ctx.settings.max_parent_depth {
                break;
            }
        }

        if !segments.is_empty() {
            let locator = format!("//{}", segments.join("/"));
            out.extend(ctx.verified(locator, StrategyKind::OptimizedStructural, flags, -15));
        }
        Ok(out)
    }
}

/// `tag`, or `tag[n]` when the parent has several children with that tag
fn path_segment<D: DomView>(dom: &D, node: D::Node) -> String {
    let tag = xpath_tag(dom, node);
    match same_tag_position(dom, node) {
        (index, count) if count > 1 => format!("{tag}[{index}]"),
        _ => tag,
    }
}
