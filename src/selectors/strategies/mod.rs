//! Candidate strategies.
//!
//! Each strategy is a stateless object that looks at one aspect of the
//! target element and proposes locators for it. Every proposed locator is
//! checked against the uniqueness oracle before it becomes a candidate, so
//! a strategy can only ever return locators that resolve to the target.

mod anchored;
mod attributes;
mod class;
mod contextual;
mod element_specific;
mod id;
mod label;
mod sibling;
mod structural;
mod test_attr;
mod text;

use crate::config::SelectorSettings;
use crate::dom::DomView;
use crate::error::SelectorError;
use crate::locator::xpath_tag;

use super::classifier::{clean_text_content, element_characteristics, is_meaningful_container};
use super::oracle::UniquenessOracle;
use super::{Candidate, ContextFlags, StrategyKind};

pub use anchored::{ChildAnchoredStrategy, ParentAnchoredStrategy};
pub use attributes::StableAttributeStrategy;
pub use class::ClassBasedStrategy;
pub use contextual::ContextualStrategy;
pub use element_specific::ElementSpecificStrategy;
pub use id::StableIdStrategy;
pub use label::ContextualLabelStrategy;
pub use sibling::{FlexibleSiblingStrategy, SpecificSiblingStrategy};
pub use structural::OptimizedStructuralStrategy;
pub use test_attr::TestAttributeStrategy;
pub use text::TextBasedStrategy;

/// Everything a strategy may look at for one generation call
pub struct StrategyContext<'a, D: DomView> {
    pub dom: &'a D,
    pub element: D::Node,
    /// Tag as it must appear in an XPath step (`*[name()='svg']` for SVG)
    pub tag: String,
    /// Cleaned text content of the element
    pub text: String,
    pub settings: &'a SelectorSettings,
    pub oracle: &'a dyn UniquenessOracle<D::Node>,
    /// Meaningful or interactive ancestors, nearest first, within
    /// `max_parent_depth` levels
    pub context_ancestors: Vec<D::Node>,
}

impl<'a, D: DomView> StrategyContext<'a, D> {
    pub fn new(
        dom: &'a D,
        element: D::Node,
        settings: &'a SelectorSettings,
        oracle: &'a dyn UniquenessOracle<D::Node>,
    ) -> Self {
        let mut context_ancestors = Vec::new();
        let mut parent = dom.parent_element(element);
        let mut depth = 0;
        while let Some(p) = parent {
            if depth >= settings.max_parent_depth {
                break;
            }
            if is_meaningful_container(dom, p) || element_characteristics(dom, p).is_interactive {
                context_ancestors.push(p);
            }
            parent = dom.parent_element(p);
            depth += 1;
        }

        Self {
            dom,
            element,
            tag: xpath_tag(dom, element),
            text: clean_text_content(&dom.text_content(element)),
            settings,
            oracle,
            context_ancestors,
        }
    }

    /// Turn `locator` into a scored candidate if it resolves to exactly
    /// the target element
    pub fn verified(
        &self,
        locator: String,
        strategy: StrategyKind,
        flags: ContextFlags,
        adjustment: i64,
    ) -> Option<Candidate> {
        if !self.oracle.identifies(&locator, self.element) {
            return None;
        }
        let candidate = Candidate::new(locator, strategy, flags, adjustment);
        if self.settings.debug_mode {
            tracing::debug!(
                "{} candidate \"{}\" scored {}",
                strategy.name(),
                candidate.locator,
                candidate.score
            );
        }
        Some(candidate)
    }

    /// Cleaned text length in characters
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// One candidate-generation heuristic
pub trait Strategy<D: DomView> {
    fn kind(&self) -> StrategyKind;

    fn name(&self) -> &'static str {
        Strategy::<D>::kind(self).name()
    }

    fn generate(&self, ctx: &StrategyContext<'_, D>) -> Result<Vec<Candidate>, SelectorError>;
}

/// All strategies in the order the orchestrator runs them
pub fn default_strategies<D: DomView>() -> Vec<Box<dyn Strategy<D>>> {
    vec![
        Box::new(StableIdStrategy),
        Box::new(TestAttributeStrategy),
        Box::new(ContextualLabelStrategy),
        Box::new(StableAttributeStrategy),
        Box::new(ParentAnchoredStrategy),
        Box::new(ChildAnchoredStrategy),
        Box::new(ElementSpecificStrategy),
        Box::new(TextBasedStrategy),
        Box::new(ClassBasedStrategy),
        Box::new(FlexibleSiblingStrategy),
        Box::new(SpecificSiblingStrategy),
        Box::new(ContextualStrategy),
        Box::new(OptimizedStructuralStrategy),
    ]
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// 1-based position of `node` among its parent's children with the same
/// tag, and how many such children there are. `(1, 1)` without a parent.
pub(crate) fn same_tag_position<D: DomView>(dom: &D, node: D::Node) -> (usize, usize) {
    let Some(parent) = dom.parent_element(node) else {
        return (1, 1);
    };
    let tag = dom.tag_name(node);
    let same: Vec<D::Node> = dom
        .element_children(parent)
        .into_iter()
        .filter(|&c| dom.tag_name(c) == tag)
        .collect();
    let index = same.iter().position(|&c| c == node).map(|i| i + 1).unwrap_or(1);
    (index, same.len())
}
