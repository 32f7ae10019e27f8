//! Selector generation: candidate strategies, scoring, reduction and the
//! orchestrator that ties them together.

pub mod classifier;
pub mod fallback;
pub mod glob;
pub mod oracle;
pub mod orchestrator;
pub mod reducer;
pub mod scorer;
pub mod shadow;
pub mod strategies;

use serde::{Deserialize, Serialize};

pub use oracle::{DocumentOracle, UniquenessOracle};
pub use orchestrator::{generate_selectors, GenerationOutcome, SelectorGenerator};
pub use shadow::shadow_css_selector;

/// Ranked locators for one element. `best` is always `alternatives[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorResult {
    pub best: String,
    pub alternatives: Vec<String>,
}

impl SelectorResult {
    /// `None` when `alternatives` is empty
    pub fn from_alternatives(alternatives: Vec<String>) -> Option<Self> {
        let best = alternatives.first()?.clone();
        Some(Self { best, alternatives })
    }

    pub fn single(locator: impl Into<String>) -> Self {
        let locator = locator.into();
        Self { best: locator.clone(), alternatives: vec![locator] }
    }
}

/// Scoring bonuses a strategy claims for its candidates. Which strategy
/// produced a candidate is tracked separately in [`Candidate::strategy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextFlags {
    /// Scored but not claimed by any built-in strategy; available to
    /// custom strategies passed to `SelectorGenerator::with_strategies`
    pub is_meaningful_container: bool,
    pub is_flexible: bool,
    pub is_element_specific: bool,
    pub is_parent_anchored: bool,
    pub is_child_anchored: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    StableId,
    TestAttribute,
    ContextualLabel,
    StableAttribute,
    ParentAnchored,
    ChildAnchored,
    ElementSpecific,
    TextBased,
    ClassBased,
    FlexibleSibling,
    SpecificSibling,
    Contextual,
    OptimizedStructural,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::StableId => "Stable ID",
            StrategyKind::TestAttribute => "Test Attribute",
            StrategyKind::ContextualLabel => "Contextual Label",
            StrategyKind::StableAttribute => "Stable Attribute",
            StrategyKind::ParentAnchored => "Parent Anchored",
            StrategyKind::ChildAnchored => "Child Anchored",
            StrategyKind::ElementSpecific => "Element Specific",
            StrategyKind::TextBased => "Text Based",
            StrategyKind::ClassBased => "Class Based",
            StrategyKind::FlexibleSibling => "Flexible Sibling",
            StrategyKind::SpecificSibling => "Specific Sibling",
            StrategyKind::Contextual => "Contextual",
            StrategyKind::OptimizedStructural => "Optimized Structural",
        }
    }
}

/// A proposed locator with its final score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub locator: String,
    pub strategy: StrategyKind,
    pub flags: ContextFlags,
    pub score: i64,
}

impl Candidate {
    /// Score `locator` and apply a strategy-specific adjustment
    pub fn new(locator: String, strategy: StrategyKind, flags: ContextFlags, adjustment: i64) -> Self {
        let score = scorer::score(&locator, &flags) + adjustment;
        Self { locator, strategy, flags, score }
    }
}
