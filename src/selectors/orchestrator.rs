use std::time::Instant;

use crate::config::SelectorSettings;
use crate::dom::DomView;
use crate::error::SelectorError;
use crate::locator::xpath_tag;

use super::fallback::simple_structural_fallback;
use super::oracle::{DocumentOracle, UniquenessOracle};
use super::reducer::reduce;
use super::strategies::{default_strategies, Strategy, StrategyContext};
use super::{Candidate, SelectorResult, StrategyKind};

/// Which path produced a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Multi-strategy generation succeeded
    Enhanced(SelectorResult),
    /// Simple structural fallback, with the reason it was used
    Fallback { result: SelectorResult, reason: String },
    /// Nothing else worked; a bare tag locator
    Emergency(SelectorResult),
}

impl GenerationOutcome {
    pub fn result(&self) -> &SelectorResult {
        match self {
            GenerationOutcome::Enhanced(result)
            | GenerationOutcome::Fallback { result, .. }
            | GenerationOutcome::Emergency(result) => result,
        }
    }

    pub fn into_result(self) -> SelectorResult {
        match self {
            GenerationOutcome::Enhanced(result)
            | GenerationOutcome::Fallback { result, .. }
            | GenerationOutcome::Emergency(result) => result,
        }
    }

    pub fn is_enhanced(&self) -> bool {
        matches!(self, GenerationOutcome::Enhanced(_))
    }
}

/// Runs the strategies for one element and merges their candidates
pub struct SelectorGenerator<'a, D: DomView> {
    dom: &'a D,
    settings: &'a SelectorSettings,
    strategies: Vec<Box<dyn Strategy<D>>>,
}

impl<'a, D: DomView> SelectorGenerator<'a, D> {
    pub fn new(dom: &'a D, settings: &'a SelectorSettings) -> Self {
        Self::with_strategies(dom, settings, default_strategies())
    }

    pub fn with_strategies(
        dom: &'a D,
        settings: &'a SelectorSettings,
        strategies: Vec<Box<dyn Strategy<D>>>,
    ) -> Self {
        Self { dom, settings, strategies }
    }

    pub fn generate(&self, element: D::Node) -> GenerationOutcome {
        if !self.dom.is_element(element) {
            tracing::warn!("Selector generation called with a non-element node {:?}", element);
            return GenerationOutcome::Emergency(SelectorResult::single("//body"));
        }
        let oracle = DocumentOracle::new(self.dom, element, self.settings.debug_mode);

        if !self.settings.enable_enhanced_selectors {
            if self.settings.debug_mode {
                tracing::debug!("Enhanced selectors disabled, using structural fallback");
            }
            return self.fallback(element, &oracle, "enhanced selectors disabled".to_string());
        }

        match self.enhanced(element, &oracle) {
            Ok(result) => GenerationOutcome::Enhanced(result),
            Err(e) => {
                tracing::warn!("Enhanced selector generation failed: {}", e);
                self.fallback(element, &oracle, e.to_string())
            }
        }
    }

    fn fallback(
        &self,
        element: D::Node,
        oracle: &dyn UniquenessOracle<D::Node>,
        reason: String,
    ) -> GenerationOutcome {
        match simple_structural_fallback(self.dom, element, oracle, self.settings) {
            Ok(result) => GenerationOutcome::Fallback { result, reason },
            Err(e) => {
                tracing::warn!("Structural fallback failed: {}", e);
                let tag = xpath_tag(self.dom, element);
                let locator = if tag.is_empty() { "//body".to_string() } else { format!("//{tag}") };
                GenerationOutcome::Emergency(SelectorResult::single(locator))
            }
        }
    }

    fn enhanced(
        &self,
        element: D::Node,
        oracle: &dyn UniquenessOracle<D::Node>,
    ) -> Result<SelectorResult, SelectorError> {
        let settings = self.settings;
        let started = Instant::now();
        let timeout = settings.selector_timeout();
        let ctx = StrategyContext::new(self.dom, element, settings, oracle);

        if settings.debug_mode {
            tracing::debug!(
                "Generating selectors for <{}> with {} context ancestor(s)",
                self.dom.tag_name(element),
                ctx.context_ancestors.len()
            );
        }

        let mut candidates: Vec<Candidate> = Vec::new();
        for strategy in &self.strategies {
            if strategy.kind() == StrategyKind::TestAttribute && !settings.prioritize_test_attributes {
                continue;
            }
            if started.elapsed() > timeout {
                if settings.debug_mode {
                    tracing::debug!("Selector generation timeout exceeded before {}", strategy.name());
                }
                break;
            }

            match strategy.generate(&ctx) {
                Ok(found) => {
                    if settings.debug_mode {
                        tracing::debug!("Strategy {} generated {} candidate(s)", strategy.name(), found.len());
                    }
                    candidates.extend(found);
                }
                Err(e) => {
                    if settings.debug_mode {
                        tracing::debug!("Strategy {} failed: {}", strategy.name(), e);
                    }
                    continue;
                }
            }

            let high_scoring = candidates.iter().filter(|c| c.score >= settings.early_exit_score).count();
            if high_scoring >= settings.early_exit_threshold {
                if settings.debug_mode {
                    tracing::debug!("Early exit after {}: {} high-scoring candidate(s)", strategy.name(), high_scoring);
                }
                break;
            }
        }

        let mut locators = merge(candidates, settings);

        if settings.enable_optimization {
            if let Some(best) = locators.first().cloned() {
                let reduced = reduce(&best, oracle);
                if reduced != best {
                    if settings.debug_mode {
                        tracing::debug!("Reduced \"{}\" to \"{}\"", best, reduced);
                    }
                    locators.insert(0, reduced);
                    dedupe(&mut locators);
                    locators.truncate(settings.max_alternatives);
                }
            }
        }

        if settings.debug_mode {
            tracing::debug!(
                "Generated {} selector(s) in {}ms",
                locators.len(),
                started.elapsed().as_millis()
            );
        }

        SelectorResult::from_alternatives(locators)
            .ok_or_else(|| SelectorError::NoCandidates(self.dom.tag_name(element).to_string()))
    }
}

/// Stable sort by score, drop over-long locators, dedupe keeping the
/// first occurrence, truncate
fn merge(mut candidates: Vec<Candidate>, settings: &SelectorSettings) -> Vec<String> {
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    let mut locators: Vec<String> = candidates
        .into_iter()
        .map(|c| c.locator)
        .filter(|l| !l.is_empty() && l.chars().count() <= settings.max_selector_length)
        .collect();
    dedupe(&mut locators);
    locators.truncate(settings.max_alternatives);
    locators
}

fn dedupe(locators: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    locators.retain(|l| seen.insert(l.clone()));
}

/// Ranked locators for `element`. Never fails: problems are logged and
/// answered with a fallback result.
pub fn generate_selectors<D: DomView>(dom: &D, element: D::Node, settings: &SelectorSettings) -> SelectorResult {
    SelectorGenerator::new(dom, settings).generate(element).into_result()
}
