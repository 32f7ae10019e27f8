use crate::dom::DomView;

/// Answers whether a locator resolves to exactly one node
pub trait UniquenessOracle<N> {
    /// Exactly one match. Invalid locators are never unique.
    fn is_unique(&self, locator: &str) -> bool;

    /// Exactly one match, and it is `node`
    fn identifies(&self, locator: &str, node: N) -> bool;
}

/// Oracle evaluating XPath against the tree that contains the target
/// element, so locators for iframe or shadow content are checked against
/// that document and not the top-level one.
pub struct DocumentOracle<'a, D: DomView> {
    dom: &'a D,
    context: D::Node,
    debug: bool,
}

impl<'a, D: DomView> DocumentOracle<'a, D> {
    pub fn new(dom: &'a D, context: D::Node, debug: bool) -> Self {
        Self { dom, context, debug }
    }

    fn matches(&self, locator: &str) -> Option<Vec<D::Node>> {
        match self.dom.evaluate_xpath(self.context, locator) {
            Ok(nodes) => {
                if self.debug {
                    tracing::debug!("XPath \"{}\" -> {} match(es)", locator, nodes.len());
                }
                Some(nodes)
            }
            Err(e) => {
                if self.debug {
                    tracing::debug!("XPath \"{}\" -> error: {}", locator, e);
                }
                None
            }
        }
    }
}

impl<'a, D: DomView> UniquenessOracle<D::Node> for DocumentOracle<'a, D> {
    fn is_unique(&self, locator: &str) -> bool {
        self.matches(locator).map(|nodes| nodes.len() == 1).unwrap_or(false)
    }

    fn identifies(&self, locator: &str, node: D::Node) -> bool {
        self.matches(locator)
            .map(|nodes| nodes.len() == 1 && nodes[0] == node)
            .unwrap_or(false)
    }
}
