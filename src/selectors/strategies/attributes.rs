use crate::dom::DomView;
use crate::error::SelectorError;
use crate::locator::escape_xpath_value;
use crate::selectors::classifier::{stable_attributes, StableAttribute};
use crate::selectors::{Candidate, ContextFlags, StrategyKind};

use super::{Strategy, StrategyContext};

const MAX_SINGLE_ATTRIBUTES: usize = 4;

/// Single-attribute locators for the highest-priority stable attributes,
/// plus two- and three-attribute composites
pub struct StableAttributeStrategy;

impl<D: DomView> Strategy<D> for StableAttributeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::StableAttribute
    }

    fn generate(&self, ctx: &StrategyContext<'_, D>) -> Result<Vec<Candidate>, SelectorError> {
        let attrs = stable_attributes(ctx.dom, ctx.element);
        let mut out = Vec::new();

        for attr in attrs.iter().take(MAX_SINGLE_ATTRIBUTES) {
            let locator = format!("//{}[{}]", ctx.tag, predicate(attr));
            out.extend(ctx.verified(locator, StrategyKind::StableAttribute, ContextFlags::default(), 0));
        }

        for (size, bonus) in [(2, 5), (3, 10)] {
            if attrs.len() < size {
                break;
            }
            let predicates: Vec<String> = attrs[..size].iter().map(predicate).collect();
            let locator = format!("//{}[{}]", ctx.tag, predicates.join(" and "));
            out.extend(ctx.verified(locator, StrategyKind::StableAttribute, ContextFlags::default(), bonus));
        }
        Ok(out)
    }
}

fn predicate(attr: &StableAttribute) -> String {
    format!("@{}={}", attr.name, escape_xpath_value(&attr.value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::selectors::strategies::test_support::{run, scored};

    #[test]
    fn test_singles_and_composites() {
        let doc = Document::parse_html(
            r#"<body><input id="t" name="q" type="search" placeholder="Find"></body>"#,
        );
        let input = doc.find_by_id("t").unwrap();
        let locators = run(&StableAttributeStrategy, &doc, input);
        assert_eq!(
            locators,
            vec![
                "//input[@id='t']",
                "//input[@name='q']",
                "//input[@placeholder='Find']",
                "//input[@type='search']",
                "//input[@id='t' and @name='q']",
                "//input[@id='t' and @name='q' and @placeholder='Find']",
            ]
        );
    }

    #[test]
    fn test_composite_disambiguates() {
        let doc = Document::parse_html(
            r#"<body>
                <input id="a" type="checkbox" name="opt" value="yes">
                <input type="checkbox" name="opt" value="no">
                <input type="radio" name="other" value="yes">
            </body>"#,
        );
        let el = doc.find_by_id("a").unwrap();
        let candidates = scored(&StableAttributeStrategy, &doc, el);
        let composite = candidates
            .iter()
            .find(|c| c.locator == "//input[@id='a' and @name='opt']")
            .unwrap();
        assert_eq!(composite.strategy, StrategyKind::StableAttribute);
        // the three-attribute composite carries the larger bonus
        let triple = candidates.iter().find(|c| c.locator.matches(" and ").count() == 2).unwrap();
        assert_eq!(triple.locator, "//input[@id='a' and @name='opt' and @value='yes']");
    }

    #[test]
    fn test_numeric_value_is_left_out_of_composites() {
        let doc = Document::parse_html(
            r#"<body><input id="a" type="checkbox" name="opt" value="1"><input type="checkbox" name="opt" value="2"></body>"#,
        );
        let el = doc.find_by_id("a").unwrap();
        let locators = run(&StableAttributeStrategy, &doc, el);
        assert!(locators.iter().all(|l| !l.contains("@value")), "{:?}", locators);
        assert!(locators.contains(&"//input[@id='a' and @name='opt' and @type='checkbox']".to_string()));
    }

    #[test]
    fn test_no_stable_attributes() {
        let doc = Document::parse_html(r#"<body><div><span style="color:red" onclick="x()">x</span></div></body>"#);
        let span = doc.descendants(doc.root()).into_iter().find(|&n| doc.tag_name(n) == "span").unwrap();
        assert!(run(&StableAttributeStrategy, &doc, span).is_empty());
    }
}
