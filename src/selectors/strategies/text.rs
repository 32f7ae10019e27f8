use crate::dom::DomView;
use crate::error::SelectorError;
use crate::locator::escape_xpath_value;
use crate::selectors::{Candidate, ContextFlags, StrategyKind};

use super::{Strategy, StrategyContext};

/// Locators on the element's own text, from exact to loosest. Each looser
/// form costs a few points.
pub struct TextBasedStrategy;

impl<D: DomView> Strategy<D> for TextBasedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TextBased
    }

    fn generate(&self, ctx: &StrategyContext<'_, D>) -> Result<Vec<Candidate>, SelectorError> {
        let len = ctx.text_len();
        if len == 0 || len > ctx.settings.max_text_length {
            return Ok(Vec::new());
        }

        let text = escape_xpath_value(&ctx.text);
        let mut variants: Vec<(String, i64)> = Vec::new();
        if len < 80 {
            variants.push((format!("//{}[normalize-space()={}]", ctx.tag, text), 0));
        }
        if len > 10 {
            variants.push((format!("//{}[contains(text(), {})]", ctx.tag, text), -3));
        }
        if len > 5 && len < 60 {
            variants.push((format!("//{}[starts-with(normalize-space(), {})]", ctx.tag, text), -2));
        }
        if len < 50 {
            variants.push((format!("//{}[contains(., {})]", ctx.tag, text), -5));
        }

        let flags = ContextFlags::default();
        Ok(variants
            .into_iter()
            .filter_map(|(locator, adjustment)| ctx.verified(locator, StrategyKind::TextBased, flags, adjustment))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorSettings;
    use crate::dom::Document;
    use crate::selectors::strategies::test_support::{run, run_with, scored};

    #[test]
    fn test_short_text() {
        let doc = Document::parse_html(r#"<body><span id="t" class="css-a8f3k2">Hi</span></body>"#);
        let span = doc.find_by_id("t").unwrap();
        assert_eq!(
            run(&TextBasedStrategy, &doc, span),
            vec!["//span[normalize-space()='Hi']", "//span[contains(., 'Hi')]"]
        );
    }

    #[test]
    fn test_all_variants_with_penalties() {
        let doc = Document::parse_html(r#"<body><p id="t">Terms and conditions</p></body>"#);
        let p = doc.find_by_id("t").unwrap();
        let candidates = scored(&TextBasedStrategy, &doc, p);
        let locators: Vec<&str> = candidates.iter().map(|c| c.locator.as_str()).collect();
        assert_eq!(
            locators,
            vec![
                "//p[normalize-space()='Terms and conditions']",
                "//p[contains(text(), 'Terms and conditions')]",
                "//p[starts-with(normalize-space(), 'Terms and conditions')]",
                "//p[contains(., 'Terms and conditions')]",
            ]
        );
        let exact = candidates[0].score;
        assert!(candidates[3].score < exact);
    }

    #[test]
    fn test_ambiguous_text_yields_nothing() {
        let doc = Document::parse_html(r#"<body><button id="t">OK</button><button>OK</button></body>"#);
        let button = doc.find_by_id("t").unwrap();
        assert!(run(&TextBasedStrategy, &doc, button).is_empty());
    }

    #[test]
    fn test_text_over_limit_is_skipped() {
        let long = "word ".repeat(10);
        let doc = Document::parse_html(&format!(r#"<body><p id="t">{long}</p></body>"#));
        let p = doc.find_by_id("t").unwrap();
        let settings = SelectorSettings { max_text_length: 20, ..Default::default() };
        assert!(run_with(&TextBasedStrategy, &doc, p, &settings).is_empty());
    }
}
