use crate::dom::DomView;
use crate::error::SelectorError;
use crate::locator::{escape_css, escape_xpath_value};
use crate::selectors::classifier::{clean_text_content, element_characteristics, is_dynamic_attribute};
use crate::selectors::glob::semantic_classes;
use crate::selectors::{Candidate, ContextFlags, StrategyKind};

use super::{char_len, same_tag_position, Strategy, StrategyContext};

/// Locators that lean on what kind of element this is: a labelled form
/// control, a named field in an identified form, a navigation link, or
/// a list item
pub struct ElementSpecificStrategy;

impl<D: DomView> Strategy<D> for ElementSpecificStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ElementSpecific
    }

    fn generate(&self, ctx: &StrategyContext<'_, D>) -> Result<Vec<Candidate>, SelectorError> {
        let traits = element_characteristics(ctx.dom, ctx.element);
        let mut locators = Vec::new();

        if traits.is_form_element {
            locators.extend(label_for(ctx)?);
            locators.extend(form_scoped(ctx));
        }
        if traits.is_interactive {
            locators.extend(nav_scoped(ctx));
        }
        if traits.is_list_item {
            locators.extend(list_position(ctx));
        }

        let flags = ContextFlags { is_element_specific: true, ..Default::default() };
        Ok(locators
            .into_iter()
            .filter_map(|locator| ctx.verified(locator, StrategyKind::ElementSpecific, flags, 0))
            .collect())
    }
}

fn fits_text_limit<D: DomView>(ctx: &StrategyContext<'_, D>, text: &str) -> bool {
    !text.is_empty() && char_len(text) <= ctx.settings.max_text_length
}

/// `//label[normalize-space()='Email']/following::input[1]` via `label[for]`
fn label_for<D: DomView>(ctx: &StrategyContext<'_, D>) -> Result<Option<String>, SelectorError> {
    let Some(id) = ctx.dom.id(ctx.element) else {
        return Ok(None);
    };
    let root = ctx.dom.tree_root(ctx.element);
    let selector = format!("label[for=\"{}\"]", escape_css(id));
    let Some(&label) = ctx.dom.query_css(root, &selector)?.first() else {
        return Ok(None);
    };

    let text = clean_text_content(&ctx.dom.text_content(label));
    if !fits_text_limit(ctx, &text) {
        return Ok(None);
    }
    Ok(Some(format!(
        "//label[normalize-space()={}]/following::{}[1]",
        escape_xpath_value(&text),
        ctx.tag
    )))
}

/// `//form[@id='login']//input[@name='user']`
fn form_scoped<D: DomView>(ctx: &StrategyContext<'_, D>) -> Option<String> {
    let form = ctx.dom.closest(ctx.element, &|n| ctx.dom.tag_name(n) == "form")?;
    let form_locator = match ctx.dom.id(form) {
        Some(id) => format!("//form[@id={}]", escape_xpath_value(id)),
        None => {
            let test_id = ctx.dom.attribute(form, "data-testid").filter(|v| !v.is_empty())?;
            format!("//form[@data-testid={}]", escape_xpath_value(test_id))
        }
    };
    let name = ctx.dom.attribute(ctx.element, "name").filter(|v| !v.is_empty())?;
    Some(format!("{}//{}[@name={}]", form_locator, ctx.tag, escape_xpath_value(name)))
}

/// `//nav//a[normalize-space()='Pricing']`
fn nav_scoped<D: DomView>(ctx: &StrategyContext<'_, D>) -> Option<String> {
    let nav = ctx.dom.closest(ctx.element, &|n| {
        ctx.dom.tag_name(n) == "nav" || ctx.dom.attribute(n, "role") == Some("navigation")
    })?;
    if !fits_text_limit(ctx, &ctx.text) {
        return None;
    }
    let nav_locator = if ctx.dom.tag_name(nav) == "nav" {
        "//nav"
    } else {
        "//*[@role=\"navigation\"]"
    };
    Some(format!(
        "{}//{}[normalize-space()={}]",
        nav_locator,
        ctx.tag,
        escape_xpath_value(&ctx.text)
    ))
}

/// `//*[@id='menu']//li[3]` or `//ul[contains(@class, 'menu')]//li[3]`
fn list_position<D: DomView>(ctx: &StrategyContext<'_, D>) -> Option<String> {
    let parent = ctx.dom.parent_element(ctx.element)?;
    let list = ctx.dom.closest(parent, &|n| {
        matches!(ctx.dom.tag_name(n), "ul" | "ol") || ctx.dom.attribute(n, "role") == Some("list")
    })?;

    let list_locator = match ctx.dom.id(list).filter(|id| !is_dynamic_attribute("id", id)) {
        Some(id) => format!("//*[@id={}]", escape_xpath_value(id)),
        None => {
            let class_name = ctx.dom.class_name(list)?;
            let class = semantic_classes(class_name, ctx.settings).into_iter().next()?;
            format!(
                "//{}[contains(@class, {})]",
                ctx.dom.tag_name(list),
                escape_xpath_value(&class)
            )
        }
    };
    let (position, _) = same_tag_position(ctx.dom, ctx.element);
    Some(format!("{}//{}[{}]", list_locator, ctx.tag, position))
}
