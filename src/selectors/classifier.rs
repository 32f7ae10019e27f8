//! Attribute stability heuristics and element classification.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::DomView;

/// Attributes whose values are regenerated on every render
const VOLATILE_ATTRIBUTES: &[&str] = &["style", "xpath", "css", "data-reactid", "data-react-checksum"];

static DYNAMIC_VALUE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^[0-9]+$",
        r"(?i)^[a-f0-9]{8,}$",
        r"\d{10,}",
        r"^(css|jss|makeStyles|sc)-",
        r"(?i)(timestamp|time|date|uuid|session|token)",
        r"_\d{3,}$",
        r"(?i)^(tmp|temp|auto|gen)",
        r"\d{4,}-\d{2,}-\d{2,}",
        r"^v\d+",
        r"react-.*\d+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("dynamic value pattern"))
    .collect()
});

/// Whether an attribute looks generated rather than authored.
/// Empty values are never dynamic.
pub fn is_dynamic_attribute(name: &str, value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    if VOLATILE_ATTRIBUTES.contains(&name) {
        return true;
    }
    DYNAMIC_VALUE_PATTERNS.iter().any(|re| re.is_match(value))
}

/// Usefulness of an attribute for locating an element; 0 means unusable
pub fn attribute_priority(name: &str) -> u32 {
    match name {
        "data-testid" | "data-cy" => 100,
        "data-test" => 95,
        "id" => 90,
        "name" => 85,
        "aria-label" => 80,
        "aria-labelledby" => 75,
        "role" => 70,
        "placeholder" => 65,
        "title" => 60,
        "alt" => 55,
        "for" => 50,
        "value" => 45,
        "href" => 40,
        "src" => 35,
        "type" => 30,
        "class" => 20,
        "tabindex" => 10,
        "target" => 5,
        _ => 0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StableAttribute {
    pub name: String,
    pub value: String,
    pub priority: u32,
}

/// Non-dynamic, prioritized attributes of `node`, highest priority first
/// (ties broken by name so the order never depends on source order)
pub fn stable_attributes<D: DomView>(dom: &D, node: D::Node) -> Vec<StableAttribute> {
    let mut attrs: Vec<StableAttribute> = dom
        .attributes(node)
        .into_iter()
        .filter_map(|(name, value)| {
            let priority = attribute_priority(name);
            if priority == 0 || is_dynamic_attribute(name, value) {
                return None;
            }
            Some(StableAttribute { name: name.to_string(), value: value.to_string(), priority })
        })
        .collect();
    attrs.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));
    attrs
}

/// Collapse whitespace, drop characters outside Latin-1 and trim
pub fn clean_text_content(text: &str) -> String {
    let filtered: String = text
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|&c| (c as u32) <= 0xFF)
        .collect();
    filtered.split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ")
}

const MEANINGFUL_TAGS: &[&str] = &[
    "nav", "ul", "ol", "table", "form", "section", "article", "header", "footer", "aside",
    "main", "fieldset", "dialog",
];

const MEANINGFUL_ROLES: &[&str] = &[
    "navigation", "list", "table", "form", "banner", "contentinfo", "complementary", "main",
    "dialog",
];

pub fn is_always_meaningful_container<D: DomView>(dom: &D, node: D::Node) -> bool {
    MEANINGFUL_TAGS.contains(&dom.tag_name(node))
        || dom
            .attribute(node, "role")
            .map(|role| MEANINGFUL_ROLES.contains(&role))
            .unwrap_or(false)
}

/// Generic wrappers only count when something identifies them
pub fn is_conditionally_meaningful_container<D: DomView>(dom: &D, node: D::Node) -> bool {
    if !matches!(dom.tag_name(node), "div" | "span" | "body") {
        return false;
    }
    let present = |name: &str| dom.attribute(node, name).map(|v| !v.is_empty()).unwrap_or(false);
    present("id")
        || present("data-testid")
        || present("data-cy")
        || present("role")
        || dom
            .class_name(node)
            .map(|class| !is_dynamic_attribute("class", class))
            .unwrap_or(false)
}

pub fn is_meaningful_container<D: DomView>(dom: &D, node: D::Node) -> bool {
    is_always_meaningful_container(dom, node) || is_conditionally_meaningful_container(dom, node)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementCharacteristics {
    pub is_interactive: bool,
    pub is_form_element: bool,
    pub is_list_item: bool,
    pub is_table_element: bool,
    pub has_aria_role: bool,
    pub is_landmark: bool,
    pub is_meaningful_container: bool,
}

pub fn element_characteristics<D: DomView>(dom: &D, node: D::Node) -> ElementCharacteristics {
    let tag = dom.tag_name(node);
    let role = dom.attribute(node, "role").unwrap_or("");
    ElementCharacteristics {
        is_interactive: matches!(tag, "a" | "button" | "input" | "select" | "textarea")
            || dom.attribute(node, "onclick").is_some()
            || dom.attribute(node, "href").is_some()
            || matches!(role, "button" | "link" | "menuitem" | "tab"),
        is_form_element: matches!(tag, "input" | "select" | "textarea" | "button" | "form" | "label"),
        is_list_item: tag == "li" || role == "listitem",
        is_table_element: matches!(tag, "table" | "tr" | "td" | "th" | "thead" | "tbody" | "tfoot")
            || matches!(role, "row" | "cell" | "columnheader" | "rowheader"),
        has_aria_role: !role.is_empty(),
        is_landmark: matches!(tag, "main" | "nav" | "header" | "footer" | "aside" | "section")
            || matches!(role, "main" | "navigation" | "banner" | "contentinfo" | "complementary" | "region"),
        is_meaningful_container: is_meaningful_container(dom, node),
    }
}
