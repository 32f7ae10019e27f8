//! Locator evaluation (XPath and CSS subsets) and string escaping helpers.

pub mod css;
pub mod eval;
pub mod xpath;

use crate::dom::DomView;

pub use eval::normalize_space;

/// Quote `value` as an XPath string literal.
///
/// XPath 1.0 has no escape syntax, so values containing both quote kinds
/// are split into a `concat(...)` call.
pub fn escape_xpath_value(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    for c in value.chars() {
        if c == '\'' {
            if !current.is_empty() {
                parts.push(format!("'{current}'"));
                current.clear();
            }
            parts.push("\"'\"".to_string());
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        parts.push(format!("'{current}'"));
    }
    format!("concat({})", parts.join(", "))
}

/// Escape `value` for use as a CSS identifier or inside a quoted value
pub fn escape_css(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        if i == 0 && c.is_ascii_digit() {
            out.push_str(&format!("\\{:x} ", c as u32));
        } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            out.push(c);
        } else if c.is_ascii_control() {
            out.push_str(&format!("\\{:x} ", c as u32));
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

/// Tag segment for an XPath step. SVG elements live in another namespace
/// and only match through `name()`.
pub fn xpath_tag<D: DomView>(dom: &D, node: D::Node) -> String {
    let tag = dom.tag_name(node);
    if dom.is_svg(node) {
        format!("*[name()='{tag}']")
    } else {
        tag.to_string()
    }
}
