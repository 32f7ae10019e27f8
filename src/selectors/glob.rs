//! Glob patterns for class black/whitelists.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::SelectorSettings;

use super::classifier::is_dynamic_attribute;

/// `block(-block)*(__element(-element)*)?(--modifier(-modifier)*)?`
static BEM_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^[a-z][a-z0-9]*(-[a-z0-9]+)*(__[a-z][a-z0-9]*(-[a-z0-9]+)*)?(--[a-z][a-z0-9]*(-[a-z0-9]+)*)?$",
    )
    .expect("BEM pattern")
});

/// A compiled glob: `*` matches any run, `?` one character, everything
/// else is literal. Matches the whole string.
#[derive(Debug, Clone)]
pub struct GlobMatcher {
    pattern: String,
    regex: Regex,
}

impl GlobMatcher {
    pub fn compile(pattern: &str) -> Self {
        let mut source = String::with_capacity(pattern.len() + 8);
        source.push('^');
        for c in pattern.chars() {
            match c {
                '*' => source.push_str(".*"),
                '?' => source.push('.'),
                other => source.push_str(&regex::escape(&other.to_string())),
            }
        }
        source.push('$');
        // escaped input always forms a valid regex
        let regex = Regex::new(&source).unwrap_or_else(|_| Regex::new("^$").expect("empty regex"));
        Self { pattern: pattern.to_string(), regex }
    }

    pub fn test(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Keep classes matching none of the patterns
    Blacklist,
    /// Keep classes matching at least one pattern
    Whitelist,
}

/// A set of compiled patterns, built once per generation call
#[derive(Debug, Clone)]
pub struct GlobSet {
    matchers: Vec<GlobMatcher>,
}

impl GlobSet {
    pub fn new(patterns: &[String]) -> Self {
        Self { matchers: patterns.iter().map(|p| GlobMatcher::compile(p)).collect() }
    }

    pub fn matches_any(&self, value: &str) -> bool {
        self.matchers.iter().any(|m| m.test(value))
    }
}

pub fn filter_classes(class_string: &str, patterns: &[String], mode: FilterMode) -> Vec<String> {
    let set = GlobSet::new(patterns);
    split_classes(class_string)
        .filter(|class| match mode {
            FilterMode::Blacklist => !set.matches_any(class),
            FilterMode::Whitelist => set.matches_any(class),
        })
        .map(str::to_string)
        .collect()
}

fn split_classes(class_string: &str) -> impl Iterator<Item = &str> {
    class_string.split_whitespace()
}

pub fn is_bem_class(class: &str) -> bool {
    BEM_CLASS.is_match(class)
}

/// Classes worth building a locator on: whitelisted or BEM-shaped, in
/// first-seen order, excluding blacklisted and dynamic-looking names
pub fn semantic_classes(class_string: &str, settings: &SelectorSettings) -> Vec<String> {
    let whitelist = GlobSet::new(&settings.class_whitelist);
    let blacklist = GlobSet::new(&settings.class_blacklist);

    let mut out: Vec<String> = Vec::new();
    let whitelisted = split_classes(class_string).filter(|c| whitelist.matches_any(c));
    let bem = split_classes(class_string).filter(|c| is_bem_class(c));
    for class in whitelisted.chain(bem) {
        if out.iter().any(|c| c == class) {
            continue;
        }
        if blacklist.matches_any(class) || is_dynamic_attribute("class", class) {
            continue;
        }
        out.push(class.to_string());
    }
    out
}
