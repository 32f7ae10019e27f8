use once_cell::sync::Lazy;
use regex::Regex;

use super::ContextFlags;

static TIER_ONE: Lazy<Regex> = Lazy::new(|| tier_regex("(id|data-testid|data-cy)"));
static TIER_TWO: Lazy<Regex> = Lazy::new(|| tier_regex("(name|aria-label)"));
static TIER_THREE: Lazy<Regex> = Lazy::new(|| tier_regex("(role|type|placeholder)"));
static TIER_FOUR: Lazy<Regex> = Lazy::new(|| tier_regex("[0-9A-Za-z_-]+"));

static BUILD_TOOL_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"css-\d+|jss\d+|makeStyles").expect("build tool class pattern"));

/// `//tag[@attr='value']` with the attribute name restricted by `attr`
fn tier_regex(attr: &str) -> Regex {
    Regex::new(&format!(r#"^/{{1,2}}[0-9A-Za-z_]+\[@{attr}=['"][^'"]*['"]?\]$"#))
        .expect("tier pattern")
}

/// Coarse bucket from the syntactic shape of a locator
pub fn priority_tier(locator: &str) -> i64 {
    if TIER_ONE.is_match(locator) {
        1000
    } else if TIER_TWO.is_match(locator) {
        900
    } else if TIER_THREE.is_match(locator) {
        800
    } else if TIER_FOUR.is_match(locator) {
        700
    } else {
        100
    }
}

/// Score a locator: tier base, heuristic adjustments, then a length
/// tie-break of 0.01 per character. Rounded half up.
pub fn score(locator: &str, flags: &ContextFlags) -> i64 {
    let mut score = priority_tier(locator) as f64;

    if locator.contains("@data-testid") || locator.contains("@data-cy") {
        score += 30.0;
    }
    if locator.contains("@aria-label") || locator.contains("@role") {
        score += 20.0;
    }
    if locator.contains("@id") && !locator.contains("contains(@id") {
        score += 15.0;
    }
    if locator.contains("text()") || locator.contains("normalize-space()") {
        score += 10.0;
    }
    if flags.is_meaningful_container {
        score += 15.0;
    }
    if flags.is_flexible {
        score += 10.0;
    }
    if flags.is_element_specific {
        score += 8.0;
    }
    if flags.is_parent_anchored {
        score += 12.0;
    }
    if flags.is_child_anchored {
        score += 10.0;
    }
    if locator.contains("@name") || locator.contains("@placeholder") {
        score += 8.0;
    }

    if locator.contains("[1]") || locator.contains("[2]") {
        score -= 5.0;
    }
    if locator.contains("[3]") || locator.contains("[4]") {
        score -= 10.0;
    }
    if locator.matches('[').count() > 3 {
        score -= 5.0;
    }
    let length = locator.chars().count();
    if length > 200 {
        score -= 20.0;
    } else if length > 100 {
        score -= 10.0;
    }
    if locator.contains("/div/div/div") {
        score -= 8.0;
    }
    if BUILD_TOOL_CLASS.is_match(locator) {
        score -= 15.0;
    }

    score -= length as f64 * 0.01;
    (score + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers() {
        assert_eq!(priority_tier("//button[@id='submit-btn']"), 1000);
        assert_eq!(priority_tier("//div[@data-testid=\"card\"]"), 1000);
        assert_eq!(priority_tier("//input[@name='email']"), 900);
        assert_eq!(priority_tier("//input[@placeholder='Search']"), 800);
        assert_eq!(priority_tier("//a[@href='/home']"), 700);
        assert_eq!(priority_tier("//div[@data-test='x']"), 700);
        assert_eq!(priority_tier("//span[normalize-space()='Hi']"), 100);
        assert_eq!(priority_tier("//input[@id='a' and @name='b']"), 100);
        assert_eq!(priority_tier("//*[name()='svg'][@id='x']"), 100);
    }

    #[test]
    fn test_id_locator_score() {
        assert_eq!(score("//button[@id='submit-btn']", &ContextFlags::default()), 1015);
    }

    #[test]
    fn test_text_locator_score() {
        assert_eq!(score("//span[normalize-space()='Hi']", &ContextFlags::default()), 110);
    }

    #[test]
    fn test_parent_anchored_score() {
        let flags = ContextFlags { is_parent_anchored: true, ..Default::default() };
        assert_eq!(score("//*[@id='parentA']//li[normalize-space()='Item']", &flags), 137);
    }

    #[test]
    fn test_flag_bonuses_stack() {
        let plain = score("//a", &ContextFlags::default());
        let flags = ContextFlags {
            is_meaningful_container: true,
            is_flexible: true,
            is_element_specific: true,
            is_parent_anchored: true,
            is_child_anchored: true,
        };
        assert_eq!(score("//a", &flags) - plain, 15 + 10 + 8 + 12 + 10);
    }

    #[test]
    fn test_penalties() {
        let base = score("//ul/li", &ContextFlags::default());
        assert_eq!(score("//ul/li[2]", &ContextFlags::default()), base - 5);
        assert_eq!(score("//ul/li[3]", &ContextFlags::default()), base - 10);
        assert!(score("//div/div/div/span", &ContextFlags::default()) < 100 - 8 + 1);
        assert!(score("//div[contains(@class, 'css-123')]", &ContextFlags::default()) < 90);

        let long = format!("//div[@title='{}']", "x".repeat(190));
        assert!(score(&long, &ContextFlags::default()) < 700 - 20 + 1);
    }

    #[test]
    fn test_shorter_wins_ties() {
        let short = score("//p[normalize-space()='Hello there']", &ContextFlags::default());
        let long = score(
            "//p[normalize-space()='Hello there my friend, how are you doing today?']",
            &ContextFlags::default(),
        );
        assert!(short >= long);
    }
}
