use std::env;
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::error::ConfigError;

/// Class patterns that never make a usable selector (framework hashes,
/// utility classes, transient UI state)
pub const DEFAULT_CLASS_BLACKLIST: &[&str] = &[
    "_*", "css-*", "jss*", "makeStyles-*", "MuiButton-root-*",
    "sc-*", "emotion-*", "jsx-*", "vue-*", "ng-*", "svelte-*",
    "webpack-*", "vite-*", "*-[0-9]*-[0-9]*", "*[0-9][0-9][0-9]*",
    "*-hash-*", "*-generated-*", "p-[0-9]*", "m-[0-9]*", "w-[0-9]*", "h-[0-9]*",
    // Angular form state
    "ng-untouched", "ng-touched", "ng-pristine", "ng-dirty",
    "ng-valid", "ng-invalid", "ng-pending", "ng-submitted",
    "ng-star-inserted", "ng-trigger", "ng-trigger-*",
    // Bootstrap-style toggles
    "active", "disabled", "selected", "checked", "expanded",
    "collapsed", "open", "closed", "show", "hide", "hidden",
    // Generic interaction state
    "loading", "error", "success", "warning", "focus", "hover",
    "visited", "current", "highlighted",
];

/// Class patterns that usually carry component meaning
pub const DEFAULT_CLASS_WHITELIST: &[&str] = &[
    "btn*", "button*", "primary", "secondary", "submit", "cancel",
    "nav*", "menu*", "form*", "input*", "header*", "footer*", "sidebar*",
    "content*", "main*", "card*", "modal*", "dialog*", "popup*", "tooltip*",
    "dropdown*", "select*", "checkbox*", "radio*", "tab*", "accordion*",
    "collapse*", "panel*", "alert*", "notice*", "message*", "notification*",
    "badge*", "tag*", "label*", "chip*", "table*", "row*", "cell*", "column*",
    "list*", "item*", "link*", "text*", "icon*", "image*", "avatar*", "logo*",
    "search*", "filter*", "sort*", "pagination*",
    "small", "medium", "large", "xl", "xs",
    "compact", "full", "mini", "tiny", "info", "dark", "light", "theme*",
    "hydrated", "form-control", "form-group", "input-group*",
];

const MAX_ALTERNATIVES: RangeInclusive<u64> = 5..=50;
const MAX_PARENT_DEPTH: RangeInclusive<u64> = 1..=10;
const MAX_SIBLING_DISTANCE: RangeInclusive<u64> = 1..=15;
const MAX_TEXT_LENGTH: RangeInclusive<u64> = 20..=500;
const MAX_SELECTOR_LENGTH: RangeInclusive<u64> = 100..=1000;
const SELECTOR_TIMEOUT_MS: RangeInclusive<u64> = 100..=10000;
const EARLY_EXIT_THRESHOLD: RangeInclusive<u64> = 1..=20;
const EARLY_EXIT_SCORE: RangeInclusive<i64> = 0..=2000;

/// Settings consumed by the selector engine.
///
/// Values are validated once, at construction: anything missing, mistyped
/// or out of range is replaced by its default. The engine itself never
/// re-checks them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorSettings {
    pub class_blacklist: Vec<String>,
    pub class_whitelist: Vec<String>,
    pub max_alternatives: usize,
    pub max_parent_depth: usize,
    pub max_sibling_distance: usize,
    pub max_text_length: usize,
    pub max_selector_length: usize,
    pub selector_timeout_ms: u64,
    pub early_exit_threshold: usize,
    /// Minimum score for a candidate to count toward `early_exit_threshold`
    pub early_exit_score: i64,
    pub enable_enhanced_selectors: bool,
    pub enable_element_state: bool,
    pub prioritize_test_attributes: bool,
    pub enable_optimization: bool,
    pub debug_mode: bool,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            class_blacklist: DEFAULT_CLASS_BLACKLIST.iter().map(|s| s.to_string()).collect(),
            class_whitelist: DEFAULT_CLASS_WHITELIST.iter().map(|s| s.to_string()).collect(),
            max_alternatives: 20,
            max_parent_depth: 3,
            max_sibling_distance: 5,
            max_text_length: 100,
            max_selector_length: 300,
            selector_timeout_ms: 1000,
            early_exit_threshold: 5,
            early_exit_score: 90,
            enable_enhanced_selectors: true,
            enable_element_state: true,
            prioritize_test_attributes: true,
            enable_optimization: true,
            debug_mode: false,
        }
    }
}

impl SelectorSettings {
    /// Build settings from loosely typed JSON (e.g. a stored extension
    /// settings object). Never fails.
    pub fn from_value(value: &Value) -> Self {
        let defaults = Self::default();
        let obj = match value.as_object() {
            Some(obj) => obj,
            None => return defaults,
        };

        let uint = |key: &str, range: RangeInclusive<u64>, default: usize| -> usize {
            obj.get(key)
                .and_then(Value::as_u64)
                .filter(|v| range.contains(v))
                .map(|v| v as usize)
                .unwrap_or(default)
        };
        let flag = |key: &str, default: bool| -> bool {
            obj.get(key).and_then(Value::as_bool).unwrap_or(default)
        };
        let patterns = |key: &str, default: &[String]| -> Vec<String> {
            obj.get(key)
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_else(|| default.to_vec())
        };

        Self {
            class_blacklist: patterns("classBlacklist", &defaults.class_blacklist),
            class_whitelist: patterns("classWhitelist", &defaults.class_whitelist),
            max_alternatives: uint("maxAlternatives", MAX_ALTERNATIVES, defaults.max_alternatives),
            max_parent_depth: uint("maxParentDepth", MAX_PARENT_DEPTH, defaults.max_parent_depth),
            max_sibling_distance: uint(
                "maxSiblingDistance",
                MAX_SIBLING_DISTANCE,
                defaults.max_sibling_distance,
            ),
            max_text_length: uint("maxTextLength", MAX_TEXT_LENGTH, defaults.max_text_length),
            max_selector_length: uint(
                "maxSelectorLength",
                MAX_SELECTOR_LENGTH,
                defaults.max_selector_length,
            ),
            selector_timeout_ms: uint(
                "selectorTimeoutMs",
                SELECTOR_TIMEOUT_MS,
                defaults.selector_timeout_ms as usize,
            ) as u64,
            early_exit_threshold: uint(
                "earlyExitThreshold",
                EARLY_EXIT_THRESHOLD,
                defaults.early_exit_threshold,
            ),
            early_exit_score: obj
                .get("earlyExitScore")
                .and_then(Value::as_i64)
                .filter(|v| EARLY_EXIT_SCORE.contains(v))
                .unwrap_or(defaults.early_exit_score),
            enable_enhanced_selectors: flag(
                "enableEnhancedSelectors",
                defaults.enable_enhanced_selectors,
            ),
            enable_element_state: flag("enableElementState", defaults.enable_element_state),
            prioritize_test_attributes: flag(
                "prioritizeTestAttributes",
                defaults.prioritize_test_attributes,
            ),
            enable_optimization: flag("enableOptimization", defaults.enable_optimization),
            debug_mode: flag("debugMode", defaults.debug_mode),
        }
    }

    /// Parse a JSON document and validate it field by field
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(&value))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Defaults overridden by `RECORDER_*` environment variables
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `RECORDER_*` environment variables on top of these settings.
    /// Invalid values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        fn uint(key: &str, range: RangeInclusive<u64>) -> Option<usize> {
            env::var(key)
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| range.contains(v))
                .map(|v| v as usize)
        }
        fn flag(key: &str) -> Option<bool> {
            env::var(key)
                .ok()
                .and_then(|v| match v.trim().to_lowercase().as_str() {
                    "1" | "true" | "yes" | "on" => Some(true),
                    "0" | "false" | "no" | "off" => Some(false),
                    _ => None,
                })
        }
        fn patterns(key: &str) -> Option<Vec<String>> {
            env::var(key).ok().map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
        }

        if let Some(v) = patterns("RECORDER_CLASS_BLACKLIST") {
            self.class_blacklist = v;
        }
        if let Some(v) = patterns("RECORDER_CLASS_WHITELIST") {
            self.class_whitelist = v;
        }
        if let Some(v) = uint("RECORDER_MAX_ALTERNATIVES", MAX_ALTERNATIVES) {
            self.max_alternatives = v;
        }
        if let Some(v) = uint("RECORDER_MAX_PARENT_DEPTH", MAX_PARENT_DEPTH) {
            self.max_parent_depth = v;
        }
        if let Some(v) = uint("RECORDER_MAX_SIBLING_DISTANCE", MAX_SIBLING_DISTANCE) {
            self.max_sibling_distance = v;
        }
        if let Some(v) = uint("RECORDER_MAX_TEXT_LENGTH", MAX_TEXT_LENGTH) {
            self.max_text_length = v;
        }
        if let Some(v) = uint("RECORDER_MAX_SELECTOR_LENGTH", MAX_SELECTOR_LENGTH) {
            self.max_selector_length = v;
        }
        if let Some(v) = uint("RECORDER_SELECTOR_TIMEOUT_MS", SELECTOR_TIMEOUT_MS) {
            self.selector_timeout_ms = v as u64;
        }
        if let Some(v) = uint("RECORDER_EARLY_EXIT_THRESHOLD", EARLY_EXIT_THRESHOLD) {
            self.early_exit_threshold = v;
        }
        if let Some(v) = env::var("RECORDER_EARLY_EXIT_SCORE")
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|v| EARLY_EXIT_SCORE.contains(v))
        {
            self.early_exit_score = v;
        }
        if let Some(v) = flag("RECORDER_ENABLE_ENHANCED_SELECTORS") {
            self.enable_enhanced_selectors = v;
        }
        if let Some(v) = flag("RECORDER_ENABLE_ELEMENT_STATE") {
            self.enable_element_state = v;
        }
        if let Some(v) = flag("RECORDER_PRIORITIZE_TEST_ATTRIBUTES") {
            self.prioritize_test_attributes = v;
        }
        if let Some(v) = flag("RECORDER_ENABLE_OPTIMIZATION") {
            self.enable_optimization = v;
        }
        if let Some(v) = flag("RECORDER_DEBUG") {
            self.debug_mode = v;
        }
        self
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_millis(self.selector_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;

    #[test]
    fn test_defaults_match_extension() {
        let settings = SelectorSettings::default();
        assert_eq!(settings.max_alternatives, 20);
        assert_eq!(settings.max_parent_depth, 3);
        assert_eq!(settings.early_exit_score, 90);
        assert!(settings.enable_enhanced_selectors);
        assert!(!settings.debug_mode);
        assert!(settings.class_blacklist.iter().any(|p| p == "css-*"));
    }

    #[test]
    fn test_out_of_range_values_fall_back_to_defaults() {
        let settings = SelectorSettings::from_value(&json!({
            "maxAlternatives": 500,
            "maxParentDepth": 0,
            "maxTextLength": 250,
            "selectorTimeoutMs": 50,
        }));
        assert_eq!(settings.max_alternatives, 20);
        assert_eq!(settings.max_parent_depth, 3);
        assert_eq!(settings.max_text_length, 250);
        assert_eq!(settings.selector_timeout_ms, 1000);
    }

    #[test]
    fn test_wrong_types_fall_back_to_defaults() {
        let settings = SelectorSettings::from_value(&json!({
            "maxAlternatives": "10",
            "enableOptimization": "no",
            "classBlacklist": "css-*",
            "classWhitelist": ["btn*", 42, "nav*"],
            "earlyExitThreshold": 7.5,
        }));
        assert_eq!(settings.max_alternatives, 20);
        assert!(settings.enable_optimization);
        assert_eq!(settings.class_blacklist, SelectorSettings::default().class_blacklist);
        assert_eq!(settings.class_whitelist, vec!["btn*", "nav*"]);
        assert_eq!(settings.early_exit_threshold, 5);
    }

    #[test]
    fn test_empty_pattern_lists_are_kept() {
        let settings = SelectorSettings::from_value(&json!({ "classBlacklist": [] }));
        assert!(settings.class_blacklist.is_empty());
    }

    #[test]
    fn test_non_object_value_gives_defaults() {
        assert_eq!(SelectorSettings::from_value(&json!(null)), SelectorSettings::default());
        assert_eq!(SelectorSettings::from_value(&json!([1, 2])), SelectorSettings::default());
    }

    #[test]
    fn test_from_json_str_rejects_malformed_json() {
        assert!(SelectorSettings::from_json_str("{not json").is_err());
        let settings = SelectorSettings::from_json_str(r#"{"debugMode": true}"#).unwrap();
        assert!(settings.debug_mode);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        env::set_var("RECORDER_MAX_ALTERNATIVES", "8");
        env::set_var("RECORDER_ENABLE_OPTIMIZATION", "false");
        env::set_var("RECORDER_MAX_PARENT_DEPTH", "99");
        let settings = SelectorSettings::from_env();
        env::remove_var("RECORDER_MAX_ALTERNATIVES");
        env::remove_var("RECORDER_ENABLE_OPTIMIZATION");
        env::remove_var("RECORDER_MAX_PARENT_DEPTH");

        assert_eq!(settings.max_alternatives, 8);
        assert!(!settings.enable_optimization);
        assert_eq!(settings.max_parent_depth, 3);
    }

    #[test]
    #[serial]
    fn test_env_pattern_list() {
        env::set_var("RECORDER_CLASS_WHITELIST", "btn*, card*,,");
        let settings = SelectorSettings::from_env();
        env::remove_var("RECORDER_CLASS_WHITELIST");

        assert_eq!(settings.class_whitelist, vec!["btn*", "card*"]);
    }
}
