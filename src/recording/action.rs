use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::SelectorSettings;
use crate::dom::DomView;
use crate::selectors::{generate_selectors, shadow_css_selector, SelectorResult};
use crate::state::{action_specific_state, detect_element_state, ElementState};

/// What a recorded action does on replay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionType {
    Click,
    DoubleClick,
    Type,
    Select,
    KeyPress,
    Hover,
    Hide,
    WaitForSelector,
    ScrollBottom,
    Navigate,
}

impl ActionType {
    pub const ALL: [ActionType; 10] = [
        ActionType::Click,
        ActionType::DoubleClick,
        ActionType::Type,
        ActionType::Select,
        ActionType::KeyPress,
        ActionType::Hover,
        ActionType::Hide,
        ActionType::WaitForSelector,
        ActionType::ScrollBottom,
        ActionType::Navigate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Click => "click",
            ActionType::DoubleClick => "doubleClick",
            ActionType::Type => "type",
            ActionType::Select => "select",
            ActionType::KeyPress => "keyPress",
            ActionType::Hover => "hover",
            ActionType::Hide => "hide",
            ActionType::WaitForSelector => "waitForSelector",
            ActionType::ScrollBottom => "scrollBottom",
            ActionType::Navigate => "navigate",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionType::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown action type: {}", s))
    }
}

/// Where to find the element an action targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SelectorDescriptor {
    Xpath {
        current: String,
        alternatives: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        state: Option<ElementState>,
    },
    Css {
        current: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        alternatives: Vec<String>,
    },
    /// An element inside a shadow root: locate `host` in its own tree,
    /// then run `inner` against the host's shadow root
    Shadow {
        host: Box<SelectorDescriptor>,
        inner: String,
    },
}

impl SelectorDescriptor {
    pub fn xpath(result: SelectorResult, state: Option<ElementState>) -> Self {
        SelectorDescriptor::Xpath { current: result.best, alternatives: result.alternatives, state }
    }

    /// The primary locator, the inner CSS for shadow selectors
    pub fn current(&self) -> &str {
        match self {
            SelectorDescriptor::Xpath { current, .. } | SelectorDescriptor::Css { current, .. } => current,
            SelectorDescriptor::Shadow { inner, .. } => inner,
        }
    }

    pub fn state(&self) -> Option<ElementState> {
        match self {
            SelectorDescriptor::Xpath { state, .. } => *state,
            _ => None,
        }
    }
}

/// Action-specific payload, flattened into the descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<i64>,
}

impl ActionFields {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Default::default() }
    }

    pub fn values(values: Vec<String>) -> Self {
        Self { values: Some(values), ..Default::default() }
    }
}

pub const DEFAULT_ON_ERROR: &str = "return";

fn default_on_error() -> String {
    DEFAULT_ON_ERROR.to_string()
}

/// A recorded action as consumed by the replay engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    pub action: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<SelectorDescriptor>,
    #[serde(flatten)]
    pub fields: ActionFields,
    #[serde(default = "default_on_error")]
    pub on_error: String,
}

impl ActionDescriptor {
    /// An action without a target element
    pub fn untargeted(action: ActionType, fields: ActionFields) -> Self {
        Self { action, selector: None, fields, on_error: default_on_error() }
    }

    pub fn key_press(key: &str) -> Self {
        Self::untargeted(ActionType::KeyPress, ActionFields { key: Some(key.to_string()), ..Default::default() })
    }

    pub fn navigate(url: &str) -> Self {
        Self::untargeted(ActionType::Navigate, ActionFields { url: Some(url.to_string()), ..Default::default() })
    }

    pub fn scroll_bottom() -> Self {
        Self::untargeted(ActionType::ScrollBottom, ActionFields::default())
    }
}

/// Selector for `element`. Elements in a shadow root get a composite
/// selector whose host part is built the same way, so nested shadow trees
/// nest accordingly.
pub fn selector_descriptor<D: DomView>(
    dom: &D,
    element: D::Node,
    settings: &SelectorSettings,
    state: Option<ElementState>,
) -> SelectorDescriptor {
    match dom.shadow_host(element) {
        Some(host) => SelectorDescriptor::Shadow {
            host: Box::new(selector_descriptor(dom, host, settings, None)),
            inner: shadow_css_selector(dom, element),
        },
        None => SelectorDescriptor::xpath(generate_selectors(dom, element, settings), state),
    }
}

/// Build the action for `element`: ranked selectors plus the state the
/// element should be in on replay. Shadow DOM elements carry no state.
pub fn create_action<D: DomView>(
    dom: &D,
    element: D::Node,
    action_type: ActionType,
    settings: &SelectorSettings,
    fields: ActionFields,
) -> ActionDescriptor {
    if dom.in_iframe(element) {
        tracing::debug!("Recording {} inside an iframe", action_type);
    }

    let state = if dom.shadow_host(element).is_some() {
        if settings.debug_mode {
            tracing::debug!("Shadow DOM element, skipping state detection");
        }
        None
    } else {
        let detected = detect_element_state(dom, element, settings);
        let state = action_specific_state(dom, action_type, element, detected);
        if settings.debug_mode {
            tracing::debug!(
                "State for {}: detected {}, using {}",
                action_type,
                detected.as_str(),
                state.as_str()
            );
        }
        Some(state)
    };

    ActionDescriptor {
        action: action_type,
        selector: Some(selector_descriptor(dom, element, settings, state)),
        fields,
        on_error: default_on_error(),
    }
}
