//! Element state detection.
//!
//! A recorded action carries the state its element should be in when the
//! action is replayed: `visible` for normal interaction, `hidden` for
//! elements that are not rendered, `attached` when only DOM presence
//! matters.

use serde::{Deserialize, Serialize};

use crate::config::SelectorSettings;
use crate::dom::DomView;
use crate::error::DomError;
use crate::recording::ActionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementState {
    Visible,
    Hidden,
    Attached,
}

impl ElementState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementState::Visible => "visible",
            ElementState::Hidden => "hidden",
            ElementState::Attached => "attached",
        }
    }
}

/// Observed state of `element`. `Visible` when detection is disabled or
/// the DOM cannot answer.
pub fn detect_element_state<D: DomView>(
    dom: &D,
    element: D::Node,
    settings: &SelectorSettings,
) -> ElementState {
    if !settings.enable_element_state {
        return ElementState::Visible;
    }
    match classify(dom, element) {
        Ok(state) => state,
        Err(e) => {
            if settings.debug_mode {
                tracing::warn!("Element state detection failed: {}", e);
            }
            ElementState::Visible
        }
    }
}

fn classify<D: DomView>(dom: &D, element: D::Node) -> Result<ElementState, DomError> {
    if !dom.is_element(element) {
        return Err(DomError::NotAnElement);
    }
    if !dom.is_connected(element) {
        return Ok(ElementState::Hidden);
    }

    let style = dom.computed_style(element)?;
    if style.is_visibility_hidden() || style.is_display_none() {
        return Ok(ElementState::Hidden);
    }

    // display:none on an ancestor only shows up as an empty box
    let rect = dom.bounding_box(element)?;
    if rect.is_empty() {
        return Ok(ElementState::Hidden);
    }
    Ok(ElementState::Visible)
}

/// Broader hidden check used for `<select>` elements: also counts fully
/// transparent elements. Errors count as visible.
pub fn is_element_hidden<D: DomView>(dom: &D, element: D::Node) -> bool {
    if !dom.is_element(element) {
        return false;
    }
    if !dom.is_connected(element) {
        return true;
    }
    let Ok(style) = dom.computed_style(element) else {
        return false;
    };
    if style.is_display_none() || style.is_visibility_hidden() || style.is_transparent() {
        return true;
    }
    dom.bounding_box(element).map(|rect| rect.is_empty()).unwrap_or(false)
}

/// Adjust a detected state for the kind of action being recorded
pub fn action_specific_state<D: DomView>(
    dom: &D,
    action: ActionType,
    element: D::Node,
    detected: ElementState,
) -> ElementState {
    match action {
        // only a visible element can be hidden
        ActionType::Hide => ElementState::Visible,
        ActionType::WaitForSelector => ElementState::Attached,
        ActionType::Select => {
            let select = dom.closest(element, &|n| dom.tag_name(n) == "select");
            match select {
                Some(select) if is_element_hidden(dom, select) => {
                    tracing::debug!("Hidden select detected, using attached state");
                    ElementState::Attached
                }
                _ => detected,
            }
        }
        _ => detected,
    }
}
