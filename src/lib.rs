//! Robust element locators for recorded browser actions.
//!
//! Given an element in a DOM, [`generate_selectors`] produces a ranked
//! list of XPath locators that each resolve to exactly that element, and
//! [`create_action`] wraps them with the element state a replay engine
//! should wait for.

pub mod browser;
pub mod config;
pub mod dom;
pub mod error;
pub mod locator;
pub mod recording;
pub mod selectors;
pub mod state;

pub use config::SelectorSettings;
pub use dom::{Document, DomView, NodeId};
pub use error::{ConfigError, DomError, LocatorError, SelectorError};
pub use recording::{create_action, ActionDescriptor, ActionFields, ActionRecorder, ActionType, RecordedEvent};
pub use selectors::{generate_selectors, GenerationOutcome, SelectorGenerator, SelectorResult};
pub use state::{action_specific_state, detect_element_state, ElementState};
