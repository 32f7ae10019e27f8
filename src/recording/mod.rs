//! Turning user interactions into replayable action descriptors

mod action;
mod recorder;

pub use action::{
    create_action, selector_descriptor, ActionDescriptor, ActionFields, ActionType, SelectorDescriptor,
    DEFAULT_ON_ERROR,
};
pub use recorder::{ActionRecorder, RecordedEvent};
