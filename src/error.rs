use thiserror::Error;

/// Errors raised while parsing or evaluating an XPath/CSS locator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocatorError {
    #[error("Unexpected end of locator: {0}")]
    UnexpectedEnd(String),

    #[error("Unexpected token '{token}' at offset {offset}")]
    UnexpectedToken { token: String, offset: usize },

    #[error("Unterminated string literal starting at offset {0}")]
    UnterminatedLiteral(usize),

    #[error("Unknown axis: {0}")]
    UnknownAxis(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Wrong number of arguments for {name}(): got {got}")]
    Arity { name: String, got: usize },

    #[error("Expression does not evaluate to a node-set: {0}")]
    NotANodeSet(String),

    #[error("Unsupported selector syntax: {0}")]
    Unsupported(String),
}

/// Errors raised by a DOM implementation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    #[error("Node is not an element")]
    NotAnElement,

    #[error("Layout information unavailable")]
    LayoutUnavailable,

    #[error("Locator error: {0}")]
    Locator(#[from] LocatorError),
}

/// Errors raised inside the selector pipeline. None of these escape
/// `generate_selectors`; they drive the fallback chain instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectorError {
    #[error("Invalid element: {0}")]
    InvalidElement(String),

    #[error("No candidates produced for <{0}>")]
    NoCandidates(String),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("Locator error: {0}")]
    Locator(#[from] LocatorError),
}

/// Errors raised when loading settings from an explicit source
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
