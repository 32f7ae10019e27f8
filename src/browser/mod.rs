//! Live-browser capture through the Chrome DevTools Protocol

pub mod cdp_dom;
pub mod manager;

pub use cdp_dom::{build_document, RawCdpTrees};
pub use manager::{BrowserSession, Viewport};
