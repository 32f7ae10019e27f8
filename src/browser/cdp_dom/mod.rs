mod builder;
mod extractor;
pub mod types;

pub use builder::build_document;
pub use extractor::{extract_trees, CDP_TIMEOUT};
pub use types::RawCdpTrees;
