//! package.json dependency declarations
//!
//! Scanning works on the semantic value of the manifest; the formatting
//! tree is only touched when patching.

pub mod embedded;
pub mod patterns;
pub mod scanner;

pub use embedded::{EmbeddedArgs, EMBEDDED_FIELD};
pub use patterns::PatternFilter;
pub use scanner::{extract_version, DependencyCatalog};
