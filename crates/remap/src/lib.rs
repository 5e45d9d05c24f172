//! Resource-dependency remapping
//!
//! Features:
//! - Identity indexes (identifier ⇄ display name) per category
//! - Dependency extraction from pages
//! - Reference rewriting between an agent's identifiers and portable names

pub mod dependencies;
pub mod error;
pub mod index;
pub mod rewriter;

pub use dependencies::{extract_dependencies, ResourceSelection};
pub use error::{RemapError, Result};
pub use index::{build_index, list_identities, IdentityIndex, IndexCollision};
pub use rewriter::{
    convert_page_dependencies, convert_start_page_dependencies, Direction, RewriteContext,
    Rewriter, SentinelSet,
};
