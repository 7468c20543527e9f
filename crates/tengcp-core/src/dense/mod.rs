//! Dense tensor implementation and operations
//!
//! The type lives in [`types`]; creation, indexing and elementwise helpers are
//! split into sibling modules that each add an `impl` block.

pub mod types;

mod creation;
mod elementwise;
mod indexing;

pub mod densend_traits;

pub use types::DenseND;
