//! Concrete element-access implementations.

pub mod markup;
pub mod memory_dom;

pub use memory_dom::{ElementSnapshot, MemoryDocument, MemoryElement};
