//! Symbol resolution for JIT-compiled frames.
//!
//! V8 announces where it places compiled code through provider events.
//! Each traced process gets a [`Context`] holding its code ranges and
//! source files; stack addresses are resolved against the context that
//! owns the sampled thread.

pub mod address_table;
pub mod context;

// Re-export main types
pub use address_table::{AddressRange, AddressRangeTable};
pub use context::{Context, ContextRegistry};
