// src/storage/mod.rs
pub mod file;
pub mod memory;
pub mod traits;

pub use file::{load_trace_file, FileTraceStore};
pub use memory::MemoryStore;
pub use traits::{IdentityResolver, StoreError, TraceLoader};
