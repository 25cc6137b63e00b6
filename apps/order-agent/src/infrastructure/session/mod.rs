//! Session persistence adapters for the request governor.
//!
//! - `file`: per-exchange files shared by every process on the host
//! - `in_memory`: single-process store and lock for tests and paper trading

mod file;
mod in_memory;

pub use file::{FileSessionLock, FileSessionStore};
pub use in_memory::{InMemorySessionLock, InMemorySessionStore};
