//! Record stores for accounts, categories and entries
//!
//! This module provides two backends behind [`RecordStore`]:
//! 1. In-memory (tests, ephemeral use)
//! 2. JSON file in the data directory

mod file;
mod memory;
mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::RecordStore;
