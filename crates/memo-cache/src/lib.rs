//! # Memo Cache
//!
//! 快取儲存：快取項目、上下文位置快取、全域鍵快取與髒標記追蹤

pub mod context_cache;
pub mod dirty_tracking;
pub mod entry;
pub mod global_cache;

// Re-export 主要類型
pub use context_cache::{ContextCache, ContextSlot, PendingCache};
pub use dirty_tracking::{DirtySet, DirtyTracker};
pub use entry::CacheEntry;
pub use global_cache::GlobalCache;
