//! # Memo Engine
//!
//! 記憶化核心：上下文位置快取與全域鍵快取的執行協定。
//!
//! 選擇器在執行期間透過 [`MemoTools`] 呼叫 `memo`/`global_memo`，
//! 引擎以呼叫順序比對上次執行的快取，依賴未變時直接重用結果。
//! 同一時間只允許一個執行框架，巢狀選擇器透過 [`MemoTools::execute`]
//! 共用父框架。

mod frame;
pub mod manager;
pub mod notify;
pub mod snapshot;
pub mod tools;

// Re-export 主要類型
pub use manager::{MemoContext, MemoManager};
pub use notify::{ChangeNotifier, Unsubscribe};
pub use snapshot::{CacheSnapshot, CacheStats, ContextSummary};
pub use tools::MemoTools;

pub use memo_cache::DirtySet;
pub use memo_core::{deps, ContextId, Dep, GlobalKey, MemoConfig, MemoError, Result, SameAs};
