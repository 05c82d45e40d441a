//! # Memo
//!
//! 選擇器記憶化函式庫。
//!
//! - [`MemoManager`]：上下文位置快取與全域鍵快取
//! - [`StoreMemoManager`]：綁定外部狀態容器，每次執行自動帶入狀態快照
//! - [`Connection`]：在狀態變更時重新執行選擇器的訂閱者
//!
//! ```
//! use memo::prelude::*;
//! use std::rc::Rc;
//!
//! #[derive(Clone)]
//! struct State {
//!     items: Rc<Vec<u32>>,
//! }
//!
//! fn select_total(tools: &StoreTools<'_, State>, _: ()) -> memo::Result<u32> {
//!     let items = &tools.state().items;
//!     tools.memo(|| items.iter().sum(), deps![items])
//! }
//!
//! let store = Rc::new(SimpleStore::new(State { items: Rc::new(vec![1, 2, 3]) }));
//! let manager = StoreMemoManager::new(Rc::clone(&store));
//! let ctx = manager.create_context("total");
//! assert_eq!(ctx.execute(select_total, ()).unwrap(), 6);
//! ```

pub use memo_cache::DirtySet;
pub use memo_core::{
    deps, shallow_equal, ContextId, Dep, GlobalKey, MemoConfig, MemoError, Result, SameAs,
};
pub use memo_engine::{
    CacheSnapshot, CacheStats, ChangeNotifier, ContextSummary, MemoContext, MemoManager,
    MemoTools, Unsubscribe,
};
pub use memo_store::{
    Connection, SimpleStore, Store, StoreMemoContext, StoreMemoManager, StoreTools,
};

/// 常用類型
pub mod prelude {
    pub use crate::{
        deps, Connection, Dep, MemoContext, MemoError, MemoManager, MemoTools, SameAs,
        SimpleStore, Store, StoreMemoContext, StoreMemoManager, StoreTools,
    };
}
