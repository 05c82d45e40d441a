//! 快取項目

use memo_core::{shallow_equal, Dep};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// 快取項目：依賴列表與記憶化結果
pub struct CacheEntry {
    deps: Vec<Dep>,
    result: Rc<dyn Any>,
}

impl CacheEntry {
    /// 創建新的快取項目
    pub fn new<T: 'static>(deps: Vec<Dep>, result: T) -> Self {
        Self {
            deps,
            result: Rc::new(result),
        }
    }

    /// 依賴是否與給定列表相同
    pub fn matches(&self, deps: &[Dep]) -> bool {
        shallow_equal(&self.deps, deps)
    }

    /// 取得結果的複本（類型不符時為 `None`）
    ///
    /// 結果為 `Rc` 時複本與原值指向同一物件。
    pub fn result<T: Clone + 'static>(&self) -> Option<T> {
        self.result.downcast_ref::<T>().cloned()
    }

    /// 依賴列表
    pub fn deps(&self) -> &[Dep] {
        &self.deps
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("deps", &self.deps)
            .finish_non_exhaustive()
    }
}
