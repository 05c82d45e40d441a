//! 選擇器工具

use memo_core::{ContextId, Dep, GlobalKey, Result};
use std::fmt;
use std::hash::Hash;

use crate::manager::Engine;

/// 傳給選擇器的工具
///
/// 只在選擇器執行期間存在，並且綁定到當次的執行框架。
pub struct MemoTools<'a> {
    engine: &'a Engine,
    frame: u64,
    context: ContextId,
}

impl<'a> MemoTools<'a> {
    pub(crate) fn new(engine: &'a Engine, frame: u64, context: ContextId) -> Self {
        Self {
            engine,
            frame,
            context,
        }
    }

    /// 位置記憶化
    ///
    /// 以呼叫順序對應上次執行的同位置快取。依賴相同時直接回傳上次結果，
    /// 否則執行 `compute` 產生新結果。每次執行的呼叫次數必須一致。
    pub fn memo<T, F>(&self, compute: F, deps: Vec<Dep>) -> Result<T>
    where
        T: Clone + 'static,
        F: FnOnce() -> T,
    {
        self.engine.memo(Some(self.frame), compute, deps)
    }

    /// 全域鍵記憶化
    ///
    /// 快取不屬於任何上下文，所有上下文以相同的鍵共用同一個結果。
    pub fn global_memo<K, T, F>(&self, key: K, compute: F, deps: Vec<Dep>) -> Result<T>
    where
        K: Hash + Eq + fmt::Debug + 'static,
        T: Clone + 'static,
        F: FnOnce() -> T,
    {
        self.engine.global_memo(GlobalKey::new(key), compute, deps)
    }

    /// 在同一個框架內呼叫另一個選擇器
    ///
    /// 巢狀選擇器共用父選擇器的位置計數，不是獨立的上下文。
    pub fn execute<I, T, F>(&self, selector: F, input: I) -> Result<T>
    where
        F: FnOnce(&MemoTools<'a>, I) -> Result<T>,
    {
        selector(self, input)
    }

    /// 目前執行中的上下文
    pub fn context(&self) -> ContextId {
        self.context
    }
}

impl fmt::Debug for MemoTools<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoTools")
            .field("frame", &self.frame)
            .field("context", &self.context)
            .finish()
    }
}
