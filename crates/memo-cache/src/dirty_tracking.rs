//! 髒標記追蹤

use memo_core::{ContextId, GlobalKey};
use std::collections::HashSet;

/// 髒標記追蹤器
///
/// 記錄自上次讀取後重新計算過的上下文與全域鍵。變更通知不帶內容，
/// 觀察者可透過此處得知是哪些快取改變。
#[derive(Debug, Default)]
pub struct DirtyTracker {
    dirty_contexts: HashSet<ContextId>,
    dirty_global_keys: HashSet<GlobalKey>,
}

/// 一次讀取的髒標記
#[derive(Debug, Default)]
pub struct DirtySet {
    pub contexts: Vec<ContextId>,
    pub global_keys: Vec<GlobalKey>,
}

impl DirtySet {
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty() && self.global_keys.is_empty()
    }
}

impl DirtyTracker {
    /// 創建新的追蹤器
    pub fn new() -> Self {
        Self::default()
    }

    /// 標記上下文為髒
    pub fn mark_context(&mut self, id: ContextId) {
        self.dirty_contexts.insert(id);
    }

    /// 標記全域鍵為髒
    pub fn mark_global(&mut self, key: GlobalKey) {
        self.dirty_global_keys.insert(key);
    }

    /// 檢查上下文是否為髒
    pub fn is_context_dirty(&self, id: &ContextId) -> bool {
        self.dirty_contexts.contains(id)
    }

    /// 檢查全域鍵是否為髒
    pub fn is_global_dirty(&self, key: &GlobalKey) -> bool {
        self.dirty_global_keys.contains(key)
    }

    /// 移除已銷毀的上下文
    pub fn forget_context(&mut self, id: &ContextId) {
        self.dirty_contexts.remove(id);
    }

    /// 清除所有髒標記
    pub fn clear(&mut self) {
        self.dirty_contexts.clear();
        self.dirty_global_keys.clear();
    }

    /// 取出所有髒標記並清空
    pub fn take(&mut self) -> DirtySet {
        DirtySet {
            contexts: self.dirty_contexts.drain().collect(),
            global_keys: self.dirty_global_keys.drain().collect(),
        }
    }
}
