//! 執行框架

use memo_cache::PendingCache;
use memo_core::ContextId;
use std::cell::{Cell, RefCell};

/// 一次 `execute` 呼叫的暫時狀態
#[derive(Debug)]
pub(crate) struct Frame {
    pub id: u64,
    pub context: ContextId,
    pub pending: PendingCache,
}

/// 確保框架在選擇器返回、出錯或 panic 後一定被關閉
pub(crate) struct FrameGuard<'a> {
    slot: &'a RefCell<Option<Frame>>,
    notify_pending: &'a Cell<u32>,
    closed: bool,
}

impl<'a> FrameGuard<'a> {
    pub fn new(slot: &'a RefCell<Option<Frame>>, notify_pending: &'a Cell<u32>) -> Self {
        Self {
            slot,
            notify_pending,
            closed: false,
        }
    }

    /// 關閉框架並取出其狀態
    pub fn close(mut self) -> Option<Frame> {
        self.closed = true;
        self.slot.borrow_mut().take()
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // 未提交的快取與延後的通知直接丟棄
        if let Ok(mut slot) = self.slot.try_borrow_mut() {
            slot.take();
        }
        self.notify_pending.set(0);
    }
}
