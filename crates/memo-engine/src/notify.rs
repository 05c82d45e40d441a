//! 變更通知
//!
//! 無內容的多播事件。監聽器依訂閱順序同步呼叫；通知期間新增的監聽器
//! 不會收到該次通知，通知期間被移除的監聽器會被略過。

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Listener = Rc<dyn Fn()>;

#[derive(Default)]
struct ListenerList {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// 變更通知器
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    listeners: Rc<RefCell<ListenerList>>,
}

impl ChangeNotifier {
    /// 創建新的通知器
    pub fn new() -> Self {
        Self::default()
    }

    /// 訂閱通知
    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Unsubscribe {
        let mut list = self.listeners.borrow_mut();
        let id = list.next_id;
        list.next_id += 1;
        list.entries.push((id, Rc::new(listener)));
        Unsubscribe {
            listeners: Rc::downgrade(&self.listeners),
            id,
        }
    }

    /// 通知所有監聽器
    pub fn notify(&self) {
        // 先取快照，監聽器可以在回呼中訂閱或取消訂閱
        let snapshot: Vec<(u64, Listener)> = self.listeners.borrow().entries.clone();
        for (id, listener) in snapshot {
            let subscribed = self
                .listeners
                .borrow()
                .entries
                .iter()
                .any(|(other, _)| *other == id);
            if subscribed {
                listener();
            }
        }
    }

    /// 目前的監聽器數量
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// 取消訂閱的控制代碼
///
/// 重複呼叫 [`Unsubscribe::unsubscribe`] 不會有任何效果。
#[derive(Clone)]
pub struct Unsubscribe {
    listeners: Weak<RefCell<ListenerList>>,
    id: u64,
}

impl Unsubscribe {
    /// 取消訂閱
    pub fn unsubscribe(&self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .borrow_mut()
                .entries
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe").field("id", &self.id).finish()
    }
}
