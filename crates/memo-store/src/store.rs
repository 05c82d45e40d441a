//! 狀態容器

use memo_engine::{ChangeNotifier, Unsubscribe};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// 外部狀態容器介面
///
/// `get_state` 同步回傳目前的狀態快照（約定不可變）；`subscribe` 的
/// 監聽器在每次狀態變更提交後被呼叫。
pub trait Store {
    type State: 'static;

    /// 目前的狀態快照
    fn get_state(&self) -> Rc<Self::State>;

    /// 訂閱狀態變更
    fn subscribe(&self, listener: Box<dyn Fn()>) -> Unsubscribe;
}

/// 簡單的狀態容器
///
/// 每次更新複製目前狀態、套用修改並產生新的快照。狀態內以 `Rc`
/// 保存的欄位在未修改時維持原本的引用身分。
pub struct SimpleStore<S> {
    state: RefCell<Rc<S>>,
    notifier: ChangeNotifier,
}

impl<S: Clone + 'static> SimpleStore<S> {
    /// 以初始狀態建立
    pub fn new(initial: S) -> Self {
        Self {
            state: RefCell::new(Rc::new(initial)),
            notifier: ChangeNotifier::new(),
        }
    }

    /// 修改狀態並通知訂閱者
    pub fn update(&self, updater: impl FnOnce(&mut S)) {
        // 修改函式內可以再次更新容器，呼叫前先釋放借用
        let current = Rc::clone(&self.state.borrow());
        let mut draft = S::clone(&current);
        updater(&mut draft);
        *self.state.borrow_mut() = Rc::new(draft);
        self.notifier.notify();
    }

    /// 直接替換狀態並通知訂閱者
    pub fn set_state(&self, state: S) {
        *self.state.borrow_mut() = Rc::new(state);
        self.notifier.notify();
    }

    /// 訂閱者數量
    pub fn listener_count(&self) -> usize {
        self.notifier.listener_count()
    }
}

impl<S: Clone + 'static> Store for SimpleStore<S> {
    type State = S;

    fn get_state(&self) -> Rc<S> {
        Rc::clone(&self.state.borrow())
    }

    fn subscribe(&self, listener: Box<dyn Fn()>) -> Unsubscribe {
        self.notifier.subscribe(listener)
    }
}

impl<S: fmt::Debug> fmt::Debug for SimpleStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleStore")
            .field("state", &self.state.borrow())
            .field("notifier", &self.notifier)
            .finish()
    }
}
