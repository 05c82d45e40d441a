//! 狀態訂閱連線
//!
//! 把一個選擇器掛到狀態容器上：建立時執行一次，之後每次狀態變更都重新執行，
//! 結果與上次不同（依 [`SameAs`]）時才呼叫 `on_change`。

use memo_core::{MemoError, Result, SameAs};
use memo_engine::Unsubscribe;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::manager::{StoreMemoManager, StoreTools};
use crate::store::Store;

struct ConnectionInner<T> {
    name: String,
    run: Box<dyn Fn() -> Result<T>>,
    destroy: Box<dyn Fn() -> Result<()>>,
    current: RefCell<T>,
    on_change: Box<dyn Fn(&T)>,
    last_error: RefCell<Option<MemoError>>,
    changes: Cell<u64>,
}

impl<T: SameAs + Clone> ConnectionInner<T> {
    fn refresh(&self) -> Result<bool> {
        let next = (self.run)()?;
        if next.same_as(&self.current.borrow()) {
            return Ok(false);
        }

        *self.current.borrow_mut() = next.clone();
        self.changes.set(self.changes.get() + 1);
        // 回呼內可以再讀取或觸發狀態更新，這裡不持有借用
        (self.on_change)(&next);
        Ok(true)
    }

    fn on_store_change(&self) {
        if let Err(err) = self.refresh() {
            tracing::warn!("連線 {} 更新失敗: {}", self.name, err);
            *self.last_error.borrow_mut() = Some(err);
        }
    }
}

/// 狀態訂閱連線
///
/// 丟棄時取消狀態訂閱並銷毀自己的上下文。
pub struct Connection<T> {
    inner: Rc<ConnectionInner<T>>,
    unsubscribe: Unsubscribe,
}

impl<T: SameAs + Clone + 'static> Connection<T> {
    /// 建立連線並立即執行一次選擇器
    ///
    /// 初次執行失敗時上下文會被銷毀，錯誤直接回傳。
    pub fn new<St, I, F>(
        manager: &StoreMemoManager<St>,
        name: impl Into<String>,
        selector: F,
        input: I,
        on_change: impl Fn(&T) + 'static,
    ) -> Result<Self>
    where
        St: Store + 'static,
        I: Clone + 'static,
        F: Fn(&StoreTools<'_, St::State>, I) -> Result<T> + 'static,
    {
        let name = name.into();
        let context = Rc::new(manager.create_context(name.clone()));

        let initial = match context.execute(&selector, input.clone()) {
            Ok(value) => value,
            Err(err) => {
                if let Err(destroy_err) = context.destroy() {
                    tracing::warn!("連線 {} 銷毀上下文失敗: {}", name, destroy_err);
                }
                return Err(err);
            }
        };

        let runner = Rc::clone(&context);
        let inner = Rc::new(ConnectionInner {
            name,
            run: Box::new(move || runner.execute(&selector, input.clone())),
            destroy: Box::new(move || context.destroy()),
            current: RefCell::new(initial),
            on_change: Box::new(on_change),
            last_error: RefCell::new(None),
            changes: Cell::new(0),
        });

        let weak = Rc::downgrade(&inner);
        let unsubscribe = manager.subscribe(move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_store_change();
            }
        });

        tracing::debug!("建立連線 {}", inner.name);
        Ok(Self { inner, unsubscribe })
    }

    /// 最近一次的結果
    pub fn current(&self) -> T {
        self.inner.current.borrow().clone()
    }

    /// 手動重新執行，回傳結果是否改變
    pub fn refresh(&self) -> Result<bool> {
        self.inner.refresh()
    }

    /// `on_change` 被呼叫的次數
    pub fn change_count(&self) -> u64 {
        self.inner.changes.get()
    }

    /// 取出最近一次狀態變更時的錯誤
    pub fn take_error(&self) -> Option<MemoError> {
        self.inner.last_error.borrow_mut().take()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl<T> Drop for Connection<T> {
    fn drop(&mut self) {
        self.unsubscribe.unsubscribe();
        if let Err(err) = (self.inner.destroy)() {
            tracing::warn!("連線 {} 銷毀上下文失敗: {}", self.inner.name, err);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.inner.name)
            .field("current", &self.inner.current.borrow())
            .field("changes", &self.inner.changes.get())
            .finish()
    }
}
