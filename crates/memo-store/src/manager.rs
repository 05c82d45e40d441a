//! 綁定狀態容器的記憶化管理器

use memo_core::{ContextId, Dep, MemoConfig, Result};
use memo_engine::{MemoContext, MemoManager, MemoTools, Unsubscribe};
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use crate::store::Store;

/// 傳給狀態選擇器的工具
///
/// `state` 是執行開始時取得的快照，整個選擇器呼叫樹共用同一份。
pub struct StoreTools<'a, S> {
    state: Rc<S>,
    tools: &'a MemoTools<'a>,
}

impl<'a, S: 'static> StoreTools<'a, S> {
    /// 目前的狀態快照
    pub fn state(&self) -> &S {
        &self.state
    }

    /// 狀態快照的引用
    pub fn snapshot(&self) -> &Rc<S> {
        &self.state
    }

    /// 位置記憶化，參見 [`MemoTools::memo`]
    pub fn memo<T, F>(&self, compute: F, deps: Vec<Dep>) -> Result<T>
    where
        T: Clone + 'static,
        F: FnOnce() -> T,
    {
        self.tools.memo(compute, deps)
    }

    /// 全域鍵記憶化，參見 [`MemoTools::global_memo`]
    pub fn global_memo<K, T, F>(&self, key: K, compute: F, deps: Vec<Dep>) -> Result<T>
    where
        K: Hash + Eq + fmt::Debug + 'static,
        T: Clone + 'static,
        F: FnOnce() -> T,
    {
        self.tools.global_memo(key, compute, deps)
    }

    /// 以同一份狀態快照呼叫另一個選擇器
    pub fn execute<I, T, F>(&self, selector: F, input: I) -> Result<T>
    where
        F: FnOnce(&StoreTools<'a, S>, I) -> Result<T>,
    {
        selector(self, input)
    }

    /// 目前執行中的上下文
    pub fn context(&self) -> ContextId {
        self.tools.context()
    }
}

/// 綁定狀態容器的記憶化管理器
///
/// 本身不持有快取，所有快取都在包裝的 [`MemoManager`] 中。
pub struct StoreMemoManager<St: Store> {
    store: Rc<St>,
    memo: MemoManager,
}

impl<St: Store> StoreMemoManager<St> {
    /// 以預設配置建立
    pub fn new(store: Rc<St>) -> Self {
        Self {
            store,
            memo: MemoManager::new(),
        }
    }

    /// 以指定配置建立
    pub fn with_config(store: Rc<St>, config: MemoConfig) -> Result<Self> {
        Ok(Self {
            store,
            memo: MemoManager::with_config(config)?,
        })
    }

    /// 建立新的執行上下文
    pub fn create_context(&self, name: impl Into<String>) -> StoreMemoContext<St> {
        StoreMemoContext {
            store: Rc::clone(&self.store),
            context: self.memo.create_context(name),
        }
    }

    /// 目前的狀態快照
    pub fn get_state(&self) -> Rc<St::State> {
        self.store.get_state()
    }

    /// 訂閱狀態變更
    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Unsubscribe {
        self.store.subscribe(Box::new(listener))
    }

    /// 訂閱快取重新計算的通知
    pub fn subscribe_changes(&self, listener: impl Fn() + 'static) -> Unsubscribe {
        self.memo.subscribe_changes(listener)
    }

    /// 底層的記憶化管理器
    pub fn memo_manager(&self) -> &MemoManager {
        &self.memo
    }

    /// 綁定的狀態容器
    pub fn store(&self) -> &Rc<St> {
        &self.store
    }
}

impl<St: Store> Clone for StoreMemoManager<St> {
    fn clone(&self) -> Self {
        Self {
            store: Rc::clone(&self.store),
            memo: self.memo.clone(),
        }
    }
}

impl<St: Store> fmt::Debug for StoreMemoManager<St> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreMemoManager")
            .field("memo", &self.memo)
            .finish_non_exhaustive()
    }
}

/// 綁定狀態容器的執行上下文
pub struct StoreMemoContext<St: Store> {
    store: Rc<St>,
    context: MemoContext,
}

impl<St: Store> StoreMemoContext<St> {
    /// 執行選擇器
    ///
    /// 每次呼叫只讀取一次狀態，巢狀選擇器看到的是同一份快照。
    pub fn execute<I, T, F>(&self, selector: F, input: I) -> Result<T>
    where
        F: FnOnce(&StoreTools<'_, St::State>, I) -> Result<T>,
    {
        self.context.execute(
            |tools, input| {
                let store_tools = StoreTools {
                    state: self.store.get_state(),
                    tools,
                };
                selector(&store_tools, input)
            },
            input,
        )
    }

    /// 銷毀上下文
    pub fn destroy(&self) -> Result<()> {
        self.context.destroy()
    }

    pub fn id(&self) -> ContextId {
        self.context.id()
    }

    pub fn name(&self) -> &str {
        self.context.name()
    }

    pub fn is_alive(&self) -> bool {
        self.context.is_alive()
    }
}

impl<St: Store> fmt::Debug for StoreMemoContext<St> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreMemoContext")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
