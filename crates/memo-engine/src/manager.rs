//! 記憶化管理器

use chrono::Utc;
use memo_cache::{CacheEntry, ContextCache, DirtySet, DirtyTracker, GlobalCache, PendingCache};
use memo_core::{ContextId, Dep, GlobalKey, MemoConfig, MemoError, Result};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use crate::frame::{Frame, FrameGuard};
use crate::notify::{ChangeNotifier, Unsubscribe};
use crate::snapshot::{CacheSnapshot, CacheStats, ContextSummary};
use crate::tools::MemoTools;

/// 管理器的共享狀態
pub(crate) struct Engine {
    config: MemoConfig,
    contexts: RefCell<ContextCache>,
    global: RefCell<GlobalCache>,
    /// 目前的執行框架（同一時間最多一個）
    frame: RefCell<Option<Frame>>,
    next_frame: Cell<u64>,
    dirty: RefCell<DirtyTracker>,
    stats: Cell<CacheStats>,
    notifier: ChangeNotifier,
    /// 框架執行期間延後的通知次數（每次重新計算一次）
    notify_pending: Cell<u32>,
}

impl Engine {
    fn new(config: MemoConfig) -> Self {
        let global = GlobalCache::with_capacity(config.global_capacity);
        Self {
            config,
            contexts: RefCell::new(ContextCache::new()),
            global: RefCell::new(global),
            frame: RefCell::new(None),
            next_frame: Cell::new(0),
            dirty: RefCell::new(DirtyTracker::new()),
            stats: Cell::new(CacheStats::default()),
            notifier: ChangeNotifier::new(),
            notify_pending: Cell::new(0),
        }
    }

    fn register(&self, name: &str) -> ContextId {
        let id = ContextId::new();
        self.contexts.borrow_mut().register(id, name.to_string());
        tracing::debug!("建立上下文 {} ({})", id, name);
        id
    }

    fn destroy(&self, id: ContextId) -> Result<()> {
        if !self.contexts.borrow_mut().remove(&id) {
            tracing::warn!("銷毀不存在的上下文 {}", id);
            return Err(MemoError::ContextMissing(id));
        }
        self.dirty.borrow_mut().forget_context(&id);
        tracing::debug!("銷毀上下文 {}", id);
        Ok(())
    }

    fn is_alive(&self, id: &ContextId) -> bool {
        self.contexts.borrow().contains(id)
    }

    /// 執行協定
    ///
    /// 1. 已有框架時拒絕執行
    /// 2. 開啟框架，帶入上次提交的快取
    /// 3. 執行選擇器
    /// 4. 檢查快取形狀與上次一致
    /// 5. 提交新快取並關閉框架
    ///
    /// 任何失敗都不會改動上次提交的快取。
    fn execute<I, T, F>(&self, context: ContextId, selector: F, input: I) -> Result<T>
    where
        F: FnOnce(&MemoTools<'_>, I) -> Result<T>,
    {
        let outcome = self
            .begin_frame(context)
            .and_then(|frame_id| self.run_frame(frame_id, context, selector, input));

        self.record(|stats| {
            stats.executions += 1;
            if outcome.is_err() {
                stats.failed_executions += 1;
            }
        });
        if let Err(err) = &outcome {
            tracing::warn!("選擇器執行失敗 (上下文 {}): {}", context, err);
        }

        self.flush_notifications();
        outcome
    }

    fn begin_frame(&self, context: ContextId) -> Result<u64> {
        let mut slot = self.frame.borrow_mut();
        if let Some(active) = slot.as_ref() {
            return Err(MemoError::Reentrant {
                active: active.context,
                requested: context,
            });
        }

        let prior = self
            .contexts
            .borrow()
            .get(&context)
            .ok_or(MemoError::ContextMissing(context))?
            .entries
            .clone();

        let id = self.next_frame.get();
        self.next_frame.set(id + 1);
        *slot = Some(Frame {
            id,
            context,
            pending: PendingCache::new(prior),
        });
        Ok(id)
    }

    fn run_frame<I, T, F>(&self, frame_id: u64, context: ContextId, selector: F, input: I) -> Result<T>
    where
        F: FnOnce(&MemoTools<'_>, I) -> Result<T>,
    {
        let guard = FrameGuard::new(&self.frame, &self.notify_pending);
        let tools = MemoTools::new(self, frame_id, context);
        let outcome = selector(&tools, input);
        let frame = guard.close();

        let value = outcome?;
        let frame = frame.ok_or(MemoError::NoActiveExecution)?;
        self.commit(frame)?;
        Ok(value)
    }

    fn commit(&self, frame: Frame) -> Result<()> {
        let Frame {
            context, pending, ..
        } = frame;

        let previous = pending.prior_len();
        let entries = pending
            .finish()
            .map_err(|position| MemoError::ResultTypeChanged { position })?;

        if let Some(previous) = previous {
            if previous != entries.len() {
                return Err(MemoError::CacheShapeChanged {
                    context,
                    previous,
                    current: entries.len(),
                });
            }
        }

        if self.contexts.borrow_mut().commit(&context, entries) {
            Ok(())
        } else {
            // 執行期間上下文被銷毀
            Err(MemoError::ContextMissing(context))
        }
    }

    pub(crate) fn memo<T, F>(&self, frame_id: Option<u64>, compute: F, deps: Vec<Dep>) -> Result<T>
    where
        T: Clone + 'static,
        F: FnOnce() -> T,
    {
        let (context, position, prior) = {
            let mut slot = self.frame.borrow_mut();
            let frame = slot
                .as_mut()
                .filter(|frame| frame_id.map_or(true, |id| id == frame.id))
                .ok_or(MemoError::NoActiveExecution)?;
            let (position, prior) = frame.pending.reserve();
            (frame.context, position, prior)
        };

        if let Some(entry) = prior.filter(|entry| entry.matches(&deps)) {
            let value = entry
                .result::<T>()
                .ok_or(MemoError::ResultTypeChanged { position })?;
            // 沿用同一個項目，保持結果的引用身分
            self.fill(position, entry)?;
            self.record(|stats| stats.hits += 1);
            tracing::trace!("上下文 {} 位置 {} 命中快取", context, position);
            return Ok(value);
        }

        let value = compute();
        self.fill(position, Rc::new(CacheEntry::new(deps, value.clone())))?;
        self.record(|stats| stats.misses += 1);
        if self.config.track_dirty {
            self.dirty.borrow_mut().mark_context(context);
        }
        tracing::debug!("上下文 {} 位置 {} 重新計算", context, position);
        self.raise_change();
        Ok(value)
    }

    fn fill(&self, position: usize, entry: Rc<CacheEntry>) -> Result<()> {
        let mut slot = self.frame.borrow_mut();
        let frame = slot.as_mut().ok_or(MemoError::NoActiveExecution)?;
        frame.pending.fill(position, entry);
        Ok(())
    }

    pub(crate) fn global_memo<T, F>(&self, key: GlobalKey, compute: F, deps: Vec<Dep>) -> Result<T>
    where
        T: Clone + 'static,
        F: FnOnce() -> T,
    {
        let cached = self.global.borrow_mut().get(&key);
        if let Some(entry) = cached.filter(|entry| entry.matches(&deps)) {
            let value = entry
                .result::<T>()
                .ok_or_else(|| MemoError::GlobalResultTypeChanged {
                    key: format!("{key:?}"),
                })?;
            self.record(|stats| stats.hits += 1);
            tracing::trace!("全域鍵 {:?} 命中快取", key);
            return Ok(value);
        }

        let value = compute();
        let entry = Rc::new(CacheEntry::new(deps, value.clone()));
        let evicted = self.global.borrow_mut().insert(key.clone(), entry);
        if let Some(evicted) = evicted {
            self.record(|stats| stats.evictions += 1);
            tracing::info!("全域快取已達上限，淘汰鍵 {:?}", evicted);
        }

        self.record(|stats| stats.misses += 1);
        tracing::debug!("全域鍵 {:?} 重新計算", key);
        if self.config.track_dirty {
            self.dirty.borrow_mut().mark_global(key);
        }
        self.raise_change();
        Ok(value)
    }

    /// 每次重新計算發出一次變更通知（框架執行中則延到框架關閉後）
    fn raise_change(&self) {
        if !self.config.notify_on_recompute {
            return;
        }
        if self.frame.borrow().is_some() {
            self.notify_pending.set(self.notify_pending.get() + 1);
        } else {
            self.notifier.notify();
        }
    }

    fn flush_notifications(&self) {
        if self.frame.borrow().is_some() {
            return;
        }
        for _ in 0..self.notify_pending.replace(0) {
            self.notifier.notify();
        }
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }

    fn snapshot(&self) -> CacheSnapshot {
        let contexts = self.contexts.borrow();
        let global = self.global.borrow();
        CacheSnapshot {
            contexts: contexts
                .iter_ordered()
                .into_iter()
                .map(|(id, slot)| ContextSummary {
                    id: *id,
                    name: slot.name.clone(),
                    entries: slot.entries.as_ref().map(|entries| entries.len()),
                })
                .collect(),
            global_entries: global.len(),
            global_capacity: global.capacity(),
            executing: self.frame.borrow().as_ref().map(|frame| frame.context),
            stats: self.stats.get(),
            captured_at: Utc::now(),
        }
    }
}

/// 記憶化管理器
///
/// 擁有上下文快取與全域快取。複製管理器只會複製控制代碼，
/// 所有複本共用同一份快取。
///
/// ```
/// use memo_engine::{deps, MemoManager};
///
/// let manager = MemoManager::new();
/// let ctx = manager.create_context("demo");
/// let doubled = ctx
///     .execute(|tools, n: u32| tools.memo(|| n * 2, deps![n]), 21)
///     .unwrap();
/// assert_eq!(doubled, 42);
/// ctx.destroy().unwrap();
/// ```
#[derive(Clone)]
pub struct MemoManager {
    engine: Rc<Engine>,
}

impl MemoManager {
    /// 以預設配置創建管理器
    pub fn new() -> Self {
        Self {
            engine: Rc::new(Engine::new(MemoConfig::default())),
        }
    }

    /// 以指定配置創建管理器
    pub fn with_config(config: MemoConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine: Rc::new(Engine::new(config)),
        })
    }

    /// 建立新的執行上下文
    ///
    /// 名稱只用於診斷，同名的上下文彼此獨立。
    pub fn create_context(&self, name: impl Into<String>) -> MemoContext {
        let name = name.into();
        let id = self.engine.register(&name);
        MemoContext {
            id,
            name,
            engine: Rc::clone(&self.engine),
        }
    }

    /// 以目前的執行框架做位置記憶化
    ///
    /// 沒有執行中的選擇器時回傳 [`MemoError::NoActiveExecution`]。
    pub fn memo<T, F>(&self, compute: F, deps: Vec<Dep>) -> Result<T>
    where
        T: Clone + 'static,
        F: FnOnce() -> T,
    {
        self.engine.memo(None, compute, deps)
    }

    /// 全域鍵記憶化，不需要執行框架
    pub fn global_memo<K, T, F>(&self, key: K, compute: F, deps: Vec<Dep>) -> Result<T>
    where
        K: Hash + Eq + fmt::Debug + 'static,
        T: Clone + 'static,
        F: FnOnce() -> T,
    {
        self.engine.global_memo(GlobalKey::new(key), compute, deps)
    }

    /// 訂閱快取重新計算的通知
    pub fn subscribe_changes(&self, listener: impl Fn() + 'static) -> Unsubscribe {
        self.engine.notifier.subscribe(listener)
    }

    /// 快取狀態快照
    pub fn snapshot(&self) -> CacheSnapshot {
        self.engine.snapshot()
    }

    /// 取出自上次讀取後重新計算過的上下文與全域鍵
    pub fn take_dirty(&self) -> DirtySet {
        self.engine.dirty.borrow_mut().take()
    }

    /// 累計統計
    pub fn stats(&self) -> CacheStats {
        self.engine.stats.get()
    }

    /// 註冊中的上下文數量
    pub fn context_count(&self) -> usize {
        self.engine.contexts.borrow().len()
    }

    /// 是否有選擇器正在執行
    pub fn is_executing(&self) -> bool {
        self.engine.frame.borrow().is_some()
    }

    /// 管理器配置
    pub fn config(&self) -> &MemoConfig {
        &self.engine.config
    }
}

impl Default for MemoManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoManager")
            .field("config", &self.engine.config)
            .field("contexts", &self.context_count())
            .field("global_entries", &self.engine.global.borrow().len())
            .finish()
    }
}

/// 執行上下文
///
/// 代表一個選擇器的訂閱者。必須明確呼叫 [`MemoContext::destroy`] 釋放，
/// 銷毀後再執行或再銷毀都會失敗。
pub struct MemoContext {
    id: ContextId,
    name: String,
    engine: Rc<Engine>,
}

impl MemoContext {
    /// 執行選擇器
    pub fn execute<I, T, F>(&self, selector: F, input: I) -> Result<T>
    where
        F: FnOnce(&MemoTools<'_>, I) -> Result<T>,
    {
        self.engine.execute(self.id, selector, input)
    }

    /// 銷毀上下文並丟棄其快取
    pub fn destroy(&self) -> Result<()> {
        self.engine.destroy(self.id)
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 上下文是否尚未銷毀
    pub fn is_alive(&self) -> bool {
        self.engine.is_alive(&self.id)
    }
}

impl fmt::Debug for MemoContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoContext")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memo_core::deps;
    use rstest::rstest;

    #[test]
    fn test_memo_reuses_result_when_deps_unchanged() {
        let manager = MemoManager::new();
        let ctx = manager.create_context("list");
        let todos = Rc::new(vec![1, 2, 3]);
        let calls = Cell::new(0);

        let select = |tools: &MemoTools<'_>, todos: Rc<Vec<i32>>| {
            tools.memo(
                || {
                    calls.set(calls.get() + 1);
                    Rc::new(todos.iter().map(|t| t * 2).collect::<Vec<_>>())
                },
                deps![&todos],
            )
        };

        let first = ctx.execute(&select, Rc::clone(&todos)).unwrap();
        let second = ctx.execute(&select, Rc::clone(&todos)).unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_memo_recomputes_when_dep_changes() {
        let manager = MemoManager::new();
        let ctx = manager.create_context("list");

        let select =
            |tools: &MemoTools<'_>, n: u32| tools.memo(|| Rc::new(n % 2), deps![n]);

        let first = ctx.execute(select, 2).unwrap();
        let second = ctx.execute(select, 4).unwrap();

        // 值相同但重新計算，引用不同
        assert_eq!(*first, *second);
        assert!(!Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_shape_change_fails_and_keeps_previous_cache() {
        let manager = MemoManager::new();
        let ctx = manager.create_context("shape");

        let select = |tools: &MemoTools<'_>, calls: usize| -> Result<usize> {
            let mut sum = 0;
            for i in 0..calls {
                sum += tools.memo(|| i, deps![i])?;
            }
            Ok(sum)
        };

        assert_eq!(ctx.execute(select, 2).unwrap(), 1);

        let err = ctx.execute(select, 3).unwrap_err();
        assert!(matches!(
            err,
            MemoError::CacheShapeChanged {
                previous: 2,
                current: 3,
                ..
            }
        ));

        // 上次提交的快取不受影響
        assert_eq!(manager.snapshot().contexts[0].entries, Some(2));
        assert_eq!(ctx.execute(select, 2).unwrap(), 1);
        assert_eq!(manager.stats().failed_executions, 1);
    }

    #[test]
    fn test_selector_error_discards_pending_cache() {
        let manager = MemoManager::new();
        let ctx = manager.create_context("failing");

        let result: Result<u32> = ctx.execute(
            |tools, _: ()| {
                tools.memo(|| 1_u32, deps![])?;
                Err(MemoError::NoActiveExecution)
            },
            (),
        );
        assert!(result.is_err());
        assert_eq!(manager.snapshot().contexts[0].entries, None);
        assert!(!manager.is_executing());
    }

    #[test]
    fn test_destroy_then_execute_fails() {
        let manager = MemoManager::new();
        let ctx = manager.create_context("gone");
        ctx.destroy().unwrap();

        assert!(!ctx.is_alive());
        let err = ctx.execute(|_, _: ()| Ok(1), ()).unwrap_err();
        assert!(matches!(err, MemoError::ContextMissing(id) if id == ctx.id()));
        assert!(matches!(ctx.destroy(), Err(MemoError::ContextMissing(_))));
    }

    #[test]
    fn test_destroy_during_execution_fails_commit() {
        let manager = MemoManager::new();
        let ctx = Rc::new(manager.create_context("self-destruct"));
        let inner = Rc::clone(&ctx);

        let err = ctx
            .execute(
                move |tools, _: ()| {
                    let value = tools.memo(|| 1, deps![])?;
                    inner.destroy()?;
                    Ok(value)
                },
                (),
            )
            .unwrap_err();
        assert!(matches!(err, MemoError::ContextMissing(_)));
        assert_eq!(manager.context_count(), 0);
    }

    #[test]
    fn test_reentrant_execute_fails() {
        let manager = MemoManager::new();
        let outer = manager.create_context("outer");
        let other = Rc::new(manager.create_context("other"));
        let nested = Rc::clone(&other);

        let inner_result = outer
            .execute(
                move |tools, _: ()| {
                    // 在計算中觸發另一個上下文的執行
                    tools.memo(|| nested.execute(|_, _: ()| Ok(1), ()).is_err(), deps![])
                },
                (),
            )
            .unwrap();
        assert!(inner_result);

        // 外層框架關閉後可正常執行
        assert_eq!(other.execute(|_, _: ()| Ok(2), ()).unwrap(), 2);
    }

    #[test]
    fn test_reentrant_error_names_both_contexts() {
        let manager = MemoManager::new();
        let outer = manager.create_context("outer");
        let other = Rc::new(manager.create_context("other"));
        let nested = Rc::clone(&other);
        let outer_id = outer.id();

        let err = outer
            .execute(move |_, _: ()| nested.execute(|_, _: ()| Ok(()), ()), ())
            .unwrap_err();
        assert!(matches!(
            err,
            MemoError::Reentrant { active, requested } if active == outer_id && requested == other.id()
        ));
    }

    #[test]
    fn test_nested_execute_shares_positions() {
        let manager = MemoManager::new();
        let ctx = manager.create_context("nested");

        fn inner(tools: &MemoTools<'_>, n: u32) -> Result<u32> {
            tools.memo(|| n + 1, deps![n])
        }

        let outer = |tools: &MemoTools<'_>, n: u32| -> Result<u32> {
            let a = tools.execute(inner, n)?;
            let b = tools.memo(|| a * 10, deps![a])?;
            Ok(b)
        };

        assert_eq!(ctx.execute(outer, 1).unwrap(), 20);
        // 巢狀呼叫的項目記錄在同一個上下文
        assert_eq!(manager.snapshot().contexts[0].entries, Some(2));
        assert_eq!(manager.context_count(), 1);
    }

    #[test]
    fn test_ambient_memo_outside_execution_fails() {
        let manager = MemoManager::new();
        let err = manager.memo(|| 1, deps![]).unwrap_err();
        assert!(matches!(err, MemoError::NoActiveExecution));
    }

    #[test]
    fn test_ambient_memo_inside_execution() {
        let manager = MemoManager::new();
        let ctx = manager.create_context("ambient");
        let handle = manager.clone();
        let calls = Cell::new(0);

        let select = |_: &MemoTools<'_>, n: u32| {
            handle.memo(
                || {
                    calls.set(calls.get() + 1);
                    n
                },
                deps![n],
            )
        };

        assert_eq!(ctx.execute(&select, 5).unwrap(), 5);
        assert_eq!(ctx.execute(&select, 5).unwrap(), 5);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_global_memo_shared_across_contexts() {
        let manager = MemoManager::new();
        let a = manager.create_context("a");
        let b = manager.create_context("b");
        let calls = Cell::new(0);

        let select = |tools: &MemoTools<'_>, id: u32| {
            tools.global_memo(
                ("todo", id),
                || {
                    calls.set(calls.get() + 1);
                    Rc::new(format!("todo-{id}"))
                },
                deps![id],
            )
        };

        let from_a = a.execute(&select, 1).unwrap();
        let from_b = b.execute(&select, 1).unwrap();
        assert!(Rc::ptr_eq(&from_a, &from_b));
        assert_eq!(calls.get(), 1);

        // 不同鍵是獨立的快取位置
        let other = b.execute(&select, 2).unwrap();
        assert!(!Rc::ptr_eq(&from_a, &other));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_global_memo_outside_execution() {
        let manager = MemoManager::new();
        let first: Rc<u32> = manager.global_memo("answer", || Rc::new(42), deps![1]).unwrap();
        let second: Rc<u32> = manager.global_memo("answer", || Rc::new(0), deps![1]).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_result_type_changed() {
        let manager = MemoManager::new();
        manager.global_memo("key", || 1_u32, deps![]).unwrap();
        let err = manager.global_memo("key", || "text", deps![]).unwrap_err();
        assert!(matches!(err, MemoError::GlobalResultTypeChanged { .. }));

        let ctx = manager.create_context("typed");
        ctx.execute(|tools, _: ()| tools.memo(|| 1_u32, deps![]), ()).unwrap();
        let err = ctx
            .execute(|tools, _: ()| tools.memo(|| 1_i64, deps![]), ())
            .unwrap_err();
        assert!(matches!(err, MemoError::ResultTypeChanged { position: 0 }));
    }

    #[test]
    fn test_one_notification_per_recompute() {
        let manager = MemoManager::new();
        let ctx = manager.create_context("notify");
        let notified = Rc::new(Cell::new(0_u64));
        let observed_executing = Rc::new(Cell::new(false));

        let watcher = manager.clone();
        let count = Rc::clone(&notified);
        let executing = Rc::clone(&observed_executing);
        let _handle = manager.subscribe_changes(move || {
            count.set(count.get() + 1);
            executing.set(watcher.is_executing());
        });

        let select = |tools: &MemoTools<'_>, n: u32| -> Result<u32> {
            let a = tools.memo(|| n, deps![n])?;
            let b = tools.memo(|| n + 1, deps![n])?;
            let c = tools.global_memo("shared", || n * 2, deps![n])?;
            Ok(a + b + c)
        };

        ctx.execute(select, 1).unwrap();
        assert_eq!(manager.stats().misses, 3);
        assert_eq!(notified.get(), 3);
        // 通知在框架關閉後送出
        assert!(!observed_executing.get());

        // 全部命中，不通知
        ctx.execute(select, 1).unwrap();
        assert_eq!(notified.get(), 3);

        ctx.execute(select, 2).unwrap();
        assert_eq!(notified.get(), 6);
        assert_eq!(notified.get(), manager.stats().misses);

        // 框架外的全域計算立即通知
        manager.global_memo("outside", || 0, deps![]).unwrap();
        assert_eq!(notified.get(), 7);
    }

    #[test]
    fn test_failed_execution_still_notifies_recomputes() {
        let manager = MemoManager::new();
        let ctx = manager.create_context("failing");
        let notified = Rc::new(Cell::new(0));
        let count = Rc::clone(&notified);
        manager.subscribe_changes(move || count.set(count.get() + 1));

        let result: Result<()> = ctx.execute(
            |tools, _: ()| {
                tools.memo(|| 1, deps![])?;
                tools.memo(|| 2, deps![])?;
                Err(MemoError::NoActiveExecution)
            },
            (),
        );
        assert!(result.is_err());
        assert_eq!(notified.get(), 2);
    }

    #[test]
    fn test_panicking_selector_releases_frame() {
        let manager = MemoManager::new();
        let ctx = manager.create_context("panic");
        let notified = Rc::new(Cell::new(0));
        let count = Rc::clone(&notified);
        manager.subscribe_changes(move || count.set(count.get() + 1));

        let select = |tools: &MemoTools<'_>, n: u32| tools.memo(|| Rc::new(n), deps![n]);
        let committed = ctx.execute(select, 1).unwrap();
        assert_eq!(notified.get(), 1);

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            ctx.execute(
                |tools, n: u32| -> Result<Rc<u32>> {
                    // 重新計算後才 panic
                    tools.memo(|| Rc::new(n), deps![n])?;
                    panic!("selector failed");
                },
                2,
            )
        }));
        assert!(outcome.is_err());
        assert!(!manager.is_executing());
        assert_eq!(manager.snapshot().contexts[0].entries, Some(1));

        // 上次提交的快取仍然命中，也沒有殘留的通知
        let after = ctx.execute(select, 1).unwrap();
        assert!(Rc::ptr_eq(&committed, &after));
        assert_eq!(notified.get(), 1);
    }

    #[test]
    fn test_listener_can_execute_after_notification() {
        let manager = MemoManager::new();
        let ctx = manager.create_context("source");
        let observer = Rc::new(manager.create_context("observer"));
        let seen = Rc::new(Cell::new(0_u32));

        let observer_ctx = Rc::clone(&observer);
        let sink = Rc::clone(&seen);
        manager.subscribe_changes(move || {
            let value = observer_ctx
                .execute(|tools, _: ()| tools.global_memo("shared", || 0_u32, deps![]), ())
                .unwrap();
            sink.set(value);
        });

        ctx.execute(|tools, _: ()| tools.global_memo("shared", || 7_u32, deps![]), ())
            .unwrap();
        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn test_notifications_disabled() {
        let manager = MemoManager::with_config(MemoConfig::new().with_notifications(false)).unwrap();
        let notified = Rc::new(Cell::new(false));
        let flag = Rc::clone(&notified);
        manager.subscribe_changes(move || flag.set(true));

        manager.global_memo("k", || 1, deps![]).unwrap();
        assert!(!notified.get());
    }

    #[test]
    fn test_dirty_tracking() {
        let manager = MemoManager::new();
        let ctx = manager.create_context("dirty");

        ctx.execute(|tools, _: ()| tools.memo(|| 1, deps![]), ()).unwrap();
        manager.global_memo("g", || 1, deps![]).unwrap();

        let dirty = manager.take_dirty();
        assert_eq!(dirty.contexts, vec![ctx.id()]);
        assert_eq!(dirty.global_keys, vec![GlobalKey::new("g")]);

        ctx.execute(|tools, _: ()| tools.memo(|| 1, deps![]), ()).unwrap();
        assert!(manager.take_dirty().is_empty());
    }

    #[rstest]
    #[case(MemoConfig::new().with_global_capacity(0), false)]
    #[case(MemoConfig::new().with_global_capacity(1), true)]
    #[case(MemoConfig::new(), true)]
    fn test_with_config_validates(#[case] config: MemoConfig, #[case] ok: bool) {
        assert_eq!(MemoManager::with_config(config).is_ok(), ok);
    }

    #[test]
    fn test_global_capacity_evicts() {
        let manager = MemoManager::with_config(MemoConfig::new().with_global_capacity(2)).unwrap();
        for key in 0..3_u32 {
            manager.global_memo(key, || key, deps![]).unwrap();
        }

        let snapshot = manager.snapshot();
        assert_eq!(snapshot.global_entries, 2);
        assert_eq!(snapshot.global_capacity, Some(2));
        assert_eq!(snapshot.stats.evictions, 1);
    }

    #[test]
    fn test_same_name_contexts_are_independent() {
        let manager = MemoManager::new();
        let a = manager.create_context("Todo");
        let b = manager.create_context("Todo");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.name(), b.name());

        a.destroy().unwrap();
        assert!(b.is_alive());
        assert_eq!(manager.context_count(), 1);
    }
}
