//! 上下文位置快取
//!
//! 每個上下文保存最近一次成功執行所產生的快取項目序列，只以呼叫順序（位置）
//! 索引。`PendingCache` 是執行中的新序列，成功完成後才會取代已提交的序列。

use memo_core::ContextId;
use std::collections::HashMap;
use std::rc::Rc;

use crate::CacheEntry;

/// 已提交的快取序列
pub type CommittedCache = Rc<[Rc<CacheEntry>]>;

/// 單一上下文的註冊資訊
#[derive(Debug)]
pub struct ContextSlot {
    /// 診斷用名稱
    pub name: String,

    /// 建立順序
    pub seq: u64,

    /// 已提交的快取（`None` 表示從未成功執行）
    pub entries: Option<CommittedCache>,
}

/// 上下文註冊表
#[derive(Debug, Default)]
pub struct ContextCache {
    slots: HashMap<ContextId, ContextSlot>,
    next_seq: u64,
}

impl ContextCache {
    /// 創建空的註冊表
    pub fn new() -> Self {
        Self::default()
    }

    /// 註冊新的上下文（尚無快取）
    pub fn register(&mut self, id: ContextId, name: String) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.slots.insert(
            id,
            ContextSlot {
                name,
                seq,
                entries: None,
            },
        );
    }

    /// 移除上下文，回傳是否存在
    pub fn remove(&mut self, id: &ContextId) -> bool {
        self.slots.remove(id).is_some()
    }

    /// 上下文是否仍註冊中
    pub fn contains(&self, id: &ContextId) -> bool {
        self.slots.contains_key(id)
    }

    /// 取得上下文資訊
    pub fn get(&self, id: &ContextId) -> Option<&ContextSlot> {
        self.slots.get(id)
    }

    /// 提交新的快取序列，回傳是否成功（上下文不存在時失敗）
    pub fn commit(&mut self, id: &ContextId, entries: Vec<Rc<CacheEntry>>) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) => {
                slot.entries = Some(entries.into());
                true
            }
            None => false,
        }
    }

    /// 依建立順序列出所有上下文
    pub fn iter_ordered(&self) -> Vec<(&ContextId, &ContextSlot)> {
        let mut slots: Vec<_> = self.slots.iter().collect();
        slots.sort_by_key(|(_, slot)| slot.seq);
        slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// 執行中的快取序列
///
/// 每次 `memo` 呼叫先保留位置再執行計算，因此計算內部再呼叫 `memo`
/// 時，外層呼叫的位置仍然固定。
#[derive(Debug)]
pub struct PendingCache {
    prior: Option<CommittedCache>,
    next: Vec<Option<Rc<CacheEntry>>>,
}

impl PendingCache {
    /// 以上次提交的快取建立
    pub fn new(prior: Option<CommittedCache>) -> Self {
        Self {
            prior,
            next: Vec::new(),
        }
    }

    /// 保留下一個位置，回傳位置與上次同位置的項目
    pub fn reserve(&mut self) -> (usize, Option<Rc<CacheEntry>>) {
        let position = self.next.len();
        self.next.push(None);
        let prior = self
            .prior
            .as_ref()
            .and_then(|entries| entries.get(position))
            .cloned();
        (position, prior)
    }

    /// 填入保留的位置
    pub fn fill(&mut self, position: usize, entry: Rc<CacheEntry>) {
        if let Some(slot) = self.next.get_mut(position) {
            *slot = Some(entry);
        }
    }

    /// 目前已保留的位置數
    pub fn len(&self) -> usize {
        self.next.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next.is_empty()
    }

    /// 上次提交的項目數（從未執行時為 `None`）
    pub fn prior_len(&self) -> Option<usize> {
        self.prior.as_ref().map(|entries| entries.len())
    }

    /// 完成執行，取得新的快取序列
    ///
    /// 若有位置未被填入，回傳第一個空位置。
    pub fn finish(self) -> Result<Vec<Rc<CacheEntry>>, usize> {
        self.next
            .into_iter()
            .enumerate()
            .map(|(position, entry)| entry.ok_or(position))
            .collect()
    }
}
