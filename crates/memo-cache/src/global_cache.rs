//! 全域鍵快取
//!
//! 項目不屬於任何上下文，預設存活到管理器被丟棄為止（不淘汰）。
//! 設定容量時改為淘汰最久未使用的項目。

use memo_core::GlobalKey;
use std::collections::HashMap;
use std::rc::Rc;

use crate::CacheEntry;

#[derive(Debug)]
struct GlobalSlot {
    entry: Rc<CacheEntry>,
    last_used: u64,
}

/// 全域快取
#[derive(Debug, Default)]
pub struct GlobalCache {
    slots: HashMap<GlobalKey, GlobalSlot>,
    capacity: Option<usize>,
    clock: u64,
}

impl GlobalCache {
    /// 創建不淘汰的全域快取
    pub fn new() -> Self {
        Self::default()
    }

    /// 創建有容量上限的全域快取
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// 查詢項目並更新使用時間
    pub fn get(&mut self, key: &GlobalKey) -> Option<Rc<CacheEntry>> {
        self.clock += 1;
        let now = self.clock;
        self.slots.get_mut(key).map(|slot| {
            slot.last_used = now;
            Rc::clone(&slot.entry)
        })
    }

    /// 寫入項目，回傳因容量上限被淘汰的鍵
    pub fn insert(&mut self, key: GlobalKey, entry: Rc<CacheEntry>) -> Option<GlobalKey> {
        self.clock += 1;
        self.slots.insert(
            key,
            GlobalSlot {
                entry,
                last_used: self.clock,
            },
        );

        let capacity = self.capacity?;
        if self.slots.len() <= capacity {
            return None;
        }

        // 容量通常很小，線性掃描即可
        let oldest = self
            .slots
            .iter()
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(key, _)| key.clone())?;
        self.slots.remove(&oldest);
        tracing::trace!("全域快取淘汰: {:?}", oldest);
        Some(oldest)
    }

    pub fn contains(&self, key: &GlobalKey) -> bool {
        self.slots.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 容量上限
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memo_core::deps;
    use rstest::rstest;

    fn entry(value: u32) -> Rc<CacheEntry> {
        Rc::new(CacheEntry::new(deps![value], value))
    }

    #[test]
    fn test_unbounded_never_evicts() {
        let mut cache = GlobalCache::new();
        for i in 0..100_u32 {
            assert!(cache.insert(GlobalKey::new(i), entry(i)).is_none());
        }
        assert_eq!(cache.len(), 100);
        assert_eq!(cache.capacity(), None);
    }

    #[test]
    fn test_replace_same_key() {
        let mut cache = GlobalCache::new();
        cache.insert(GlobalKey::new("visible"), entry(1));
        cache.insert(GlobalKey::new("visible"), entry(2));

        assert_eq!(cache.len(), 1);
        let found = cache.get(&GlobalKey::new("visible")).unwrap();
        assert_eq!(found.result::<u32>(), Some(2));
    }

    #[test]
    fn test_lru_evicts_least_recently_used() {
        let mut cache = GlobalCache::with_capacity(Some(2));
        cache.insert(GlobalKey::new(1_u32), entry(1));
        cache.insert(GlobalKey::new(2_u32), entry(2));

        // 讀取 1 之後，2 成為最久未使用
        assert!(cache.get(&GlobalKey::new(1_u32)).is_some());

        let evicted = cache.insert(GlobalKey::new(3_u32), entry(3));
        assert_eq!(evicted, Some(GlobalKey::new(2_u32)));
        assert!(cache.contains(&GlobalKey::new(1_u32)));
        assert!(!cache.contains(&GlobalKey::new(2_u32)));
        assert!(cache.contains(&GlobalKey::new(3_u32)));
    }

    #[rstest]
    #[case(1, 5, 1)]
    #[case(3, 5, 3)]
    #[case(8, 5, 5)]
    fn test_len_never_exceeds_capacity(
        #[case] capacity: usize,
        #[case] inserts: u32,
        #[case] expected_len: usize,
    ) {
        let mut cache = GlobalCache::with_capacity(Some(capacity));
        for i in 0..inserts {
            cache.insert(GlobalKey::new(i), entry(i));
        }
        assert_eq!(cache.len(), expected_len);
    }
}
