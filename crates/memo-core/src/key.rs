//! 全域快取鍵
//!
//! 任意 `Hash + Eq + Debug` 的值都可以作為全域鍵（字串、整數、元組、
//! 作為選擇器標籤的單元結構）。不同 Rust 類型的鍵永遠不相等。

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

trait KeyObject: fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn eq_key(&self, other: &dyn KeyObject) -> bool;
    fn hash_key(&self, state: &mut dyn Hasher);
}

impl<K> KeyObject for K
where
    K: Hash + Eq + fmt::Debug + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_key(&self, other: &dyn KeyObject) -> bool {
        other
            .as_any()
            .downcast_ref::<K>()
            .is_some_and(|other| other == self)
    }

    fn hash_key(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<K>().hash(&mut state);
        self.hash(&mut state);
    }
}

/// 類型抹除的全域鍵
#[derive(Clone)]
pub struct GlobalKey(Rc<dyn KeyObject>);

impl GlobalKey {
    /// 包裝任意鍵值
    pub fn new<K>(key: K) -> Self
    where
        K: Hash + Eq + fmt::Debug + 'static,
    {
        Self(Rc::new(key))
    }

    /// 取回原始鍵值（類型不符時為 `None`）
    pub fn downcast_ref<K: 'static>(&self) -> Option<&K> {
        self.0.as_any().downcast_ref::<K>()
    }
}

impl PartialEq for GlobalKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_key(other.0.as_ref())
    }
}

impl Eq for GlobalKey {}

impl Hash for GlobalKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash_key(state);
    }
}

impl fmt::Debug for GlobalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0.as_ref(), f)
    }
}
