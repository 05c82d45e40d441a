//! 依賴比較
//!
//! 依賴列表以位置逐一比較：基本值比較值，引用只比較身分（指標）。
//! 不會遞迴比較巢狀結構，容器引用不變時內部欄位的變更不會被偵測到。

use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// 單一依賴值
#[derive(Clone)]
pub enum Dep {
    /// 空值
    Unit,
    Bool(bool),
    Int(i64),
    UInt(u64),
    /// 浮點數（IEEE 比較，`NaN` 不等於自身）
    Float(f64),
    Char(char),
    /// 字串以值比較
    Str(Rc<str>),
    /// 物件引用，只比較指標身分
    ///
    /// 持有 `Rc` 可確保被依賴的物件在快取存活期間不會被釋放，
    /// 因此位址不會被新配置重複使用。
    Ref(Rc<dyn Any>),
    /// 不定長物件（`Rc<str>`、`Rc<[T]>` 等）的引用，只比較指標身分
    ///
    /// `owner` 保存一份 `Rc` 複本，讓位址在快取存活期間保持有效。
    Shared {
        addr: *const (),
        owner: Rc<dyn Any>,
    },
}

impl Dep {
    /// 以引用身分建立依賴
    pub fn by_ref<T: 'static>(value: &Rc<T>) -> Self {
        let erased: Rc<dyn Any> = Rc::clone(value) as Rc<dyn Any>;
        Dep::Ref(erased)
    }

    /// 以引用身分建立依賴，也接受不定長的 `Rc<str>`、`Rc<[T]>`
    ///
    /// 會額外配置一個持有者，定長類型請用 [`Dep::by_ref`]。
    pub fn by_shared<T: ?Sized + 'static>(value: &Rc<T>) -> Self {
        Dep::Shared {
            addr: Rc::as_ptr(value) as *const (),
            owner: Rc::new(Rc::clone(value)),
        }
    }

    /// 兩個依賴是否視為相同
    pub fn same(&self, other: &Dep) -> bool {
        match (self, other) {
            (Dep::Unit, Dep::Unit) => true,
            (Dep::Bool(a), Dep::Bool(b)) => a == b,
            (Dep::Int(a), Dep::Int(b)) => a == b,
            (Dep::UInt(a), Dep::UInt(b)) => a == b,
            // 有號與無號整數以數值比較
            (Dep::Int(a), Dep::UInt(b)) | (Dep::UInt(b), Dep::Int(a)) => {
                u64::try_from(*a).is_ok_and(|a| a == *b)
            }
            (Dep::Float(a), Dep::Float(b)) => a == b,
            (Dep::Char(a), Dep::Char(b)) => a == b,
            (Dep::Str(a), Dep::Str(b)) => a == b,
            (Dep::Ref(a), Dep::Ref(b)) => {
                Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
            }
            (Dep::Shared { addr: a, .. }, Dep::Shared { addr: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dep::Unit => f.write_str("Unit"),
            Dep::Bool(v) => write!(f, "Bool({v})"),
            Dep::Int(v) => write!(f, "Int({v})"),
            Dep::UInt(v) => write!(f, "UInt({v})"),
            Dep::Float(v) => write!(f, "Float({v})"),
            Dep::Char(v) => write!(f, "Char({v:?})"),
            Dep::Str(v) => write!(f, "Str({v:?})"),
            Dep::Ref(v) => write!(f, "Ref({:p})", Rc::as_ptr(v) as *const ()),
            Dep::Shared { addr, .. } => write!(f, "Shared({addr:p})"),
        }
    }
}

/// 淺層比較兩個依賴列表：長度相同且每個位置都相同
pub fn shallow_equal(left: &[Dep], right: &[Dep]) -> bool {
    left.len() == right.len() && left.iter().zip(right).all(|(l, r)| l.same(r))
}

macro_rules! dep_from_signed {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Dep {
            fn from(value: $ty) -> Self {
                Dep::Int(i64::from(value))
            }
        })*
    };
}

macro_rules! dep_from_unsigned {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Dep {
            fn from(value: $ty) -> Self {
                Dep::UInt(value as u64)
            }
        })*
    };
}

dep_from_signed!(i8, i16, i32, i64);
dep_from_unsigned!(u8, u16, u32, u64, usize);

impl From<isize> for Dep {
    fn from(value: isize) -> Self {
        Dep::Int(value as i64)
    }
}

impl From<()> for Dep {
    fn from(_: ()) -> Self {
        Dep::Unit
    }
}

impl From<bool> for Dep {
    fn from(value: bool) -> Self {
        Dep::Bool(value)
    }
}

impl From<f32> for Dep {
    fn from(value: f32) -> Self {
        Dep::Float(f64::from(value))
    }
}

impl From<f64> for Dep {
    fn from(value: f64) -> Self {
        Dep::Float(value)
    }
}

impl From<char> for Dep {
    fn from(value: char) -> Self {
        Dep::Char(value)
    }
}

impl From<&str> for Dep {
    fn from(value: &str) -> Self {
        Dep::Str(Rc::from(value))
    }
}

impl From<String> for Dep {
    fn from(value: String) -> Self {
        Dep::Str(Rc::from(value))
    }
}

impl<T: 'static> From<&Rc<T>> for Dep {
    fn from(value: &Rc<T>) -> Self {
        Dep::by_ref(value)
    }
}

impl<T: 'static> From<Rc<T>> for Dep {
    fn from(value: Rc<T>) -> Self {
        Dep::Ref(value as Rc<dyn Any>)
    }
}

impl From<&Rc<str>> for Dep {
    fn from(value: &Rc<str>) -> Self {
        Dep::by_shared(value)
    }
}

impl From<Rc<str>> for Dep {
    fn from(value: Rc<str>) -> Self {
        Dep::by_shared(&value)
    }
}

impl<T: 'static> From<&Rc<[T]>> for Dep {
    fn from(value: &Rc<[T]>) -> Self {
        Dep::by_shared(value)
    }
}

impl<T: 'static> From<Rc<[T]>> for Dep {
    fn from(value: Rc<[T]>) -> Self {
        Dep::by_shared(&value)
    }
}

/// `None` 視為 [`Dep::Unit`]
impl<D: Into<Dep>> From<Option<D>> for Dep {
    fn from(value: Option<D>) -> Self {
        value.map_or(Dep::Unit, Into::into)
    }
}

/// 建立依賴列表
///
/// ```
/// use std::rc::Rc;
/// use memo_core::{deps, shallow_equal};
///
/// let todos = Rc::new(vec![1, 2, 3]);
/// let a = deps![&todos, true, 7];
/// let b = deps![&todos, true, 7];
/// assert!(shallow_equal(&a, &b));
/// ```
#[macro_export]
macro_rules! deps {
    () => {
        ::std::vec::Vec::<$crate::Dep>::new()
    };
    ($($dep:expr),+ $(,)?) => {
        ::std::vec![$($crate::Dep::from($dep)),+]
    };
}

/// 結果身分比較
///
/// 消費端用來判斷兩次執行的結果是否「相同」：`Rc` 比較指標，基本值比較值。
pub trait SameAs {
    fn same_as(&self, other: &Self) -> bool;
}

impl<T: ?Sized> SameAs for Rc<T> {
    fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: SameAs> SameAs for Option<T> {
    fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_as(b),
            (None, None) => true,
            _ => false,
        }
    }
}

macro_rules! same_as_by_value {
    ($($ty:ty),*) => {
        $(impl SameAs for $ty {
            fn same_as(&self, other: &Self) -> bool {
                self == other
            }
        })*
    };
}

same_as_by_value!(
    (), bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String,
    &'static str
);
