//! # Memo Core
//!
//! 核心資料模型與類型定義：依賴比較、全域鍵、上下文識別與配置

pub mod config;
pub mod context;
pub mod deps;
pub mod key;

// Re-export 主要類型
pub use config::MemoConfig;
pub use context::ContextId;
pub use deps::{shallow_equal, Dep, SameAs};
pub use key::GlobalKey;

/// 記憶化引擎錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum MemoError {
    #[error("找不到執行上下文（已銷毀或不屬於此管理器）: {0}")]
    ContextMissing(ContextId),

    #[error("已有執行中的選擇器（上下文 {active}），不允許重入執行上下文 {requested}")]
    Reentrant {
        active: ContextId,
        requested: ContextId,
    },

    #[error("目前沒有執行中的選擇器")]
    NoActiveExecution,

    #[error("上下文 {context} 的快取形狀改變: 上次 {previous} 筆，本次 {current} 筆")]
    CacheShapeChanged {
        context: ContextId,
        previous: usize,
        current: usize,
    },

    #[error("位置 {position} 的快取結果類型與呼叫端不符")]
    ResultTypeChanged { position: usize },

    #[error("全域鍵 {key} 的快取結果類型與呼叫端不符")]
    GlobalResultTypeChanged { key: String },

    #[error("配置錯誤: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MemoError>;
