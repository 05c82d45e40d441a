//! # Memo Store
//!
//! 將記憶化管理器綁定到外部狀態容器：每次執行自動取得目前狀態快照，
//! 並提供在同一快照下呼叫其他選擇器的巢狀 `execute`。

pub mod connection;
pub mod manager;
pub mod store;

// Re-export 主要類型
pub use connection::Connection;
pub use manager::{StoreMemoContext, StoreMemoManager, StoreTools};
pub use store::{SimpleStore, Store};
