//! 快取狀態快照與統計

use chrono::{DateTime, Utc};
use memo_core::ContextId;
use serde::{Deserialize, Serialize};

/// 累計統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// 命中次數（上下文與全域）
    pub hits: u64,
    /// 重新計算次數
    pub misses: u64,
    /// 全域快取淘汰次數
    pub evictions: u64,
    /// 頂層執行次數
    pub executions: u64,
    /// 失敗的頂層執行次數
    pub failed_executions: u64,
}

impl CacheStats {
    /// 命中率（尚無查詢時為 0）
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }
        self.hits as f64 / lookups as f64
    }
}

/// 單一上下文摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSummary {
    pub id: ContextId,
    pub name: String,
    /// 已提交的快取項目數（從未成功執行時為 `None`）
    pub entries: Option<usize>,
}

/// 快取狀態快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// 依建立順序排列的上下文
    pub contexts: Vec<ContextSummary>,
    pub global_entries: usize,
    pub global_capacity: Option<usize>,
    /// 正在執行的上下文
    pub executing: Option<ContextId>,
    pub stats: CacheStats,
    pub captured_at: DateTime<Utc>,
}

impl CacheSnapshot {
    /// 依ID查詢上下文摘要
    pub fn context(&self, id: &ContextId) -> Option<&ContextSummary> {
        self.contexts.iter().find(|summary| summary.id == *id)
    }

    /// 輸出為 JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
