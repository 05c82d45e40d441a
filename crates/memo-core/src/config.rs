//! 記憶化引擎配置

use serde::{Deserialize, Serialize};

use crate::{MemoError, Result};

/// 記憶化引擎配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoConfig {
    /// 快取重新計算時是否發出變更通知
    pub notify_on_recompute: bool,

    /// 全域快取容量上限
    ///
    /// - `None`: 不淘汰（預設），項目存活到管理器被丟棄為止
    /// - `Some(n)`: 超過 n 筆時淘汰最久未使用的項目
    pub global_capacity: Option<usize>,

    /// 是否記錄自上次讀取後重新計算過的上下文與全域鍵
    pub track_dirty: bool,
}

impl MemoConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self {
            notify_on_recompute: true,
            global_capacity: None,
            track_dirty: true,
        }
    }

    /// 從 JSON 讀取配置
    ///
    /// ```
    /// # use memo_core::MemoConfig;
    /// let config = MemoConfig::from_json_str(r#"{ "global_capacity": 32 }"#).unwrap();
    /// assert_eq!(config.global_capacity, Some(32));
    /// assert!(config.notify_on_recompute);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| MemoError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 建構器模式：設置是否發出變更通知
    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.notify_on_recompute = enabled;
        self
    }

    /// 建構器模式：設置全域快取容量
    pub fn with_global_capacity(mut self, capacity: usize) -> Self {
        self.global_capacity = Some(capacity);
        self
    }

    /// 建構器模式：設置是否追蹤髒標記
    pub fn with_dirty_tracking(mut self, enabled: bool) -> Self {
        self.track_dirty = enabled;
        self
    }

    /// 檢查配置是否有效
    pub fn validate(&self) -> Result<()> {
        if self.global_capacity == Some(0) {
            return Err(MemoError::Config("全域快取容量必須大於 0".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self::new()
    }
}
