//! 執行上下文識別

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 執行上下文ID
///
/// 每次建立都會產生新的識別，即使名稱相同也不會衝突。名稱只用於診斷，
/// 不參與相等比較。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(Uuid);

impl ContextId {
    /// 產生新的上下文ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// 底層 UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}
