use serde::{Deserialize, Serialize};

/// 调用方提供的用户标识，核心层不做校验
pub type OwnerId = i64;

/// 规范记录：原始 URL 与短码的一一对应
///
/// `deleted` 在 `read` / `read_by_original_url` 的返回中恒为 `false`，
/// 在 `read_by_owner` 的返回中表示该用户视角下是否已删除。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub original_url: String,
    pub alias: String,
    #[serde(default)]
    pub deleted: bool,
}

impl Record {
    pub fn new(original_url: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            alias: alias.into(),
            deleted: false,
        }
    }

    pub(crate) fn with_deleted(mut self, deleted: bool) -> Self {
        self.deleted = deleted;
        self
    }
}

/// 统计信息，按需计算
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_urls: i64,
    pub total_users: i64,
}
