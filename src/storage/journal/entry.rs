use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::Result;
use crate::storage::models::OwnerId;

/// 日志中的一行
///
/// 注册行不带 `deleted` 字段；软删除行写 `"deleted": true`。
/// 一次追加多行时，每行带相同的 `batch` 和总行数 `batch_size`，
/// 回放时只应用完整的批次。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub uuid: String,
    pub short_url: String,
    pub original_url: String,
    pub user_id: OwnerId,
    #[serde(default, skip_serializing_if = "is_false")]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl JournalEntry {
    pub fn registration(
        owner: OwnerId,
        alias: impl Into<String>,
        original_url: impl Into<String>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            short_url: alias.into(),
            original_url: original_url.into(),
            user_id: owner,
            deleted: false,
            batch: None,
            batch_size: None,
        }
    }

    pub fn deletion(
        owner: OwnerId,
        alias: impl Into<String>,
        original_url: impl Into<String>,
    ) -> Self {
        Self {
            deleted: true,
            ..Self::registration(owner, alias, original_url)
        }
    }

    pub fn parse(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }
}

/// 把多条记录编码为一个连续的缓冲区，每条以换行结尾
///
/// 多于一条时为整组打上同一个批次标记。
pub(crate) fn encode_lines(entries: &[JournalEntry]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(entries.len() * 160);
    if let [entry] = entries {
        serde_json::to_writer(&mut buf, entry)?;
        buf.push(b'\n');
        return Ok(buf);
    }

    let batch = Uuid::new_v4().to_string();
    for entry in entries {
        let sealed = JournalEntry {
            batch: Some(batch.clone()),
            batch_size: Some(entries.len()),
            ..entry.clone()
        };
        serde_json::to_writer(&mut buf, &sealed)?;
        buf.push(b'\n');
    }
    Ok(buf)
}
