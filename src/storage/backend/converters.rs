use chrono::{DateTime, Utc};

use crate::storage::models::{OwnerId, Record};
use migration::entities::{short_url, user_url};

/// 将 short_urls 行转换为 Record（`deleted` 恒为 false）
pub fn model_to_record(model: short_url::Model) -> Record {
    Record::new(model.original_url, model.alias)
}

/// 将 Record 转换为 ActiveModel（仅用于插入）
pub fn record_to_active_model(record: &Record, now: DateTime<Utc>) -> short_url::ActiveModel {
    use sea_orm::ActiveValue::*;

    short_url::ActiveModel {
        alias: Set(record.alias.clone()),
        original_url: Set(record.original_url.clone()),
        created_at: Set(now),
    }
}

/// 新的归属关系，初始未删除
pub fn ownership_active_model(
    owner: OwnerId,
    alias: &str,
    now: DateTime<Utc>,
) -> user_url::ActiveModel {
    use sea_orm::ActiveValue::*;

    user_url::ActiveModel {
        id: NotSet,
        user_id: Set(owner),
        alias: Set(alias.to_string()),
        deleted: Set(false),
        created_at: Set(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ActiveValue;

    #[test]
    fn test_model_to_record_is_not_deleted() {
        let model = short_url::Model {
            alias: "abc123".to_string(),
            original_url: "https://example.com/".to_string(),
            created_at: Utc::now(),
        };

        let record = model_to_record(model);
        assert_eq!(record.alias, "abc123");
        assert_eq!(record.original_url, "https://example.com/");
        assert!(!record.deleted);
    }

    #[test]
    fn test_record_to_active_model_sets_all_columns() {
        let now = Utc::now();
        let record = Record::new("https://example.com/", "xyz789");
        let active_model = record_to_active_model(&record, now);

        assert!(matches!(active_model.alias, ActiveValue::Set(ref a) if a == "xyz789"));
        assert!(matches!(
            active_model.original_url,
            ActiveValue::Set(ref u) if u == "https://example.com/"
        ));
        assert!(matches!(active_model.created_at, ActiveValue::Set(t) if t == now));
    }

    #[test]
    fn test_ownership_starts_undeleted() {
        let active_model = ownership_active_model(42, "xyz789", Utc::now());
        assert!(matches!(active_model.id, ActiveValue::NotSet));
        assert!(matches!(active_model.user_id, ActiveValue::Set(42)));
        assert!(matches!(active_model.deleted, ActiveValue::Set(false)));
    }
}
