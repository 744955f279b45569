//! Volatile in-process store
//!
//! One `RwLock` guards the whole index, so writers are globally serialized and
//! a batch is never observed half-applied. Mutations are split into a read-only
//! planning step and an apply step; the journaled store reuses that split to
//! append to disk between the two.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use super::models::{OwnerId, Record, Stats};
use super::RecordStore;
use crate::errors::{Result, ShortenerError};

/// 一条注册请求在当前索引上的效果
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PlannedAdd {
    /// 新建记录并归属给调用者
    Create(Record),
    /// URL 已存在，为调用者新增归属
    Own { alias: String, original_url: String },
    /// URL 已存在且调用者已拥有
    Unchanged { alias: String },
}

impl PlannedAdd {
    pub(crate) fn alias(&self) -> &str {
        match self {
            PlannedAdd::Create(record) => &record.alias,
            PlannedAdd::Own { alias, .. } | PlannedAdd::Unchanged { alias } => alias,
        }
    }

    pub(crate) fn original_url(&self) -> Option<&str> {
        match self {
            PlannedAdd::Create(record) => Some(&record.original_url),
            PlannedAdd::Own { original_url, .. } => Some(original_url),
            PlannedAdd::Unchanged { .. } => None,
        }
    }
}

/// 单条 add 的结果：新建为 Ok，其余返回规范短码
pub(crate) fn single_outcome(plan: &[PlannedAdd]) -> Result<()> {
    match plan.first() {
        Some(PlannedAdd::Create(_)) => Ok(()),
        Some(other) => Err(ShortenerError::already_exists(other.alias())),
        None => Ok(()),
    }
}

#[derive(Debug, Default)]
pub(crate) struct Index {
    /// alias -> record
    records: HashMap<String, Record>,
    /// owner -> aliases，按注册顺序
    owned: HashMap<OwnerId, Vec<String>>,
    /// (owner, alias) 删除标记
    deleted: HashSet<(OwnerId, String)>,
}

impl Index {
    /// 线性扫描，内存后端的已知限制
    fn find_by_url(&self, original_url: &str) -> Option<&Record> {
        self.records
            .values()
            .find(|record| record.original_url == original_url)
    }

    fn owns(&self, owner: OwnerId, alias: &str) -> bool {
        self.owned
            .get(&owner)
            .is_some_and(|aliases| aliases.iter().any(|a| a == alias))
    }

    fn is_deleted(&self, owner: OwnerId, alias: &str) -> bool {
        self.deleted.contains(&(owner, alias.to_string()))
    }

    /// 依次对每条记录应用 add 语义，但不修改索引
    ///
    /// 同一批次内先出现的记录对后续记录可见。
    pub(crate) fn plan_batch(&self, records: &[Record], owner: OwnerId) -> Result<Vec<PlannedAdd>> {
        let mut pending_by_url: HashMap<&str, &str> = HashMap::new();
        let mut pending_aliases: HashSet<&str> = HashSet::new();
        let mut pending_owned: HashSet<&str> = HashSet::new();
        let mut plan = Vec::with_capacity(records.len());

        for record in records {
            let existing = pending_by_url
                .get(record.original_url.as_str())
                .copied()
                .or_else(|| {
                    self.find_by_url(&record.original_url)
                        .map(|found| found.alias.as_str())
                });

            match existing {
                Some(alias) if self.owns(owner, alias) || pending_owned.contains(alias) => {
                    plan.push(PlannedAdd::Unchanged {
                        alias: alias.to_string(),
                    });
                }
                Some(alias) => {
                    pending_owned.insert(alias);
                    plan.push(PlannedAdd::Own {
                        alias: alias.to_string(),
                        original_url: record.original_url.clone(),
                    });
                }
                None => {
                    if self.records.contains_key(&record.alias)
                        || pending_aliases.contains(record.alias.as_str())
                    {
                        return Err(ShortenerError::alias_collision(record.alias.clone()));
                    }
                    pending_by_url.insert(&record.original_url, &record.alias);
                    pending_aliases.insert(&record.alias);
                    pending_owned.insert(&record.alias);
                    plan.push(PlannedAdd::Create(record.clone().with_deleted(false)));
                }
            }
        }

        Ok(plan)
    }

    pub(crate) fn apply(&mut self, owner: OwnerId, plan: &[PlannedAdd]) {
        for step in plan {
            match step {
                PlannedAdd::Create(record) => {
                    self.records.insert(record.alias.clone(), record.clone());
                    self.owned
                        .entry(owner)
                        .or_default()
                        .push(record.alias.clone());
                }
                PlannedAdd::Own { alias, .. } => {
                    self.owned.entry(owner).or_default().push(alias.clone());
                }
                PlannedAdd::Unchanged { .. } => {}
            }
        }
    }

    /// 返回本次真正会被标记删除的记录（已拥有且尚未删除，去重）
    pub(crate) fn plan_soft_delete(&self, aliases: &[String], owner: OwnerId) -> Vec<Record> {
        let mut seen = HashSet::new();
        aliases
            .iter()
            .filter(|alias| seen.insert(alias.as_str()))
            .filter(|alias| self.owns(owner, alias) && !self.is_deleted(owner, alias))
            .filter_map(|alias| self.records.get(alias.as_str()).cloned())
            .collect()
    }

    pub(crate) fn apply_soft_delete<'a>(
        &mut self,
        owner: OwnerId,
        aliases: impl IntoIterator<Item = &'a str>,
    ) {
        for alias in aliases {
            self.deleted.insert((owner, alias.to_string()));
        }
    }

    fn read_by_owner(&self, owner: OwnerId) -> Vec<Record> {
        self.owned
            .get(&owner)
            .map(|aliases| {
                aliases
                    .iter()
                    .filter_map(|alias| {
                        self.records
                            .get(alias)
                            .map(|record| record.clone().with_deleted(self.is_deleted(owner, alias)))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn stats(&self) -> Stats {
        Stats {
            total_urls: self.records.len() as i64,
            total_users: self.owned.values().filter(|a| !a.is_empty()).count() as i64,
        }
    }
}

/// 内存存储
#[derive(Debug, Default)]
pub struct VolatileStore {
    index: RwLock<Index>,
}

impl VolatileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn index(&self) -> &RwLock<Index> {
        &self.index
    }

    /// 记录总数
    pub fn len(&self) -> usize {
        self.index.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert_batch(&self, records: &[Record], owner: OwnerId) -> Result<Vec<PlannedAdd>> {
        let mut index = self.index.write();
        let plan = index.plan_batch(records, owner)?;
        index.apply(owner, &plan);
        Ok(plan)
    }

    pub(crate) fn get(&self, alias: &str) -> Result<Record> {
        self.index
            .read()
            .records
            .get(alias)
            .cloned()
            .ok_or_else(|| ShortenerError::not_found(format!("alias '{}' not found", alias)))
    }

    pub(crate) fn get_by_url(&self, original_url: &str) -> Result<Record> {
        self.index
            .read()
            .find_by_url(original_url)
            .cloned()
            .ok_or_else(|| ShortenerError::not_found(format!("url '{}' not found", original_url)))
    }

    pub(crate) fn owned_by(&self, owner: OwnerId) -> Vec<Record> {
        self.index.read().read_by_owner(owner)
    }

    pub(crate) fn deleted_for(&self, alias: &str, owner: OwnerId) -> bool {
        let index = self.index.read();
        index.owns(owner, alias) && index.is_deleted(owner, alias)
    }

    pub(crate) fn counts(&self) -> Stats {
        self.index.read().stats()
    }
}

#[async_trait]
impl RecordStore for VolatileStore {
    async fn add(&self, record: &Record, owner: OwnerId) -> Result<()> {
        let plan = self.insert_batch(std::slice::from_ref(record), owner)?;
        debug!("memory add: owner={} alias={}", owner, record.alias);
        single_outcome(&plan)
    }

    async fn add_batch(&self, records: &[Record], owner: OwnerId) -> Result<()> {
        self.insert_batch(records, owner)?;
        debug!("memory add_batch: owner={} size={}", owner, records.len());
        Ok(())
    }

    async fn read(&self, alias: &str) -> Result<Record> {
        self.get(alias)
    }

    async fn read_by_original_url(&self, original_url: &str) -> Result<Record> {
        self.get_by_url(original_url)
    }

    async fn read_by_owner(&self, owner: OwnerId) -> Result<Vec<Record>> {
        Ok(self.owned_by(owner))
    }

    async fn is_deleted_for(&self, alias: &str, owner: OwnerId) -> Result<bool> {
        Ok(self.deleted_for(alias, owner))
    }

    async fn soft_delete_many(&self, aliases: &[String], owner: OwnerId) -> Result<()> {
        let mut index = self.index.write();
        let targets = index.plan_soft_delete(aliases, owner);
        index.apply_soft_delete(owner, targets.iter().map(|r| r.alias.as_str()));
        debug!(
            "memory soft delete: owner={} requested={} applied={}",
            owner,
            aliases.len(),
            targets.len()
        );
        Ok(())
    }

    async fn stats(&self) -> Result<Stats> {
        Ok(self.counts())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
