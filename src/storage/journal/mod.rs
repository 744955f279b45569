//! Journaled store
//!
//! An in-memory index backed by an append-only JSON-lines file. Every
//! mutation is planned against the index, appended to the file, and only then
//! applied in memory. On startup the file is replayed in order to rebuild the
//! index.

mod entry;
mod writer;

use std::fs::{self, File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

pub use entry::JournalEntry;
pub(crate) use writer::JournalSink;
use writer::JournalWriter;

use super::memory::{Index, PlannedAdd, VolatileStore, single_outcome};
use super::models::{OwnerId, Record, Stats};
use super::RecordStore;
use crate::errors::{Result, ShortenerError};

/// 回放统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayReport {
    pub applied: usize,
    pub skipped: usize,
    pub torn_tail: bool,
}

pub struct JournaledStore {
    path: PathBuf,
    memory: VolatileStore,
    /// 写者互斥锁；关闭后为 None
    writer: Mutex<Option<JournalWriter>>,
    replay: ReplayReport,
}

impl JournaledStore {
    /// 打开（或创建）日志文件并回放
    pub fn open(path: &Path, fsync: bool) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        let memory = VolatileStore::new();
        let report = replay(&mut file, &memory)?;

        info!(
            "Journal replayed from {}: {} applied, {} skipped, {} records",
            path.display(),
            report.applied,
            report.skipped,
            memory.len()
        );

        let mut store = Self::with_sink(path.to_path_buf(), memory, Box::new(file), fsync);
        store.replay = report;
        Ok(store)
    }

    pub(crate) fn with_sink(
        path: PathBuf,
        memory: VolatileStore,
        sink: Box<dyn JournalSink>,
        fsync: bool,
    ) -> Self {
        Self {
            path,
            memory,
            writer: Mutex::new(Some(JournalWriter::new(sink, fsync))),
            replay: ReplayReport::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 启动回放的结果
    pub fn replay_report(&self) -> ReplayReport {
        self.replay
    }

    fn closed_error(&self) -> ShortenerError {
        ShortenerError::backend_unavailable(format!(
            "journal {} is closed",
            self.path.display()
        ))
    }

    fn register(&self, records: &[Record], owner: OwnerId) -> Result<Vec<PlannedAdd>> {
        let mut guard = self.writer.lock();
        let writer = guard.as_mut().ok_or_else(|| self.closed_error())?;

        let plan = self.memory.index().read().plan_batch(records, owner)?;
        let entries: Vec<JournalEntry> = plan
            .iter()
            .filter_map(|step| {
                step.original_url()
                    .map(|url| JournalEntry::registration(owner, step.alias(), url))
            })
            .collect();

        writer.append(&entries)?;
        self.memory.index().write().apply(owner, &plan);

        debug!(
            "journal register: owner={} records={} appended={}",
            owner,
            records.len(),
            entries.len()
        );
        Ok(plan)
    }
}

/// 按文件顺序回放日志
///
/// 最后一行若没有换行符视为崩溃时的残行：告警、丢弃并把文件截断到最后一个完整行。
/// 末尾不完整的批次同样整组丢弃并截断。
fn replay(file: &mut File, memory: &VolatileStore) -> Result<ReplayReport> {
    let mut content = Vec::new();
    file.read_to_end(&mut content)?;

    let mut report = ReplayReport::default();

    let complete_len = content
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1);
    if complete_len < content.len() {
        warn!(
            "Journal has a torn final line ({} bytes), discarding it",
            content.len() - complete_len
        );
        file.set_len(complete_len as u64)?;
        report.torn_tail = true;
    }

    let text = std::str::from_utf8(&content[..complete_len])
        .map_err(|e| ShortenerError::serialization(format!("journal is not valid UTF-8: {}", e)))?;

    let mut index = memory.index().write();
    let mut pending: Option<PendingBatch> = None;
    let mut offset = 0usize;

    for (lineno, raw) in text.split_inclusive('\n').enumerate() {
        let line_start = offset;
        offset += raw.len();
        let lineno = lineno + 1;

        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let entry = JournalEntry::parse(line).map_err(|e| {
            ShortenerError::serialization(format!("journal line {}: {}", lineno, e.message()))
        })?;

        let Some(batch) = entry.batch.clone() else {
            if let Some(open) = &pending {
                return Err(open.interrupted_at(lineno));
            }
            replay_entry(&mut index, lineno, entry, &mut report)?;
            continue;
        };

        if let Some(open) = pending.as_ref().filter(|open| open.id != batch) {
            return Err(open.interrupted_at(lineno));
        }
        let size = entry.batch_size.unwrap_or(0);
        let open = pending.get_or_insert_with(|| PendingBatch {
            id: batch,
            size,
            start: line_start,
            lines: Vec::new(),
        });
        open.lines.push((lineno, entry));

        if open.lines.len() >= open.size
            && let Some(done) = pending.take()
        {
            for (lineno, entry) in done.lines {
                replay_entry(&mut index, lineno, entry, &mut report)?;
            }
        }
    }

    if let Some(open) = pending {
        warn!(
            "Journal ends inside batch {} ({} of {} lines), discarding it",
            open.id,
            open.lines.len(),
            open.size
        );
        file.set_len(open.start as u64)?;
        report.torn_tail = true;
    }

    Ok(report)
}

/// 回放中尚未读完的批次
struct PendingBatch {
    id: String,
    size: usize,
    /// 批次首行在文件中的字节偏移
    start: usize,
    lines: Vec<(usize, JournalEntry)>,
}

impl PendingBatch {
    fn interrupted_at(&self, lineno: usize) -> ShortenerError {
        ShortenerError::serialization(format!(
            "journal line {}: batch {} interrupted after {} of {} lines",
            lineno,
            self.id,
            self.lines.len(),
            self.size
        ))
    }
}

fn replay_entry(
    index: &mut Index,
    lineno: usize,
    entry: JournalEntry,
    report: &mut ReplayReport,
) -> Result<()> {
    let owner = entry.user_id;

    if entry.deleted {
        let targets = index.plan_soft_delete(std::slice::from_ref(&entry.short_url), owner);
        if targets.is_empty() {
            warn!(
                "Journal line {}: delete of '{}' by owner {} has no effect, skipped",
                lineno, entry.short_url, owner
            );
            report.skipped += 1;
        } else {
            index.apply_soft_delete(owner, [entry.short_url.as_str()]);
            report.applied += 1;
        }
        return Ok(());
    }

    let record = Record::new(entry.original_url, entry.short_url);
    match index.plan_batch(std::slice::from_ref(&record), owner) {
        Ok(plan) => {
            index.apply(owner, &plan);
            report.applied += 1;
            Ok(())
        }
        Err(ShortenerError::AliasCollision(alias)) => {
            warn!(
                "Journal line {}: alias '{}' already holds another URL, skipped",
                lineno, alias
            );
            report.skipped += 1;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[async_trait]
impl RecordStore for JournaledStore {
    async fn add(&self, record: &Record, owner: OwnerId) -> Result<()> {
        let plan = self.register(std::slice::from_ref(record), owner)?;
        single_outcome(&plan)
    }

    async fn add_batch(&self, records: &[Record], owner: OwnerId) -> Result<()> {
        self.register(records, owner)?;
        Ok(())
    }

    async fn read(&self, alias: &str) -> Result<Record> {
        self.memory.get(alias)
    }

    async fn read_by_original_url(&self, original_url: &str) -> Result<Record> {
        self.memory.get_by_url(original_url)
    }

    async fn read_by_owner(&self, owner: OwnerId) -> Result<Vec<Record>> {
        Ok(self.memory.owned_by(owner))
    }

    async fn is_deleted_for(&self, alias: &str, owner: OwnerId) -> Result<bool> {
        Ok(self.memory.deleted_for(alias, owner))
    }

    async fn soft_delete_many(&self, aliases: &[String], owner: OwnerId) -> Result<()> {
        let mut guard = self.writer.lock();
        let writer = guard.as_mut().ok_or_else(|| self.closed_error())?;

        let targets = self.memory.index().read().plan_soft_delete(aliases, owner);
        let entries: Vec<JournalEntry> = targets
            .iter()
            .map(|record| JournalEntry::deletion(owner, &record.alias, &record.original_url))
            .collect();

        writer.append(&entries)?;
        self.memory
            .index()
            .write()
            .apply_soft_delete(owner, targets.iter().map(|r| r.alias.as_str()));

        debug!(
            "journal soft delete: owner={} requested={} applied={}",
            owner,
            aliases.len(),
            targets.len()
        );
        Ok(())
    }

    async fn stats(&self) -> Result<Stats> {
        Ok(self.memory.counts())
    }

    async fn ping(&self) -> Result<()> {
        match self.writer.lock().as_ref() {
            Some(writer) if writer.is_poisoned() => Err(ShortenerError::backend_unavailable(
                format!("journal {} needs to be reopened", self.path.display()),
            )),
            Some(_) => Ok(()),
            None => Err(self.closed_error()),
        }
    }

    async fn close(&self) -> Result<()> {
        let writer = self.writer.lock().take();
        if let Some(writer) = writer {
            writer.finish()?;
            info!("Journal closed: {}", self.path.display());
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "journal"
    }
}
