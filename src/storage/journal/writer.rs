use std::fs::File;
use std::io::{self, Write};

use tracing::error;

use super::entry::{JournalEntry, encode_lines};
use crate::errors::{Result, ShortenerError};

/// 日志写入目标，测试中可替换为会失败的实现
pub(crate) trait JournalSink: Write + Send {
    fn sync(&mut self) -> io::Result<()>;
    fn len(&self) -> io::Result<u64>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl JournalSink for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

pub(crate) struct JournalWriter {
    sink: Box<dyn JournalSink>,
    fsync: bool,
    /// 回滚失败后文件尾部可能残留半行，此后拒绝任何追加
    poisoned: bool,
}

impl JournalWriter {
    pub(crate) fn new(sink: Box<dyn JournalSink>, fsync: bool) -> Self {
        Self {
            sink,
            fsync,
            poisoned: false,
        }
    }

    pub(crate) fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// 一次性追加整组记录
    ///
    /// 失败时把文件截回追加前的长度，调用方不得修改内存状态。
    /// 截断也失败时写者进入不可用状态，重新打开后由回放丢弃残行。
    pub(crate) fn append(&mut self, entries: &[JournalEntry]) -> Result<()> {
        if self.poisoned {
            return Err(ShortenerError::backend_unavailable(
                "journal is unusable after a failed rollback, reopen to recover",
            ));
        }
        if entries.is_empty() {
            return Ok(());
        }

        let buf = encode_lines(entries)?;
        let before = self.sink.len()?;

        if let Err(e) = self.write_through(&buf) {
            error!("Journal append failed: {}", e);
            if let Err(te) = self.sink.truncate(before) {
                error!(
                    "Failed to roll back journal to {} bytes, refusing further writes: {}",
                    before, te
                );
                self.poisoned = true;
            }
            return Err(ShortenerError::backend_unavailable(format!(
                "journal append failed: {}",
                e
            )));
        }
        Ok(())
    }

    fn write_through(&mut self, buf: &[u8]) -> io::Result<()> {
        self.sink.write_all(buf)?;
        self.sink.flush()?;
        if self.fsync {
            self.sink.sync()?;
        }
        Ok(())
    }

    pub(crate) fn finish(mut self) -> Result<()> {
        self.sink.flush()?;
        self.sink.sync()?;
        Ok(())
    }
}
