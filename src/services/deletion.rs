//! Background soft-delete pipeline
//!
//! A bounded `tokio::sync::mpsc` channel feeds a fixed pool of workers that
//! share the receiving end. Submitting awaits only when the channel is full.
//! Worker failures are logged and dropped; there is no retry.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::DeletionConfig;
use crate::errors::{Result, ShortenerError};
use crate::storage::{OwnerId, RecordStore};

/// 队列中的一个删除批次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDeleteRequest {
    pub aliases: Vec<String>,
    pub owner: OwnerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Running,
    /// 已停止接收，等待队列排空
    Draining,
    Stopped,
}

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<BatchDeleteRequest>>>;

pub struct DeletionPipeline {
    /// 关闭后为 None
    sender: Mutex<Option<mpsc::Sender<BatchDeleteRequest>>>,
    workers: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
    state: Mutex<PipelineState>,
    chunk_size: usize,
}

impl DeletionPipeline {
    /// 启动 worker，必须在 tokio runtime 内调用
    pub fn start(store: Arc<dyn RecordStore>, config: &DeletionConfig) -> Self {
        let worker_count = config.workers.max(1);
        let (sender, receiver) = mpsc::channel(config.queue_depth.max(1));
        let receiver: SharedReceiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let workers: Vec<JoinHandle<()>> = (0..worker_count)
            .map(|id| tokio::spawn(worker_loop(id, Arc::clone(&store), Arc::clone(&receiver))))
            .collect();

        info!(
            "Deletion pipeline started: {} workers, queue depth {}, chunk size {}",
            worker_count, config.queue_depth, config.chunk_size
        );

        Self {
            sender: Mutex::new(Some(sender)),
            workers: tokio::sync::Mutex::new(workers),
            state: Mutex::new(PipelineState::Running),
            chunk_size: config.chunk_size.max(1),
        }
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock()
    }

    /// 按 chunk_size 拆分后入队
    ///
    /// 队列满时等待 worker 腾出空间；关闭后返回 `BackendUnavailable`。
    pub async fn submit(&self, aliases: Vec<String>, owner: OwnerId) -> Result<()> {
        if aliases.is_empty() {
            return Ok(());
        }

        let sender = self
            .sender
            .lock()
            .clone()
            .ok_or_else(|| ShortenerError::backend_unavailable("deletion pipeline is shut down"))?;

        let chunks = aliases.len().div_ceil(self.chunk_size);
        for chunk in aliases.chunks(self.chunk_size) {
            let request = BatchDeleteRequest {
                aliases: chunk.to_vec(),
                owner,
            };
            sender.send(request).await.map_err(|_| {
                ShortenerError::backend_unavailable("deletion pipeline channel closed")
            })?;
        }

        debug!(
            "Queued {} aliases for owner {} in {} chunks",
            aliases.len(),
            owner,
            chunks
        );
        Ok(())
    }

    /// 停止接收并等待已入队的批次处理完成，可重复调用
    pub async fn shutdown(&self) {
        {
            let mut state = self.state.lock();
            if *state == PipelineState::Stopped {
                return;
            }
            *state = PipelineState::Draining;
        }

        // 丢弃发送端后 worker 在队列排空时退出
        self.sender.lock().take();

        let mut workers = self.workers.lock().await;
        for handle in workers.drain(..) {
            if let Err(e) = handle.await {
                error!("Deletion worker terminated abnormally: {}", e);
            }
        }

        *self.state.lock() = PipelineState::Stopped;
        info!("Deletion pipeline stopped");
    }
}

async fn worker_loop(id: usize, store: Arc<dyn RecordStore>, receiver: SharedReceiver) {
    loop {
        let request = receiver.lock().await.recv().await;
        let Some(request) = request else {
            break;
        };

        if let Err(e) = store
            .soft_delete_many(&request.aliases, request.owner)
            .await
        {
            error!(
                "Deletion worker {} failed for owner {} ({} aliases): {}",
                id,
                request.owner,
                request.aliases.len(),
                e
            );
        }
    }
    debug!("Deletion worker {} exited", id);
}
