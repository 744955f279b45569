use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, trace};

use crate::errors::{Result, ShortenerError};
use crate::storage::RecordStore;

/// 可插拔的存活检查
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn ping(&self) -> Result<()>;
}

/// 无外部依赖时使用
pub struct AlwaysHealthy;

#[async_trait]
impl HealthProbe for AlwaysHealthy {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// 委托给存储后端的 ping，超时视为不健康（默认 5 秒）
pub struct StoreHealthProbe {
    store: Arc<dyn RecordStore>,
    timeout: Duration,
}

impl StoreHealthProbe {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl HealthProbe for StoreHealthProbe {
    async fn ping(&self) -> Result<()> {
        trace!("Pinging {} storage", self.store.backend_name());
        match tokio::time::timeout(self.timeout, self.store.ping()).await {
            Ok(result) => result,
            Err(_) => {
                error!("Storage health check timeout");
                Err(ShortenerError::backend_unavailable(format!(
                    "{} storage ping timed out",
                    self.store.backend_name()
                )))
            }
        }
    }
}
