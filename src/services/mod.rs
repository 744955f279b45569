//! Service layer
//!
//! The deletion pipeline, health probes and the facade that transports call.

pub mod deletion;
pub mod health;
mod shortener;

pub use deletion::{BatchDeleteRequest, DeletionPipeline, PipelineState};
pub use health::{AlwaysHealthy, HealthProbe, StoreHealthProbe};
pub use shortener::{Resolved, ShortenerService};
