use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// A trial panicked. The run is abandoned, never retried.
    #[error("simulation failed: {0}")]
    Failed(String),

    #[error("worker pool unavailable: {0}")]
    WorkerPool(String),
}
