use thiserror::Error;

/// Fatal conditions for a filtering run. None of them are retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid bitmap: {0}")]
    InvalidFormat(String),

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not allocate {bytes} bytes for pixel data")]
    AllocationFailure { bytes: usize },

    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error("worker {index} failed: {reason}")]
    Worker { index: usize, reason: String },

    #[error("failed to start worker pool")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl PipelineError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    #[error("worker count must be at least 1")]
    ZeroWorkers,

    #[error("{workers} workers requested for an image with only {height} rows")]
    TooManyWorkers { height: u32, workers: usize },
}

/// Allocate a zeroed byte buffer, reporting failure instead of aborting.
pub fn try_alloc(len: usize) -> Result<Vec<u8>, PipelineError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| PipelineError::AllocationFailure { bytes: len })?;
    buf.resize(len, 0);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_error_converts() {
        let err: PipelineError = PartitionError::TooManyWorkers {
            height: 2,
            workers: 3,
        }
        .into();
        assert!(matches!(
            err,
            PipelineError::Partition(PartitionError::TooManyWorkers { .. })
        ));
        assert_eq!(
            err.to_string(),
            "3 workers requested for an image with only 2 rows"
        );
    }

    #[test]
    fn io_error_keeps_source() {
        let err = PipelineError::io(
            "open View.bmp",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(err.to_string(), "open View.bmp");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn oversized_allocation_is_reported() {
        let err = try_alloc(usize::MAX).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::AllocationFailure { bytes } if bytes == usize::MAX
        ));
    }

    #[test]
    fn alloc_is_zeroed() {
        let buf = try_alloc(12).unwrap();
        assert_eq!(buf, vec![0u8; 12]);
    }
}
