pub mod coordinator;
pub mod error;
pub mod filter;
pub mod image_buf;
pub mod partition;

pub use coordinator::{BandOutput, Coordinator, WorkItem, Worker};
pub use error::{PartitionError, PipelineError, try_alloc};
pub use filter::{FilterKind, RowFilter};
pub use image_buf::{CHANNELS, ImageGeometry, PixelBuffer};
pub use partition::{RowBand, compute_bands};
