//! # Producer/Consumer Synchronization
//!
//! The point cloud double buffer and the lock-guarded exchange the decode
//! thread publishes into.

mod double_buffer;
mod exchange;
mod stats;

pub use double_buffer::{CloudSlots, Computed, PointCloud, PointCloudDescriptor, WorkingCloud};
pub use exchange::{Exchange, Retrieval, Want};
pub use stats::{ExchangeStats, StatsSnapshot};
