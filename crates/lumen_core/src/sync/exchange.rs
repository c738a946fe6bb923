//! # Exchange Core
//!
//! The single point where producer and consumer meet. One mutex guards the
//! frame slots and the published point cloud together, so a consumer always
//! sees frames and cloud from the same publish.
//!
//! ## Protocol
//!
//! ```text
//!  Producer                         Consumer
//!  ────────                         ────────
//!  unproject (no lock)
//!  lock ── update slots              begin ── lock
//!       ── swap cloud                      ── no live frame? unlock, NoNewData
//!  unlock                                  ── read descriptors, use data
//!                                    end   ── release frames, unlock
//! ```
//!
//! Ending a retrieval releases the frame references it saw. The next begin
//! reports `NoNewData` until the producer publishes again.

use parking_lot::{Mutex, MutexGuard};

use lumen_shared::MAX_DECODERS;

use super::double_buffer::{PointCloud, PointCloudDescriptor, WorkingCloud};
use super::stats::ExchangeStats;
use crate::error::{LumenResult, RetrieveError};
use crate::frame::{FrameBatch, FrameDescriptor, FrameSlots};

/// What a consumer asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Want {
    /// Frame descriptors only.
    Frames,
    /// Point cloud only.
    PointCloud,
    /// Frames and the point cloud from the same publish.
    Both,
}

impl Want {
    fn frames(self) -> bool {
        matches!(self, Self::Frames | Self::Both)
    }

    fn point_cloud(self) -> bool {
        matches!(self, Self::PointCloud | Self::Both)
    }
}

#[derive(Debug)]
struct Shared {
    frames: FrameSlots,
    cloud: PointCloud,
}

/// Lock-guarded state shared by the decode thread and consumers.
#[derive(Debug)]
pub struct Exchange {
    shared: Mutex<Shared>,
    decoders: usize,
    has_unprojector: bool,
    stats: ExchangeStats,
}

impl Exchange {
    /// Creates an exchange for `decoders` streams.
    ///
    /// # Errors
    ///
    /// Fails on a decoder count outside `1..=MAX_DECODERS`.
    pub fn new(decoders: usize, has_unprojector: bool) -> LumenResult<Self> {
        Ok(Self {
            shared: Mutex::new(Shared {
                frames: FrameSlots::new(decoders)?,
                cloud: PointCloud::new(),
            }),
            decoders,
            has_unprojector,
            stats: ExchangeStats::default(),
        })
    }

    /// Configured stream count.
    #[must_use]
    pub fn decoders(&self) -> usize {
        self.decoders
    }

    /// True if point clouds are produced.
    #[must_use]
    pub fn has_unprojector(&self) -> bool {
        self.has_unprojector
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> &ExchangeStats {
        &self.stats
    }

    /// Publishes one producer cycle.
    ///
    /// Retains the new frames in `batch` and, if given, swaps the freshly
    /// computed working cloud into the published slot. Holds the lock for
    /// refcount updates and a pointer swap only.
    pub fn publish(&self, batch: &FrameBatch, working: Option<&mut WorkingCloud>) {
        let with_cloud = working.is_some();
        {
            let mut shared = self.shared.lock();
            let shared = &mut *shared;
            shared.frames.update(batch);
            if let Some(working) = working {
                working.swap_with(&mut shared.cloud);
            }
        }
        self.stats.record_publish(with_cloud);
    }

    /// Starts a retrieval.
    ///
    /// # Errors
    ///
    /// [`RetrieveError::NoNewData`] when no stream holds a live frame, or when
    /// only the point cloud is wanted and none is produced. The lock is
    /// already released in that case.
    pub fn begin(&self, want: Want) -> Result<Retrieval<'_>, RetrieveError> {
        if want == Want::PointCloud && !self.has_unprojector {
            self.stats.record_retrieval(false);
            return Err(RetrieveError::NoNewData);
        }

        let guard = self.shared.lock();
        if !guard.frames.has_live() {
            drop(guard);
            self.stats.record_retrieval(false);
            return Err(RetrieveError::NoNewData);
        }

        self.stats.record_retrieval(true);
        Ok(Retrieval {
            guard,
            frames: want.frames(),
            point_cloud: want.point_cloud() && self.has_unprojector,
        })
    }

    /// Drops all frame references and the published cloud.
    pub fn clear(&self) {
        let mut shared = self.shared.lock();
        shared.frames.release_all();
        shared.cloud = PointCloud::new();
    }
}

/// An in-progress retrieval. Holds the exchange lock.
///
/// Keep it short: the decode thread cannot publish while this is alive.
/// Ending it, explicitly or by drop, releases the frame references and
/// unlocks.
#[must_use = "dropping a retrieval immediately ends it"]
pub struct Retrieval<'a> {
    guard: MutexGuard<'a, Shared>,
    frames: bool,
    point_cloud: bool,
}

impl Retrieval<'_> {
    /// Descriptor for `stream`, if frames were requested and it holds data.
    #[must_use]
    pub fn frame(&self, stream: usize) -> Option<FrameDescriptor<'_>> {
        if self.frames {
            self.guard.frames.descriptor(stream)
        } else {
            None
        }
    }

    /// Descriptors for every stream slot, in stream order.
    #[must_use]
    pub fn frames(&self) -> [Option<FrameDescriptor<'_>>; MAX_DECODERS] {
        std::array::from_fn(|stream| self.frame(stream))
    }

    /// Number of configured streams.
    #[must_use]
    pub fn decoders(&self) -> usize {
        self.guard.frames.len()
    }

    /// Published point cloud, if requested and produced.
    #[must_use]
    pub fn point_cloud(&self) -> Option<PointCloudDescriptor<'_>> {
        self.point_cloud.then(|| self.guard.cloud.descriptor())
    }

    /// Ends the retrieval. Always succeeds.
    pub fn end(self) {
        drop(self);
    }
}

impl Drop for Retrieval<'_> {
    fn drop(&mut self) {
        self.guard.frames.release_all();
    }
}

impl std::fmt::Debug for Retrieval<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retrieval")
            .field("frames", &self.frames)
            .field("point_cloud", &self.point_cloud)
            .finish_non_exhaustive()
    }
}
