//! # Double-Buffered Point Cloud
//!
//! The producer unprojects into its **working** cloud while the consumer
//! may be reading the **published** one. Publication swaps the two.
//!
//! ## Architecture
//!
//! ```text
//!   Decode thread (no lock)                 Exchange (under lock)
//!  ┌──────────────────────┐              ┌──────────────────────┐
//!  │  WorkingCloud        │   mem::swap  │  published           │
//!  │  points ─┐ colors ─┐ │ <──────────> │  points ─┐ colors ─┐ │
//!  └──────────┼─────────┼─┘              └──────────┼─────────┼─┘
//!             ▼         ▼                           ▼         ▼
//!          [Vec3; N] [Color32; N]               [Vec3; M] [Color32; M]
//! ```
//!
//! The swap exchanges two vector headers each side plus a few scalars. The
//! bulk arrays never move, so lock hold time does not depend on cloud size.
//!
//! ## Buffer Policy
//!
//! - Same slot count as last time on this buffer: storage is reused.
//! - Different slot count: both arrays are freed and reallocated together.
//! - After every unprojection, slots `[used, capacity)` are zeroed so a
//!   smaller cloud never shows leftovers from a larger one.

use lumen_shared::{Color32, Quaternion, Vec3};

use crate::error::{LumenError, LumenResult};

/// Point cloud storage: parallel point and color arrays of equal capacity.
///
/// Invariants: `used <= capacity`; slots past `used` are zero.
#[derive(Debug, Default)]
pub struct PointCloud {
    points: Vec<Vec3>,
    colors: Vec<Color32>,
    used: usize,
    position: Vec3,
    rotation: Quaternion,
}

impl PointCloud {
    /// Empty cloud, nothing allocated.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocated slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.points.len()
    }

    /// Valid leading slots.
    #[inline]
    #[must_use]
    pub fn used(&self) -> usize {
        self.used
    }

    /// All point slots, including the zeroed tail.
    #[inline]
    #[must_use]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// All color slots, including the zeroed tail.
    #[inline]
    #[must_use]
    pub fn colors(&self) -> &[Color32] {
        &self.colors
    }

    /// Capture position.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Capture orientation.
    #[inline]
    #[must_use]
    pub fn rotation(&self) -> Quaternion {
        self.rotation
    }

    /// By-value summary borrowing this cloud's arrays.
    #[must_use]
    pub fn descriptor(&self) -> PointCloudDescriptor<'_> {
        PointCloudDescriptor {
            points: &self.points,
            colors: &self.colors,
            capacity: self.capacity(),
            used: self.used,
            position: self.position,
            rotation: self.rotation,
        }
    }

    /// Grow-or-reuse. Returns true if the arrays were reallocated.
    fn reserve_exact_slots(&mut self, slots: usize) -> LumenResult<bool> {
        if slots == self.capacity() {
            return Ok(false);
        }

        // free first so peak memory is one cloud, not two
        self.points = Vec::new();
        self.colors = Vec::new();
        self.used = 0;

        let mut points = Vec::new();
        points
            .try_reserve_exact(slots)
            .map_err(|_| LumenError::Allocation { what: "point cloud points", slots })?;
        let mut colors = Vec::new();
        colors
            .try_reserve_exact(slots)
            .map_err(|_| LumenError::Allocation { what: "point cloud colors", slots })?;
        points.resize(slots, Vec3::ZERO);
        colors.resize(slots, Color32::ZERO);

        self.points = points;
        self.colors = colors;
        Ok(true)
    }

    fn slots_mut(&mut self) -> CloudSlots<'_> {
        CloudSlots {
            points: &mut self.points,
            colors: &mut self.colors,
            position: &mut self.position,
            rotation: &mut self.rotation,
        }
    }

    fn set_used_and_clear_tail(&mut self, used: usize) -> LumenResult<()> {
        let capacity = self.capacity();
        if used > capacity {
            self.used = 0;
            bytemuck::fill_zeroes(&mut self.points);
            bytemuck::fill_zeroes(&mut self.colors);
            return Err(LumenError::Unproject(format!(
                "unprojector reported {used} points for {capacity} slots"
            )));
        }
        self.used = used;
        bytemuck::fill_zeroes(&mut self.points[used..]);
        bytemuck::fill_zeroes(&mut self.colors[used..]);
        Ok(())
    }
}

/// Lightweight copy-by-value point cloud description.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointCloudDescriptor<'a> {
    /// Point coordinates, `capacity` long.
    pub points: &'a [Vec3],
    /// Point colors, `capacity` long.
    pub colors: &'a [Color32],
    /// Allocated slots.
    pub capacity: usize,
    /// Valid leading slots.
    pub used: usize,
    /// Position the cloud was captured from.
    pub position: Vec3,
    /// Heading quaternion the cloud was captured with.
    pub rotation: Quaternion,
}

impl<'a> PointCloudDescriptor<'a> {
    /// Only the valid points.
    #[must_use]
    pub fn used_points(&self) -> &'a [Vec3] {
        &self.points[..self.used]
    }

    /// Only the valid colors.
    #[must_use]
    pub fn used_colors(&self) -> &'a [Color32] {
        &self.colors[..self.used]
    }
}

/// Writable view handed to the unprojector.
#[derive(Debug)]
pub struct CloudSlots<'a> {
    /// Point slots to fill from the front.
    pub points: &'a mut [Vec3],
    /// Color slots, parallel to `points`.
    pub colors: &'a mut [Color32],
    /// Capture position; leave untouched if unknown.
    pub position: &'a mut Vec3,
    /// Capture orientation; leave untouched if unknown.
    pub rotation: &'a mut Quaternion,
}

/// Result of one unprojection into the working buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Computed {
    /// Points produced.
    pub used: usize,
    /// Whether the arrays had to be reallocated first.
    pub reallocated: bool,
}

/// Producer half of the double buffer. Owned by the decode thread only.
#[derive(Debug, Default)]
pub struct WorkingCloud {
    cloud: PointCloud,
    reallocations: u64,
}

impl WorkingCloud {
    /// Creates an empty working buffer. Allocation waits for the first frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cloud being built.
    #[inline]
    #[must_use]
    pub fn cloud(&self) -> &PointCloud {
        &self.cloud
    }

    /// Times this buffer has been reallocated.
    #[inline]
    #[must_use]
    pub fn reallocations(&self) -> u64 {
        self.reallocations
    }

    /// Sizes the buffer to `slots`, lets `fill` write the leading points and
    /// zeroes the rest.
    ///
    /// `fill` returns how many slots it wrote.
    ///
    /// # Errors
    ///
    /// [`LumenError::Allocation`] if resizing fails, any error from `fill`,
    /// or [`LumenError::Unproject`] if `fill` claims more slots than exist.
    pub fn compute<F>(&mut self, slots: usize, fill: F) -> LumenResult<Computed>
    where
        F: FnOnce(CloudSlots<'_>) -> LumenResult<usize>,
    {
        let reallocated = self.cloud.reserve_exact_slots(slots)?;
        if reallocated {
            self.reallocations += 1;
        }
        let used = fill(self.cloud.slots_mut())?;
        self.cloud.set_used_and_clear_tail(used)?;
        Ok(Computed { used, reallocated })
    }

    /// Swaps the working cloud with `published`. O(1), no data moves.
    ///
    /// Call with the exchange lock held; afterwards this buffer holds the
    /// previously published cloud and is reused for the next frame.
    #[inline]
    pub fn swap_with(&mut self, published: &mut PointCloud) {
        std::mem::swap(&mut self.cloud, published);
    }
}
