//! Fixed-window moving-average filter.

use crate::sample::AxisSample;

/// Window length used by the device sampler.
pub const FILTER_WINDOW: usize = 16;

/// Ring buffer of the most recent `N` samples with a shift-based average.
///
/// `N` must be a power of two. Each stored value is shifted right by `log2(N)` before summing,
/// so the result truncates per slot rather than rounding the mean: sixteen samples of `1`
/// average to `0`.
#[derive(Debug, Clone)]
pub struct SampleFilter<const N: usize = FILTER_WINDOW> {
    slots: [AxisSample; N],
    cursor: usize,
    filled: usize,
}

impl<const N: usize> SampleFilter<N> {
    const SHIFT: u32 = {
        assert!(N.is_power_of_two(), "filter window must be a power of two");
        N.trailing_zeros()
    };

    /// Creates an empty filter.
    pub const fn new() -> Self {
        let _ = Self::SHIFT;
        Self {
            slots: [AxisSample::ZERO; N],
            cursor: 0,
            filled: 0,
        }
    }

    /// Stores `sample` and returns the window average once the window is full.
    pub fn push(&mut self, sample: AxisSample) -> Option<AxisSample> {
        self.slots[self.cursor] = sample;
        self.cursor = (self.cursor + 1) & (N - 1);
        if self.filled < N {
            self.filled += 1;
        }

        self.is_warm().then(|| self.average())
    }

    /// Clears every slot along with the cursor and fill counter.
    pub fn reset(&mut self) {
        self.slots = [AxisSample::ZERO; N];
        self.cursor = 0;
        self.filled = 0;
    }

    /// Number of valid slots, saturating at `N`.
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Position of the next write.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether every slot holds a sample.
    pub fn is_warm(&self) -> bool {
        self.filled == N
    }

    fn average(&self) -> AxisSample {
        let (x, y, z) = self.slots.iter().fold((0i32, 0i32, 0i32), |(x, y, z), s| {
            (
                x + (i32::from(s.x) >> Self::SHIFT),
                y + (i32::from(s.y) >> Self::SHIFT),
                z + (i32::from(s.z) >> Self::SHIFT),
            )
        });

        AxisSample::new(x as i16, y as i16, z as i16)
    }
}

impl<const N: usize> Default for SampleFilter<N> {
    fn default() -> Self {
        Self::new()
    }
}
