use std::fmt::Debug;

use ndarray::ArrayView1;
use num_traits::Num;

/// A half-open window `[start, end)` of observation rows.
///
/// All parallel arrays in a dataset share row indices, so one window selects
/// corresponding rows from every array at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub end: usize,
    _private: (),
}

impl Window {
    /// Create a window. `end < start` is clamped to the empty window at
    /// `start` rather than rejected, so a failed search degrades to "no
    /// rows" instead of an error.
    pub fn new(start: usize, end: usize) -> Self {
        let end = if end < start { start } else { end };
        Self {
            start,
            end,
            _private: (),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// First index in `axis` whose value is not less than `value`, or `axis.len()`
/// if every value is smaller. `axis` must be non-decreasing.
fn lower_bound<N>(axis: &ArrayView1<N>, value: N) -> usize
where
    N: PartialOrd + Copy,
{
    let mut lo = 0;
    let mut hi = axis.len();
    while lo < hi {
        let mid = (lo + hi) / 2;
        if axis[mid] < value {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    lo
}

/// Find the window of rows whose axis value lies in `[lower, upper)`.
///
/// `axis` must be non-decreasing. An omitted `lower` means "from the first
/// row", an omitted `upper` means "through the last row". Bounds that fall
/// entirely outside the axis yield an empty window.
pub fn search_window<N>(axis: ArrayView1<N>, lower: Option<N>, upper: Option<N>) -> Window
where
    N: Num + Debug + Copy + PartialOrd,
{
    let start = match lower {
        Some(value) => lower_bound(&axis, value),
        None => 0,
    };
    let end = match upper {
        Some(value) => lower_bound(&axis, value),
        None => axis.len(),
    };

    Window::new(start, end)
}
