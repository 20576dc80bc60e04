use std::num::NonZeroUsize;

use crate::data::model::MeasurementSlice;

/// A contiguous, borrowed run of at most `window_size_points` samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window<'a> {
    /// Position of the window within its measurement, from 0.
    pub index: usize,
    pub time: &'a [f64],
    pub data: &'a [f64],
}

impl Window<'_> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Non-overlapping windows over a measurement, in order.  Clone the iterator
/// (or call [`segment`] again) to walk the windows a second time.
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    time: &'a [f64],
    data: &'a [f64],
    size: usize,
    next_index: usize,
}

/// Split `slice` into windows of `size` samples; the last one holds the
/// remainder when the length is not a multiple of `size`.
pub fn segment(slice: &MeasurementSlice, size: NonZeroUsize) -> Windows<'_> {
    Windows {
        time: &slice.time,
        data: &slice.data,
        size: size.get(),
        next_index: 0,
    }
}

impl<'a> Iterator for Windows<'a> {
    type Item = Window<'a>;

    fn next(&mut self) -> Option<Window<'a>> {
        if self.data.is_empty() {
            return None;
        }
        let n = self.size.min(self.data.len());
        let (data, rest_data) = self.data.split_at(n);
        let (time, rest_time) = self.time.split_at(n.min(self.time.len()));
        self.data = rest_data;
        self.time = rest_time;

        let window = Window {
            index: self.next_index,
            time,
            data,
        };
        self.next_index += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.data.len().div_ceil(self.size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows<'_> {}
