/// Signal layer: per-measurement windowing and cleaning.
///
/// ```text
///   MeasurementSlice
///        │
///        ▼
///   window      fixed-size, non-overlapping windows
///        │
///        ▼
///   lowpass     5th-order Butterworth, 40 Hz, per window
///        │
///        ▼
///   normalize   min-max to [0, 1], per window
///        │
///        ▼
///   preprocessor  one `{experiment}_{measurement}.csv` per measurement
/// ```

pub mod lowpass;
pub mod normalize;
pub mod preprocessor;
pub mod window;
