/// Rescale `values` in place so their minimum becomes 0.0 and their maximum
/// 1.0.  A constant (or empty) run becomes all zeros.
pub fn normalize_min_max(values: &mut [f64]) {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    let range = max - min;
    if !(range > 0.0) || !range.is_finite() {
        values.iter_mut().for_each(|v| *v = 0.0);
        return;
    }
    for v in values.iter_mut() {
        *v = (*v - min) / range;
    }
}
