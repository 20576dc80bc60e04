//! Butterworth low-pass stage.
//!
//! The filter is designed by the bilinear transform of the analog Butterworth
//! prototype (with frequency pre-warping) and realized as a cascade of
//! second-order sections.  With zero initial state this is the same causal,
//! single-pass response as the direct-form `(b, a)` filter of that order.

use std::f64::consts::PI;

use crate::error::{PipelineError, Result};

/// Filter order used for every window.
pub const FILTER_ORDER: usize = 5;

/// Cutoff applied at filter time, whatever the caller configured.
pub const EFFECTIVE_CUTOFF_HZ: f64 = 40.0;

/// Second-order section coefficients, normalized so `a0 == 1`.
/// H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Biquad {
    /// Run the section over `signal` in place (Direct Form II transposed),
    /// starting from rest.
    fn run(&self, signal: &mut [f64]) {
        let (mut z1, mut z2) = (0.0, 0.0);
        for x in signal.iter_mut() {
            let input = *x;
            let output = self.b0 * input + z1;
            z1 = self.b1 * input - self.a1 * output + z2;
            z2 = self.b2 * input - self.a2 * output;
            *x = output;
        }
    }
}

/// Fixed-order Butterworth low-pass filter.
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    /// Cutoff the caller asked for; kept for reporting only.
    configured_cutoff_hz: f64,
    sampling_rate_hz: f64,
    sections: Vec<Biquad>,
}

impl LowPassFilter {
    /// `cutoff_hz` is recorded but the design always uses
    /// [`EFFECTIVE_CUTOFF_HZ`].
    pub fn new(cutoff_hz: f64, sampling_rate_hz: f64) -> Result<Self> {
        let nyquist = sampling_rate_hz / 2.0;
        if !(EFFECTIVE_CUTOFF_HZ < nyquist) {
            return Err(PipelineError::Config(format!(
                "{EFFECTIVE_CUTOFF_HZ} Hz cutoff is not below the Nyquist frequency of {nyquist} Hz"
            )));
        }
        if cutoff_hz != EFFECTIVE_CUTOFF_HZ {
            log::debug!(
                "Configured cutoff {cutoff_hz} Hz ignored; filtering at {EFFECTIVE_CUTOFF_HZ} Hz"
            );
        }
        Ok(LowPassFilter {
            configured_cutoff_hz: cutoff_hz,
            sampling_rate_hz,
            sections: design_butterworth_lowpass(
                EFFECTIVE_CUTOFF_HZ,
                sampling_rate_hz,
                FILTER_ORDER,
            ),
        })
    }

    pub fn configured_cutoff_hz(&self) -> f64 {
        self.configured_cutoff_hz
    }

    pub fn sampling_rate_hz(&self) -> f64 {
        self.sampling_rate_hz
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Shortest input the filter accepts.
    pub fn min_len(&self) -> usize {
        FILTER_ORDER + 1
    }

    /// Filter `samples` in place.  State never carries over between calls.
    pub fn apply(&self, samples: &mut [f64]) -> Result<()> {
        if samples.len() < self.min_len() {
            return Err(PipelineError::Filter {
                len: samples.len(),
                required: self.min_len(),
            });
        }
        for section in &self.sections {
            section.run(samples);
        }
        Ok(())
    }

    /// Filter a copy of `samples`.
    pub fn filter(&self, samples: &[f64]) -> Result<Vec<f64>> {
        let mut out = samples.to_vec();
        self.apply(&mut out)?;
        Ok(out)
    }
}

/// Digital Butterworth low-pass sections for `order` at `cutoff_hz`.
///
/// Analog poles sit at angles θk = π(2k+1)/(2N) from the imaginary axis; each
/// conjugate pair gives `wc² / (s² + 2·wc·sin θk·s + wc²)` and an odd order
/// adds the real pole `wc / (s + wc)`.  Each section is then mapped with
/// s = (1 - z⁻¹)/(1 + z⁻¹) and `wc = tan(π·fc/fs)`.
pub fn design_butterworth_lowpass(
    cutoff_hz: f64,
    sampling_rate_hz: f64,
    order: usize,
) -> Vec<Biquad> {
    let wc = (PI * cutoff_hz / sampling_rate_hz).tan();
    let wc2 = wc * wc;
    let mut sections = Vec::with_capacity(order.div_ceil(2));

    for k in 0..order / 2 {
        let theta = PI * (2 * k + 1) as f64 / (2 * order) as f64;
        let q = 2.0 * wc * theta.sin();
        let a0 = 1.0 + q + wc2;
        let gain = wc2 / a0;
        sections.push(Biquad {
            b0: gain,
            b1: 2.0 * gain,
            b2: gain,
            a1: 2.0 * (wc2 - 1.0) / a0,
            a2: (1.0 - q + wc2) / a0,
        });
    }

    if order % 2 == 1 {
        let gain = wc / (1.0 + wc);
        sections.push(Biquad {
            b0: gain,
            b1: gain,
            b2: 0.0,
            a1: (wc - 1.0) / (wc + 1.0),
            a2: 0.0,
        });
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variance(v: &[f64]) -> f64 {
        let mean = v.iter().sum::<f64>() / v.len() as f64;
        v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / v.len() as f64
    }

    #[test]
    fn order_five_gives_three_sections() {
        let filter = LowPassFilter::new(150.0, 10_000.0).unwrap();
        // Two pole pairs and one real pole.
        assert_eq!(filter.sections().len(), 3);
        assert_eq!(filter.sections()[2].b2, 0.0);
        assert_eq!(filter.configured_cutoff_hz(), 150.0);
    }

    #[test]
    fn unity_gain_at_dc() {
        for section in design_butterworth_lowpass(40.0, 10_000.0, FILTER_ORDER) {
            let num = section.b0 + section.b1 + section.b2;
            let den = 1.0 + section.a1 + section.a2;
            assert!((num / den - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn poles_inside_unit_circle() {
        for s in design_butterworth_lowpass(40.0, 10_000.0, FILTER_ORDER) {
            // Stability triangle for z² + a1·z + a2.
            assert!(s.a2.abs() < 1.0);
            assert!(s.a1.abs() < 1.0 + s.a2);
        }
    }

    #[test]
    fn constant_input_settles_to_constant() {
        let filter = LowPassFilter::new(40.0, 10_000.0).unwrap();
        let out = filter.filter(&vec![2.0; 5_000]).unwrap();
        assert_eq!(out.len(), 5_000);
        assert!((out[4_999] - 2.0).abs() < 1e-3);
        // Causal start from rest: the first output is far from the input.
        assert!(out[0] < 0.1);
    }

    #[test]
    fn removes_high_frequency_component() {
        let fs = 10_000.0;
        let signal: Vec<f64> = (0..10_000)
            .map(|i| {
                let t = i as f64 / fs;
                (2.0 * PI * 5.0 * t).sin() + (2.0 * PI * 500.0 * t).sin()
            })
            .collect();
        let filter = LowPassFilter::new(150.0, fs).unwrap();
        let out = filter.filter(&signal).unwrap();
        assert!(variance(&out) < variance(&signal));
        // What is left is essentially the 5 Hz tone (variance ≈ 0.5).
        assert!(variance(&out) < 0.6);
    }

    #[test]
    fn independent_calls_share_no_state() {
        let filter = LowPassFilter::new(40.0, 10_000.0).unwrap();
        let input: Vec<f64> = (0..200).map(|i| (i % 7) as f64).collect();
        assert_eq!(filter.filter(&input).unwrap(), filter.filter(&input).unwrap());
    }

    #[test]
    fn too_short_window_is_filter_error() {
        let filter = LowPassFilter::new(40.0, 10_000.0).unwrap();
        let mut short = [1.0; 5];
        assert!(matches!(
            filter.apply(&mut short),
            Err(PipelineError::Filter { len: 5, required: 6 })
        ));
        assert!(filter.filter(&[1.0; 6]).is_ok());
    }

    #[test]
    fn low_sampling_rate_is_rejected() {
        assert!(matches!(
            LowPassFilter::new(40.0, 60.0),
            Err(PipelineError::Config(_))
        ));
    }
}
