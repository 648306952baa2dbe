//! Zero-phase Butterworth filters for fMRI time series
//!
//! Filters are built as cascades of bilinear-transformed second-order
//! sections (plus one first-order section for odd orders) and applied
//! forward and backward so the result has no phase delay.

use ndarray::{Array2, Axis};
use tracing::warn;

/// Filter coefficients in direct form II transposed
///
/// First-order sections carry zero `b[2]` and `a[2]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    /// Numerator coefficients [b0, b1, b2]
    pub b: [f64; 3],
    /// Denominator coefficients [a1, a2] (a0 is normalized to 1)
    pub a: [f64; 2],
}

/// Response type of a single filter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Response {
    /// Pass frequencies below the cutoff
    LowPass,
    /// Pass frequencies above the cutoff
    HighPass,
}

impl Section {
    fn second_order(response: Response, k: f64, q: f64) -> Self {
        let k2 = k * k;
        let norm = 1.0 / (1.0 + k / q + k2);
        let a = [2.0 * (k2 - 1.0) * norm, (1.0 - k / q + k2) * norm];
        let b = match response {
            Response::LowPass => [k2 * norm, 2.0 * k2 * norm, k2 * norm],
            Response::HighPass => [norm, -2.0 * norm, norm],
        };
        Self { b, a }
    }

    fn first_order(response: Response, k: f64) -> Self {
        let norm = 1.0 / (1.0 + k);
        let a = [(k - 1.0) * norm, 0.0];
        let b = match response {
            Response::LowPass => [k * norm, k * norm, 0.0],
            Response::HighPass => [norm, -norm, 0.0],
        };
        Self { b, a }
    }

    /// Gain at zero frequency
    pub fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / (1.0 + self.a[0] + self.a[1])
    }

    // The state starts at the steady state for a constant input equal to the
    // first sample, which keeps start-up transients out of short series
    fn run(&self, samples: &mut [f64]) {
        let Some(&first) = samples.first() else {
            return;
        };
        let [b0, b1, b2] = self.b;
        let [a1, a2] = self.a;
        let steady = self.dc_gain() * first;
        let mut z2 = b2.mul_add(first, -a2 * steady);
        let mut z1 = b0.mul_add(-first, steady);

        for sample in samples.iter_mut() {
            let x = *sample;
            let y = b0.mul_add(x, z1);
            z1 = b1.mul_add(x, a1.mul_add(-y, z2));
            z2 = b2.mul_add(x, -a2 * y);
            *sample = y;
        }
    }
}

/// Cascade of sections forming one Butterworth filter
#[derive(Clone, Debug, PartialEq)]
pub struct Butterworth {
    sections: Vec<Section>,
}

impl Butterworth {
    /// Design an `order`-pole Butterworth filter for the given sampling rate
    pub fn new(response: Response, order: usize, sample_rate: f64, cutoff: f64) -> Self {
        let k = (std::f64::consts::PI * cutoff / sample_rate).tan();
        let order = order.max(1);
        let mut sections: Vec<Section> = (0..order / 2)
            .map(|i| {
                let theta = std::f64::consts::PI * (2 * i + 1) as f64 / (2 * order) as f64;
                Section::second_order(response, k, 1.0 / (2.0 * theta.cos()))
            })
            .collect();
        if order % 2 == 1 {
            sections.push(Section::first_order(response, k));
        }
        Self { sections }
    }

    /// The cascaded sections
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Filter in place, forward only
    pub fn filter(&self, samples: &mut [f64]) {
        for section in &self.sections {
            section.run(samples);
        }
    }

    /// Forward-backward filtering with odd reflection padding at both ends
    pub fn filtfilt(&self, samples: &[f64]) -> Vec<f64> {
        let n = samples.len();
        if n < 2 {
            return samples.to_vec();
        }
        let pad = (3 * (2 * self.sections.len() + 1)).min(n - 1);
        let (Some(&first), Some(&last)) = (samples.first(), samples.last()) else {
            return samples.to_vec();
        };

        let mut extended = Vec::with_capacity(n + 2 * pad);
        extended.extend(samples.iter().skip(1).take(pad).rev().map(|v| 2.0 * first - v));
        extended.extend_from_slice(samples);
        extended.extend(
            samples
                .iter()
                .rev()
                .skip(1)
                .take(pad)
                .map(|v| 2.0 * last - v),
        );

        self.filter(&mut extended);
        extended.reverse();
        self.filter(&mut extended);
        extended.reverse();

        extended.into_iter().skip(pad).take(n).collect()
    }
}

/// High-pass and low-pass stages applied together
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BandPass {
    high_pass: Option<Butterworth>,
    low_pass: Option<Butterworth>,
}

impl BandPass {
    /// Build the band-pass for a repetition time in seconds
    ///
    /// Cutoffs at or above Nyquist are dropped with a warning.
    pub fn new(
        order: usize,
        repetition_time: f64,
        high_pass: Option<f64>,
        low_pass: Option<f64>,
    ) -> Self {
        let sample_rate = 1.0 / repetition_time;
        let nyquist = sample_rate / 2.0;
        let usable = |name: &str, cutoff: Option<f64>| {
            cutoff.filter(|&c| {
                if c >= nyquist {
                    warn!("{name} cutoff {c} Hz is at or above Nyquist ({nyquist} Hz); skipping");
                    false
                } else {
                    c > 0.0
                }
            })
        };

        Self {
            high_pass: usable("high-pass", high_pass)
                .map(|c| Butterworth::new(Response::HighPass, order, sample_rate, c)),
            low_pass: usable("low-pass", low_pass)
                .map(|c| Butterworth::new(Response::LowPass, order, sample_rate, c)),
        }
    }

    /// Whether any stage is active
    pub const fn is_active(&self) -> bool {
        self.high_pass.is_some() || self.low_pass.is_some()
    }

    /// Filter one series
    pub fn apply(&self, samples: &[f64]) -> Vec<f64> {
        let mut out = samples.to_vec();
        if let Some(hp) = &self.high_pass {
            out = hp.filtfilt(&out);
        }
        if let Some(lp) = &self.low_pass {
            out = lp.filtfilt(&out);
        }
        out
    }

    /// Filter every column of a time-by-series array in place
    pub fn apply_columns(&self, series: &mut Array2<f64>) {
        if !self.is_active() {
            return;
        }
        for mut column in series.axis_iter_mut(Axis(1)) {
            let filtered = self.apply(&column.to_vec());
            for (dst, src) in column.iter_mut().zip(filtered) {
                *dst = src;
            }
        }
    }
}
