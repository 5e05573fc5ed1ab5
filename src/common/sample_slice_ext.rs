//! Level measurements on sample slices.

use crate::sample::Sample;

/// Level measurements on `[T]` where `T` is a [`Sample`].
pub trait SampleSliceExt {
    /// Returns the maximum absolute value.
    fn peak_level(&self) -> f64;
    /// Returns the mean of the squared samples.
    fn mean_power(&self) -> f64;
    /// Returns the [root mean square](https://en.wikipedia.org/wiki/Root_mean_square)
    /// level.
    fn rms_level(&self) -> f64;
    /// Returns the [root mean square](https://en.wikipedia.org/wiki/Root_mean_square)
    /// level in dB relative to 1, i.e 0 dB corresponds to a level of 1.
    fn rms_level_db(&self) -> f64;
}

impl<T: Sample> SampleSliceExt for [T] {
    fn peak_level(&self) -> f64 {
        self.iter()
            .map(|sample| sample.to_f64().abs())
            .fold(0.0, f64::max)
    }

    fn mean_power(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        };
        let sum: f64 = self
            .iter()
            .map(|sample| {
                let value = sample.to_f64();
                value * value
            })
            .sum();
        sum / (self.len() as f64)
    }

    fn rms_level(&self) -> f64 {
        self.mean_power().sqrt()
    }

    fn rms_level_db(&self) -> f64 {
        20. * self.rms_level().log10()
    }
}
