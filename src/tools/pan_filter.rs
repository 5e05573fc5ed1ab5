use core::f64::consts::{FRAC_PI_4, SQRT_2};

use tracing::warn;

use crate::error::{Error, Result};
use crate::filter::{validate_chunk, Filter};
use crate::sample::Sample;

/// How a pan position maps to left and right gains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PanLaw {
    /// Constant power sin/cos law, unity gain in both channels at the center.
    #[default]
    SinCos0Center,
    /// Constant power sin/cos law, -3 dB in both channels at the center.
    SinCos3Center,
    /// Square root law, unity gain at the center.
    Square0Center,
    /// Square root law, -3 dB at the center.
    Square3Center,
    /// Linear crossfade, -6 dB at the center.
    LinearTaper,
    /// Attenuates only the channel opposite to the pan direction.
    Balance,
}

impl PanLaw {
    /// Returns `(left, right)` gains for a pan position in `[-1, 1]`.
    pub fn gains(self, pan: f64) -> (f64, f64) {
        match self {
            PanLaw::SinCos0Center => {
                let angle = (pan + 1.) * FRAC_PI_4;
                (SQRT_2 * angle.cos(), SQRT_2 * angle.sin())
            }
            PanLaw::SinCos3Center => {
                let angle = (pan + 1.) * FRAC_PI_4;
                (angle.cos(), angle.sin())
            }
            PanLaw::Square0Center => (
                SQRT_2 * ((1. - pan) / 2.).sqrt(),
                SQRT_2 * ((1. + pan) / 2.).sqrt(),
            ),
            PanLaw::Square3Center => (((1. - pan) / 2.).sqrt(), ((1. + pan) / 2.).sqrt()),
            PanLaw::LinearTaper => ((1. - pan) / 2., (1. + pan) / 2.),
            PanLaw::Balance => (
                if pan < 0. { 1. } else { 1. - pan },
                if pan > 0. { 1. } else { 1. + pan },
            ),
        }
    }
}

/// Pans a mono input to a stereo pair.
#[derive(Debug, Clone, Default)]
pub struct PanFilter {
    law: PanLaw,
    pan: f64,
}

impl PanFilter {
    pub fn new() -> Self {
        PanFilter::default()
    }

    pub fn set_pan_law(&mut self, law: PanLaw) {
        self.law = law;
    }

    pub fn pan_law(&self) -> PanLaw {
        self.law
    }

    /// Sets the pan position, `-1` is hard left and `1` hard right.
    pub fn set_pan(&mut self, pan: f64) -> Result<()> {
        if !(-1.0..=1.0).contains(&pan) {
            warn!(pan, "rejected pan position");
            return Err(Error::PanOutOfRange(pan));
        }
        self.pan = pan;
        Ok(())
    }

    pub fn pan(&self) -> f64 {
        self.pan
    }
}

impl<T: Sample> Filter<T> for PanFilter {
    fn input_count(&self) -> usize {
        1
    }

    fn output_count(&self) -> usize {
        2
    }

    /// Output channel 0 is left, channel 1 right.
    fn process(&mut self, inputs: &[&[T]], outputs: &mut [&mut [T]]) {
        validate_chunk::<T, Self>(&*self, inputs, outputs);
        let (left_gain, right_gain) = self.law.gains(self.pan);
        let (left, right) = outputs.split_at_mut(1);
        for ((input, left), right) in inputs[0]
            .iter()
            .zip(left[0].iter_mut())
            .zip(right[0].iter_mut())
        {
            let input = input.to_f64();
            *left = T::from_f64(left_gain * input);
            *right = T::from_f64(right_gain * input);
        }
    }
}
