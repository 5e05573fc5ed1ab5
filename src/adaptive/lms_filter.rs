use tracing::{debug, warn};

use super::config::{validate_memory, validate_mu, validate_size, DEFAULT_MEMORY, DEFAULT_MU};
use crate::error::{Error, Result};
use crate::filter::{validate_chunk, Filter};
use crate::sample::Sample;

/// The weight update rule of an [`LmsFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LmsMode {
    /// `w ← αw + μ e x`
    #[default]
    Normal,
    /// `w ← αw + μ e x / (xᵀx + ε)`
    Normalized,
    /// `w ← αw + μ sign(e) x`
    SignError,
    /// `w ← αw + μ e sign(x)`
    SignData,
    /// `w ← αw + μ sign(e) sign(x)`
    SignSign,
}

/// An adaptive [least mean squares filter](https://en.wikipedia.org/wiki/Least_mean_squares_filter)
/// updated once per sample. Using the same notation as in the linked description.
pub struct LmsFilter<T: Sample> {
    /// FIR filter coefficients
    w: Box<[f64]>,
    /// Most recent input values, a ring buffer. Newest sample is at `buffer_pos`.
    x: Box<[f64]>,
    /// Forgetting factor
    α: f64,
    /// Step size scale
    μ: f64,
    /// Constant added to the normalized update denominator to avoid division by zero.
    ε: f64,
    mode: LmsMode,
    learning: bool,
    buffer_pos: usize,
    _sample: core::marker::PhantomData<T>,
}

fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

impl<T: Sample> LmsFilter<T> {
    pub fn new(size: usize) -> Result<Self> {
        LmsFilter::from_options(size, LmsMode::Normal, DEFAULT_MEMORY, DEFAULT_MU)
    }

    pub fn from_options(size: usize, mode: LmsMode, memory: f64, mu: f64) -> Result<Self> {
        validate_size(size)?;
        validate_memory(memory)?;
        validate_mu(mu)?;
        debug!(size, ?mode, memory, mu, "created LMS filter");
        Ok(LmsFilter {
            w: vec![0.0; size].into_boxed_slice(),
            x: vec![0.0; size].into_boxed_slice(),
            α: memory,
            μ: mu,
            ε: 1e-3,
            mode,
            learning: true,
            buffer_pos: 0,
            _sample: core::marker::PhantomData,
        })
    }

    /// Pushes one input/reference pair and returns the error `d - wᵀx`.
    pub fn update(&mut self, x: T, d: T) -> T {
        let size = self.size();
        self.x[self.buffer_pos] = x.to_f64();

        let prev_idx = |i: usize, buffer_pos: usize| -> usize {
            if i > buffer_pos {
                (size + buffer_pos) - i
            } else {
                buffer_pos - i
            }
        };

        // Compute filter output y = w applied to x.
        let mut y = 0.0;
        for (i, w) in self.w.iter().enumerate() {
            y += w * self.x[prev_idx(i, self.buffer_pos)];
        }
        let e = d.to_f64() - y;

        if self.learning {
            let scale = match self.mode {
                LmsMode::Normalized => {
                    let power: f64 = self.x.iter().map(|x| x * x).sum();
                    self.μ * e / (power + self.ε)
                }
                LmsMode::SignError | LmsMode::SignSign => self.μ * sign(e),
                LmsMode::Normal | LmsMode::SignData => self.μ * e,
            };
            let sign_data = matches!(self.mode, LmsMode::SignData | LmsMode::SignSign);
            for (i, w) in self.w.iter_mut().enumerate() {
                let x = self.x[prev_idx(i, self.buffer_pos)];
                let x = if sign_data { sign(x) } else { x };
                *w = self.α * *w + scale * x;
            }
        }

        self.buffer_pos = if self.buffer_pos == size - 1 {
            0
        } else {
            self.buffer_pos + 1
        };

        T::from_f64(e)
    }

    /// Resizes the filter, clearing weights and history.
    pub fn set_size(&mut self, size: usize) -> Result<()> {
        validate_size(size)?;
        debug!(size, "resized LMS filter");
        self.w = vec![0.0; size].into_boxed_slice();
        self.x = vec![0.0; size].into_boxed_slice();
        self.buffer_pos = 0;
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.w.len()
    }

    pub fn set_mode(&mut self, mode: LmsMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> LmsMode {
        self.mode
    }

    pub fn set_memory(&mut self, memory: f64) -> Result<()> {
        validate_memory(memory)?;
        self.α = memory;
        Ok(())
    }

    pub fn memory(&self) -> f64 {
        self.α
    }

    pub fn set_mu(&mut self, mu: f64) -> Result<()> {
        validate_mu(mu)?;
        self.μ = mu;
        Ok(())
    }

    pub fn mu(&self) -> f64 {
        self.μ
    }

    /// Sets the regularization of [`LmsMode::Normalized`].
    pub fn set_epsilon(&mut self, epsilon: f64) -> Result<()> {
        if !(epsilon > 0.0 && epsilon.is_finite()) {
            warn!(epsilon, "rejected LMS epsilon");
            return Err(Error::EpsilonOutOfRange(epsilon));
        }
        self.ε = epsilon;
        Ok(())
    }

    pub fn epsilon(&self) -> f64 {
        self.ε
    }

    pub fn set_learning(&mut self, learning: bool) {
        self.learning = learning;
    }

    pub fn learning(&self) -> bool {
        self.learning
    }

    /// FIR coefficients, `w[0]` applies to the newest sample.
    pub fn weights(&self) -> &[f64] {
        &self.w
    }

    pub fn set_weights(&mut self, weights: &[f64]) -> Result<()> {
        if weights.len() != self.w.len() {
            warn!(expected = self.w.len(), actual = weights.len(), "rejected weight vector");
            return Err(Error::WeightLengthMismatch {
                expected: self.w.len(),
                actual: weights.len(),
            });
        }
        self.w.copy_from_slice(weights);
        Ok(())
    }

    /// Clears weights and history. Parameters are kept.
    pub fn reset(&mut self) {
        self.w.fill(0.0);
        self.x.fill(0.0);
        self.buffer_pos = 0;
    }
}

impl<T: Sample> Filter<T> for LmsFilter<T> {
    fn input_count(&self) -> usize {
        2
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process(&mut self, inputs: &[&[T]], outputs: &mut [&mut [T]]) {
        validate_chunk(&*self, inputs, outputs);
        for ((e, x), d) in outputs[0].iter_mut().zip(inputs[0]).zip(inputs[1]) {
            *e = self.update(*x, *d);
        }
    }
}
