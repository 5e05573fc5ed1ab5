use std::fmt;
use std::sync::Arc;

use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;

use crate::sample::Sample;

/// Fixed length discrete Fourier transform working in `f64`.
///
/// The forward transform is scaled by `1 / size`, the backward transform is
/// unscaled and only keeps the real part. Code mixing the two directions must
/// multiply by `size` once per round trip through the frequency domain.
/// Neither direction allocates.
pub struct Fft {
    size: usize,
    forward: Arc<dyn rustfft::Fft<f64>>,
    inverse: Arc<dyn rustfft::Fft<f64>>,
    buffer: Box<[Complex64]>,
    scratch: Box<[Complex64]>,
}

impl fmt::Debug for Fft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fft").field("size", &self.size).finish()
    }
}

impl Fft {
    pub fn new(size: usize) -> Self {
        if size == 0 {
            panic!("FFT size must be greater than 0")
        }

        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        Fft {
            size,
            forward,
            inverse,
            buffer: vec![Complex64::new(0.0, 0.0); size].into_boxed_slice(),
            scratch: vec![Complex64::new(0.0, 0.0); scratch_len].into_boxed_slice(),
        }
    }

    /// Replans the transforms for a new length.
    pub fn set_size(&mut self, size: usize) {
        *self = Fft::new(size);
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Transforms up to `size` real samples, zero padding the rest.
    pub fn forward<T: Sample>(&mut self, input: &[T], output: &mut [Complex64]) {
        if input.len() > self.size {
            panic!(
                "Got forward FFT input of length {}, expected at most {}",
                input.len(),
                self.size
            )
        }
        if output.len() != self.size {
            panic!(
                "Got forward FFT output of length {}, expected {}",
                output.len(),
                self.size
            )
        }

        let (head, tail) = output.split_at_mut(input.len());
        for (value, sample) in head.iter_mut().zip(input) {
            *value = Complex64::new(sample.to_f64(), 0.0);
        }
        for value in tail.iter_mut() {
            *value = Complex64::new(0.0, 0.0);
        }

        self.forward.process_with_scratch(output, &mut self.scratch);

        let scale = 1.0 / self.size as f64;
        for value in output.iter_mut() {
            *value *= scale;
        }
    }

    /// Unscaled inverse transform, keeping the real part.
    pub fn backward(&mut self, input: &[Complex64], output: &mut [f64]) {
        if input.len() != self.size || output.len() != self.size {
            panic!(
                "Backward FFT buffers must have length {}, got {} and {}",
                self.size,
                input.len(),
                output.len()
            )
        }

        self.buffer.copy_from_slice(input);
        self.inverse
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
        for (sample, value) in output.iter_mut().zip(self.buffer.iter()) {
            *sample = value.re;
        }
    }
}
