use rustfft::num_complex::Complex64;
use tracing::{debug, warn};

use super::config::{
    validate_memory, validate_mu, validate_size, BlockLmsConfig, DEFAULT_MEMORY, DEFAULT_MU,
};
use crate::common::Fft;
use crate::error::{Error, Result};
use crate::filter::{validate_chunk, Filter};
use crate::sample::Sample;

/// Buffers and frequency domain weights of a block LMS filter of size `N`.
///
/// Replaced wholesale when the filter is resized.
struct BlockLmsState<T: Sample> {
    /// `N`, the number of samples accumulated before each adaptation step.
    block_size: usize,
    /// Transform of the current coefficients, length `2N`.
    weights: Box<[Complex64]>,
    /// Previous block in `[..N]`, block under accumulation in `[N..]`.
    input: Box<[T]>,
    /// Reference samples of the block under accumulation, length `N`.
    reference: Box<[T]>,
    /// Residuals of the most recently completed block, length `N`.
    residual: Box<[T]>,
    /// Transform of `input`, length `2N`.
    input_spectrum: Box<[Complex64]>,
    /// Prediction, error and gradient spectra, length `2N`.
    spectrum: Box<[Complex64]>,
    /// Time domain scratch, length `2N`.
    time: Box<[f64]>,
    fft: Fft,
    /// Position within the block under accumulation, in `[0, N)`.
    accumulated: usize,
}

impl<T: Sample> BlockLmsState<T> {
    fn new(size: usize) -> Self {
        let full = 2 * size;
        let zero = Complex64::new(0.0, 0.0);
        BlockLmsState {
            block_size: size,
            weights: vec![zero; full].into_boxed_slice(),
            input: vec![T::ZERO; full].into_boxed_slice(),
            reference: vec![T::ZERO; size].into_boxed_slice(),
            residual: vec![T::ZERO; size].into_boxed_slice(),
            input_spectrum: vec![zero; full].into_boxed_slice(),
            spectrum: vec![zero; full].into_boxed_slice(),
            time: vec![0.0; full].into_boxed_slice(),
            fft: Fft::new(full),
            accumulated: 0,
        }
    }

    fn size(&self) -> usize {
        self.weights.len() / 2
    }

    fn clear_buffers(&mut self) {
        let zero = Complex64::new(0.0, 0.0);
        self.input.fill(T::ZERO);
        self.reference.fill(T::ZERO);
        self.residual.fill(T::ZERO);
        self.input_spectrum.fill(zero);
        self.spectrum.fill(zero);
        self.time.fill(0.0);
        self.accumulated = 0;
    }

    #[inline]
    fn update(&mut self, input: T, reference: T, memory: f64, mu: f64, learning: bool) -> T {
        let block_size = self.block_size;
        let slot = self.accumulated;

        self.input[block_size + slot] = input;
        // Both values still belong to the previous block.
        let output = self.reference[slot] - self.residual[slot];
        self.reference[slot] = reference;

        self.accumulated += 1;
        if self.accumulated == block_size {
            self.process_block(memory, mu, learning);
            self.accumulated = 0;
        }
        output
    }

    fn process_block(&mut self, memory: f64, mu: f64, learning: bool) {
        let block_size = self.block_size;
        let full_size = 2 * block_size;
        // Undoes the 1 / 2N applied by each forward transform.
        let fft_factor = full_size as f64;

        // Fast convolution. Only the last N samples of the circular result are valid.
        self.fft.forward(&self.input, &mut self.input_spectrum);
        for ((y, x), w) in self
            .spectrum
            .iter_mut()
            .zip(self.input_spectrum.iter())
            .zip(self.weights.iter())
        {
            *y = x * w * fft_factor;
        }
        self.fft.backward(&self.spectrum, &mut self.time);

        for (i, (reference, residual)) in self
            .reference
            .iter()
            .zip(self.residual.iter_mut())
            .enumerate()
        {
            let error = reference.to_f64() - self.time[block_size + i];
            self.time[block_size + i] = error;
            *residual = T::from_f64(error);
        }

        if learning {
            // Error spectrum of [0; N] followed by the residuals.
            self.time[..block_size].fill(0.0);
            self.fft.forward(&self.time, &mut self.spectrum);
            for (e, x) in self.spectrum.iter_mut().zip(self.input_spectrum.iter()) {
                *e = x.conj() * *e * fft_factor;
            }
            self.fft.backward(&self.spectrum, &mut self.time);

            // Gradient constraint: keep the N causal lags only.
            self.fft.forward(&self.time[..block_size], &mut self.spectrum);
            for (w, g) in self.weights.iter_mut().zip(self.spectrum.iter()) {
                *w = *w * memory + *g * mu;
            }
        }

        self.input.copy_within(block_size.., 0);
    }
}

/// An FFT accelerated [block LMS](https://en.wikipedia.org/wiki/Least_mean_squares_filter)
/// adaptive filter.
///
/// Samples are accumulated into blocks of `N` samples. Once a block is
/// complete, the filter predicts the reference from the input using overlap-save
/// fast convolution, stores the residual and, if learning is enabled, performs a
/// gradient constrained leaky weight update in the frequency domain:
///
/// ```text
/// W ← memory · W + mu · FFT(first N lags of IFFT(conj(X) · E))
/// ```
///
/// The value returned by [`BlockLmsFilter::update`] for slot `i` of a block
/// equals the prediction made for slot `i` of the previous block, i.e the
/// filter has a latency of exactly one block.
///
/// Stability depends entirely on `memory`, `mu` and the input signal. Weights
/// are never checked for divergence.
pub struct BlockLmsFilter<T: Sample> {
    state: BlockLmsState<T>,
    memory: f64,
    mu: f64,
    learning: bool,
}

impl<T: Sample> BlockLmsFilter<T> {
    /// Creates a filter of length `size` with `memory = 0.99`, `mu = 0.05` and
    /// learning enabled.
    pub fn new(size: usize) -> Result<Self> {
        BlockLmsFilter::from_options(size, DEFAULT_MEMORY, DEFAULT_MU)
    }

    pub fn from_options(size: usize, memory: f64, mu: f64) -> Result<Self> {
        BlockLmsFilter::from_config(&BlockLmsConfig {
            size,
            memory,
            mu,
            learning: true,
        })
    }

    pub fn from_config(config: &BlockLmsConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            size = config.size,
            memory = config.memory,
            mu = config.mu,
            "created block LMS filter"
        );
        Ok(BlockLmsFilter {
            state: BlockLmsState::new(config.size),
            memory: config.memory,
            mu: config.mu,
            learning: config.learning,
        })
    }

    /// Pushes one input/reference pair and returns the output delayed by one block.
    ///
    /// Every `N`th call triggers a block adaptation step.
    #[inline]
    pub fn update(&mut self, input: T, reference: T) -> T {
        self.state
            .update(input, reference, self.memory, self.mu, self.learning)
    }

    /// Resizes the filter. Discards all adaptation and sets the block size to `size`.
    pub fn set_size(&mut self, size: usize) -> Result<()> {
        validate_size(size)?;
        debug!(size, "resized block LMS filter");
        self.state = BlockLmsState::new(size);
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.state.size()
    }

    /// Clears the sample buffers and the block position, keeping the weights.
    ///
    /// The block size is tied to the filter size, so `block_size` must equal
    /// [`BlockLmsFilter::size`]. Use [`BlockLmsFilter::set_size`] to change it.
    pub fn set_block_size(&mut self, block_size: usize) -> Result<()> {
        if block_size == 0 {
            warn!("rejected zero block size");
            return Err(Error::InvalidBlockSize);
        }
        let size = self.size();
        if block_size != size {
            warn!(block_size, size, "rejected block size that differs from the filter size");
            return Err(Error::BlockSizeMismatch { block_size, size });
        }
        self.state.clear_buffers();
        Ok(())
    }

    pub fn block_size(&self) -> usize {
        self.state.block_size
    }

    /// Sets the forgetting factor, in `(0, 1)`.
    pub fn set_memory(&mut self, memory: f64) -> Result<()> {
        validate_memory(memory)?;
        self.memory = memory;
        Ok(())
    }

    pub fn memory(&self) -> f64 {
        self.memory
    }

    /// Sets the adaptation step size, in `(0, 1)`.
    pub fn set_mu(&mut self, mu: f64) -> Result<()> {
        validate_mu(mu)?;
        self.mu = mu;
        Ok(())
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Enables or disables adaptation. A filter that is not learning is a
    /// frozen predictor.
    pub fn set_learning(&mut self, learning: bool) {
        self.learning = learning;
    }

    pub fn learning(&self) -> bool {
        self.learning
    }

    /// The frequency domain weights, length `2 * size`.
    pub fn weights(&self) -> &[Complex64] {
        &self.state.weights
    }

    /// Overwrites the frequency domain weights, e.g to restore a checkpoint.
    pub fn set_weights(&mut self, weights: &[Complex64]) -> Result<()> {
        let expected = self.state.weights.len();
        if weights.len() != expected {
            warn!(expected, actual = weights.len(), "rejected weight vector");
            return Err(Error::WeightLengthMismatch {
                expected,
                actual: weights.len(),
            });
        }
        self.state.weights.copy_from_slice(weights);
        Ok(())
    }

    /// The time domain filter that the current weights represent, `size` taps.
    pub fn impulse_response(&mut self) -> Vec<f64> {
        let state = &mut self.state;
        state.fft.backward(&state.weights, &mut state.time);
        state.time[..state.block_size].to_vec()
    }

    /// Sets the weights from a time domain filter of at most `size` taps.
    pub fn set_impulse_response(&mut self, taps: &[f64]) -> Result<()> {
        let max = self.size();
        if taps.len() > max {
            warn!(max, actual = taps.len(), "rejected impulse response");
            return Err(Error::ImpulseResponseTooLong {
                max,
                actual: taps.len(),
            });
        }
        let state = &mut self.state;
        state.fft.forward(taps, &mut state.weights);
        Ok(())
    }

    /// Clears buffers, block position and weights. Parameters are kept.
    pub fn reset(&mut self) {
        debug!(size = self.size(), "reset block LMS filter");
        self.state.clear_buffers();
        self.state.weights.fill(Complex64::new(0.0, 0.0));
    }
}

impl<T: Sample> Filter<T> for BlockLmsFilter<T> {
    fn input_count(&self) -> usize {
        2
    }

    fn output_count(&self) -> usize {
        1
    }

    /// Input channel 0 is the input signal, channel 1 the reference.
    fn process(&mut self, inputs: &[&[T]], outputs: &mut [&mut [T]]) {
        validate_chunk(&*self, inputs, outputs);
        let (input, reference) = (inputs[0], inputs[1]);
        for ((output, x), d) in outputs[0].iter_mut().zip(input).zip(reference) {
            *output = self.update(*x, *d);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn noise(count: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count).map(|_| rng.gen_range(-1.0..=1.0)).collect()
    }

    fn assert_all_zero(weights: &[Complex64]) {
        assert!(weights.iter().all(|w| *w == Complex64::new(0.0, 0.0)));
    }

    #[test]
    fn test_construction() {
        for size in [1, 2, 3, 4, 7, 64, 100] {
            let filter = BlockLmsFilter::<f64>::new(size).unwrap();
            assert_eq!(filter.size(), size);
            assert_eq!(filter.block_size(), size);
            assert_eq!(filter.weights().len(), 2 * size);
            assert_all_zero(filter.weights());
            assert_eq!(filter.memory(), 0.99);
            assert_eq!(filter.mu(), 0.05);
            assert!(filter.learning());
        }
        assert!(matches!(
            BlockLmsFilter::<f32>::new(0),
            Err(Error::InvalidSize)
        ));
    }

    #[test]
    fn test_parameter_round_trip() {
        let mut filter = BlockLmsFilter::<f64>::new(8).unwrap();
        for value in [1e-6, 0.01, 0.5, 0.999] {
            filter.set_memory(value).unwrap();
            assert_eq!(filter.memory(), value);
            filter.set_mu(value).unwrap();
            assert_eq!(filter.mu(), value);
        }

        filter.set_memory(0.5).unwrap();
        filter.set_mu(0.25).unwrap();
        for invalid in [0.0, 1.0, -1.0] {
            assert_eq!(
                filter.set_memory(invalid),
                Err(Error::MemoryOutOfRange(invalid))
            );
            assert_eq!(filter.set_mu(invalid), Err(Error::MuOutOfRange(invalid)));
        }
        assert_eq!(filter.memory(), 0.5);
        assert_eq!(filter.mu(), 0.25);

        filter.set_learning(false);
        assert!(!filter.learning());
    }

    #[test]
    fn test_first_block_outputs_zero() {
        let mut filter = BlockLmsFilter::<f64>::new(4).unwrap();
        for i in 0..4 {
            assert_eq!(filter.update(i as f64 + 1.0, -(i as f64)), 0.0);
        }
    }

    #[test]
    fn test_frozen_zero_filter_predicts_zero() {
        let mut filter = BlockLmsFilter::<f64>::new(8).unwrap();
        filter.set_learning(false);
        let input = noise(800, 1);
        let reference = noise(800, 2);
        for (x, d) in input.iter().zip(reference.iter()) {
            assert_eq!(filter.update(*x, *d), 0.0);
        }
        assert_all_zero(filter.weights());
    }

    #[test]
    fn test_one_block_latency() {
        // An identity filter predicts the input, which is returned one block later.
        let mut filter = BlockLmsFilter::<f64>::new(4).unwrap();
        filter.set_learning(false);
        filter.set_impulse_response(&[1.0]).unwrap();

        let input = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let reference = [0.5, -0.25, 2.0, 10.0, 0.0, 0.0, 0.0, 0.0];
        let output: Vec<f64> = input
            .iter()
            .zip(reference.iter())
            .map(|(x, d)| filter.update(*x, *d))
            .collect();

        assert_eq!(&output[..4], &[0.0; 4]);
        for i in 0..4 {
            // reference - (reference - prediction)
            let golden = reference[i] - (reference[i] - input[i]);
            assert_abs_diff_eq!(output[4 + i], golden, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_overlap_save_uses_previous_block() {
        // A one sample delay reaches back into the previous block.
        let mut filter = BlockLmsFilter::<f64>::new(4).unwrap();
        filter.set_learning(false);
        filter.set_impulse_response(&[0.0, 1.0]).unwrap();

        let input: Vec<f64> = (1..=12).map(|i| i as f64).collect();
        let output: Vec<f64> = input.iter().map(|x| filter.update(*x, 0.0)).collect();

        let expected = [
            0.0, 0.0, 0.0, 0.0, // first block
            0.0, 1.0, 2.0, 3.0, // delayed prediction of the first block
            4.0, 5.0, 6.0, 7.0, // delayed prediction of the second block
        ];
        for (actual, expected) in output.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*actual, *expected, epsilon = 1e-12);
        }
    }

    /// Runs `blocks` blocks of a deterministic sequence through a default filter.
    /// The reference is `0.5 x(n) - 0.25 x(n - 1)`.
    fn run_default_filter(size: usize, blocks: usize) -> (BlockLmsFilter<f64>, Vec<f64>) {
        let input: Vec<f64> = (0..size * blocks)
            .map(|n| (((n * 7) % 11) as f64 - 5.0) / 5.0)
            .collect();
        let mut filter = BlockLmsFilter::<f64>::new(size).unwrap();
        let output = (0..input.len())
            .map(|n| {
                let previous = if n > 0 { input[n - 1] } else { 0.0 };
                filter.update(input[n], 0.5 * input[n] - 0.25 * previous)
            })
            .collect();
        (filter, output)
    }

    fn assert_golden(
        filter: &BlockLmsFilter<f64>,
        output: &[f64],
        golden: &[f64],
        weights: &[(f64, f64)],
    ) {
        assert_eq!(output.len(), golden.len());
        for (n, (actual, expected)) in output.iter().zip(golden.iter()).enumerate() {
            assert!(
                (actual - expected).abs() < 1e-12,
                "output {} is {}, expected {}",
                n,
                actual,
                expected
            );
        }
        assert_eq!(filter.weights().len(), weights.len());
        for (actual, (re, im)) in filter.weights().iter().zip(weights.iter()) {
            assert_abs_diff_eq!(actual.re, *re, epsilon = 1e-12);
            assert_abs_diff_eq!(actual.im, *im, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_learning_step_golden_values_even_size() {
        // memory 0.99, mu 0.05, five blocks.
        let (filter, output) = run_default_filter(4, 5);
        #[rustfmt::skip]
        let golden = [
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
            -0.0493, -0.011100000000000165, 0.05570000000000008, -0.05460000000000009,
            -0.06069740000000001, 0.11293040000000004, -0.07802800000000007, -0.07039679999999998,
            0.16552208880000013, -0.1020299976, 0.13919797680000023, -0.04214108160000021,
        ];
        let weights = [
            (0.01573226199219801, 0.0),
            (0.009045598280948183, 0.006524069302620965),
            (0.024606254920740003, 0.022856943473806),
            (0.041370197735999835, 0.007727355478088973),
            (0.035886820200218016, 0.0),
            (0.04137019773599984, -0.0077273554780889625),
            (0.024606254920740013, -0.022856943473806),
            (0.009045598280948189, -0.006524069302620967),
        ];
        assert_golden(&filter, &output, &golden, &weights);
    }

    #[test]
    fn test_learning_step_golden_values_odd_size() {
        let (filter, output) = run_default_filter(3, 5);
        #[rustfmt::skip]
        let golden = [
            0.0, 0.0, 0.0,
            0.0, 0.0, 0.0,
            0.05740000000000001, -0.026499999999999982, -0.01469999999999999,
            0.09188160000000001, -0.045720200000000044, -0.05131759999999996,
            0.11866133039999999, -0.06747254440000006, -0.08953260599999996,
        ];
        let weights = [
            (0.012432222502931998, 0.0),
            (0.01705627175421399, 0.013437782024301525),
            (0.03570714371005798, 0.01886647580868181),
            (0.04973396641462001, 0.0),
            (0.035707143710058, -0.018866475808681806),
            (0.01705627175421399, -0.013437782024301525),
        ];
        assert_golden(&filter, &output, &golden, &weights);
    }

    #[test]
    fn test_impulse_response_round_trip() {
        let mut filter = BlockLmsFilter::<f32>::new(5).unwrap();
        let taps = [0.5, -0.25, 0.125, 0.0, 1.0];
        filter.set_impulse_response(&taps).unwrap();
        let response = filter.impulse_response();
        for (expected, actual) in taps.iter().zip(response.iter()) {
            assert_abs_diff_eq!(*expected, *actual, epsilon = 1e-12);
        }
        assert_eq!(
            filter.set_impulse_response(&[0.0; 6]),
            Err(Error::ImpulseResponseTooLong { max: 5, actual: 6 })
        );
    }

    #[test]
    fn test_block_size_reset_matches_fresh_filter() {
        let input = noise(64, 3);
        let reference = noise(64, 4);

        let mut filter = BlockLmsFilter::<f64>::new(4).unwrap();
        for (x, d) in input.iter().zip(reference.iter()).take(10) {
            filter.update(*x, *d);
        }
        filter.set_learning(false);
        filter.set_weights(&vec![Complex64::new(0.0, 0.0); 8]).unwrap();
        filter.set_block_size(4).unwrap();

        let mut fresh = BlockLmsFilter::<f64>::new(4).unwrap();
        fresh.set_learning(false);
        for (x, d) in input.iter().zip(reference.iter()).skip(10).take(8) {
            assert_eq!(filter.update(*x, *d), fresh.update(*x, *d));
        }
    }

    #[test]
    fn test_block_size_must_match_size() {
        let mut filter = BlockLmsFilter::<f64>::new(4).unwrap();
        assert_eq!(filter.set_block_size(0), Err(Error::InvalidBlockSize));
        assert_eq!(
            filter.set_block_size(8),
            Err(Error::BlockSizeMismatch {
                block_size: 8,
                size: 4
            })
        );
        assert_eq!(filter.block_size(), 4);
    }

    #[test]
    fn test_resize_clears_adaptation() {
        let input = noise(400, 5);
        let mut filter = BlockLmsFilter::<f64>::new(8).unwrap();
        for x in input.iter() {
            filter.update(*x, 0.5 * *x);
        }
        assert!(filter.weights().iter().any(|w| w.norm() > 0.0));

        for size in [8, 3, 16] {
            filter.set_size(size).unwrap();
            assert_eq!(filter.size(), size);
            assert_eq!(filter.block_size(), size);
            assert_eq!(filter.weights().len(), 2 * size);
            assert_all_zero(filter.weights());
        }

        filter.set_mu(0.2).unwrap();
        assert_eq!(filter.set_size(0), Err(Error::InvalidSize));
        assert_eq!(filter.size(), 16);
        assert_eq!(filter.mu(), 0.2);
    }

    #[test]
    fn test_set_weights_checks_length() {
        let mut filter = BlockLmsFilter::<f64>::new(4).unwrap();
        let weights: Vec<Complex64> = (0..8).map(|i| Complex64::new(i as f64, 1.0)).collect();
        filter.set_weights(&weights).unwrap();
        assert_eq!(filter.weights(), &weights[..]);

        assert_eq!(
            filter.set_weights(&weights[..4]),
            Err(Error::WeightLengthMismatch {
                expected: 8,
                actual: 4
            })
        );
        assert_eq!(filter.weights(), &weights[..]);
    }

    #[test]
    fn test_reset_clears_weights_and_keeps_parameters() {
        let mut filter = BlockLmsFilter::<f64>::from_options(4, 0.9, 0.1).unwrap();
        filter.set_impulse_response(&[1.0, 0.5]).unwrap();
        filter.update(1.0, 1.0);
        filter.reset();
        assert_all_zero(filter.weights());
        assert_eq!(filter.memory(), 0.9);
        assert_eq!(filter.mu(), 0.1);
        assert_eq!(filter.update(1.0, 1.0), 0.0);
    }

    #[test]
    fn test_chunk_size_does_not_matter() {
        let input = noise(100, 6);
        let reference: Vec<f64> = input.iter().map(|x| 0.8 * x).collect();

        let mut by_sample = BlockLmsFilter::<f64>::new(8).unwrap();
        let expected: Vec<f64> = input
            .iter()
            .zip(reference.iter())
            .map(|(x, d)| by_sample.update(*x, *d))
            .collect();

        let mut by_chunk = BlockLmsFilter::<f64>::new(8).unwrap();
        let mut output = vec![0.0; input.len()];
        let mut offset = 0;
        for chunk_len in [3, 13, 0, 1, 40, 43] {
            let range = offset..offset + chunk_len;
            by_chunk.process(
                &[&input[range.clone()], &reference[range.clone()]],
                &mut [&mut output[range]],
            );
            offset += chunk_len;
        }
        assert_eq!(offset, input.len());
        assert_eq!(output, expected);
    }

    #[test]
    fn test_learning_moves_weights_towards_target() {
        let input = noise(4000, 7);
        let mut filter = BlockLmsFilter::<f32>::from_options(4, 0.999_999, 0.05).unwrap();
        for x in input.iter() {
            let x = *x as f32;
            filter.update(x, 0.5 * x);
        }
        let response = filter.impulse_response();
        assert_abs_diff_eq!(response[0], 0.5, epsilon = 1e-3);
        for tap in &response[1..] {
            assert_abs_diff_eq!(*tap, 0.0, epsilon = 1e-3);
        }
    }
}
