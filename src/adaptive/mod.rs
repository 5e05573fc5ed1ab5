//! Adaptive filters.
//!
//! * [`BlockLmsFilter`] - FFT accelerated block LMS filter, adapting once per block of `N` samples.
//! * [`LmsFilter`] - [least mean squares](https://en.wikipedia.org/wiki/Least_mean_squares_filter)
//!   filter adapting on every sample, with normalized and sign variants.
//!
//! Both filters take an input signal x(n) and a reference signal d(n) (notation
//! from [here](https://en.wikipedia.org/wiki/Least_mean_squares_filter)) and
//! model d(n) as x(n) filtered by an unknown FIR filter.
//!
//! # Examples
//! ## System identification
//!
//! The reference is the input passed through a short FIR filter. The block
//! filter converges to the same impulse response.
//!
//! ```
//! use rand::{rngs::StdRng, Rng, SeedableRng};
//! use blockdsp::adaptive::BlockLmsFilter;
//!
//! // Generate noise signal
//! let sample_count = 16000;
//! let mut rng = StdRng::seed_from_u64(123);
//! let signal: Vec<f64> = (0..sample_count).map(|_| rng.gen_range(-1.0..=1.0)).collect();
//!
//! // Create filter instance
//! let mut filter = BlockLmsFilter::<f64>::from_options(8, 0.999_999, 0.05).unwrap();
//!
//! // Perform filtering
//! let mut previous = 0.0;
//! for x in signal.iter() {
//!     let d = 0.75 * *x - 0.5 * previous;
//!     previous = *x;
//!     filter.update(*x, d);
//! }
//!
//! let h = filter.impulse_response();
//! assert!((h[0] - 0.75).abs() < 1e-3);
//! assert!((h[1] + 0.5).abs() < 1e-3);
//! assert!(h[2..].iter().all(|h| h.abs() < 1e-3));
//! ```

mod block_lms_filter;
mod config;
mod lms_filter;

pub use block_lms_filter::BlockLmsFilter;
pub use config::BlockLmsConfig;
pub use lms_filter::{LmsFilter, LmsMode};
