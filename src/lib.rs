//! Composable real-time audio filters.
//!
//! Every filter is a streaming node implementing [`Filter`]: a fixed number of
//! input and output channels, processing chunks of arbitrary length. Filters
//! are generic over the [`Sample`] type (`f32` or `f64`).
//!
//! Features
//! * [`adaptive::BlockLmsFilter`], an FFT accelerated block LMS adaptive filter
//! using overlap-save fast convolution and a gradient constrained frequency
//! domain weight update, suitable for echo and noise cancellation.
//! * [`adaptive::LmsFilter`], a per-sample LMS filter with normalized and sign variants.
//! * [`tools::PanFilter`], mono to stereo panning with the common pan laws.
//! * No allocations while processing, suitable for real time audio use. Memory
//! is only allocated when a filter is created or resized.
//!
//! # Examples
//!
//! Streaming API, passing chunks of arbitrary size through a filter.
//!
//! ```
//! use blockdsp::{adaptive::BlockLmsFilter, Filter};
//!
//! let mut filter = BlockLmsFilter::<f32>::new(256).unwrap();
//! let input = vec![0.0; 100];
//! let reference = vec![0.0; 100];
//! let mut output = vec![0.0; 100];
//! filter.process(&[&input[..], &reference[..]], &mut [&mut output[..]]);
//! ```

pub mod adaptive;
pub mod common;
mod error;
mod filter;
mod sample;
pub mod tools;

pub use error::{Error, Result};
pub use filter::Filter;
pub use sample::Sample;
