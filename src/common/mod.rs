//! Common algorithms and utilities.

mod fft;
mod sample_slice_ext;

pub use fft::Fft;
pub use sample_slice_ext::SampleSliceExt;
