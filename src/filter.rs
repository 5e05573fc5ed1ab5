//! The streaming contract shared by every filter in the crate.

use crate::sample::Sample;

/// A streaming filter node with a fixed number of input and output channels.
///
/// The caller pulls chunks of arbitrary length through [`Filter::process`].
/// Filters that work on fixed size blocks internally carry partial blocks
/// over from one chunk to the next, so chunk boundaries never affect the
/// output.
pub trait Filter<T: Sample> {
    /// The number of input channels.
    fn input_count(&self) -> usize;

    /// The number of output channels.
    fn output_count(&self) -> usize;

    /// Processes one chunk. All input and output slices must have the same length.
    fn process(&mut self, inputs: &[&[T]], outputs: &mut [&mut [T]]);
}

/// Panics unless the channel counts match `filter` and all channels have the
/// same length. Returns the chunk length.
pub(crate) fn validate_chunk<T: Sample, F: Filter<T> + ?Sized>(
    filter: &F,
    inputs: &[&[T]],
    outputs: &[&mut [T]],
) -> usize {
    if inputs.len() != filter.input_count() {
        panic!(
            "Got {} input channels, expected {}",
            inputs.len(),
            filter.input_count()
        )
    }
    if outputs.len() != filter.output_count() {
        panic!(
            "Got {} output channels, expected {}",
            outputs.len(),
            filter.output_count()
        )
    }

    let chunk_len = inputs
        .first()
        .map(|input| input.len())
        .or_else(|| outputs.first().map(|output| output.len()))
        .unwrap_or(0);
    let inputs_match = inputs.iter().all(|input| input.len() == chunk_len);
    let outputs_match = outputs.iter().all(|output| output.len() == chunk_len);
    if !inputs_match || !outputs_match {
        panic!("All channels of a chunk must have the same length")
    }
    chunk_len
}
