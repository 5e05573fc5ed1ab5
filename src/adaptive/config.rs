use tracing::warn;

use crate::error::{Error, Result};

pub(crate) const DEFAULT_MEMORY: f64 = 0.99;
pub(crate) const DEFAULT_MU: f64 = 0.05;

/// Construction options for a [`BlockLmsFilter`](super::BlockLmsFilter).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BlockLmsConfig {
    /// Filter length `N`, which is also the block length.
    pub size: usize,
    /// Forgetting factor applied to the weights once per block.
    pub memory: f64,
    /// Adaptation step size.
    pub mu: f64,
    /// Whether the weights adapt.
    pub learning: bool,
}

impl Default for BlockLmsConfig {
    fn default() -> Self {
        BlockLmsConfig {
            size: 64,
            memory: DEFAULT_MEMORY,
            mu: DEFAULT_MU,
            learning: true,
        }
    }
}

impl BlockLmsConfig {
    pub fn validate(&self) -> Result<()> {
        validate_size(self.size)?;
        validate_memory(self.memory)?;
        validate_mu(self.mu)
    }
}

pub(crate) fn validate_size(size: usize) -> Result<()> {
    if size == 0 {
        warn!("rejected zero filter size");
        return Err(Error::InvalidSize);
    }
    Ok(())
}

pub(crate) fn validate_memory(memory: f64) -> Result<()> {
    if !(memory > 0.0 && memory < 1.0) {
        warn!(memory, "rejected memory factor");
        return Err(Error::MemoryOutOfRange(memory));
    }
    Ok(())
}

pub(crate) fn validate_mu(mu: f64) -> Result<()> {
    if !(mu > 0.0 && mu < 1.0) {
        warn!(mu, "rejected step size");
        return Err(Error::MuOutOfRange(mu));
    }
    Ok(())
}
