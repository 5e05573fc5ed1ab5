//! Utility filters.

mod pan_filter;

pub use pan_filter::{PanFilter, PanLaw};
