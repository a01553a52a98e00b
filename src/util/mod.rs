//! Utility types and functions shared by the viewer.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - [`Bounds`] - Axis-aligned bounding box over `glam` vectors
//! - [`natural_cmp`] - Numeric-aware file name ordering

mod bounds;
mod error;
mod sort;

pub use bounds::*;
pub use error::*;
pub use sort::*;
