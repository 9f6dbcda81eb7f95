//! Shared data structures for decline-curve analysis
//!
//! - `production`: observed points, streams, data-quality metadata
//! - `decline`: model families, fit modes and fit results
//! - `forecast`: forecast settings and results

mod decline;
mod forecast;
mod production;

pub use decline::*;
pub use forecast::*;
pub use production::*;
