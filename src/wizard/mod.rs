//! New-series wizard steps.

pub mod access;

pub use access::NewSeriesAccess;
