//! # Marrow Core
//!
//! Foundational types shared by the Marrow animation crates:
//!
//! - [`MarrowError`] / [`Result`]: the single error type
//! - [`Transform`]: joint-local TRS
//! - [`CoordinateConvention`]: load-time axis correction
//! - [`ImportSettings`]: loader configuration

pub mod convention;
pub mod errors;
pub mod settings;
pub mod transform;

pub use convention::CoordinateConvention;
pub use errors::{MarrowError, Result};
pub use settings::ImportSettings;
pub use transform::Transform;
