//! Import Settings
//!
//! Options the asset loader applies while turning importer output into clips,
//! skeletons and skins.
//!
//! ```rust,ignore
//! use marrow_core::{CoordinateConvention, ImportSettings};
//!
//! let settings = ImportSettings {
//!     convention: CoordinateConvention::Native,
//!     ..Default::default()
//! };
//! ```

use serde::{Deserialize, Serialize};

use crate::convention::CoordinateConvention;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Axis correction applied once at load time.
    pub convention: CoordinateConvention,

    /// Emit a `warn!` when a skin binding had to drop influences beyond the
    /// per-vertex slot limit. Off by default; the count is always available
    /// from the skin cluster.
    pub report_dropped_influences: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            convention: CoordinateConvention::FlipZ,
            report_dropped_influences: false,
        }
    }
}
