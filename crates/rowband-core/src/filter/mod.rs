pub mod module;
pub mod modules;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use module::RowFilter;

/// The transform selected for a run. Fixed for the run's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Grayscale,
    Blur,
}

impl FilterKind {
    /// Command-line mode: `"grey"` selects grayscale, anything else blur.
    pub fn from_mode(mode: &str) -> Self {
        if mode == "grey" {
            Self::Grayscale
        } else {
            Self::Blur
        }
    }

    pub fn filter(self) -> &'static dyn RowFilter {
        match self {
            Self::Grayscale => &modules::Grayscale,
            Self::Blur => &modules::Blur,
        }
    }

    pub fn needs_halo(self) -> bool {
        self.filter().needs_halo()
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.filter().name())
    }
}
