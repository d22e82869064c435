//! Core types for spark-pointer.
//!
//! Plain data shared by every module: the pointer sample handed to user
//! callbacks, the modality tag, handler ids and the arbiter options.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PointerError, Result};

/// Window during which a start from the other modality is treated as a
/// browser-synthesized ghost and dropped.
///
/// Touch interfaces fire a trailing mousedown/mouseup pair after the touch
/// sequence. Fixed, not configurable.
pub const DUPLICATE_INTERVAL: Duration = Duration::from_millis(400);

// =============================================================================
// PointerSample
// =============================================================================

/// Last known pointer location in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerSample {
    pub client_x: f64,
    pub client_y: f64,
}

impl PointerSample {
    pub fn new(client_x: f64, client_y: f64) -> Self {
        Self { client_x, client_y }
    }
}

impl From<(f64, f64)> for PointerSample {
    fn from((client_x, client_y): (f64, f64)) -> Self {
        Self { client_x, client_y }
    }
}

impl fmt::Display for PointerSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.client_x, self.client_y)
    }
}

// =============================================================================
// Modality
// =============================================================================

/// Which input family owns the active gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Modality {
    #[default]
    None,
    Mouse,
    Touch,
}

impl Modality {
    /// True for `Mouse` and `Touch`.
    pub fn is_some(self) -> bool {
        self != Modality::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Modality::None => "none",
            Modality::Mouse => "mouse",
            Modality::Touch => "touch",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// HandlerId
// =============================================================================

/// Identifier returned by `register_start`.
///
/// Minted from a per-arbiter counter starting at 1 and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub(crate) u32);

impl HandlerId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// ArbiterOptions
// =============================================================================

/// Propagation-control policy applied after each start/move/end handler.
///
/// Missing keys fall back to the defaults when deserializing:
///
/// ```ignore
/// let opts = ArbiterOptions::from_toml_str("stop_propagation = false")?;
/// assert!(opts.prevent_default);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterOptions {
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

impl Default for ArbiterOptions {
    fn default() -> Self {
        Self {
            prevent_default: true,
            stop_propagation: true,
        }
    }
}

impl ArbiterOptions {
    /// Parse options from a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| PointerError::Config(e.to_string()))
    }

    pub fn with_prevent_default(mut self, value: bool) -> Self {
        self.prevent_default = value;
        self
    }

    pub fn with_stop_propagation(mut self, value: bool) -> Self {
        self.stop_propagation = value;
        self
    }
}
