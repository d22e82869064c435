//! # spark-pointer
//!
//! Unified pointer input for drag and sizing widgets.
//!
//! Mouse and touch input arrive as separate native event streams, and
//! touch browsers follow every tap with a synthesized mousedown/mouseup
//! pair. spark-pointer folds both streams into four phases (start, move,
//! end, cancel) with exactly one handler per phase, and keeps the ghost
//! events from starting a second gesture.
//!
//! ## Architecture
//!
//! ```text
//! native event ──▶ EventKind (mouse | touch, decided once)
//!                    │
//!                    ▼
//!              PointerArbiter ── owns Modality + last sample (signals)
//!                    │             400ms duplicate window
//!                    ▼
//!        start / move (per frame) / end / cancel handler
//!                    │
//!                    ▼
//!        prevent_default / stop_propagation per current options
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Pointer sample, modality, handler ids, options
//! - [`arbiter`] - The arbiter and its dispatch rules
//! - [`host`] - Event targets, native events, in-memory DOM, terminal input
//! - [`frame`] - Per-frame coalescing of move events
//! - [`clock`] - Time source for the duplicate window
//!
//! ## Frames
//!
//! `Environment::default()` uses the [`Immediate`] scheduler, which runs
//! every move handler on the spot with no coalescing. Hosts that draw on a
//! frame clock pass a [`FrameQueue`] (or their own [`FrameScheduler`]) via
//! `Environment::with_frames` to get one move callback per frame.

pub mod arbiter;
pub mod clock;
pub mod error;
pub mod frame;
pub mod host;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{PointerError, Result};

pub use arbiter::{
    CancelCallback, Environment, PointerArbiter, SampleCallback, SharedOptions, StartCallback,
    Suppression, WeakPointerArbiter,
};

pub use clock::{Clock, ManualClock, MonotonicClock};

pub use frame::{Coalesced, FrameQueue, FrameScheduler, FrameTask, Immediate, coalesce};

pub use host::dom::{Document, Element};
pub use host::{
    EventKind, EventTarget, Listener, ListenerArg, ListenerOptions, ListenerSupport, NativeEvent,
    Phase, add_event_listener_with_options, configure_listener_support, listener,
    listener_support,
};
