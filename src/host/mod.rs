//! Host Module - The boundary between native input and the arbiter
//!
//! The arbiter never talks to a concrete platform. It registers
//! [`Listener`]s on anything implementing [`EventTarget`] and receives
//! [`NativeEvent`]s from it. The event family (mouse or touch) is decided
//! once here, as an [`EventKind`], and flows downstream as a plain value.
//!
//! - [`dom`] - In-memory element tree with capture/bubble dispatch
//! - [`terminal`] - crossterm mouse input as native events
//!
//! # Listener support
//!
//! Whether the host understands listener option objects (and with them
//! `passive`) is process-wide configuration. It is resolved once, either
//! explicitly through [`configure_listener_support`] or implicitly on the
//! first [`listener_support`] read, and then injected into each arbiter.

pub mod dom;
pub mod terminal;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::OnceLock;

use crate::error::{PointerError, Result};
use crate::types::{Modality, PointerSample};

// =============================================================================
// EVENT KIND
// =============================================================================

/// Native event types the arbiter listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MouseDown,
    MouseMove,
    MouseUp,
    TouchStart,
    TouchMove,
    TouchEnd,
    TouchCancel,
    DragStart,
}

/// Lifecycle phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Start,
    Move,
    End,
    Cancel,
}

impl EventKind {
    /// Input family of this event. `DragStart` belongs to neither.
    pub fn modality(self) -> Modality {
        match self {
            EventKind::MouseDown | EventKind::MouseMove | EventKind::MouseUp => Modality::Mouse,
            EventKind::TouchStart
            | EventKind::TouchMove
            | EventKind::TouchEnd
            | EventKind::TouchCancel => Modality::Touch,
            EventKind::DragStart => Modality::None,
        }
    }

    pub fn phase(self) -> Option<Phase> {
        match self {
            EventKind::MouseDown | EventKind::TouchStart => Some(Phase::Start),
            EventKind::MouseMove | EventKind::TouchMove => Some(Phase::Move),
            EventKind::MouseUp | EventKind::TouchEnd => Some(Phase::End),
            EventKind::TouchCancel => Some(Phase::Cancel),
            EventKind::DragStart => None,
        }
    }

    /// Web event type name.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::MouseDown => "mousedown",
            EventKind::MouseMove => "mousemove",
            EventKind::MouseUp => "mouseup",
            EventKind::TouchStart => "touchstart",
            EventKind::TouchMove => "touchmove",
            EventKind::TouchEnd => "touchend",
            EventKind::TouchCancel => "touchcancel",
            EventKind::DragStart => "dragstart",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// NATIVE EVENT
// =============================================================================

/// Per-dispatch flags, shared by every clone of an event.
#[derive(Debug, Default)]
struct DispatchFlags {
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
    in_passive_listener: Cell<bool>,
}

/// A native input event as delivered by the host.
///
/// Clones share dispatch flags, so a clone held past dispatch (for example
/// by a frame-coalesced move listener) still reports on the original event.
#[derive(Debug, Clone)]
pub struct NativeEvent {
    kind: EventKind,
    point: Option<PointerSample>,
    target_touches: Vec<PointerSample>,
    touches: Vec<PointerSample>,
    bubbles: bool,
    cancelable: bool,
    flags: Rc<DispatchFlags>,
}

impl NativeEvent {
    fn new(kind: EventKind) -> Self {
        Self {
            kind,
            point: None,
            target_touches: Vec::new(),
            touches: Vec::new(),
            bubbles: true,
            cancelable: true,
            flags: Rc::new(DispatchFlags::default()),
        }
    }

    /// Mouse event at client coordinates.
    pub fn mouse(kind: EventKind, client_x: f64, client_y: f64) -> Self {
        let mut event = Self::new(kind);
        event.point = Some(PointerSample::new(client_x, client_y));
        event
    }

    /// Touch event with explicit touch lists.
    pub fn touch(
        kind: EventKind,
        target_touches: Vec<PointerSample>,
        touches: Vec<PointerSample>,
    ) -> Self {
        let mut event = Self::new(kind);
        event.target_touches = target_touches;
        event.touches = touches;
        event
    }

    /// Single-finger touch on the target.
    pub fn touch_at(kind: EventKind, client_x: f64, client_y: f64) -> Self {
        let sample = PointerSample::new(client_x, client_y);
        Self::touch(kind, vec![sample], vec![sample])
    }

    /// Touch event with no remaining touch points (a lifted last finger).
    pub fn touch_released(kind: EventKind) -> Self {
        Self::touch(kind, Vec::new(), Vec::new())
    }

    pub fn drag_start() -> Self {
        Self::new(EventKind::DragStart)
    }

    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    pub fn with_cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn modality(&self) -> Modality {
        self.kind.modality()
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    pub fn target_touches(&self) -> &[PointerSample] {
        &self.target_touches
    }

    pub fn touches(&self) -> &[PointerSample] {
        &self.touches
    }

    /// Coordinates carried by this event.
    ///
    /// Mouse events carry their own point. Touch events use the first touch
    /// on the target, then the first touch anywhere. A touch end for the
    /// last finger carries none.
    pub fn pointer_sample(&self) -> Option<PointerSample> {
        match self.kind.modality() {
            Modality::Mouse => self.point,
            Modality::Touch => self
                .target_touches
                .first()
                .or_else(|| self.touches.first())
                .copied(),
            Modality::None => None,
        }
    }

    /// Suppress the native default action.
    ///
    /// No-op for non-cancelable events and inside passive listeners.
    pub fn prevent_default(&self) {
        if self.cancelable && !self.flags.in_passive_listener.get() {
            self.flags.default_prevented.set(true);
        }
    }

    pub fn stop_propagation(&self) {
        self.flags.propagation_stopped.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.flags.default_prevented.get()
    }

    pub fn propagation_stopped(&self) -> bool {
        self.flags.propagation_stopped.get()
    }

    /// Marks whether the listener about to run was registered passive.
    /// Called by [`EventTarget`] implementations around each listener.
    pub fn set_in_passive_listener(&self, passive: bool) {
        self.flags.in_passive_listener.set(passive);
    }
}

// =============================================================================
// LISTENERS
// =============================================================================

/// Native event listener. Identity is the `Rc` allocation.
pub type Listener = Rc<dyn Fn(&NativeEvent)>;

/// Wrap a closure as a [`Listener`].
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&NativeEvent) + 'static,
{
    Rc::new(f)
}

/// Listener option object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListenerOptions {
    pub capture: bool,
    pub passive: bool,
}

/// Third argument of a listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerArg {
    Options(ListenerOptions),
    /// Legacy boolean form for hosts without option objects.
    UseCapture(bool),
}

impl ListenerArg {
    pub fn capture(self) -> bool {
        match self {
            ListenerArg::Options(options) => options.capture,
            ListenerArg::UseCapture(capture) => capture,
        }
    }

    /// Legacy registrations are never passive.
    pub fn passive(self) -> bool {
        match self {
            ListenerArg::Options(options) => options.passive,
            ListenerArg::UseCapture(_) => false,
        }
    }
}

/// Something listeners can be attached to.
pub trait EventTarget {
    /// Attach `listener`. Registering the same listener for the same kind
    /// and capture flag twice has no effect.
    fn add_event_listener(&self, kind: EventKind, listener: &Listener, arg: ListenerArg);

    fn remove_event_listener(&self, kind: EventKind, listener: &Listener, capture: bool);
}

// =============================================================================
// LISTENER SUPPORT
// =============================================================================

/// What the host's listener registration understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerSupport {
    /// Option objects (and `passive`) are understood.
    pub passive: bool,
}

impl Default for ListenerSupport {
    fn default() -> Self {
        Self { passive: true }
    }
}

static LISTENER_SUPPORT: OnceLock<ListenerSupport> = OnceLock::new();

/// Resolve process-wide listener support. Must happen before the first
/// [`listener_support`] read.
pub fn configure_listener_support(support: ListenerSupport) -> Result<()> {
    LISTENER_SUPPORT
        .set(support)
        .map_err(|_| PointerError::AlreadyConfigured)
}

/// Process-wide listener support, defaulting to option-object support.
pub fn listener_support() -> ListenerSupport {
    *LISTENER_SUPPORT.get_or_init(ListenerSupport::default)
}

/// Register `listener` with an option object, or with only the capture
/// flag when the host does not understand option objects.
pub fn add_event_listener_with_options<T>(
    target: &T,
    kind: EventKind,
    listener: &Listener,
    options: ListenerOptions,
    support: ListenerSupport,
) where
    T: EventTarget + ?Sized,
{
    let arg = if support.passive {
        ListenerArg::Options(options)
    } else {
        ListenerArg::UseCapture(options.capture)
    };
    target.add_event_listener(kind, listener, arg);
}
