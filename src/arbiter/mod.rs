//! Pointer Arbiter - One pointer stream out of mouse and touch input
//!
//! Consumers register one set of handlers (start, move, end, cancel) and
//! never branch on input modality. The arbiter decides which modality owns
//! the active gesture and drops the other stream's events, including the
//! mousedown/mouseup pair browsers synthesize after a touch.
//!
//! # API
//!
//! - `register_start(fn)` / `unregister_start(id)` - Start callback table
//! - `bind_start(el, id)` / `unbind_start(el, id)` - Attach to an element
//! - `bind_move(el, fn)` - Frame-coalesced move handler (last bind wins)
//! - `bind_end(el, fn)` - End handler (last bind wins)
//! - `bind_cancel(el, fn)` - Touch cancel handler (last bind wins)
//! - `cancel()` - Force the idle state
//! - `move_to(sample)` / `end(sample)` - Drive the gesture programmatically
//!
//! # States
//!
//! ```text
//! Idle ──start(accepted)──▶ Captured(m)
//! Captured(m) ──end | cancel──▶ Idle
//! Captured(m) ──start(other, < 400ms)──▶ Captured(m)   (ghost, dropped)
//! Captured(m) ──start(other, ≥ 400ms)──▶ Captured(m')  (preempted)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use spark_pointer::{Document, Environment, PointerArbiter, ArbiterOptions};
//!
//! let doc = Document::new();
//! let handle = doc.create_element(None);
//! let arbiter = PointerArbiter::new(Environment::default(), ArbiterOptions::default());
//!
//! let id = arbiter.register_start(|sample| {
//!     println!("grabbed at {sample}");
//!     true // Capture the gesture
//! });
//! arbiter.bind_start(&handle, id)?;
//! arbiter.bind_move(&handle, |sample| println!("dragging {sample}"));
//! arbiter.bind_end(&handle, |sample| println!("dropped at {sample}"));
//! ```

mod session;
mod suppress;

pub use suppress::Suppression;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use spark_signals::Signal;
use tracing::{debug, trace, warn};

use crate::clock::{Clock, MonotonicClock};
use crate::error::{PointerError, Result};
use crate::frame::{FrameScheduler, Immediate, coalesce};
use crate::host::{
    EventKind, EventTarget, Listener, ListenerOptions, ListenerSupport, NativeEvent,
    add_event_listener_with_options, listener, listener_support,
};
use crate::types::{ArbiterOptions, HandlerId, Modality, PointerSample};

use session::Session;

// =============================================================================
// HANDLER TYPES
// =============================================================================

/// Start handler. Return true to capture the gesture.
pub type StartCallback = Rc<dyn Fn(PointerSample) -> bool>;

/// Move and end handlers.
pub type SampleCallback = Rc<dyn Fn(PointerSample)>;

pub type CancelCallback = Rc<dyn Fn()>;

/// Registered listeners are non-capturing and never passive, since the
/// arbiter may prevent the default action.
const LISTENER_OPTIONS: ListenerOptions = ListenerOptions {
    capture: false,
    passive: false,
};

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Host facilities injected into an arbiter.
///
/// The default frame scheduler is [`Immediate`]: every move is its own
/// frame and nothing is coalesced. Hosts with a real frame clock pass a
/// [`FrameQueue`](crate::frame::FrameQueue) or their own scheduler through
/// [`with_frames`](Self::with_frames).
#[derive(Clone)]
pub struct Environment {
    pub listener_support: ListenerSupport,
    pub clock: Rc<dyn Clock>,
    pub frames: Rc<dyn FrameScheduler>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            listener_support: listener_support(),
            clock: Rc::new(MonotonicClock::new()),
            frames: Rc::new(Immediate),
        }
    }
}

impl Environment {
    pub fn with_listener_support(mut self, support: ListenerSupport) -> Self {
        self.listener_support = support;
        self
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_frames(mut self, frames: Rc<dyn FrameScheduler>) -> Self {
        self.frames = frames;
        self
    }
}

// =============================================================================
// SHARED OPTIONS
// =============================================================================

/// Options cell shared between the arbiter and anyone holding a clone.
///
/// Handlers capture a clone to change options mid-dispatch. The arbiter
/// reads options after the handler returns, so the change applies to the
/// event being handled.
#[derive(Clone, Default)]
pub struct SharedOptions(Rc<Cell<ArbiterOptions>>);

impl SharedOptions {
    pub fn new(options: ArbiterOptions) -> Self {
        Self(Rc::new(Cell::new(options)))
    }

    pub fn get(&self) -> ArbiterOptions {
        self.0.get()
    }

    pub fn set(&self, options: ArbiterOptions) {
        self.0.set(options);
    }

    pub fn set_prevent_default(&self, value: bool) {
        self.set(self.get().with_prevent_default(value));
    }

    pub fn set_stop_propagation(&self, value: bool) {
        self.set(self.get().with_stop_propagation(value));
    }
}

impl fmt::Debug for SharedOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.get(), f)
    }
}

// =============================================================================
// HANDLER REGISTRY
// =============================================================================

struct StartEntry {
    callback: StartCallback,
    listener: Listener,
}

#[derive(Default)]
struct StartRegistry {
    entries: HashMap<HandlerId, StartEntry>,
    last_id: u32,
}

impl StartRegistry {
    fn next_id(&mut self) -> HandlerId {
        self.last_id += 1;
        HandlerId(self.last_id)
    }

    fn listener(&self, id: HandlerId) -> Result<Listener> {
        match self.entries.get(&id) {
            Some(entry) => Ok(Rc::clone(&entry.listener)),
            None => {
                warn!(handler = %id, "unknown start handler");
                Err(PointerError::InvalidHandler(id))
            }
        }
    }
}

/// One handler per phase. Binding again replaces the previous one.
#[derive(Default)]
struct PhaseHandlers {
    on_move: Option<SampleCallback>,
    on_end: Option<SampleCallback>,
    on_cancel: Option<CancelCallback>,
}

// =============================================================================
// ARBITER
// =============================================================================

struct Inner {
    env: Environment,
    options: SharedOptions,
    session: Session,
    starts: RefCell<StartRegistry>,
    handlers: RefCell<PhaseHandlers>,
    /// Blocks engines that start a native drag on images and links.
    drag_guard: Listener,
    /// One listener per phase, so binding again on the same element is a
    /// no-op and every element feeds the same frame coalescer.
    move_listener: Listener,
    end_listener: Listener,
    cancel_listener: Listener,
}

/// Mouse/touch arbiter. Cheap to clone; clones share state.
///
/// No internal borrow is held while user callbacks run, so callbacks may
/// call back into the arbiter (cancel, rebind, change options).
#[derive(Clone)]
pub struct PointerArbiter {
    inner: Rc<Inner>,
}

/// Non-owning handle for callbacks that need the arbiter.
#[derive(Clone)]
pub struct WeakPointerArbiter {
    inner: Weak<Inner>,
}

impl WeakPointerArbiter {
    pub fn upgrade(&self) -> Option<PointerArbiter> {
        self.inner.upgrade().map(|inner| PointerArbiter { inner })
    }
}

impl Default for PointerArbiter {
    fn default() -> Self {
        Self::new(Environment::default(), ArbiterOptions::default())
    }
}

impl fmt::Debug for PointerArbiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerArbiter")
            .field("modality", &self.modality())
            .field("last_sample", &self.last_sample())
            .field("options", &self.options())
            .finish()
    }
}

impl PointerArbiter {
    pub fn new(env: Environment, options: ArbiterOptions) -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<Inner>| {
            let on_frame = weak.clone();
            let per_frame = coalesce(Rc::clone(&env.frames), move |event: NativeEvent| {
                if let Some(inner) = on_frame.upgrade() {
                    inner.handle_move(&event);
                }
            });
            let move_listener = listener(move |event| per_frame.call(event.clone()));

            let on_end = weak.clone();
            let end_listener = listener(move |event| {
                if let Some(inner) = on_end.upgrade() {
                    inner.handle_end(event);
                }
            });

            let on_cancel = weak.clone();
            let cancel_listener = listener(move |event| {
                if let Some(inner) = on_cancel.upgrade() {
                    trace!(event = %event.kind(), "native cancel");
                    inner.cancel();
                }
            });

            Inner {
                env,
                options: SharedOptions::new(options),
                session: Session::new(),
                starts: RefCell::new(StartRegistry::default()),
                handlers: RefCell::new(PhaseHandlers::default()),
                drag_guard: listener(|event| event.prevent_default()),
                move_listener,
                end_listener,
                cancel_listener,
            }
        });
        Self { inner }
    }

    pub fn downgrade(&self) -> WeakPointerArbiter {
        WeakPointerArbiter {
            inner: Rc::downgrade(&self.inner),
        }
    }

    // -------------------------------------------------------------------------
    // Options
    // -------------------------------------------------------------------------

    pub fn options(&self) -> ArbiterOptions {
        self.inner.options.get()
    }

    pub fn set_options(&self, options: ArbiterOptions) {
        self.inner.options.set(options);
    }

    pub fn set_prevent_default(&self, value: bool) {
        self.inner.options.set_prevent_default(value);
    }

    pub fn set_stop_propagation(&self, value: bool) {
        self.inner.options.set_stop_propagation(value);
    }

    /// Handle onto this arbiter's live options.
    pub fn shared_options(&self) -> SharedOptions {
        self.inner.options.clone()
    }

    // -------------------------------------------------------------------------
    // State
    // -------------------------------------------------------------------------

    /// Modality owning the active gesture, `None` when idle.
    pub fn modality(&self) -> Modality {
        self.inner.session.modality()
    }

    pub fn is_captured(&self) -> bool {
        self.modality().is_some()
    }

    /// Most recent coordinates of the owning modality.
    pub fn last_sample(&self) -> PointerSample {
        self.inner.session.last_sample()
    }

    pub fn modality_signal(&self) -> Signal<Modality> {
        self.inner.session.modality_signal()
    }

    pub fn last_sample_signal(&self) -> Signal<PointerSample> {
        self.inner.session.last_sample_signal()
    }

    // -------------------------------------------------------------------------
    // Start
    // -------------------------------------------------------------------------

    /// Store a start callback under a fresh id.
    pub fn register_start<F>(&self, callback: F) -> HandlerId
    where
        F: Fn(PointerSample) -> bool + 'static,
    {
        let mut starts = self.inner.starts.borrow_mut();
        let id = starts.next_id();

        let weak = Rc::downgrade(&self.inner);
        let start_listener = listener(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_start(id, event);
            }
        });

        starts.entries.insert(
            id,
            StartEntry {
                callback: Rc::new(callback),
                listener: start_listener,
            },
        );
        trace!(handler = %id, "start handler registered");
        id
    }

    /// Remove a start callback. Unknown ids are ignored.
    ///
    /// Listeners still attached for `id` stop doing anything. Returns
    /// whether a callback was removed.
    pub fn unregister_start(&self, id: HandlerId) -> bool {
        let removed = self.inner.starts.borrow_mut().entries.remove(&id).is_some();
        if removed {
            trace!(handler = %id, "start handler unregistered");
        }
        removed
    }

    /// Attach the start callback `id` to mousedown and touchstart on
    /// `element`, and block native drag start there.
    pub fn bind_start<T>(&self, element: &T, id: HandlerId) -> Result<HandlerId>
    where
        T: EventTarget + ?Sized,
    {
        let start_listener = self.inner.starts.borrow().listener(id)?;
        let support = self.inner.env.listener_support;
        for kind in [EventKind::MouseDown, EventKind::TouchStart] {
            add_event_listener_with_options(
                element,
                kind,
                &start_listener,
                LISTENER_OPTIONS,
                support,
            );
        }
        add_event_listener_with_options(
            element,
            EventKind::DragStart,
            &self.inner.drag_guard,
            LISTENER_OPTIONS,
            support,
        );
        Ok(id)
    }

    /// Detach everything [`bind_start`](Self::bind_start) attached.
    pub fn unbind_start<T>(&self, element: &T, id: HandlerId) -> Result<HandlerId>
    where
        T: EventTarget + ?Sized,
    {
        let start_listener = self.inner.starts.borrow().listener(id)?;
        element.remove_event_listener(EventKind::MouseDown, &start_listener, false);
        element.remove_event_listener(EventKind::TouchStart, &start_listener, false);
        // The drag guard is shared by every start handler on the element; it
        // goes even if another id is still bound there.
        element.remove_event_listener(EventKind::DragStart, &self.inner.drag_guard, false);
        Ok(id)
    }

    // -------------------------------------------------------------------------
    // Move / End / Cancel
    // -------------------------------------------------------------------------

    /// Listen for mousemove and touchmove on `element`, at most once per
    /// frame, and make `callback` the current move handler.
    pub fn bind_move<T, F>(&self, element: &T, callback: F)
    where
        T: EventTarget + ?Sized,
        F: Fn(PointerSample) + 'static,
    {
        let support = self.inner.env.listener_support;
        for kind in [EventKind::MouseMove, EventKind::TouchMove] {
            add_event_listener_with_options(
                element,
                kind,
                &self.inner.move_listener,
                LISTENER_OPTIONS,
                support,
            );
        }
        self.inner.handlers.borrow_mut().on_move = Some(Rc::new(callback));
    }

    /// Listen for mouseup and touchend on `element` and make `callback` the
    /// current end handler.
    pub fn bind_end<T, F>(&self, element: &T, callback: F)
    where
        T: EventTarget + ?Sized,
        F: Fn(PointerSample) + 'static,
    {
        let support = self.inner.env.listener_support;
        for kind in [EventKind::MouseUp, EventKind::TouchEnd] {
            add_event_listener_with_options(
                element,
                kind,
                &self.inner.end_listener,
                LISTENER_OPTIONS,
                support,
            );
        }
        self.inner.handlers.borrow_mut().on_end = Some(Rc::new(callback));
    }

    /// Listen for touchcancel on `element` and make `callback` the current
    /// cancel handler. Mouse input has no cancel.
    pub fn bind_cancel<T, F>(&self, element: &T, callback: F)
    where
        T: EventTarget + ?Sized,
        F: Fn() + 'static,
    {
        add_event_listener_with_options(
            element,
            EventKind::TouchCancel,
            &self.inner.cancel_listener,
            LISTENER_OPTIONS,
            self.inner.env.listener_support,
        );
        self.inner.handlers.borrow_mut().on_cancel = Some(Rc::new(callback));
    }

    /// Return to idle, calling the cancel handler.
    ///
    /// The handler runs even when no gesture is captured.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Record `sample` (if any) and call the move handler with the last
    /// sample. Does not check ownership.
    pub fn move_to(&self, sample: Option<PointerSample>) {
        self.inner.move_to(sample);
    }

    /// Record `sample` (if any), call the end handler and return to idle.
    /// Does not check ownership.
    pub fn end(&self, sample: Option<PointerSample>) {
        self.inner.end(sample);
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

impl Inner {
    fn suppress(&self, event: &NativeEvent) {
        // Read after the handler: it may have changed the options
        Suppression::from_options(self.options.get()).apply(event);
    }

    fn handle_start(&self, id: HandlerId, event: &NativeEvent) {
        let incoming = event.modality();
        let now = self.env.clock.now();

        if self.session.is_ghost_start(incoming, now) {
            debug!(
                event = %event.kind(),
                owner = %self.session.modality(),
                "start ignored inside duplicate window"
            );
            return;
        }

        let Some(sample) = event.pointer_sample() else {
            debug!(event = %event.kind(), "start without touch points ignored");
            return;
        };

        let callback = match self.starts.borrow().entries.get(&id) {
            Some(entry) => Rc::clone(&entry.callback),
            None => {
                debug!(handler = %id, "start handler no longer registered");
                return;
            }
        };

        if callback(sample) {
            self.session.capture(incoming, sample, now);
            trace!(modality = %incoming, sample = %sample, "gesture captured");
            self.suppress(event);
        }
    }

    fn handle_move(&self, event: &NativeEvent) {
        let incoming = event.modality();
        if incoming != self.session.modality() {
            debug!(event = %event.kind(), owner = %self.session.modality(), "move ignored");
            return;
        }
        self.move_to(event.pointer_sample());
        self.suppress(event);
    }

    fn handle_end(&self, event: &NativeEvent) {
        let incoming = event.modality();
        if incoming != self.session.modality() {
            debug!(event = %event.kind(), owner = %self.session.modality(), "end ignored");
            return;
        }
        self.end(event.pointer_sample());
        self.suppress(event);
    }

    fn move_to(&self, sample: Option<PointerSample>) {
        self.session.record(sample);
        let handler = self.handlers.borrow().on_move.clone();
        if let Some(handler) = handler {
            handler(self.session.last_sample());
        }
    }

    fn end(&self, sample: Option<PointerSample>) {
        self.session.record(sample);
        let handler = self.handlers.borrow().on_end.clone();
        if let Some(handler) = handler {
            handler(self.session.last_sample());
        }
        self.session.release();
        trace!(sample = %self.session.last_sample(), "gesture ended");
    }

    fn cancel(&self) {
        let handler = self.handlers.borrow().on_cancel.clone();
        if let Some(handler) = handler {
            handler();
        }
        self.session.release();
        trace!("gesture cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::frame::FrameQueue;
    use crate::host::dom::{Document, Element};
    use std::time::Duration;

    struct Fixture {
        arbiter: PointerArbiter,
        clock: Rc<ManualClock>,
        element: Element,
        starts: Rc<RefCell<Vec<PointerSample>>>,
        moves: Rc<RefCell<Vec<PointerSample>>>,
        ends: Rc<RefCell<Vec<PointerSample>>>,
        cancels: Rc<Cell<usize>>,
        id: HandlerId,
    }

    fn setup_with(frames: Rc<dyn FrameScheduler>, accept: bool) -> Fixture {
        let clock = Rc::new(ManualClock::new(Duration::from_secs(100)));
        let env = Environment::default()
            .with_clock(clock.clone())
            .with_frames(frames);
        let arbiter = PointerArbiter::new(env, ArbiterOptions::default());
        let doc = Document::new();
        let element = doc.create_element(None);

        let starts = Rc::new(RefCell::new(Vec::new()));
        let moves = Rc::new(RefCell::new(Vec::new()));
        let ends = Rc::new(RefCell::new(Vec::new()));
        let cancels = Rc::new(Cell::new(0));

        let starts_clone = starts.clone();
        let id = arbiter.register_start(move |sample| {
            starts_clone.borrow_mut().push(sample);
            accept
        });
        arbiter.bind_start(&element, id).unwrap();

        let moves_clone = moves.clone();
        arbiter.bind_move(&element, move |sample| moves_clone.borrow_mut().push(sample));
        let ends_clone = ends.clone();
        arbiter.bind_end(&element, move |sample| ends_clone.borrow_mut().push(sample));
        let cancels_clone = cancels.clone();
        arbiter.bind_cancel(&element, move || cancels_clone.set(cancels_clone.get() + 1));

        Fixture {
            arbiter,
            clock,
            element,
            starts,
            moves,
            ends,
            cancels,
            id,
        }
    }

    fn setup() -> Fixture {
        setup_with(Rc::new(Immediate), true)
    }

    fn sample(x: f64, y: f64) -> PointerSample {
        PointerSample::new(x, y)
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    #[test]
    fn test_handler_ids_are_monotonic() {
        let arbiter = PointerArbiter::default();
        let a = arbiter.register_start(|_| true);
        let b = arbiter.register_start(|_| true);
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);

        assert!(arbiter.unregister_start(a));
        let c = arbiter.register_start(|_| true);
        assert_eq!(c.get(), 3);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let arbiter = PointerArbiter::default();
        let id = arbiter.register_start(|_| true);
        assert!(arbiter.unregister_start(id));
        assert!(!arbiter.unregister_start(id));
        assert!(!arbiter.unregister_start(HandlerId(99)));
    }

    #[test]
    fn test_bind_unknown_id_fails() {
        let arbiter = PointerArbiter::default();
        let element = Document::new().create_element(None);

        assert_eq!(
            arbiter.bind_start(&element, HandlerId(7)),
            Err(PointerError::InvalidHandler(HandlerId(7)))
        );
        assert_eq!(
            arbiter.unbind_start(&element, HandlerId(7)),
            Err(PointerError::InvalidHandler(HandlerId(7)))
        );
        assert_eq!(element.listener_count(EventKind::MouseDown), 0);
    }

    #[test]
    fn test_bind_and_unbind_start_listeners() {
        let arbiter = PointerArbiter::default();
        let element = Document::new().create_element(None);
        let id = arbiter.register_start(|_| true);

        assert_eq!(arbiter.bind_start(&element, id), Ok(id));
        assert_eq!(element.listener_count(EventKind::MouseDown), 1);
        assert_eq!(element.listener_count(EventKind::TouchStart), 1);
        assert_eq!(element.listener_count(EventKind::DragStart), 1);

        assert_eq!(arbiter.unbind_start(&element, id), Ok(id));
        assert_eq!(element.listener_count(EventKind::MouseDown), 0);
        assert_eq!(element.listener_count(EventKind::TouchStart), 0);
        assert_eq!(element.listener_count(EventKind::DragStart), 0);
    }

    #[test]
    fn test_drag_start_is_blocked() {
        let f = setup();
        assert!(!f.element.dispatch(&NativeEvent::drag_start()));
    }

    #[test]
    fn test_unregistered_handler_no_longer_fires() {
        let f = setup();
        f.arbiter.unregister_start(f.id);

        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseDown, 1.0, 2.0));
        assert!(f.starts.borrow().is_empty());
        assert_eq!(f.arbiter.modality(), Modality::None);
        assert!(f.arbiter.unbind_start(&f.element, f.id).is_err());
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    #[test]
    fn test_mouse_gesture() {
        let f = setup();

        let down = NativeEvent::mouse(EventKind::MouseDown, 1.0, 2.0);
        assert!(!f.element.dispatch(&down));
        assert!(down.propagation_stopped());
        assert_eq!(*f.starts.borrow(), vec![sample(1.0, 2.0)]);
        assert_eq!(f.arbiter.modality(), Modality::Mouse);

        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseMove, 4.0, 8.0));
        assert_eq!(*f.moves.borrow(), vec![sample(4.0, 8.0)]);

        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseUp, 5.0, 9.0));
        assert_eq!(*f.ends.borrow(), vec![sample(5.0, 9.0)]);
        assert_eq!(f.arbiter.modality(), Modality::None);
        assert_eq!(f.arbiter.last_sample(), sample(5.0, 9.0));
    }

    #[test]
    fn test_rejected_start_leaves_state_alone() {
        let f = setup_with(Rc::new(Immediate), false);

        let down = NativeEvent::mouse(EventKind::MouseDown, 1.0, 2.0);
        assert!(f.element.dispatch(&down));
        assert!(!down.propagation_stopped());
        assert_eq!(f.starts.borrow().len(), 1);
        assert_eq!(f.arbiter.modality(), Modality::None);
        assert_eq!(f.arbiter.last_sample(), PointerSample::default());

        // No owner, so moves and ends are ignored
        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseMove, 4.0, 8.0));
        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseUp, 4.0, 8.0));
        assert!(f.moves.borrow().is_empty());
        assert!(f.ends.borrow().is_empty());
    }

    #[test]
    fn test_touch_end_without_points_keeps_last_sample() {
        let f = setup();

        f.element.dispatch(&NativeEvent::touch_at(EventKind::TouchStart, 1.0, 2.0));
        f.element.dispatch(&NativeEvent::touch_at(EventKind::TouchMove, 3.0, 4.0));
        f.element.dispatch(&NativeEvent::touch_released(EventKind::TouchEnd));

        assert_eq!(*f.ends.borrow(), vec![sample(3.0, 4.0)]);
        assert_eq!(f.arbiter.modality(), Modality::None);
    }

    #[test]
    fn test_touch_start_without_points_is_ignored() {
        let f = setup();
        f.element.dispatch(&NativeEvent::touch_released(EventKind::TouchStart));
        assert!(f.starts.borrow().is_empty());
        assert_eq!(f.arbiter.modality(), Modality::None);
    }

    #[test]
    fn test_ghost_mouse_after_touch_is_dropped() {
        let f = setup();

        f.element.dispatch(&NativeEvent::touch_at(EventKind::TouchStart, 1.0, 1.0));
        f.clock.advance(Duration::from_millis(120));

        let ghost = NativeEvent::mouse(EventKind::MouseDown, 1.0, 1.0);
        assert!(f.element.dispatch(&ghost));
        assert!(!ghost.propagation_stopped());
        assert_eq!(f.starts.borrow().len(), 1);
        assert_eq!(f.arbiter.modality(), Modality::Touch);

        // Mouse moves do not drive a touch gesture
        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseMove, 9.0, 9.0));
        assert!(f.moves.borrow().is_empty());
    }

    #[test]
    fn test_ghost_touch_after_mouse_is_dropped() {
        let f = setup();

        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseDown, 1.0, 1.0));
        f.clock.advance(Duration::from_millis(399));

        let ghost = NativeEvent::touch_at(EventKind::TouchStart, 5.0, 5.0);
        assert!(f.element.dispatch(&ghost));
        assert_eq!(f.starts.borrow().len(), 1);
        assert_eq!(f.arbiter.modality(), Modality::Mouse);
        assert_eq!(f.arbiter.last_sample(), sample(1.0, 1.0));
    }

    #[test]
    fn test_other_modality_preempts_after_window() {
        let f = setup();

        f.element.dispatch(&NativeEvent::touch_at(EventKind::TouchStart, 1.0, 1.0));
        f.clock.advance(Duration::from_millis(400));
        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseDown, 2.0, 2.0));

        assert_eq!(f.starts.borrow().len(), 2);
        assert_eq!(f.arbiter.modality(), Modality::Mouse);
        assert_eq!(f.arbiter.last_sample(), sample(2.0, 2.0));

        // The old touch stream can no longer end the gesture
        f.element.dispatch(&NativeEvent::touch_at(EventKind::TouchEnd, 1.0, 1.0));
        assert!(f.ends.borrow().is_empty());
        assert_eq!(f.arbiter.modality(), Modality::Mouse);
    }

    #[test]
    fn test_native_cancel_ignores_owner() {
        let f = setup();
        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseDown, 1.0, 1.0));

        let cancel = NativeEvent::touch_released(EventKind::TouchCancel);
        assert!(f.element.dispatch(&cancel));
        assert!(!cancel.propagation_stopped());
        assert_eq!(f.cancels.get(), 1);
        assert_eq!(f.arbiter.modality(), Modality::None);
    }

    #[test]
    fn test_cancel_without_gesture_still_calls_handler() {
        let f = setup();
        f.arbiter.cancel();
        f.arbiter.cancel();
        assert_eq!(f.cancels.get(), 2);
        assert_eq!(f.arbiter.modality(), Modality::None);
    }

    #[test]
    fn test_moves_coalesce_per_frame() {
        let frames = Rc::new(FrameQueue::new());
        let f = setup_with(frames.clone(), true);

        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseDown, 1.0, 2.0));
        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseMove, 3.0, 3.0));
        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseMove, 4.0, 8.0));
        assert!(f.moves.borrow().is_empty());

        frames.run_frame();
        assert_eq!(*f.moves.borrow(), vec![sample(4.0, 8.0)]);
        assert_eq!(f.arbiter.last_sample(), sample(4.0, 8.0));
    }

    #[test]
    fn test_ownership_checked_when_frame_runs() {
        let frames = Rc::new(FrameQueue::new());
        let f = setup_with(frames.clone(), true);

        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseDown, 1.0, 2.0));
        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseMove, 3.0, 3.0));
        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseUp, 3.0, 3.0));

        frames.run_frame();
        assert!(f.moves.borrow().is_empty());
    }

    #[test]
    fn test_binding_twice_calls_handlers_once() {
        let frames = Rc::new(FrameQueue::new());
        let f = setup_with(frames.clone(), true);
        let moves_clone = f.moves.clone();
        f.arbiter
            .bind_move(&f.element, move |sample| moves_clone.borrow_mut().push(sample));
        let cancels_clone = f.cancels.clone();
        f.arbiter
            .bind_cancel(&f.element, move || cancels_clone.set(cancels_clone.get() + 1));
        let ends_clone = f.ends.clone();
        f.arbiter
            .bind_end(&f.element, move |sample| ends_clone.borrow_mut().push(sample));
        assert_eq!(f.element.listener_count(EventKind::MouseMove), 1);
        assert_eq!(f.element.listener_count(EventKind::TouchCancel), 1);
        assert_eq!(f.element.listener_count(EventKind::MouseUp), 1);

        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseDown, 1.0, 2.0));
        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseMove, 4.0, 8.0));
        assert_eq!(frames.run_frame(), 1);
        assert_eq!(*f.moves.borrow(), vec![sample(4.0, 8.0)]);

        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseUp, 5.0, 9.0));
        assert_eq!(*f.ends.borrow(), vec![sample(5.0, 9.0)]);

        f.element.dispatch(&NativeEvent::touch_released(EventKind::TouchCancel));
        assert_eq!(f.cancels.get(), 1);
    }

    #[test]
    fn test_nested_move_bindings_share_one_frame() {
        let frames = Rc::new(FrameQueue::new());
        let f = setup_with(frames.clone(), true);
        let doc = Document::new();
        let parent = doc.create_element(None);
        let child = doc.create_element(Some(&parent));
        let moves_clone = f.moves.clone();
        f.arbiter
            .bind_move(&parent, move |sample| moves_clone.borrow_mut().push(sample));
        f.arbiter.bind_move(&child, {
            let moves = f.moves.clone();
            move |sample| moves.borrow_mut().push(sample)
        });

        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseDown, 0.0, 0.0));
        child.dispatch(&NativeEvent::mouse(EventKind::MouseMove, 2.0, 3.0));
        assert_eq!(frames.pending(), 1);
        frames.run_frame();
        assert_eq!(*f.moves.borrow(), vec![sample(2.0, 3.0)]);
    }

    #[test]
    fn test_last_bound_move_handler_wins() {
        let f = setup();
        let second = Rc::new(Cell::new(0));
        let second_clone = second.clone();
        let other = Document::new().create_element(None);
        f.arbiter
            .bind_move(&other, move |_| second_clone.set(second_clone.get() + 1));

        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseDown, 0.0, 0.0));
        f.element.dispatch(&NativeEvent::mouse(EventKind::MouseMove, 1.0, 1.0));

        assert!(f.moves.borrow().is_empty());
        assert_eq!(second.get(), 1);
    }

    // -------------------------------------------------------------------------
    // Programmatic control
    // -------------------------------------------------------------------------

    #[test]
    fn test_programmatic_move_and_end() {
        let f = setup();
        f.element.dispatch(&NativeEvent::touch_at(EventKind::TouchStart, 1.0, 1.0));

        f.arbiter.move_to(Some(sample(6.0, 6.0)));
        f.arbiter.move_to(None);
        assert_eq!(*f.moves.borrow(), vec![sample(6.0, 6.0), sample(6.0, 6.0)]);

        f.arbiter.end(None);
        assert_eq!(*f.ends.borrow(), vec![sample(6.0, 6.0)]);
        assert!(!f.arbiter.is_captured());
    }

    #[test]
    fn test_handler_may_cancel_reentrantly() {
        let arbiter = PointerArbiter::default();
        let element = Document::new().create_element(None);
        let weak = arbiter.downgrade();
        let id = arbiter.register_start(move |_| {
            if let Some(arbiter) = weak.upgrade() {
                arbiter.cancel();
            }
            true
        });
        arbiter.bind_start(&element, id).unwrap();

        element.dispatch(&NativeEvent::mouse(EventKind::MouseDown, 0.0, 0.0));
        // Captured after the handler returned true
        assert_eq!(arbiter.modality(), Modality::Mouse);
    }

    #[test]
    fn test_options_change_inside_handler_applies_to_same_event() {
        let arbiter = PointerArbiter::new(
            Environment::default(),
            ArbiterOptions::default().with_prevent_default(false),
        );
        let element = Document::new().create_element(None);
        let options = arbiter.shared_options();
        let id = arbiter.register_start(move |_| {
            options.set_prevent_default(true);
            true
        });
        arbiter.bind_start(&element, id).unwrap();

        let down = NativeEvent::mouse(EventKind::MouseDown, 0.0, 0.0);
        assert!(!element.dispatch(&down));
        assert!(arbiter.options().prevent_default);
    }

    #[test]
    fn test_legacy_listener_registration() {
        let env = Environment::default().with_listener_support(ListenerSupport { passive: false });
        let arbiter = PointerArbiter::new(env, ArbiterOptions::default());
        let element = Document::new().create_element(None);
        let id = arbiter.register_start(|_| true);
        arbiter.bind_start(&element, id).unwrap();

        let down = NativeEvent::mouse(EventKind::MouseDown, 0.0, 0.0);
        assert!(!element.dispatch(&down));
        assert_eq!(arbiter.modality(), Modality::Mouse);
    }

    #[test]
    fn test_modality_signal_follows_gesture() {
        let f = setup();
        let modality = f.arbiter.modality_signal();
        let position = f.arbiter.last_sample_signal();

        f.element.dispatch(&NativeEvent::touch_at(EventKind::TouchStart, 2.0, 3.0));
        assert_eq!(modality.get(), Modality::Touch);
        assert_eq!(position.get(), sample(2.0, 3.0));

        f.arbiter.cancel();
        assert_eq!(modality.get(), Modality::None);
    }

    #[test]
    fn test_dropped_arbiter_listeners_go_quiet() {
        let element = Document::new().create_element(None);
        let hits = Rc::new(Cell::new(0));
        {
            let arbiter = PointerArbiter::default();
            let hits_clone = hits.clone();
            let id = arbiter.register_start(move |_| {
                hits_clone.set(hits_clone.get() + 1);
                true
            });
            arbiter.bind_start(&element, id).unwrap();
        }
        assert!(element.dispatch(&NativeEvent::mouse(EventKind::MouseDown, 0.0, 0.0)));
        assert_eq!(hits.get(), 0);
    }
}
