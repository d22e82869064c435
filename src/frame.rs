//! Frame Scheduling - Per-frame coalescing of rapid notifications
//!
//! Move events arrive far faster than anything can be drawn. A [`Coalesced`]
//! wrapper keeps only the most recent value and asks the [`FrameScheduler`]
//! for one frame; when the frame runs, the callback fires once with that
//! value. Everything older is dropped.
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use spark_pointer::frame::{coalesce, FrameQueue};
//!
//! let frames = Rc::new(FrameQueue::new());
//! let moved = coalesce(frames.clone(), |x: i32| println!("moved to {x}"));
//!
//! moved.call(1);
//! moved.call(2);
//! frames.run_frame(); // prints "moved to 2" once
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Work queued for the next frame.
pub type FrameTask = Box<dyn FnOnce()>;

/// Host facility that runs a task on the next rendering frame.
pub trait FrameScheduler {
    fn request_frame(&self, task: FrameTask);
}

// =============================================================================
// SCHEDULERS
// =============================================================================

/// Frame clock driven by the embedder.
///
/// Tasks requested while a frame is running land in the next frame.
#[derive(Default)]
pub struct FrameQueue {
    tasks: RefCell<Vec<FrameTask>>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Run every task queued so far. Returns how many ran.
    pub fn run_frame(&self) -> usize {
        let tasks = std::mem::take(&mut *self.tasks.borrow_mut());
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&self, task: FrameTask) {
        self.tasks.borrow_mut().push(task);
    }
}

/// Runs every task on the spot. Each request is its own frame.
///
/// For hosts without a frame clock (terminals, tests), and the only
/// scheduler under which move suppression reaches the live event.
#[derive(Debug, Default, Clone, Copy)]
pub struct Immediate;

impl FrameScheduler for Immediate {
    fn request_frame(&self, task: FrameTask) {
        task();
    }
}

// =============================================================================
// COALESCING
// =============================================================================

struct CoalescedInner<T> {
    latest: RefCell<Option<T>>,
    queued: Cell<bool>,
    callback: Box<dyn Fn(T)>,
    scheduler: Rc<dyn FrameScheduler>,
}

impl<T> CoalescedInner<T> {
    fn flush(&self) {
        self.queued.set(false);
        let value = self.latest.borrow_mut().take();
        if let Some(value) = value {
            (self.callback)(value);
        }
    }
}

/// Rate-limited wrapper around a callback. See [`coalesce`].
pub struct Coalesced<T> {
    inner: Rc<CoalescedInner<T>>,
}

impl<T> Clone for Coalesced<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Coalesced<T> {
    /// Record `value` and make sure a frame is requested.
    ///
    /// Calls made before that frame only replace the stored value.
    pub fn call(&self, value: T) {
        *self.inner.latest.borrow_mut() = Some(value);
        if self.inner.queued.replace(true) {
            return;
        }
        let inner = Rc::clone(&self.inner);
        self.inner
            .scheduler
            .request_frame(Box::new(move || inner.flush()));
    }

    /// True while a value is waiting for its frame.
    pub fn is_queued(&self) -> bool {
        self.inner.queued.get()
    }
}

/// Wrap `callback` so it runs at most once per frame with the latest value.
pub fn coalesce<T, F>(scheduler: Rc<dyn FrameScheduler>, callback: F) -> Coalesced<T>
where
    T: 'static,
    F: Fn(T) + 'static,
{
    Coalesced {
        inner: Rc::new(CoalescedInner {
            latest: RefCell::new(None),
            queued: Cell::new(false),
            callback: Box::new(callback),
            scheduler,
        }),
    }
}
