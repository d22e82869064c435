//! Session state - which modality owns the gesture and where it is.
//!
//! Modality and last sample live in signals so widgets can derive state
//! ("is dragging", cursor position) without registering handlers.

use std::cell::Cell;
use std::time::Duration;

use spark_signals::{signal, Signal};

use crate::types::{Modality, PointerSample};

/// Invariant: `modality != None` exactly while a gesture is captured.
pub(crate) struct Session {
    modality: Signal<Modality>,
    last_sample: Signal<PointerSample>,
    last_start: Cell<Duration>,
}

impl Session {
    pub(crate) fn new() -> Self {
        Self {
            modality: signal(Modality::None),
            last_sample: signal(PointerSample::default()),
            last_start: Cell::new(Duration::ZERO),
        }
    }

    pub(crate) fn modality(&self) -> Modality {
        self.modality.get()
    }

    pub(crate) fn last_sample(&self) -> PointerSample {
        self.last_sample.get()
    }

    pub(crate) fn last_start(&self) -> Duration {
        self.last_start.get()
    }

    pub(crate) fn modality_signal(&self) -> Signal<Modality> {
        self.modality.clone()
    }

    pub(crate) fn last_sample_signal(&self) -> Signal<PointerSample> {
        self.last_sample.clone()
    }

    /// Accepted start: `modality` takes ownership at `now`.
    pub(crate) fn capture(&self, modality: Modality, sample: PointerSample, now: Duration) {
        self.modality.set(modality);
        self.last_sample.set(sample);
        self.last_start.set(now);
    }

    /// Record coordinates when the event carried any.
    pub(crate) fn record(&self, sample: Option<PointerSample>) {
        if let Some(sample) = sample {
            self.last_sample.set(sample);
        }
    }

    pub(crate) fn release(&self) {
        self.modality.set(Modality::None);
    }

    /// True when a start from `incoming` at `now` is a ghost of the
    /// gesture owned by another modality.
    pub(crate) fn is_ghost_start(&self, incoming: Modality, now: Duration) -> bool {
        let current = self.modality();
        current.is_some()
            && incoming != current
            && now.saturating_sub(self.last_start()) < crate::DUPLICATE_INTERVAL
    }
}
