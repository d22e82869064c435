//! Terminal mouse input as native events.
//!
//! Terminals only report mouse input, so everything arriving here is
//! `Modality::Mouse`. Cell coordinates become client coordinates.

use crossterm::event::{Event, MouseEvent, MouseEventKind};

use super::dom::Element;
use super::{EventKind, NativeEvent};

/// Convert a crossterm mouse event. Scroll events have no pointer phase.
pub fn from_crossterm(event: &MouseEvent) -> Option<NativeEvent> {
    let kind = match event.kind {
        MouseEventKind::Down(_) => EventKind::MouseDown,
        MouseEventKind::Drag(_) | MouseEventKind::Moved => EventKind::MouseMove,
        MouseEventKind::Up(_) => EventKind::MouseUp,
        _ => return None,
    };
    Some(NativeEvent::mouse(
        kind,
        f64::from(event.column),
        f64::from(event.row),
    ))
}

/// Convert any crossterm event, keeping only mouse input.
pub fn from_crossterm_event(event: &Event) -> Option<NativeEvent> {
    match event {
        Event::Mouse(mouse) => from_crossterm(mouse),
        _ => None,
    }
}

/// Convert and dispatch on `target`.
///
/// Returns `None` when the event is not pointer input, otherwise whether
/// the default action survived.
pub fn dispatch_crossterm(target: &Element, event: &Event) -> Option<bool> {
    let native = from_crossterm_event(event)?;
    Some(target.dispatch(&native))
}
