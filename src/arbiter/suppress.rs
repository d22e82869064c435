//! Default-action and propagation suppression.

use crate::host::NativeEvent;
use crate::types::ArbiterOptions;

bitflags::bitflags! {
    /// What to suppress on a native event once its handler has run.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Suppression: u8 {
        const NONE = 0;
        const PREVENT_DEFAULT = 1 << 0;
        const STOP_PROPAGATION = 1 << 1;
    }
}

impl Suppression {
    pub fn from_options(options: ArbiterOptions) -> Self {
        let mut flags = Suppression::NONE;
        if options.prevent_default {
            flags |= Suppression::PREVENT_DEFAULT;
        }
        if options.stop_propagation {
            flags |= Suppression::STOP_PROPAGATION;
        }
        flags
    }

    pub fn apply(self, event: &NativeEvent) {
        if self.contains(Suppression::PREVENT_DEFAULT) {
            event.prevent_default();
        }
        if self.contains(Suppression::STOP_PROPAGATION) {
            event.stop_propagation();
        }
    }
}
