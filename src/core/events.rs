//! Upward notifications to the surrounding UI/state owner.
//!
//! The controller emits one `MaskChanged` and one `MaskPresence` per mask
//! capture. The sender is a thin wrapper around an optional channel so
//! components can run without a receiver (tests, headless use).

use crossbeam_channel::Sender;

/// Notifications produced by the sidebar controller
#[derive(Debug, Clone)]
pub enum SidebarEvent {
    /// New mask geometry, serialized as a GeoJSON string
    MaskChanged { geojson: String },

    /// Whether a mask is currently present
    MaskPresence { present: bool },
}

/// Event sender wrapper for the controller.
///
/// Silent when unconnected - emitting without a receiver is a no-op.
#[derive(Clone, Debug, Default)]
pub struct SidebarEventSender {
    sender: Option<Sender<SidebarEvent>>,
}

impl SidebarEventSender {
    /// Sender wired to a live channel
    pub fn new(sender: Sender<SidebarEvent>) -> Self {
        Self { sender: Some(sender) }
    }

    /// Unconnected sender; every `emit` is a silent no-op
    pub fn dummy() -> Self {
        Self { sender: None }
    }

    /// Deliver the event to the receiver, if one is connected.
    pub fn emit(&self, event: SidebarEvent) {
        if let Some(ref tx) = self.sender {
            // A dropped receiver is not an error here
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_emit_delivers() {
        let (tx, rx) = unbounded();
        let sender = SidebarEventSender::new(tx);
        sender.emit(SidebarEvent::MaskPresence { present: true });

        match rx.try_recv().unwrap() {
            SidebarEvent::MaskPresence { present } => assert!(present),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_dummy_is_silent() {
        let sender = SidebarEventSender::dummy();
        // Must not panic or block
        sender.emit(SidebarEvent::MaskChanged { geojson: "{}".into() });
    }
}
