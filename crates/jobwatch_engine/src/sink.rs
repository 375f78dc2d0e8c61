use std::sync::mpsc;

/// Broadcast to UI surfaces; listeners re-read storage on receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    StateChanged,
}

pub trait UiSink: Send + Sync {
    /// Best effort: a missing listener is not an error.
    fn emit(&self, event: UiEvent);
}

pub struct ChannelUiSink {
    tx: mpsc::Sender<UiEvent>,
}

impl ChannelUiSink {
    pub fn new(tx: mpsc::Sender<UiEvent>) -> Self {
        Self { tx }
    }
}

impl UiSink for ChannelUiSink {
    fn emit(&self, event: UiEvent) {
        let _ = self.tx.send(event);
    }
}

/// Drops every event; for one-shot commands with no UI attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullUiSink;

impl UiSink for NullUiSink {
    fn emit(&self, _event: UiEvent) {}
}
