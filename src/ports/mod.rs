//! Ports - Trait definitions implemented by adapters.

pub mod encoder;
pub mod projects;
pub mod renderer;

/// Channel end a driver reports raw 0-100 percentages into. Delivery is
/// decoupled from computation: drivers send, the orchestrator scales and
/// broadcasts. Send failures mean the listener is gone and are ignorable.
pub type ProgressSink = tokio::sync::mpsc::UnboundedSender<u8>;
