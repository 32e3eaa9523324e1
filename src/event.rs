use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Messages from the agent-channel tasks to the UI thread.
#[derive(Debug, Clone)]
pub enum AppEvent {
    StreamDelta(String),
    StreamEnd,
    StatusChanged(ConnectionState),
    AgentError(String),
    SessionCreated(String),
    /// A complete recipe as asserted by the agent, in wire form. The app
    /// replaces the mirror snapshot with it and runs a reconciliation pass.
    StateSnapshot(Value),
}
