//! Engine events and the error recovery policy

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Engine event kinds the binder subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineEventKind {
    MediaAttached,
    ManifestParsed,
    LevelSwitched,
    Error,
}

impl EngineEventKind {
    /// Every kind the binder registers, in registration order
    pub const ALL: [EngineEventKind; 4] = [
        EngineEventKind::MediaAttached,
        EngineEventKind::ManifestParsed,
        EngineEventKind::LevelSwitched,
        EngineEventKind::Error,
    ];

    /// Event name used by hls.js
    pub fn event_name(&self) -> &'static str {
        match self {
            EngineEventKind::MediaAttached => "hlsMediaAttached",
            EngineEventKind::ManifestParsed => "hlsManifestParsed",
            EngineEventKind::LevelSwitched => "hlsLevelSwitched",
            EngineEventKind::Error => "hlsError",
        }
    }

    /// Parse an hls.js event name
    pub fn from_event_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.event_name() == name)
    }
}

impl std::fmt::Display for EngineEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.event_name())
    }
}

/// Engine error category
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Network,
    Media,
    Mux,
    KeySystem,
    Other(String),
}

impl ErrorCategory {
    /// Parse the hls.js `ErrorTypes` string
    pub fn from_type(error_type: &str) -> Self {
        match error_type {
            "networkError" => ErrorCategory::Network,
            "mediaError" => ErrorCategory::Media,
            "muxError" => ErrorCategory::Mux,
            "keySystemError" => ErrorCategory::KeySystem,
            other => ErrorCategory::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Network => write!(f, "networkError"),
            ErrorCategory::Media => write!(f, "mediaError"),
            ErrorCategory::Mux => write!(f, "muxError"),
            ErrorCategory::KeySystem => write!(f, "keySystemError"),
            ErrorCategory::Other(other) => write!(f, "{other}"),
        }
    }
}

/// Error payload emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineError {
    /// Whether the engine gave up on its own
    pub fatal: bool,
    /// Error category, selects the recovery action
    pub category: ErrorCategory,
    /// Engine-specific detail code, e.g. `manifestLoadError`
    pub details: String,
    /// Raw event payload, forwarded untouched
    pub payload: Value,
}

impl EngineError {
    pub fn new(fatal: bool, category: ErrorCategory, details: impl Into<String>) -> Self {
        Self {
            fatal,
            category,
            details: details.into(),
            payload: Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Event delivered by the engine to a subscribed handler
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    MediaAttached,
    ManifestParsed(Value),
    LevelSwitched { level: usize },
    Error(EngineError),
}

impl EngineEvent {
    pub fn kind(&self) -> EngineEventKind {
        match self {
            EngineEvent::MediaAttached => EngineEventKind::MediaAttached,
            EngineEvent::ManifestParsed(_) => EngineEventKind::ManifestParsed,
            EngineEvent::LevelSwitched { .. } => EngineEventKind::LevelSwitched,
            EngineEvent::Error(_) => EngineEventKind::Error,
        }
    }
}

/// Action taken in response to an engine error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    /// Forward only
    None,
    /// Ask the engine to resume loading
    RestartLoad,
    /// Ask the engine to recover from a media error
    RecoverMedia,
    /// Destroy the engine instance
    Teardown,
}

impl RecoveryAction {
    /// Select the recovery action for an engine error
    pub fn for_error(error: &EngineError) -> Self {
        if !error.fatal {
            return RecoveryAction::None;
        }
        match error.category {
            ErrorCategory::Network => RecoveryAction::RestartLoad,
            ErrorCategory::Media => RecoveryAction::RecoverMedia,
            _ => RecoveryAction::Teardown,
        }
    }
}
