//! Streaming engine capability interface
//!
//! Everything the engine does internally (segment fetching, ABR, buffering)
//! stays behind these traits.

use crate::{EngineConfig, EngineEvent, EngineEventKind, PlaybackSurface, Result};

/// Handler invoked by the engine for a subscribed event kind
pub type EventHandler = Box<dyn Fn(EngineEvent)>;

/// A live streaming engine instance
pub trait StreamingEngine: 'static {
    type Surface: PlaybackSurface;

    /// Attach the engine to a playback surface
    fn attach_media(&self, surface: &Self::Surface);

    /// Begin loading a source URL
    fn load_source(&self, url: &str);

    /// Subscribe `handler` to events of `kind`
    fn on(&self, kind: EngineEventKind, handler: EventHandler);

    /// Resume or restart loading after a network failure
    fn start_load(&self);

    /// Attempt recovery from a media error
    fn recover_media_error(&self);

    /// Release the instance and cancel its in-flight work
    fn destroy(&self);
}

/// Constructs streaming engine instances
pub trait EngineFactory {
    type Engine: StreamingEngine;

    /// Whether a software engine can run in this environment
    fn is_supported(&self) -> bool;

    /// Construct an engine from an already merged configuration
    fn construct(&self, config: &EngineConfig) -> Result<Self::Engine>;
}
