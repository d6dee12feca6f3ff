//! Playback surface capability interface
//!
//! The surface is the host's native media element. The binder only ever
//! references it; the host UI tree owns it.

use crate::Result;

pub use futures::future::LocalBoxFuture;

/// MIME type probed for native HLS support
pub const HLS_MIME_TYPE: &str = "application/vnd.apple.mpegurl";

/// Native media element controlled by the host environment
pub trait PlaybackSurface: Clone + 'static {
    /// Whether the element can play `mime_type` without a software engine
    fn can_play_type(&self, mime_type: &str) -> bool;

    /// Assign a source for native playback
    fn set_src(&self, url: &str);

    /// Request playback start. Resolves to an error when the environment
    /// rejects the request, e.g. for disallowed autoplay.
    fn play(&self) -> LocalBoxFuture<'static, Result<()>>;

    /// Show or hide the native controls
    fn set_controls(&self, enabled: bool);

    /// Apply a pass-through attribute
    fn set_attribute(&self, name: &str, value: &str) -> Result<()>;

    /// Drop a pass-through attribute that is no longer requested
    fn remove_attribute(&self, name: &str) -> Result<()>;
}

/// Executor for fire-and-forget work on the UI context
pub trait Spawn {
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>);
}

impl<F> Spawn for F
where
    F: Fn(LocalBoxFuture<'static, ()>),
{
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
        self(future)
    }
}
