//! Core types for Kino Bind

use crate::{PlaybackSurface, StreamingEngine};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

/// Unique identifier for one bind cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleId(pub Uuid);

impl CycleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CycleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Playback path chosen while binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPath {
    /// A software streaming engine feeds the surface
    Engine,
    /// The surface plays the source itself
    Native,
    /// No playback path was available
    Unsupported,
}

impl std::fmt::Display for PlaybackPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackPath::Engine => write!(f, "engine"),
            PlaybackPath::Native => write!(f, "native"),
            PlaybackPath::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Binder lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "path", rename_all = "snake_case")]
pub enum BindState {
    /// No binding is active
    Unbound,
    /// Setup in progress
    Binding,
    /// Setup finished along the given path
    Bound(PlaybackPath),
}

impl BindState {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: BindState) -> bool {
        use BindState::*;
        matches!(
            (self, target),
            (Unbound, Binding) | (Binding, Bound(_)) | (Binding, Unbound) | (Bound(_), Unbound)
        )
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, BindState::Bound(_))
    }
}

impl std::fmt::Display for BindState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindState::Unbound => write!(f, "unbound"),
            BindState::Binding => write!(f, "binding"),
            BindState::Bound(path) => write!(f, "bound({path})"),
        }
    }
}

/// Externally observable snapshot of the current surface and engine
pub struct ExternalHandle<S, E> {
    pub surface: Option<S>,
    pub engine: Option<Rc<E>>,
}

impl<S, E> ExternalHandle<S, E> {
    pub fn empty() -> Self {
        Self {
            surface: None,
            engine: None,
        }
    }

    /// Both fields absent
    pub fn is_empty(&self) -> bool {
        self.surface.is_none() && self.engine.is_none()
    }

    pub fn reset(&mut self) {
        self.surface = None;
        self.engine = None;
    }
}

impl<S, E> Default for ExternalHandle<S, E> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<S: Clone, E> Clone for ExternalHandle<S, E> {
    fn clone(&self) -> Self {
        Self {
            surface: self.surface.clone(),
            engine: self.engine.clone(),
        }
    }
}

impl<S, E> std::fmt::Debug for ExternalHandle<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalHandle")
            .field("surface", &self.surface.is_some())
            .field("engine", &self.engine.is_some())
            .finish()
    }
}

/// Shared write target for the handle snapshot
pub type HandleRef<S, E> = Rc<RefCell<ExternalHandle<S, E>>>;

/// Create a fresh, empty handle
pub fn new_handle<S: PlaybackSurface, E: StreamingEngine>() -> HandleRef<S, E> {
    Rc::new(RefCell::new(ExternalHandle::empty()))
}

/// Serializable binder status for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinderStatus {
    pub state: BindState,
    pub cycle_id: Option<CycleId>,
    pub src: Option<String>,
    /// Engines constructed over the binder's lifetime
    pub engines_created: u64,
    /// Engines destroyed over the binder's lifetime
    pub engines_destroyed: u64,
}

impl BinderStatus {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_state_transitions() {
        assert!(BindState::Unbound.can_transition_to(BindState::Binding));
        assert!(BindState::Binding.can_transition_to(BindState::Bound(PlaybackPath::Native)));
        assert!(BindState::Bound(PlaybackPath::Engine).can_transition_to(BindState::Unbound));

        assert!(!BindState::Unbound.can_transition_to(BindState::Bound(PlaybackPath::Engine)));
        assert!(!BindState::Bound(PlaybackPath::Engine).can_transition_to(BindState::Binding));
    }

    #[test]
    fn test_bind_state_display() {
        assert_eq!(BindState::Unbound.to_string(), "unbound");
        assert_eq!(BindState::Bound(PlaybackPath::Engine).to_string(), "bound(engine)");
    }

    #[test]
    fn test_handle_reset() {
        let mut handle: ExternalHandle<String, ()> = ExternalHandle {
            surface: Some("video".to_string()),
            engine: Some(Rc::new(())),
        };
        assert!(!handle.is_empty());
        handle.reset();
        assert!(handle.is_empty());
    }

    #[test]
    fn test_status_json() {
        let status = BinderStatus {
            state: BindState::Bound(PlaybackPath::Native),
            cycle_id: None,
            src: Some("a.m3u8".into()),
            engines_created: 0,
            engines_destroyed: 0,
        };
        let json = status.to_json();
        assert!(json.contains(r#""state":"bound""#));
        assert!(json.contains(r#""path":"native""#));
    }
}
