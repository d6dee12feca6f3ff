//! Binder input properties
//!
//! [`BinderProps`] is the declarative input set a host component hands to the
//! binder on every mount and update. [`BindInputs`] is the subset whose change
//! forces a teardown followed by a fresh bind; everything else (pass-through
//! attributes) is reapplied without rebinding.
//!
//! Callback and configuration identity is `Rc` identity. Cloning a
//! [`Callbacks`] value keeps the identities, so a host that stores its props
//! and clones them per update never triggers a spurious rebind.

use crate::{EngineConfig, EngineError, EngineEventKind, Error, HandleRef, Result};
use serde_json::Value;
use std::rc::Rc;

pub type EngineCallback<E> = Rc<dyn Fn(&Rc<E>)>;
pub type ReadyCallback<S, E> = Rc<dyn Fn(&Rc<E>, &S)>;
pub type NotifyCallback = Rc<dyn Fn()>;
pub type ManifestCallback = Rc<dyn Fn(&Value)>;
pub type LevelCallback = Rc<dyn Fn(usize)>;
pub type ErrorCallback = Rc<dyn Fn(EngineEventKind, &EngineError)>;

/// Optional caller callbacks
pub struct Callbacks<S, E> {
    /// Engine instance constructed and loading
    pub on_engine_constructed: Option<EngineCallback<E>>,
    /// Attach and load were issued
    pub on_ready: Option<ReadyCallback<S, E>>,
    pub on_media_attached: Option<NotifyCallback>,
    pub on_manifest_parsed: Option<ManifestCallback>,
    pub on_level_switched: Option<LevelCallback>,
    /// Raw engine error, forwarded after recovery
    pub on_error: Option<ErrorCallback>,
}

impl<S, E> Callbacks<S, E> {
    pub fn new() -> Self {
        Self {
            on_engine_constructed: None,
            on_ready: None,
            on_media_attached: None,
            on_manifest_parsed: None,
            on_level_switched: None,
            on_error: None,
        }
    }

    pub fn on_engine_constructed(mut self, f: impl Fn(&Rc<E>) + 'static) -> Self {
        self.on_engine_constructed = Some(Rc::new(f));
        self
    }

    pub fn on_ready(mut self, f: impl Fn(&Rc<E>, &S) + 'static) -> Self {
        self.on_ready = Some(Rc::new(f));
        self
    }

    pub fn on_media_attached(mut self, f: impl Fn() + 'static) -> Self {
        self.on_media_attached = Some(Rc::new(f));
        self
    }

    pub fn on_manifest_parsed(mut self, f: impl Fn(&Value) + 'static) -> Self {
        self.on_manifest_parsed = Some(Rc::new(f));
        self
    }

    pub fn on_level_switched(mut self, f: impl Fn(usize) + 'static) -> Self {
        self.on_level_switched = Some(Rc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(EngineEventKind, &EngineError) + 'static) -> Self {
        self.on_error = Some(Rc::new(f));
        self
    }

    /// True when every slot holds the same callback (or none) in both sets
    pub fn same_identity(&self, other: &Self) -> bool {
        same_slot(&self.on_engine_constructed, &other.on_engine_constructed)
            && same_slot(&self.on_ready, &other.on_ready)
            && same_slot(&self.on_media_attached, &other.on_media_attached)
            && same_slot(&self.on_manifest_parsed, &other.on_manifest_parsed)
            && same_slot(&self.on_level_switched, &other.on_level_switched)
            && same_slot(&self.on_error, &other.on_error)
    }
}

impl<S, E> Default for Callbacks<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, E> Clone for Callbacks<S, E> {
    fn clone(&self) -> Self {
        Self {
            on_engine_constructed: self.on_engine_constructed.clone(),
            on_ready: self.on_ready.clone(),
            on_media_attached: self.on_media_attached.clone(),
            on_manifest_parsed: self.on_manifest_parsed.clone(),
            on_level_switched: self.on_level_switched.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

fn same_slot<T: ?Sized>(a: &Option<Rc<T>>, b: &Option<Rc<T>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
        _ => false,
    }
}

/// Declarative binder inputs
pub struct BinderProps<S, E> {
    pub(crate) src: String,
    pub(crate) config: Option<Rc<EngineConfig>>,
    pub(crate) autoplay: bool,
    pub(crate) handle: Option<HandleRef<S, E>>,
    pub(crate) callbacks: Callbacks<S, E>,
    pub(crate) attributes: Vec<(String, String)>,
}

impl<S, E> BinderProps<S, E> {
    /// Create props for a source URL, which must not be empty
    pub fn new(src: impl Into<String>) -> Result<Self> {
        let src = src.into();
        if src.trim().is_empty() {
            return Err(Error::EmptySource);
        }
        Ok(Self {
            src,
            config: None,
            autoplay: false,
            handle: None,
            callbacks: Callbacks::new(),
            attributes: Vec::new(),
        })
    }

    pub fn with_config(mut self, config: Rc<EngineConfig>) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    /// Write the handle snapshot into a caller-owned container
    pub fn with_handle(mut self, handle: HandleRef<S, E>) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn with_callbacks(mut self, callbacks: Callbacks<S, E>) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Add a pass-through surface attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// The subset of inputs whose change forces a rebind
    pub fn inputs(&self) -> BindInputs<S, E> {
        BindInputs {
            src: self.src.clone(),
            config: self.config.clone(),
            autoplay: self.autoplay,
            handle: self.handle.clone(),
            callbacks: self.callbacks.clone(),
        }
    }
}

impl<S, E> Clone for BinderProps<S, E> {
    fn clone(&self) -> Self {
        Self {
            src: self.src.clone(),
            config: self.config.clone(),
            autoplay: self.autoplay,
            handle: self.handle.clone(),
            callbacks: self.callbacks.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

/// Inputs compared on every update
pub struct BindInputs<S, E> {
    pub(crate) src: String,
    pub(crate) config: Option<Rc<EngineConfig>>,
    pub(crate) autoplay: bool,
    pub(crate) handle: Option<HandleRef<S, E>>,
    pub(crate) callbacks: Callbacks<S, E>,
}

impl<S, E> BindInputs<S, E> {
    /// Whether rebinding is required to move from `self` to `next`
    pub fn requires_rebind(&self, next: &BindInputs<S, E>) -> bool {
        self.src != next.src
            || !same_slot(&self.config, &next.config)
            || self.autoplay != next.autoplay
            || !same_slot(&self.handle, &next.handle)
            || !self.callbacks.same_identity(&next.callbacks)
    }
}
