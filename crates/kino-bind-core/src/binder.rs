//! Lifecycle Binder - ties one streaming engine to one playback surface
//!
//! Coordinates:
//! - Setup on mount and on changes to the rebind inputs
//! - Fallback to native playback, then to a logged capability error
//! - Event forwarding and the engine error recovery policy
//! - Teardown on unmount, before every rebind, and on unrecoverable errors
//!
//! At most one engine is ever live per binder: the previous instance is
//! destroyed before the next one is constructed.

use crate::{
    config::EngineConfig,
    engine::{EngineFactory, StreamingEngine},
    events::{EngineError, EngineEvent, EngineEventKind, RecoveryAction},
    props::{BindInputs, BinderProps, Callbacks},
    surface::{PlaybackSurface, Spawn, HLS_MIME_TYPE},
    types::*,
    Error,
};
use futures::FutureExt;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, error, info, instrument, warn};

type EngineOf<F> = <F as EngineFactory>::Engine;
type SurfaceOf<F> = <<F as EngineFactory>::Engine as StreamingEngine>::Surface;

/// Binding state shared with the engine event handlers
struct Binding<E: StreamingEngine> {
    state: BindState,
    /// Bumped on every bind so handlers of a replaced engine go stale
    generation: u64,
    cycle_id: Option<CycleId>,
    src: Option<String>,
    engine: Option<Rc<E>>,
    /// Handle written during the current cycle
    target: Option<HandleRef<E::Surface, E>>,
    engines_created: u64,
    engines_destroyed: u64,
}

impl<E: StreamingEngine> Binding<E> {
    fn new() -> Self {
        Self {
            state: BindState::Unbound,
            generation: 0,
            cycle_id: None,
            src: None,
            engine: None,
            target: None,
            engines_created: 0,
            engines_destroyed: 0,
        }
    }

    fn set_state(&mut self, new_state: BindState) {
        if !self.state.can_transition_to(new_state) {
            warn!(from = %self.state, to = %new_state, "Unexpected binder state transition");
        }
        debug!(from = %self.state, to = %new_state, "State transition");
        self.state = new_state;
    }
}

/// Destroy the engine, reset the handle and return to `Unbound`.
///
/// No borrow is held while the engine's `destroy` runs.
fn teardown<E: StreamingEngine>(binding: &RefCell<Binding<E>>) {
    let (engine, target, cycle_id) = {
        let mut b = binding.borrow_mut();
        if b.state == BindState::Unbound && b.engine.is_none() && b.target.is_none() {
            return;
        }
        (b.engine.take(), b.target.take(), b.cycle_id)
    };

    if let Some(engine) = engine {
        engine.destroy();
        binding.borrow_mut().engines_destroyed += 1;
        info!(cycle_id = ?cycle_id, "Streaming engine destroyed");
    }

    if let Some(target) = target {
        target.borrow_mut().reset();
    }

    let mut b = binding.borrow_mut();
    if b.state != BindState::Unbound {
        b.set_state(BindState::Unbound);
    }
}

/// Routes engine events for a single bind cycle
struct EventRouter<E: StreamingEngine> {
    binding: Weak<RefCell<Binding<E>>>,
    generation: u64,
    cycle_id: CycleId,
    surface: E::Surface,
    autoplay: bool,
    callbacks: Callbacks<E::Surface, E>,
    spawner: Rc<dyn Spawn>,
}

impl<E: StreamingEngine> EventRouter<E> {
    fn dispatch(&self, event: EngineEvent) {
        match event {
            EngineEvent::MediaAttached => {
                debug!(cycle_id = %self.cycle_id, "Media attached");
                if let Some(ref cb) = self.callbacks.on_media_attached {
                    cb();
                }
            }
            EngineEvent::ManifestParsed(payload) => {
                debug!(cycle_id = %self.cycle_id, autoplay = self.autoplay, "Manifest parsed");
                if self.autoplay {
                    self.start_playback();
                }
                if let Some(ref cb) = self.callbacks.on_manifest_parsed {
                    cb(&payload);
                }
            }
            EngineEvent::LevelSwitched { level } => {
                debug!(cycle_id = %self.cycle_id, level, "Level switched");
                if let Some(ref cb) = self.callbacks.on_level_switched {
                    cb(level);
                }
            }
            EngineEvent::Error(err) => {
                self.recover(&err);
                if let Some(ref cb) = self.callbacks.on_error {
                    cb(EngineEventKind::Error, &err);
                }
            }
        }
    }

    /// Request playback; a rejection is logged and swallowed
    fn start_playback(&self) {
        let play = self.surface.play();
        let cycle_id = self.cycle_id;
        self.spawner.spawn_local(
            async move {
                if let Err(err) = play.await {
                    warn!(cycle_id = %cycle_id, code = err.error_code(), error = %err, "Autoplay failed");
                }
            }
            .boxed_local(),
        );
    }

    fn recover(&self, err: &EngineError) {
        let action = RecoveryAction::for_error(err);
        if action == RecoveryAction::None {
            debug!(
                cycle_id = %self.cycle_id,
                category = %err.category,
                details = %err.details,
                "Non-fatal engine error"
            );
            return;
        }

        let Some(binding) = self.binding.upgrade() else {
            debug!(cycle_id = %self.cycle_id, "Binder dropped, skipping recovery");
            return;
        };
        let engine = {
            let b = binding.borrow();
            if b.generation == self.generation {
                b.engine.clone()
            } else {
                None
            }
        };
        let Some(engine) = engine else {
            debug!(cycle_id = %self.cycle_id, "Engine no longer current, skipping recovery");
            return;
        };

        warn!(
            cycle_id = %self.cycle_id,
            category = %err.category,
            details = %err.details,
            action = ?action,
            "Fatal engine error"
        );

        match action {
            RecoveryAction::RestartLoad => engine.start_load(),
            RecoveryAction::RecoverMedia => engine.recover_media_error(),
            RecoveryAction::Teardown => {
                drop(engine);
                teardown(&binding);
            }
            RecoveryAction::None => {}
        }
    }
}

/// Binds a streaming engine to a playback surface across a component's lifecycle
pub struct LifecycleBinder<F: EngineFactory> {
    factory: F,
    spawner: Rc<dyn Spawn>,
    binding: Rc<RefCell<Binding<EngineOf<F>>>>,
    /// Fallback write target when the caller supplies no handle
    own_handle: HandleRef<SurfaceOf<F>, EngineOf<F>>,
    surface: Option<SurfaceOf<F>>,
    /// Pass-through attribute names currently set on the surface
    applied_attributes: Vec<String>,
    /// Inputs of the last bind, compared on update
    inputs: Option<BindInputs<SurfaceOf<F>, EngineOf<F>>>,
}

impl<F: EngineFactory> LifecycleBinder<F> {
    /// Create a binder; `spawner` runs playback-start futures
    pub fn new(factory: F, spawner: impl Spawn + 'static) -> Self {
        Self {
            factory,
            spawner: Rc::new(spawner),
            binding: Rc::new(RefCell::new(Binding::new())),
            own_handle: new_handle(),
            surface: None,
            applied_attributes: Vec::new(),
            inputs: None,
        }
    }

    /// Surface became available: apply attributes and bind
    pub fn mount(&mut self, surface: SurfaceOf<F>, props: BinderProps<SurfaceOf<F>, EngineOf<F>>) {
        if self.surface.is_some() {
            debug!("Surface replaced, rebinding");
        }
        self.surface = Some(surface);
        self.applied_attributes.clear();
        self.apply_attributes(&props);
        self.bind(&props);
    }

    /// Props changed: reapply attributes, rebind if any rebind input changed
    pub fn update(&mut self, props: BinderProps<SurfaceOf<F>, EngineOf<F>>) {
        if self.surface.is_none() {
            debug!(src = %props.src, "Update before mount ignored");
            return;
        }
        self.apply_attributes(&props);

        let next = props.inputs();
        let changed = self
            .inputs
            .as_ref()
            .map_or(true, |current| current.requires_rebind(&next));
        if changed {
            self.bind(&props);
        }
    }

    /// Component unmounted: tear down and release the surface
    pub fn unmount(&mut self) {
        teardown(&self.binding);
        self.surface = None;
        self.applied_attributes.clear();
        self.inputs = None;
        info!("Binder unmounted");
    }

    /// Current lifecycle state
    pub fn state(&self) -> BindState {
        self.binding.borrow().state
    }

    /// The live engine, if any
    pub fn engine(&self) -> Option<Rc<EngineOf<F>>> {
        self.binding.borrow().engine.clone()
    }

    /// The mounted surface, if any
    pub fn surface(&self) -> Option<&SurfaceOf<F>> {
        self.surface.as_ref()
    }

    /// The binder-owned handle, written when the caller supplies none
    pub fn own_handle(&self) -> HandleRef<SurfaceOf<F>, EngineOf<F>> {
        self.own_handle.clone()
    }

    /// Snapshot of the handle written by the current cycle
    pub fn handle(&self) -> ExternalHandle<SurfaceOf<F>, EngineOf<F>> {
        let target = self.binding.borrow().target.clone();
        match target {
            Some(target) => target.borrow().clone(),
            None => self.own_handle.borrow().clone(),
        }
    }

    /// Diagnostics snapshot
    pub fn status(&self) -> BinderStatus {
        let b = self.binding.borrow();
        BinderStatus {
            state: b.state,
            cycle_id: b.cycle_id,
            src: b.src.clone(),
            engines_created: b.engines_created,
            engines_destroyed: b.engines_destroyed,
        }
    }

    fn apply_attributes(&mut self, props: &BinderProps<SurfaceOf<F>, EngineOf<F>>) {
        let Some(ref surface) = self.surface else {
            return;
        };
        surface.set_controls(true);

        let applied = &mut self.applied_attributes;
        for name in applied.iter() {
            if props.attributes.iter().any(|(next, _)| next == name) {
                continue;
            }
            if let Err(err) = surface.remove_attribute(name) {
                warn!(attribute = %name, error = %err, "Failed to remove surface attribute");
            }
        }
        applied.clear();

        for (name, value) in &props.attributes {
            match surface.set_attribute(name, value) {
                Ok(()) => applied.push(name.clone()),
                Err(err) => warn!(attribute = %name, error = %err, "Failed to apply surface attribute"),
            }
        }
    }

    #[instrument(skip(self, props), fields(src = %props.src, autoplay = props.autoplay))]
    fn bind(&mut self, props: &BinderProps<SurfaceOf<F>, EngineOf<F>>) {
        let Some(surface) = self.surface.clone() else {
            return;
        };

        teardown(&self.binding);
        self.inputs = Some(props.inputs());

        let cycle_id = CycleId::new();
        let target = props.handle.clone().unwrap_or_else(|| self.own_handle.clone());
        let generation = {
            let mut b = self.binding.borrow_mut();
            b.set_state(BindState::Binding);
            b.generation += 1;
            b.cycle_id = Some(cycle_id);
            b.src = Some(props.src.clone());
            b.target = Some(target.clone());
            b.generation
        };

        info!(cycle_id = %cycle_id, "Binding playback surface");

        if self.factory.is_supported() {
            self.bind_engine(props, surface, target, generation, cycle_id);
        } else if surface.can_play_type(HLS_MIME_TYPE) {
            surface.set_src(&props.src);
            target.borrow_mut().surface = Some(surface);
            self.binding
                .borrow_mut()
                .set_state(BindState::Bound(PlaybackPath::Native));
            info!(cycle_id = %cycle_id, "Using native HLS playback");
        } else {
            let err = Error::Unsupported;
            error!(cycle_id = %cycle_id, code = err.error_code(), error = %err, "No playback path available");
            self.binding
                .borrow_mut()
                .set_state(BindState::Bound(PlaybackPath::Unsupported));
        }
    }

    fn bind_engine(
        &mut self,
        props: &BinderProps<SurfaceOf<F>, EngineOf<F>>,
        surface: SurfaceOf<F>,
        target: HandleRef<SurfaceOf<F>, EngineOf<F>>,
        generation: u64,
        cycle_id: CycleId,
    ) {
        let config = props
            .config
            .as_deref()
            .map(EngineConfig::merged_over_defaults)
            .unwrap_or_else(EngineConfig::defaults);

        let engine = match self.factory.construct(&config) {
            Ok(engine) => Rc::new(engine),
            Err(err) => {
                error!(cycle_id = %cycle_id, code = err.error_code(), error = %err, "Engine construction failed");
                teardown(&self.binding);
                return;
            }
        };

        {
            let mut b = self.binding.borrow_mut();
            b.engine = Some(engine.clone());
            b.engines_created += 1;
        }
        {
            let mut handle = target.borrow_mut();
            handle.engine = Some(engine.clone());
            handle.surface = Some(surface.clone());
        }

        let router = Rc::new(EventRouter {
            binding: Rc::downgrade(&self.binding),
            generation,
            cycle_id,
            surface: surface.clone(),
            autoplay: props.autoplay,
            callbacks: props.callbacks.clone(),
            spawner: self.spawner.clone(),
        });
        for kind in EngineEventKind::ALL {
            let router = router.clone();
            engine.on(kind, Box::new(move |event| router.dispatch(event)));
        }

        // A fatal error raised synchronously by the engine may already have
        // torn this cycle down
        engine.attach_media(&surface);
        if !self.is_current(&engine, generation) {
            debug!(cycle_id = %cycle_id, "Engine torn down while attaching");
            return;
        }
        engine.load_source(&props.src);
        if !self.is_current(&engine, generation) {
            debug!(cycle_id = %cycle_id, "Engine torn down while loading");
            return;
        }
        self.binding
            .borrow_mut()
            .set_state(BindState::Bound(PlaybackPath::Engine));

        info!(cycle_id = %cycle_id, options = config.len(), "Streaming engine attached");

        if let Some(ref cb) = props.callbacks.on_engine_constructed {
            cb(&engine);
        }
        if let Some(ref cb) = props.callbacks.on_ready {
            cb(&engine, &surface);
        }
    }

    /// Whether `engine` is still the live engine of bind cycle `generation`
    fn is_current(&self, engine: &Rc<EngineOf<F>>, generation: u64) -> bool {
        let b = self.binding.borrow();
        b.generation == generation && b.engine.as_ref().is_some_and(|live| Rc::ptr_eq(live, engine))
    }
}

impl<F: EngineFactory> Drop for LifecycleBinder<F> {
    fn drop(&mut self) {
        teardown(&self.binding);
    }
}
