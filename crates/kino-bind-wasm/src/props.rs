//! JS props object → [`BinderProps`]
//!
//! Hosts re-render with a fresh props object every time, so identity is
//! carried by the values inside it: a JS function or config object that is
//! `===` to the previous one maps back to the same `Rc`, and the binder sees
//! no change.

use crate::hls::HlsJsEngine;
use crate::surface::{describe_js_error, VideoSurface};
use kino_bind_core::{
    new_handle, BinderProps, Callbacks, EngineConfig, EngineError, EngineEventKind, ExternalHandle,
    HandleRef,
};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;
use wasm_bindgen::prelude::*;

pub type Handle = HandleRef<VideoSurface, HlsJsEngine>;
pub type Props = BinderProps<VideoSurface, HlsJsEngine>;

/// Writes the handle snapshot into a caller-owned JS object as `hls` / `video`
pub struct RefMirror {
    pub handle: Handle,
    pub target: js_sys::Object,
}

impl RefMirror {
    pub fn sync(&self) {
        let (hls, video) = {
            let handle = self.handle.borrow();
            let hls = handle
                .engine
                .as_ref()
                .map_or(JsValue::NULL, |engine| JsValue::from(engine.raw().clone()));
            let video = handle
                .surface
                .as_ref()
                .map_or(JsValue::NULL, |surface| JsValue::from(surface.element().clone()));
            (hls, video)
        };
        set_field(&self.target, "hls", &hls);
        set_field(&self.target, "video", &video);
    }

    /// Null out both fields, used when the caller swaps refs
    pub fn clear(&self) {
        set_field(&self.target, "hls", &JsValue::NULL);
        set_field(&self.target, "video", &JsValue::NULL);
    }
}

fn replace_mirror(slot: &MirrorSlot, next: Option<RefMirror>) {
    let previous = slot.replace(next);
    if let Some(previous) = previous {
        let still_current = slot
            .borrow()
            .as_ref()
            .is_some_and(|current| current.target == previous.target);
        if !still_current {
            previous.clear();
        }
    }
}

/// Currently selected mirror, shared with the callback wrappers
pub type MirrorSlot = Rc<RefCell<Option<RefMirror>>>;

struct Cached<T: ?Sized> {
    key: JsValue,
    value: Rc<T>,
}

fn reuse<T: ?Sized>(slot: &mut Option<Cached<T>>, key: JsValue, build: impl FnOnce() -> Rc<T>) -> Rc<T> {
    if let Some(cached) = slot {
        if cached.key == key {
            return cached.value.clone();
        }
    }
    let value = build();
    *slot = Some(Cached {
        key,
        value: value.clone(),
    });
    value
}

/// Identity cache for everything compared by reference
#[derive(Default)]
pub struct PropsCache {
    config: Option<Cached<EngineConfig>>,
    handle: Option<Cached<RefCell<ExternalHandle<VideoSurface, HlsJsEngine>>>>,
    on_engine_constructed: Option<Cached<dyn Fn(&Rc<HlsJsEngine>)>>,
    on_ready: Option<Cached<dyn Fn(&Rc<HlsJsEngine>, &VideoSurface)>>,
    on_media_attached: Option<Cached<dyn Fn()>>,
    on_manifest_parsed: Option<Cached<dyn Fn(&Value)>>,
    on_level_switched: Option<Cached<dyn Fn(usize)>>,
    on_error: Option<Cached<dyn Fn(EngineEventKind, &EngineError)>>,
}

impl PropsCache {
    /// Parse a JS props object, reusing cached `Rc`s for unchanged values
    pub fn parse(&mut self, props: &JsValue, mirror: &MirrorSlot) -> Result<Props, JsValue> {
        let src = get_field(props, "src").as_string().unwrap_or_default();
        let mut parsed = BinderProps::new(src).map_err(|e| JsValue::from_str(&e.to_string()))?;

        let autoplay = get_field(props, "autoPlay").as_bool().unwrap_or(false);
        parsed = parsed.with_autoplay(autoplay);

        let config = get_field(props, "hlsConfig");
        if config.is_object() {
            let key = config.clone();
            parsed = parsed.with_config(reuse(&mut self.config, key, || Rc::new(parse_config(&config))));
        } else {
            self.config = None;
        }

        let player_ref = get_field(props, "playerRef");
        match player_ref.dyn_ref::<js_sys::Object>() {
            Some(target) => {
                let handle: Handle = reuse(&mut self.handle, player_ref.clone(), new_handle);
                replace_mirror(
                    mirror,
                    Some(RefMirror {
                        handle: handle.clone(),
                        target: target.clone(),
                    }),
                );
                parsed = parsed.with_handle(handle);
            }
            None => {
                self.handle = None;
                replace_mirror(mirror, None);
            }
        }

        parsed = parsed.with_callbacks(self.callbacks(props, mirror));

        for (name, value) in parse_attributes(&get_field(props, "attributes")) {
            parsed = parsed.with_attribute(name, value);
        }

        Ok(parsed)
    }

    fn callbacks(&mut self, props: &JsValue, mirror: &MirrorSlot) -> Callbacks<VideoSurface, HlsJsEngine> {
        let mut callbacks = Callbacks::new();

        if let Some(f) = get_function(props, "onHlsInit") {
            callbacks.on_engine_constructed = Some(reuse(&mut self.on_engine_constructed, f.clone().into(), || {
                Rc::new(move |engine: &Rc<HlsJsEngine>| {
                    call(&f, "onHlsInit", &[JsValue::from(engine.raw().clone())]);
                })
            }));
        } else {
            self.on_engine_constructed = None;
        }

        if let Some(f) = get_function(props, "onReady") {
            let mirror = mirror.clone();
            callbacks.on_ready = Some(reuse(&mut self.on_ready, f.clone().into(), || {
                Rc::new(move |engine: &Rc<HlsJsEngine>, surface: &VideoSurface| {
                    sync(&mirror);
                    call(
                        &f,
                        "onReady",
                        &[JsValue::from(engine.raw().clone()), JsValue::from(surface.element().clone())],
                    );
                })
            }));
        } else {
            self.on_ready = None;
        }

        if let Some(f) = get_function(props, "onMediaAttached") {
            callbacks.on_media_attached = Some(reuse(&mut self.on_media_attached, f.clone().into(), || {
                Rc::new(move || call(&f, "onMediaAttached", &[]))
            }));
        } else {
            self.on_media_attached = None;
        }

        if let Some(f) = get_function(props, "onManifestParsed") {
            callbacks.on_manifest_parsed = Some(reuse(&mut self.on_manifest_parsed, f.clone().into(), || {
                Rc::new(move |payload: &Value| {
                    call(
                        &f,
                        "onManifestParsed",
                        &[
                            JsValue::from_str(EngineEventKind::ManifestParsed.event_name()),
                            json_to_js(payload),
                        ],
                    );
                })
            }));
        } else {
            self.on_manifest_parsed = None;
        }

        if let Some(f) = get_function(props, "onLevelSwitched") {
            callbacks.on_level_switched = Some(reuse(&mut self.on_level_switched, f.clone().into(), || {
                Rc::new(move |level: usize| call(&f, "onLevelSwitched", &[JsValue::from_f64(level as f64)]))
            }));
        } else {
            self.on_level_switched = None;
        }

        // Installed even without a JS callback so a teardown from the
        // recovery policy reaches the caller's ref.
        let on_error = get_function(props, "onError");
        let key = on_error.as_ref().map_or(JsValue::UNDEFINED, |f| f.clone().into());
        let mirror = mirror.clone();
        callbacks.on_error = Some(reuse(&mut self.on_error, key, || {
            Rc::new(move |kind: EngineEventKind, err: &EngineError| {
                sync(&mirror);
                if let Some(ref f) = on_error {
                    call(f, "onError", &[JsValue::from_str(kind.event_name()), json_to_js(&err.payload)]);
                }
            })
        }));

        callbacks
    }
}

fn sync(mirror: &MirrorSlot) {
    if let Some(ref mirror) = *mirror.borrow() {
        mirror.sync();
    }
}

fn call(f: &js_sys::Function, name: &str, args: &[JsValue]) {
    let args: js_sys::Array = args.iter().collect();
    if let Err(err) = f.apply(&JsValue::NULL, &args) {
        warn!(callback = name, error = %describe_js_error(&err), "Callback threw");
    }
}

fn json_to_js(value: &Value) -> JsValue {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    serde::Serialize::serialize(value, &serializer).unwrap_or(JsValue::NULL)
}

pub(crate) fn get_field(target: &JsValue, name: &str) -> JsValue {
    js_sys::Reflect::get(target, &JsValue::from_str(name)).unwrap_or(JsValue::UNDEFINED)
}

fn set_field(target: &js_sys::Object, name: &str, value: &JsValue) {
    if let Err(err) = js_sys::Reflect::set(target, &JsValue::from_str(name), value) {
        warn!(field = name, error = %describe_js_error(&err), "Failed to update player ref");
    }
}

fn get_function(props: &JsValue, name: &str) -> Option<js_sys::Function> {
    get_field(props, name).dyn_into::<js_sys::Function>().ok()
}

/// Convert option by option, dropping values JSON cannot carry
fn parse_config(config: &JsValue) -> EngineConfig {
    let mut options = Map::new();
    let Some(object) = config.dyn_ref::<js_sys::Object>() else {
        return EngineConfig::new();
    };
    for entry in js_sys::Object::entries(object).iter() {
        let pair: js_sys::Array = entry.unchecked_into();
        let Some(key) = pair.get(0).as_string() else {
            continue;
        };
        let value = pair.get(1);
        if value.is_function() {
            warn!(option = %key, "Function-valued engine option is not supported, skipping");
            continue;
        }
        match serde_wasm_bindgen::from_value::<Value>(value) {
            Ok(value) => {
                options.insert(key, value);
            }
            Err(err) => warn!(option = %key, error = %err, "Skipping engine option"),
        }
    }
    EngineConfig::from(options)
}

/// Pass-through attributes: strings and numbers verbatim, `true` as a bare
/// attribute. `false`, `null` and `undefined` leave the attribute out, which
/// removes it from the element. Functions are event handlers, see
/// [`crate::listeners`].
fn parse_attributes(attributes: &JsValue) -> Vec<(String, String)> {
    let Some(object) = attributes.dyn_ref::<js_sys::Object>() else {
        return Vec::new();
    };
    js_sys::Object::entries(object)
        .iter()
        .filter_map(|entry| {
            let pair: js_sys::Array = entry.unchecked_into();
            let name = pair.get(0).as_string()?;
            let value = pair.get(1);
            if let Some(s) = value.as_string() {
                Some((name, s))
            } else if let Some(n) = value.as_f64() {
                Some((name, n.to_string()))
            } else if value.as_bool() == Some(true) {
                Some((name, String::new()))
            } else {
                None
            }
        })
        .collect()
}
