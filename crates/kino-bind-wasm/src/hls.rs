//! hls.js engine bindings
//!
//! Binds the global `Hls` class and adapts it to the core engine traits.

use crate::surface::{describe_js_error, VideoSurface};
use kino_bind_core::{
    EngineConfig, EngineError, EngineEvent, EngineEventKind, EngineFactory, Error, ErrorCategory,
    EventHandler, Result, StreamingEngine,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::cell::RefCell;
use tracing::debug;
use wasm_bindgen::prelude::*;
use web_sys::HtmlMediaElement;

#[wasm_bindgen]
extern "C" {
    /// The hls.js player class
    #[wasm_bindgen(js_name = Hls)]
    #[derive(Clone, Debug)]
    pub type Hls;

    #[wasm_bindgen(static_method_of = Hls, js_name = isSupported)]
    fn is_supported() -> bool;

    #[wasm_bindgen(constructor, catch)]
    fn new(config: &JsValue) -> std::result::Result<Hls, JsValue>;

    #[wasm_bindgen(method, js_name = attachMedia)]
    fn attach_media(this: &Hls, media: &HtmlMediaElement);

    #[wasm_bindgen(method, js_name = loadSource)]
    fn load_source(this: &Hls, url: &str);

    #[wasm_bindgen(method)]
    fn on(this: &Hls, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_name = startLoad)]
    fn start_load(this: &Hls);

    #[wasm_bindgen(method, js_name = recoverMediaError)]
    fn recover_media_error(this: &Hls);

    #[wasm_bindgen(method)]
    fn destroy(this: &Hls);
}

type Listener = Closure<dyn Fn(JsValue, JsValue)>;

/// A live hls.js instance
pub struct HlsJsEngine {
    hls: Hls,
    /// Keeps the registered listeners alive until the engine is dropped
    listeners: RefCell<Vec<Listener>>,
}

impl HlsJsEngine {
    /// The underlying `Hls` object
    pub fn raw(&self) -> &Hls {
        &self.hls
    }
}

impl StreamingEngine for HlsJsEngine {
    type Surface = VideoSurface;

    fn attach_media(&self, surface: &VideoSurface) {
        self.hls.attach_media(surface.element());
    }

    fn load_source(&self, url: &str) {
        self.hls.load_source(url);
    }

    fn on(&self, kind: EngineEventKind, handler: EventHandler) {
        let listener = Closure::<dyn Fn(JsValue, JsValue)>::new(move |_event: JsValue, data: JsValue| {
            handler(to_engine_event(kind, &data));
        });
        self.hls.on(kind.event_name(), listener.as_ref().unchecked_ref());
        self.listeners.borrow_mut().push(listener);
    }

    fn start_load(&self) {
        self.hls.start_load();
    }

    fn recover_media_error(&self) {
        self.hls.recover_media_error();
    }

    fn destroy(&self) {
        self.hls.destroy();
    }
}

/// Builds hls.js instances when the global `Hls` class is present
#[derive(Default)]
pub struct HlsJsFactory;

impl EngineFactory for HlsJsFactory {
    type Engine = HlsJsEngine;

    fn is_supported(&self) -> bool {
        let loaded = js_sys::Reflect::has(&js_sys::global(), &JsValue::from_str("Hls")).unwrap_or(false);
        loaded && Hls::is_supported()
    }

    fn construct(&self, config: &EngineConfig) -> Result<HlsJsEngine> {
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let js_config = config
            .serialize(&serializer)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        let hls = Hls::new(&js_config).map_err(|e| Error::EngineConstruct(describe_js_error(&e)))?;
        Ok(HlsJsEngine {
            hls,
            listeners: RefCell::new(Vec::new()),
        })
    }
}

/// Convert a JS value to JSON, falling back to `null` for non-serializable data
pub(crate) fn js_to_json(value: &JsValue) -> Value {
    if value.is_undefined() || value.is_null() {
        return Value::Null;
    }
    serde_wasm_bindgen::from_value(value.clone()).unwrap_or_else(|err| {
        debug!(error = %err, "Event payload is not JSON-compatible");
        Value::Null
    })
}

fn get_field(data: &JsValue, name: &str) -> JsValue {
    js_sys::Reflect::get(data, &JsValue::from_str(name)).unwrap_or(JsValue::UNDEFINED)
}

fn to_engine_event(kind: EngineEventKind, data: &JsValue) -> EngineEvent {
    match kind {
        EngineEventKind::MediaAttached => EngineEvent::MediaAttached,
        EngineEventKind::ManifestParsed => EngineEvent::ManifestParsed(js_to_json(data)),
        EngineEventKind::LevelSwitched => {
            let level = get_field(data, "level").as_f64().unwrap_or(0.0).max(0.0) as usize;
            EngineEvent::LevelSwitched { level }
        }
        EngineEventKind::Error => {
            let fatal = get_field(data, "fatal").as_bool().unwrap_or(false);
            let error_type = get_field(data, "type").as_string().unwrap_or_default();
            let details = get_field(data, "details").as_string().unwrap_or_default();
            let payload = match js_to_json(data) {
                Value::Null => json!({ "type": error_type, "details": details, "fatal": fatal }),
                payload => payload,
            };
            EngineEvent::Error(
                EngineError::new(fatal, ErrorCategory::from_type(&error_type), details)
                    .with_payload(payload),
            )
        }
    }
}
