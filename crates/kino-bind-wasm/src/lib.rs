//! Kino Bind WASM - hls.js lifecycle binding for the browser
//!
//! Exposes [`KinoHlsPlayer`], which a UI component drives from its
//! mount/update/unmount hooks:
//!
//! ```javascript
//! import init, { KinoHlsPlayer } from '@kino/bind-wasm';
//!
//! await init();
//! const player = new KinoHlsPlayer();
//! player.mount(videoElement, {
//!     src: 'https://example.com/master.m3u8',
//!     autoPlay: true,
//!     attributes: { muted: true, onTimeUpdate: (e) => console.log(e.target.currentTime) },
//! });
//! player.update({ src: 'https://example.com/other.m3u8' });
//! player.unmount();
//! ```

use kino_bind_core::{LifecycleBinder, LocalBoxFuture};
use wasm_bindgen::prelude::*;
use web_sys::HtmlVideoElement;

mod hls;
mod listeners;
mod props;
mod surface;

pub use hls::{Hls, HlsJsEngine, HlsJsFactory};
pub use surface::VideoSurface;

use listeners::{parse_listeners, SurfaceListeners};
use props::{get_field, MirrorSlot, PropsCache};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    tracing::info!(version = kino_bind_core::VERSION, "Kino Bind WASM initialized");
}

/// Library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn spawn(future: LocalBoxFuture<'static, ()>) {
    wasm_bindgen_futures::spawn_local(future);
}

/// hls.js player bound to a `<video>` element
#[wasm_bindgen]
pub struct KinoHlsPlayer {
    binder: LifecycleBinder<HlsJsFactory>,
    cache: PropsCache,
    mirror: MirrorSlot,
    listeners: SurfaceListeners,
}

#[wasm_bindgen]
impl KinoHlsPlayer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            binder: LifecycleBinder::new(HlsJsFactory, spawn),
            cache: PropsCache::default(),
            mirror: MirrorSlot::default(),
            listeners: SurfaceListeners::default(),
        }
    }

    /// Bind to a video element
    #[wasm_bindgen]
    pub fn mount(&mut self, video: HtmlVideoElement, props: JsValue) -> Result<(), JsValue> {
        let parsed = self.cache.parse(&props, &self.mirror)?;
        self.listeners
            .apply(&video, parse_listeners(&get_field(&props, "attributes")));
        self.binder.mount(VideoSurface::new(video), parsed);
        self.sync_ref();
        Ok(())
    }

    /// Apply new props; rebinds only when a rebind input changed
    #[wasm_bindgen]
    pub fn update(&mut self, props: JsValue) -> Result<(), JsValue> {
        let parsed = self.cache.parse(&props, &self.mirror)?;
        if let Some(surface) = self.binder.surface() {
            let element = surface.element().clone();
            self.listeners
                .apply(&element, parse_listeners(&get_field(&props, "attributes")));
        }
        self.binder.update(parsed);
        self.sync_ref();
        Ok(())
    }

    /// Destroy the engine and release the element
    #[wasm_bindgen]
    pub fn unmount(&mut self) {
        self.listeners.clear();
        self.binder.unmount();
        self.sync_ref();
    }

    /// The live `Hls` instance, or `null`
    #[wasm_bindgen(getter)]
    pub fn hls(&self) -> JsValue {
        self.binder
            .handle()
            .engine
            .map_or(JsValue::NULL, |engine| JsValue::from(engine.raw().clone()))
    }

    /// The bound video element, if any
    #[wasm_bindgen(getter)]
    pub fn video(&self) -> Option<HtmlVideoElement> {
        self.binder.handle().surface.map(|surface| surface.element().clone())
    }

    /// Lifecycle state, e.g. `bound(engine)`
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        self.binder.state().to_string()
    }

    /// Diagnostics snapshot as JSON
    #[wasm_bindgen]
    pub fn status(&self) -> String {
        self.binder.status().to_json()
    }

    fn sync_ref(&self) {
        if let Some(ref mirror) = *self.mirror.borrow() {
            mirror.sync();
        }
    }
}

impl Default for KinoHlsPlayer {
    fn default() -> Self {
        Self::new()
    }
}
