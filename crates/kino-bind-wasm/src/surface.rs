//! `<video>` element as the playback surface

use futures::future::{self, FutureExt};
use kino_bind_core::{Error, LocalBoxFuture, PlaybackSurface, Result};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlVideoElement;

/// Playback surface backed by a host-owned `<video>` element
#[derive(Clone, Debug)]
pub struct VideoSurface(HtmlVideoElement);

impl VideoSurface {
    pub fn new(element: HtmlVideoElement) -> Self {
        Self(element)
    }

    pub fn element(&self) -> &HtmlVideoElement {
        &self.0
    }
}

impl PlaybackSurface for VideoSurface {
    fn can_play_type(&self, mime_type: &str) -> bool {
        !self.0.can_play_type(mime_type).is_empty()
    }

    fn set_src(&self, url: &str) {
        self.0.set_src(url);
    }

    fn play(&self) -> LocalBoxFuture<'static, Result<()>> {
        match self.0.play() {
            Ok(promise) => JsFuture::from(promise)
                .map(|result| {
                    result
                        .map(|_| ())
                        .map_err(|e| Error::AutoplayRejected(describe_js_error(&e)))
                })
                .boxed_local(),
            Err(e) => future::err(Error::AutoplayRejected(describe_js_error(&e))).boxed_local(),
        }
    }

    fn set_controls(&self, enabled: bool) {
        self.0.set_controls(enabled);
    }

    fn set_attribute(&self, name: &str, value: &str) -> Result<()> {
        self.0
            .set_attribute(name, value)
            .map_err(|e| Error::Surface(describe_js_error(&e)))
    }

    fn remove_attribute(&self, name: &str) -> Result<()> {
        self.0
            .remove_attribute(name)
            .map_err(|e| Error::Surface(describe_js_error(&e)))
    }
}

/// Render a thrown JS value for logs
pub(crate) fn describe_js_error(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return format!("{}: {}", String::from(err.name()), String::from(err.message()));
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
