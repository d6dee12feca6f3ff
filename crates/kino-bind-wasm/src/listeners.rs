//! Pass-through DOM event handlers
//!
//! Function-valued `on*` entries of the `attributes` prop (`onPlay`,
//! `onTimeUpdate`, ...) are registered on the `<video>` element as event
//! listeners. Each update diffs against the previous registration so an
//! unchanged handler is never re-added and a dropped one is removed.

use crate::surface::describe_js_error;
use tracing::warn;
use wasm_bindgen::prelude::*;
use web_sys::HtmlVideoElement;

/// `onTimeUpdate` → `timeupdate`
pub(crate) fn dom_event_name(prop: &str) -> Option<String> {
    let event = prop.strip_prefix("on")?;
    if event.is_empty() {
        return None;
    }
    Some(event.to_ascii_lowercase())
}

/// Split `current` against `next`: entries to remove, entries to add
fn diff<T: PartialEq + Clone>(current: &[(String, T)], next: &[(String, T)]) -> (Vec<(String, T)>, Vec<(String, T)>) {
    let removed = current.iter().filter(|entry| !next.contains(entry)).cloned().collect();
    let added = next.iter().filter(|entry| !current.contains(entry)).cloned().collect();
    (removed, added)
}

/// Read the handler entries of a JS `attributes` object
pub(crate) fn parse_listeners(attributes: &JsValue) -> Vec<(String, js_sys::Function)> {
    let Some(object) = attributes.dyn_ref::<js_sys::Object>() else {
        return Vec::new();
    };
    let mut listeners = Vec::new();
    for entry in js_sys::Object::entries(object).iter() {
        let pair: js_sys::Array = entry.unchecked_into();
        let Some(prop) = pair.get(0).as_string() else {
            continue;
        };
        let Ok(handler) = pair.get(1).dyn_into::<js_sys::Function>() else {
            continue;
        };
        match dom_event_name(&prop) {
            Some(event) => listeners.push((event, handler)),
            None => warn!(attribute = %prop, "Function-valued attribute is not an event handler, skipping"),
        }
    }
    listeners
}

/// Handlers currently registered on one element
#[derive(Default)]
pub struct SurfaceListeners {
    element: Option<HtmlVideoElement>,
    registered: Vec<(String, js_sys::Function)>,
}

impl SurfaceListeners {
    /// Make `next` the registered set on `element`
    pub fn apply(&mut self, element: &HtmlVideoElement, next: Vec<(String, js_sys::Function)>) {
        if self.element.as_ref().is_some_and(|current| current != element) {
            self.clear();
        }
        self.element = Some(element.clone());

        let (removed, added) = diff(&self.registered, &next);
        for (event, handler) in &removed {
            if let Err(err) = element.remove_event_listener_with_callback(event, handler) {
                warn!(event = %event, error = %describe_js_error(&err), "Failed to remove event handler");
            }
        }
        for (event, handler) in &added {
            if let Err(err) = element.add_event_listener_with_callback(event, handler) {
                warn!(event = %event, error = %describe_js_error(&err), "Failed to add event handler");
            }
        }
        self.registered = next;
    }

    /// Remove every registered handler and forget the element
    pub fn clear(&mut self) {
        let Some(element) = self.element.take() else {
            return;
        };
        for (event, handler) in self.registered.drain(..) {
            if let Err(err) = element.remove_event_listener_with_callback(&event, &handler) {
                warn!(event = %event, error = %describe_js_error(&err), "Failed to remove event handler");
            }
        }
    }
}

impl Drop for SurfaceListeners {
    fn drop(&mut self) {
        self.clear();
    }
}
