//! Browser shell for the POI map.
//!
//! `mountPoiMap` wires a `MapSession` to a canvas: a wgpu renderer, DOM
//! listeners and a `requestAnimationFrame` loop. Everything lives on the
//! returned `PoiMap`, and `unmount` tears it down.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use foundation::math::Vec2;
use layers::MapSession;
use layers::config::MapConfig;
use layers::copy::Axis;
use runtime::event_bus::MapEvent;
use streaming::FetchTicket;
use tracing::{debug, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::HtmlCanvasElement;

mod clipboard;
mod frame_loop;
mod label_canvas;
mod listeners;
pub mod logging;
mod renderer;
mod shaders;
mod stats_client;

use frame_loop::FrameLoop;
use label_canvas::DomLabelCanvas;
use listeners::Listeners;
use renderer::{FrameGlobals, Renderer};

struct Mount {
    session: MapSession<DomLabelCanvas>,
    canvas: HtmlCanvasElement,
    renderer: Option<Renderer>,
    frame_loop: Option<FrameLoop>,
    listeners: Listeners,
    callbacks: Callbacks,
}

/// Host callbacks, one per map event kind.
#[derive(Default)]
struct Callbacks {
    selection: Option<js_sys::Function>,
    hover: Option<js_sys::Function>,
    filter: Option<js_sys::Function>,
    stats: Option<js_sys::Function>,
}

impl Callbacks {
    fn for_event(&self, event: &MapEvent) -> Option<&js_sys::Function> {
        match event {
            MapEvent::SelectionChanged { .. } => self.selection.as_ref(),
            MapEvent::HoverChanged { .. } => self.hover.as_ref(),
            MapEvent::FilterChanged { .. } => self.filter.as_ref(),
            MapEvent::StatsChanged => self.stats.as_ref(),
        }
    }
}

impl Mount {
    fn frame(&mut self, timestamp_ms: f64) {
        let Some(list) = self.session.frame(timestamp_ms) else {
            return;
        };
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        // Releases first: a freed texture id may be reused by a new upload.
        for id in self.session.take_label_releases() {
            renderer.release_label(id);
        }
        for (id, bitmap) in self.session.take_label_uploads() {
            renderer.upload_label(id, &bitmap);
        }
        let Some(view_proj) = self.session.view_proj() else {
            return;
        };
        let camera = self.session.camera();
        let globals = FrameGlobals {
            view_proj,
            camera_right: camera.right().to_f32(),
            camera_up: camera.up().to_f32(),
        };
        if let Err(e) = renderer.render(&list, globals) {
            debug!(error = %e, "frame skipped");
        }
    }

    fn sync_size(&mut self) {
        let css_w = self.canvas.client_width().max(0) as f64;
        let css_h = self.canvas.client_height().max(0) as f64;
        let dpr = web_sys::window()
            .map(|w| w.device_pixel_ratio())
            .unwrap_or(1.0);
        let px_w = (css_w * dpr).round() as u32;
        let px_h = (css_h * dpr).round() as u32;
        if px_w > 0 && px_h > 0 {
            self.canvas.set_width(px_w);
            self.canvas.set_height(px_h);
        }
        if let Some(r) = self.renderer.as_mut() {
            r.resize(px_w, px_h);
        }
        self.session.resize(css_w, css_h);
    }

    fn apply_cursor(&self) {
        let _ = self
            .canvas
            .style()
            .set_property("cursor", self.session.cursor().css());
    }
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn pointer_pos(ev: &web_sys::Event) -> Vec2 {
    let ev = ev.unchecked_ref::<web_sys::MouseEvent>();
    Vec2::new(ev.offset_x() as f64, ev.offset_y() as f64)
}

fn stats_value(session: &MapSession<DomLabelCanvas>) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(&session.stats_view()).map_err(js_err)?;
    js_sys::JSON::parse(&json)
}

/// Deliver queued map events to the registered host callbacks.
///
/// Arguments are built while the mount is borrowed; the callbacks run
/// after the borrow ends so they may call back into the map.
fn notify(mount: &Rc<RefCell<Mount>>) {
    let calls: Vec<(js_sys::Function, &'static str, JsValue)> = {
        let mut m = mount.borrow_mut();
        let events = m.session.drain_events();
        let mut calls = Vec::new();
        for e in events {
            let Some(callback) = m.callbacks.for_event(&e.event).cloned() else {
                continue;
            };
            let kind = e.event.kind();
            let arg = match e.event {
                MapEvent::SelectionChanged { id } | MapEvent::HoverChanged { id } => {
                    id.map(JsValue::from).unwrap_or(JsValue::NULL)
                }
                MapEvent::FilterChanged { active } => active
                    .into_iter()
                    .map(JsValue::from)
                    .collect::<js_sys::Array>()
                    .into(),
                MapEvent::StatsChanged => stats_value(&m.session).unwrap_or(JsValue::NULL),
            };
            calls.push((callback, kind, arg));
        }
        calls
    };
    for (callback, kind, arg) in calls {
        if let Err(e) = callback.call1(&JsValue::NULL, &arg) {
            warn!(kind, error = ?e, "map callback threw");
        }
    }
}

/// Send a stats request; the answer is handed back only if the map is
/// still mounted, and dropped by the overlay if it went stale meanwhile.
fn dispatch_fetch(weak: Weak<RefCell<Mount>>, ticket: FetchTicket) {
    let Some(endpoint) = weak
        .upgrade()
        .map(|m| m.borrow().session.stats_endpoint().to_string())
    else {
        return;
    };
    spawn_local(async move {
        let outcome = stats_client::fetch_stats(&endpoint, &ticket.request).await;
        let Some(mount) = weak.upgrade() else {
            return;
        };
        let applied = mount
            .borrow_mut()
            .session
            .stats_resolve(ticket.generation, outcome);
        if applied {
            notify(&mount);
        }
    });
}

fn attach_listeners(mount: &Rc<RefCell<Mount>>) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("window missing"))?;
    let canvas: web_sys::EventTarget = mount.borrow().canvas.clone().into();
    let window_target: web_sys::EventTarget = window.into();
    let mut listeners = Listeners::new();

    let weak = Rc::downgrade(mount);
    listeners.add(&canvas, "pointerdown", move |ev| {
        if let Some(m) = weak.upgrade() {
            let mut m = m.borrow_mut();
            m.session.pointer_down(pointer_pos(&ev));
            m.apply_cursor();
        }
    })?;

    let weak = Rc::downgrade(mount);
    listeners.add(&canvas, "pointermove", move |ev| {
        if let Some(mount) = weak.upgrade() {
            {
                let mut m = mount.borrow_mut();
                m.session.pointer_move(pointer_pos(&ev));
                m.apply_cursor();
            }
            notify(&mount);
        }
    })?;

    let weak = Rc::downgrade(mount);
    listeners.add(&canvas, "pointerup", move |ev| {
        let Some(mount) = weak.upgrade() else {
            return;
        };
        let ticket = {
            let mut m = mount.borrow_mut();
            let ticket = m.session.pointer_up(pointer_pos(&ev));
            m.apply_cursor();
            ticket
        };
        if let Some(ticket) = ticket {
            dispatch_fetch(weak.clone(), ticket);
        }
        notify(&mount);
    })?;

    let weak = Rc::downgrade(mount);
    listeners.add(&canvas, "pointerleave", move |_| {
        if let Some(mount) = weak.upgrade() {
            {
                let mut m = mount.borrow_mut();
                m.session.pointer_leave();
                m.apply_cursor();
            }
            notify(&mount);
        }
    })?;

    let weak = Rc::downgrade(mount);
    listeners.add(&canvas, "wheel", move |ev| {
        ev.prevent_default();
        let delta = ev.unchecked_ref::<web_sys::WheelEvent>().delta_y();
        if let Some(m) = weak.upgrade() {
            m.borrow_mut().session.wheel(delta);
        }
    })?;

    let weak = Rc::downgrade(mount);
    listeners.add(&window_target, "keydown", move |ev| {
        let key = ev.unchecked_ref::<web_sys::KeyboardEvent>().key();
        if key != "Escape" {
            return;
        }
        if let Some(mount) = weak.upgrade() {
            mount.borrow_mut().session.escape();
            notify(&mount);
        }
    })?;

    let weak = Rc::downgrade(mount);
    listeners.add(&window_target, "resize", move |_| {
        if let Some(m) = weak.upgrade() {
            m.borrow_mut().sync_size();
        }
    })?;

    mount.borrow_mut().listeners = listeners;
    Ok(())
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Mount a map on the canvas with id `canvas_id`. `config_json` may be empty.
#[wasm_bindgen(js_name = mountPoiMap)]
pub async fn mount_poi_map(canvas_id: String, config_json: String) -> Result<PoiMap, JsValue> {
    let config = MapConfig::from_json(&config_json).map_err(js_err)?;
    logging::init(&config.log_level);

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("document missing"))?;
    let canvas = document
        .get_element_by_id(&canvas_id)
        .ok_or_else(|| JsValue::from_str("canvas missing"))?
        .dyn_into::<HtmlCanvasElement>()?;

    let renderer = Renderer::new(canvas.clone()).await.map_err(js_err)?;
    let session = MapSession::new(config, DomLabelCanvas::new()?);

    let mount = Rc::new(RefCell::new(Mount {
        session,
        canvas,
        renderer: Some(renderer),
        frame_loop: None,
        listeners: Listeners::new(),
        callbacks: Callbacks::default(),
    }));
    mount.borrow_mut().sync_size();
    mount.borrow().apply_cursor();
    attach_listeners(&mount)?;

    let weak = Rc::downgrade(&mount);
    let frame_loop = FrameLoop::start(move |timestamp| {
        if let Some(mount) = weak.upgrade() {
            mount.borrow_mut().frame(timestamp);
            notify(&mount);
        }
    })?;
    mount.borrow_mut().frame_loop = Some(frame_loop);

    info!(canvas = %canvas_id, "poi map mounted");
    Ok(PoiMap { mount })
}

#[wasm_bindgen]
pub struct PoiMap {
    mount: Rc<RefCell<Mount>>,
}

#[wasm_bindgen]
impl PoiMap {
    /// Replace the POI list from JSON. Returns how many POIs were accepted.
    #[wasm_bindgen(js_name = setPois)]
    pub fn set_pois(&self, json: &str) -> Result<u32, JsValue> {
        let set = self
            .mount
            .borrow_mut()
            .session
            .load_json(json)
            .map_err(js_err)?;
        notify(&self.mount);
        Ok(set.pois.len() as u32)
    }

    #[wasm_bindgen(js_name = toggleCategory)]
    pub fn toggle_category(&self, key: &str) {
        self.mount.borrow_mut().session.toggle_category(key);
        notify(&self.mount);
    }

    #[wasm_bindgen(js_name = clearFilter)]
    pub fn clear_filter(&self) {
        self.mount.borrow_mut().session.clear_filter();
        notify(&self.mount);
    }

    #[wasm_bindgen(js_name = activeCategories)]
    pub fn active_categories(&self) -> js_sys::Array {
        self.mount
            .borrow()
            .session
            .active_categories()
            .into_iter()
            .map(JsValue::from)
            .collect()
    }

    #[wasm_bindgen(js_name = resetView)]
    pub fn reset_view(&self) {
        self.mount.borrow_mut().session.reset_view();
    }

    /// `callback(id | null)` runs after every selection change.
    #[wasm_bindgen(js_name = onSelectionChange)]
    pub fn on_selection_change(&self, callback: js_sys::Function) {
        self.mount.borrow_mut().callbacks.selection = Some(callback);
    }

    /// `callback(id | null)` runs when the pointer enters or leaves a marker.
    #[wasm_bindgen(js_name = onHoverChange)]
    pub fn on_hover_change(&self, callback: js_sys::Function) {
        self.mount.borrow_mut().callbacks.hover = Some(callback);
    }

    /// `callback(activeKeys)` runs after every filter toggle or clear.
    #[wasm_bindgen(js_name = onFilterChange)]
    pub fn on_filter_change(&self, callback: js_sys::Function) {
        self.mount.borrow_mut().callbacks.filter = Some(callback);
    }

    /// `callback(statsView)` runs whenever the overlay changes state,
    /// including when a stats answer arrives after the click.
    #[wasm_bindgen(js_name = onStatsChange)]
    pub fn on_stats_change(&self, callback: js_sys::Function) {
        self.mount.borrow_mut().callbacks.stats = Some(callback);
    }

    /// The selected POI as a plain object, or `null`.
    #[wasm_bindgen(js_name = selectedPoi)]
    pub fn selected_poi(&self) -> Result<JsValue, JsValue> {
        let m = self.mount.borrow();
        let Some(poi) = m.session.selected_poi() else {
            return Ok(JsValue::NULL);
        };
        let json = serde_json::to_string(poi).map_err(js_err)?;
        js_sys::JSON::parse(&json)
    }

    /// Copy one coordinate of the selection. Resolves to `true` on success.
    #[wasm_bindgen(js_name = copyCoordinate)]
    pub fn copy_coordinate(&self, axis: &str) -> js_sys::Promise {
        let text = Axis::parse(axis).and_then(|a| self.mount.borrow().session.coordinate_text(a));
        copy_promise(text)
    }

    /// Copy the `/wp [...]` waypoint of the selection.
    #[wasm_bindgen(js_name = copyWaypoint)]
    pub fn copy_waypoint(&self) -> js_sys::Promise {
        let text = self.mount.borrow().session.waypoint_text();
        copy_promise(text)
    }

    #[wasm_bindgen(js_name = statsView)]
    pub fn stats_view(&self) -> Result<JsValue, JsValue> {
        stats_value(&self.mount.borrow().session)
    }

    /// Re-read the canvas size. Also runs on window `resize`.
    pub fn resize(&self) {
        self.mount.borrow_mut().sync_size();
    }

    /// Stop the frame loop, remove listeners, free GPU resources and
    /// release the render surface, in that order.
    pub fn unmount(&self) {
        let mut m = self.mount.borrow_mut();
        if !m.session.is_mounted() {
            return;
        }
        if let Some(mut frame_loop) = m.frame_loop.take() {
            frame_loop.cancel();
        }
        m.listeners.remove_all();
        m.callbacks = Callbacks::default();
        m.session.unmount();
        if let Some(mut renderer) = m.renderer.take() {
            for id in m.session.take_label_releases() {
                renderer.release_label(id);
            }
            m.session.take_label_uploads();
            renderer.dispose();
        }
        let _ = m.canvas.style().remove_property("cursor");
        info!("poi map unmounted");
    }
}

fn copy_promise(text: Option<String>) -> js_sys::Promise {
    future_to_promise(async move {
        let ok = match text {
            Some(text) => clipboard::write_text(&text).await,
            None => false,
        };
        Ok(JsValue::from_bool(ok))
    })
}
