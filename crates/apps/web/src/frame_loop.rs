//! `requestAnimationFrame` loop with a cancellable handle.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

type RafClosure = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// Owns the rAF closure. The closure is created once and re-registered
/// every frame until `cancel` runs.
pub struct FrameLoop {
    closure: RafClosure,
    handle: Rc<Cell<Option<i32>>>,
    running: Rc<Cell<bool>>,
}

impl FrameLoop {
    /// Start calling `on_frame(timestamp_ms)` once per display frame.
    pub fn start(mut on_frame: impl FnMut(f64) + 'static) -> Result<Self, JsValue> {
        let closure: RafClosure = Rc::new(RefCell::new(None));
        let handle = Rc::new(Cell::new(None));
        let running = Rc::new(Cell::new(true));

        let next = closure.clone();
        let next_handle = handle.clone();
        let still_running = running.clone();
        *closure.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
            next_handle.set(None);
            if !still_running.get() {
                return;
            }
            on_frame(timestamp);
            if still_running.get() {
                next_handle.set(schedule(&next).ok());
            }
        }) as Box<dyn FnMut(f64)>));

        handle.set(Some(schedule(&closure)?));
        Ok(Self {
            closure,
            handle,
            running,
        })
    }

    /// Cancel the pending frame and free the closure. No callback fires
    /// after this returns.
    pub fn cancel(&mut self) {
        self.running.set(false);
        if let Some(id) = self.handle.take()
            && let Some(window) = web_sys::window()
        {
            let _ = window.cancel_animation_frame(id);
        }
        self.closure.borrow_mut().take();
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn schedule(closure: &RafClosure) -> Result<i32, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("window missing"))?;
    let slot = closure.borrow();
    let callback = slot
        .as_ref()
        .ok_or_else(|| JsValue::from_str("frame loop already cancelled"))?;
    window.request_animation_frame(callback.as_ref().unchecked_ref())
}
