//! Offscreen 2D canvas backing the label factory.

use layers::labels::{LabelBitmap, LabelCanvas, LabelError, TextPass};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

pub struct DomLabelCanvas {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl DomLabelCanvas {
    pub fn new() -> Result<Self, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("document missing"))?;
        let canvas = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()?;
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }
}

fn surface_err(e: JsValue) -> LabelError {
    LabelError::Surface(format!("{e:?}"))
}

fn ctx_set_fill_style(ctx: &CanvasRenderingContext2d, value: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("fillStyle"),
        &JsValue::from_str(value),
    );
}

impl LabelCanvas for DomLabelCanvas {
    fn begin(&mut self, width: u32, height: u32, font: &str) -> Result<(), LabelError> {
        // Resizing resets the context state as well as the pixels.
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.ctx.clear_rect(0.0, 0.0, width as f64, height as f64);
        self.ctx.set_font(font);
        self.ctx.set_text_align("center");
        self.ctx.set_text_baseline("middle");
        Ok(())
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, pass: &TextPass) -> Result<(), LabelError> {
        ctx_set_fill_style(&self.ctx, &pass.fill);
        self.ctx.set_shadow_color(&pass.shadow_color);
        self.ctx.set_shadow_blur(pass.shadow_blur_px as f64);
        self.ctx.fill_text(text, x, y).map_err(surface_err)
    }

    fn read_pixels(&mut self) -> Result<LabelBitmap, LabelError> {
        let (w, h) = (self.canvas.width(), self.canvas.height());
        let image = self
            .ctx
            .get_image_data(0.0, 0.0, w as f64, h as f64)
            .map_err(surface_err)?;
        Ok(LabelBitmap {
            width: w,
            height: h,
            rgba: image.data().0,
        })
    }
}
