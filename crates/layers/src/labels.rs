//! Baked POI name labels.
//!
//! Each label is drawn once into an offscreen RGBA bitmap with two passes at
//! the same position: a blurred glow pass, then a crisp pass on top. The
//! bitmap is queued for upload and referenced by a `LabelTextureId` until the
//! POI disappears or is renamed.

use std::collections::HashMap;

use scene::components::LabelTextureId;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub font_size_px: f32,
    pub font_family: String,
    /// CSS color of the crisp pass.
    pub color: String,
    /// CSS color of the glow pass.
    pub glow_color: String,
    pub glow_blur_px: f32,
    /// Longer names are cut and suffixed with an ellipsis.
    pub max_chars: usize,
    /// Label height in scene units; width follows the bitmap aspect.
    pub world_height: f64,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_size_px: 56.0,
            font_family: "\"Orbitron\", \"Segoe UI\", sans-serif".to_string(),
            color: "#e8fbff".to_string(),
            glow_color: "#3fd8ff".to_string(),
            glow_blur_px: 18.0,
            max_chars: 28,
            world_height: 1.6,
        }
    }
}

/// One text draw: fill color plus optional shadow used as glow.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPass {
    pub fill: String,
    pub shadow_color: String,
    pub shadow_blur_px: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelBitmap {
    pub width: u32,
    pub height: u32,
    /// Tightly packed, non-premultiplied RGBA8.
    pub rgba: Vec<u8>,
}

#[derive(Debug, Error, PartialEq)]
pub enum LabelError {
    #[error("label surface unavailable: {0}")]
    Surface(String),
    #[error("label bitmap has {got} bytes, expected {expected}")]
    BadBitmap { got: usize, expected: usize },
}

/// 2D drawing surface a label is rasterized on.
pub trait LabelCanvas {
    /// Resize and clear to transparent.
    fn begin(&mut self, width: u32, height: u32, font: &str) -> Result<(), LabelError>;
    /// Draw centered text at `(x, y)` pixels.
    fn fill_text(&mut self, text: &str, x: f64, y: f64, pass: &TextPass) -> Result<(), LabelError>;
    fn read_pixels(&mut self) -> Result<LabelBitmap, LabelError>;
}

#[derive(Debug, Clone, PartialEq)]
struct LabelEntry {
    texture: LabelTextureId,
    text: String,
    color: String,
}

/// Handle to a baked label.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BakedLabel {
    pub texture: LabelTextureId,
    pub world_width: f64,
    pub world_height: f64,
}

pub struct LabelFactory<C: LabelCanvas> {
    canvas: C,
    style: LabelStyle,
    width_px: u32,
    height_px: u32,
    entries: HashMap<String, LabelEntry>,
    free_textures: Vec<LabelTextureId>,
    next_texture: u32,
    uploads: Vec<(LabelTextureId, LabelBitmap)>,
    releases: Vec<LabelTextureId>,
}

impl<C: LabelCanvas> LabelFactory<C> {
    pub fn new(canvas: C, style: LabelStyle, width_px: u32, height_px: u32) -> Self {
        Self {
            canvas,
            style,
            width_px: width_px.max(1),
            height_px: height_px.max(1),
            entries: HashMap::new(),
            free_textures: Vec::new(),
            next_texture: 0,
            uploads: Vec::new(),
            releases: Vec::new(),
        }
    }

    pub fn style(&self) -> &LabelStyle {
        &self.style
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn baked(&self, texture: LabelTextureId) -> BakedLabel {
        let h = self.style.world_height;
        BakedLabel {
            texture,
            world_width: h * self.width_px as f64 / self.height_px as f64,
            world_height: h,
        }
    }

    /// Label for `poi_id`, rasterizing only if the text or color changed.
    pub fn label(&mut self, poi_id: &str, name: &str, color: &str) -> Result<BakedLabel, LabelError> {
        let text = truncate_label(name, self.style.max_chars);
        if let Some(entry) = self.entries.get(poi_id)
            && entry.text == text
            && entry.color == color
        {
            return Ok(self.baked(entry.texture));
        }

        let bitmap = self.rasterize(&text, color)?;
        let texture = match self.entries.get(poi_id) {
            Some(entry) => entry.texture,
            None => self.allocate_texture(),
        };
        debug!(poi_id, texture = texture.0, "label baked");
        self.entries.insert(
            poi_id.to_string(),
            LabelEntry {
                texture,
                text,
                color: color.to_string(),
            },
        );
        self.uploads.push((texture, bitmap));
        Ok(self.baked(texture))
    }

    pub fn release(&mut self, poi_id: &str) {
        if let Some(entry) = self.entries.remove(poi_id) {
            self.uploads.retain(|(t, _)| *t != entry.texture);
            self.free_textures.push(entry.texture);
            self.releases.push(entry.texture);
        }
    }

    pub fn release_all(&mut self) {
        let ids: Vec<String> = self.entries.keys().cloned().collect();
        for id in ids {
            self.release(&id);
        }
    }

    /// Bitmaps baked since the last call, for GPU upload.
    pub fn take_uploads(&mut self) -> Vec<(LabelTextureId, LabelBitmap)> {
        std::mem::take(&mut self.uploads)
    }

    /// Textures released since the last call.
    pub fn take_releases(&mut self) -> Vec<LabelTextureId> {
        std::mem::take(&mut self.releases)
    }

    fn allocate_texture(&mut self) -> LabelTextureId {
        if let Some(t) = self.free_textures.pop() {
            return t;
        }
        let t = LabelTextureId(self.next_texture);
        self.next_texture += 1;
        t
    }

    fn rasterize(&mut self, text: &str, color: &str) -> Result<LabelBitmap, LabelError> {
        let font = format!("600 {}px {}", self.style.font_size_px, self.style.font_family);
        self.canvas.begin(self.width_px, self.height_px, &font)?;

        let x = self.width_px as f64 * 0.5;
        let y = self.height_px as f64 * 0.5;
        let glow = TextPass {
            fill: color.to_string(),
            shadow_color: self.style.glow_color.clone(),
            shadow_blur_px: self.style.glow_blur_px,
        };
        let crisp = TextPass {
            fill: self.style.color.clone(),
            shadow_color: "transparent".to_string(),
            shadow_blur_px: 0.0,
        };
        self.canvas.fill_text(text, x, y, &glow)?;
        self.canvas.fill_text(text, x, y, &crisp)?;

        let bitmap = self.canvas.read_pixels()?;
        let expected = (self.width_px * self.height_px * 4) as usize;
        if bitmap.rgba.len() != expected {
            return Err(LabelError::BadBitmap {
                got: bitmap.rgba.len(),
                expected,
            });
        }
        Ok(bitmap)
    }
}

pub fn truncate_label(name: &str, max_chars: usize) -> String {
    let trimmed = name.trim();
    if max_chars == 0 || trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('\u{2026}');
    out
}

/// Records draw calls; used where no real 2D surface exists.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    pub size: (u32, u32),
    pub font: String,
    pub passes: Vec<(String, f64, f64, TextPass)>,
    pub begins: usize,
}

impl LabelCanvas for RecordingCanvas {
    fn begin(&mut self, width: u32, height: u32, font: &str) -> Result<(), LabelError> {
        self.size = (width, height);
        self.font = font.to_string();
        self.passes.clear();
        self.begins += 1;
        Ok(())
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, pass: &TextPass) -> Result<(), LabelError> {
        self.passes.push((text.to_string(), x, y, pass.clone()));
        Ok(())
    }

    fn read_pixels(&mut self) -> Result<LabelBitmap, LabelError> {
        let (w, h) = self.size;
        Ok(LabelBitmap {
            width: w,
            height: h,
            rgba: vec![0; (w * h * 4) as usize],
        })
    }
}
