/// How a material composes with what is already drawn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Blend {
    #[default]
    Opaque,
    /// Alpha-blended, no depth write.
    Translucent,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    /// Linear RGB plus base alpha.
    pub color: [f32; 4],
    /// Multiplier on `color[3]`; animated per frame.
    pub opacity: f32,
    /// Self-illumination strength in `[0, 1]`.
    pub emissive: f32,
    pub blend: Blend,
}

impl Material {
    pub fn opaque(color: [f32; 3]) -> Self {
        Self {
            color: [color[0], color[1], color[2], 1.0],
            opacity: 1.0,
            emissive: 0.0,
            blend: Blend::Opaque,
        }
    }

    pub fn translucent(color: [f32; 3], alpha: f32) -> Self {
        Self {
            color: [color[0], color[1], color[2], alpha],
            opacity: 1.0,
            emissive: 0.0,
            blend: Blend::Translucent,
        }
    }

    pub fn with_emissive(mut self, emissive: f32) -> Self {
        self.emissive = emissive;
        self
    }

    /// Final RGBA after applying `opacity`.
    pub fn rgba(&self) -> [f32; 4] {
        [
            self.color[0],
            self.color[1],
            self.color[2],
            (self.color[3] * self.opacity).clamp(0.0, 1.0),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::{Blend, Material};

    #[test]
    fn opacity_scales_alpha() {
        let mut m = Material::translucent([1.0, 0.0, 0.0], 0.5);
        m.opacity = 0.5;
        assert_eq!(m.rgba()[3], 0.25);
        assert_eq!(m.blend, Blend::Translucent);
        assert_eq!(Material::opaque([0.0, 1.0, 0.0]).rgba()[3], 1.0);
    }
}
