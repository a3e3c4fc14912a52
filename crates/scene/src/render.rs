//! Flattening of visible `World` entities into GPU-ready instance lists.

use foundation::math::precision::stable_total_cmp_f64;
use foundation::math::{Mat4, Vec3, mat4_from_trs};

use crate::World;
use crate::components::{Blend, LabelTextureId, MeshKind, Shape3D};
use crate::entity::EntityId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawInstance {
    pub entity: EntityId,
    pub kind: MeshKind,
    pub model: Mat4,
    pub color: [f32; 4],
    /// `[emissive, shape_a, shape_b, 0]`: ring inner ratio in `shape_a`,
    /// label width/height in `shape_a`/`shape_b`.
    pub params: [f32; 4],
    pub texture: Option<LabelTextureId>,
}

/// One frame's worth of draw instances, split by pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    pub opaque: Vec<DrawInstance>,
    /// Sorted back-to-front from the eye.
    pub translucent: Vec<DrawInstance>,
    pub lines: Vec<DrawInstance>,
    /// Sorted back-to-front from the eye.
    pub labels: Vec<DrawInstance>,
}

impl DrawList {
    pub fn len(&self) -> usize {
        self.opaque.len() + self.translucent.len() + self.lines.len() + self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn extract_draw_list(world: &World, eye: Vec3) -> DrawList {
    let mut list = DrawList::default();
    let mut translucent: Vec<(f64, DrawInstance)> = Vec::new();
    let mut labels: Vec<(f64, DrawInstance)> = Vec::new();

    for (entity, transform, drawable, material) in world.drawables() {
        let shape = drawable.shape;
        let mut params = [material.emissive, 0.0, 0.0, 0.0];
        let mut texture = None;
        let model_scale = match shape {
            Shape3D::Label {
                width,
                height,
                texture: tex,
            } => {
                params[1] = (width * transform.scale) as f32;
                params[2] = (height * transform.scale) as f32;
                texture = Some(tex);
                1.0
            }
            Shape3D::Ring { inner, outer } => {
                params[1] = if outer > 0.0 { (inner / outer) as f32 } else { 0.0 };
                transform.scale * shape.extent()
            }
            _ => transform.scale * shape.extent(),
        };

        let instance = DrawInstance {
            entity,
            kind: shape.kind(),
            model: mat4_from_trs(transform.position, transform.rotation, model_scale),
            color: material.rgba(),
            params,
            texture,
        };
        let depth = transform.position.distance(eye);

        match (shape.kind(), material.blend) {
            (MeshKind::Label, _) => labels.push((depth, instance)),
            (MeshKind::WireSphere, _) => list.lines.push(instance),
            (_, Blend::Translucent) => translucent.push((depth, instance)),
            (_, Blend::Opaque) => list.opaque.push(instance),
        }
    }

    list.translucent = back_to_front(translucent);
    list.labels = back_to_front(labels);
    list
}

fn back_to_front(mut items: Vec<(f64, DrawInstance)>) -> Vec<DrawInstance> {
    items.sort_by(|a, b| {
        stable_total_cmp_f64(b.0, a.0).then_with(|| a.1.entity.index().cmp(&b.1.entity.index()))
    });
    items.into_iter().map(|(_, i)| i).collect()
}
