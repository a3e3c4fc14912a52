use crate::components::{Drawable3D, Material, PickBounds, Transform, Visibility};
use crate::entity::EntityId;
use foundation::handles::Handle;

/// Per-map entity registry.
///
/// Components are stored column-wise, one `Vec<Option<_>>` per component,
/// indexed by `EntityId::index()`. Despawned slots are recycled with a bumped
/// generation, so a stale `EntityId` never reads a new occupant.
#[derive(Debug, Default)]
pub struct World {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free: Vec<u32>,
    transforms: Vec<Option<Transform>>,
    visibility: Vec<Option<Visibility>>,
    drawables: Vec<Option<Drawable3D>>,
    materials: Vec<Option<Material>>,
    pick_bounds: Vec<Option<PickBounds>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self) -> EntityId {
        if let Some(idx) = self.free.pop() {
            let i = idx as usize;
            self.alive[i] = true;
            return EntityId(Handle::new(idx, self.generations[i]));
        }
        let idx = self.generations.len() as u32;
        self.ensure_capacity(idx as usize);
        self.alive[idx as usize] = true;
        EntityId(Handle::new(idx, 0))
    }

    /// Remove an entity and all its components.
    ///
    /// Returns `false` if the id was already stale.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let i = entity.index() as usize;
        self.alive[i] = false;
        self.generations[i] = self.generations[i].wrapping_add(1);
        self.transforms[i] = None;
        self.visibility[i] = None;
        self.drawables[i] = None;
        self.materials[i] = None;
        self.pick_bounds[i] = None;
        self.free.push(entity.index());
        true
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        let i = entity.index() as usize;
        self.alive.get(i).copied().unwrap_or(false)
            && self.generations[i] == entity.generation()
    }

    pub fn len(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entity; slot storage is released too.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn set_transform(&mut self, entity: EntityId, transform: Transform) {
        if let Some(slot) = self.slot(entity) {
            self.transforms[slot] = Some(transform);
        }
    }

    pub fn set_visibility(&mut self, entity: EntityId, visibility: Visibility) {
        if let Some(slot) = self.slot(entity) {
            self.visibility[slot] = Some(visibility);
        }
    }

    pub fn set_drawable(&mut self, entity: EntityId, drawable: Drawable3D) {
        if let Some(slot) = self.slot(entity) {
            self.drawables[slot] = Some(drawable);
        }
    }

    pub fn set_material(&mut self, entity: EntityId, material: Material) {
        if let Some(slot) = self.slot(entity) {
            self.materials[slot] = Some(material);
        }
    }

    pub fn set_pick_bounds(&mut self, entity: EntityId, bounds: PickBounds) {
        if let Some(slot) = self.slot(entity) {
            self.pick_bounds[slot] = Some(bounds);
        }
    }

    pub fn transform(&self, entity: EntityId) -> Option<Transform> {
        self.slot(entity).and_then(|i| self.transforms[i])
    }

    pub fn transform_mut(&mut self, entity: EntityId) -> Option<&mut Transform> {
        let i = self.slot(entity)?;
        self.transforms[i].as_mut()
    }

    pub fn material(&self, entity: EntityId) -> Option<Material> {
        self.slot(entity).and_then(|i| self.materials[i])
    }

    pub fn material_mut(&mut self, entity: EntityId) -> Option<&mut Material> {
        let i = self.slot(entity)?;
        self.materials[i].as_mut()
    }

    pub fn drawable(&self, entity: EntityId) -> Option<Drawable3D> {
        self.slot(entity).and_then(|i| self.drawables[i])
    }

    pub fn pick_bounds(&self, entity: EntityId) -> Option<PickBounds> {
        self.slot(entity).and_then(|i| self.pick_bounds[i])
    }

    /// Entities without a `Visibility` component count as visible.
    pub fn is_visible(&self, entity: EntityId) -> bool {
        self.slot(entity)
            .map(|i| self.visible_at(i))
            .unwrap_or(false)
    }

    /// Visible entities with a transform and pick bounds, in index order.
    pub fn pickables(&self) -> Vec<(EntityId, Transform, PickBounds)> {
        let mut out = Vec::new();
        for (idx, bounds) in self.pick_bounds.iter().enumerate() {
            let Some(bounds) = bounds else { continue };
            let Some(transform) = self.transforms[idx] else {
                continue;
            };
            if !self.visible_at(idx) {
                continue;
            }
            out.push((self.id_at(idx), transform, *bounds));
        }
        out
    }

    /// Visible entities with a transform, drawable and material, in index order.
    pub fn drawables(&self) -> Vec<(EntityId, Transform, Drawable3D, Material)> {
        let mut out = Vec::new();
        for (idx, drawable) in self.drawables.iter().enumerate() {
            let Some(drawable) = drawable else { continue };
            let (Some(transform), Some(material)) = (self.transforms[idx], self.materials[idx])
            else {
                continue;
            };
            if !self.visible_at(idx) {
                continue;
            }
            out.push((self.id_at(idx), transform, *drawable, material));
        }
        out
    }

    fn visible_at(&self, idx: usize) -> bool {
        self.visibility
            .get(idx)
            .and_then(|v| *v)
            .map(|v| v.visible)
            .unwrap_or(true)
    }

    fn id_at(&self, idx: usize) -> EntityId {
        EntityId(Handle::new(idx as u32, self.generations[idx]))
    }

    fn slot(&self, entity: EntityId) -> Option<usize> {
        self.is_alive(entity).then_some(entity.index() as usize)
    }

    fn ensure_capacity(&mut self, idx: usize) {
        let needed = idx + 1;
        if self.generations.len() < needed {
            self.generations.resize(needed, 0);
            self.alive.resize(needed, false);
            self.transforms.resize(needed, None);
            self.visibility.resize(needed, None);
            self.drawables.resize(needed, None);
            self.materials.resize(needed, None);
            self.pick_bounds.resize(needed, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::World;
    use crate::components::{Drawable3D, Material, PickBounds, Transform, Visibility};
    use foundation::math::Vec3;

    fn marker(world: &mut World, x: f64) -> crate::entity::EntityId {
        let e = world.spawn();
        world.set_transform(e, Transform::translate(Vec3::new(x, 0.0, 0.0)));
        world.set_drawable(e, Drawable3D::sphere(1.0));
        world.set_material(e, Material::opaque([1.0, 1.0, 1.0]));
        world.set_pick_bounds(e, PickBounds::new(1.0));
        e
    }

    #[test]
    fn hidden_entities_are_not_drawn_or_pickable() {
        let mut world = World::new();
        let a = marker(&mut world, 0.0);
        let b = marker(&mut world, 5.0);
        world.set_visibility(b, Visibility::HIDDEN);

        let drawn: Vec<_> = world.drawables().into_iter().map(|d| d.0).collect();
        assert_eq!(drawn, vec![a]);
        assert_eq!(world.pickables().len(), 1);
        assert!(!world.is_visible(b));
    }

    #[test]
    fn despawn_recycles_slot_with_new_generation() {
        let mut world = World::new();
        let a = marker(&mut world, 0.0);
        assert!(world.despawn(a));
        assert!(!world.despawn(a));
        assert!(world.transform(a).is_none());

        let b = world.spawn();
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert!(!world.is_alive(a));
        assert!(world.is_alive(b));

        // Writes through a stale id are ignored.
        world.set_transform(a, Transform::identity());
        assert!(world.transform(b).is_none());
    }

    #[test]
    fn clear_drops_everything() {
        let mut world = World::new();
        marker(&mut world, 0.0);
        marker(&mut world, 1.0);
        assert_eq!(world.len(), 2);
        world.clear();
        assert!(world.is_empty());
        assert!(world.drawables().is_empty());
    }
}
