use foundation::math::Vec3;
use foundation::math::precision::stable_total_cmp_f64;

use crate::World;
use crate::entity::EntityId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir * t
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub entity: EntityId,
    pub distance: f64,
    pub point: Vec3,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    pub max_distance: f64,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            max_distance: 1.0e30,
        }
    }
}

/// Deterministic ray picking against entities carrying `PickBounds`.
///
/// Ordering contract:
/// - If multiple entities are hit at the same distance, the lower `EntityId::index()` wins.
/// - Otherwise, the closest hit along the (normalized) ray wins.
///
/// Hidden entities and entities without pick bounds are never hit.
pub fn pick_ray(world: &World, ray: Ray, opts: PickOptions) -> Option<PickHit> {
    let dir = ray.dir.normalize()?;
    let ray = Ray::new(ray.origin, dir);

    let mut best: Option<(f64, EntityId)> = None;
    for (entity, transform, bounds) in world.pickables() {
        let radius = bounds.radius * transform.scale;
        let Some(t) = ray_sphere_hit_t(ray, transform.position, radius, opts.max_distance) else {
            continue;
        };

        best = match best {
            None => Some((t, entity)),
            Some((bt, be)) => {
                let ord = stable_total_cmp_f64(t, bt).then_with(|| entity.index().cmp(&be.index()));
                if ord.is_lt() {
                    Some((t, entity))
                } else {
                    Some((bt, be))
                }
            }
        };
    }

    let (t, entity) = best?;
    Some(PickHit {
        entity,
        distance: t,
        point: ray.at(t),
    })
}

/// Screen picking wrapper.
///
/// The caller supplies the screen->ray mapping via `make_ray`; returning
/// `None` (e.g. for a zero-size viewport) yields no hit.
pub fn pick_screen<F>(
    world: &World,
    x_px: f64,
    y_px: f64,
    mut make_ray: F,
    opts: PickOptions,
) -> Option<PickHit>
where
    F: FnMut(f64, f64) -> Option<Ray>,
{
    let ray = make_ray(x_px, y_px)?;
    pick_ray(world, ray, opts)
}

/// Entry distance of a normalized ray into a sphere; `0` when starting inside.
fn ray_sphere_hit_t(ray: Ray, center: Vec3, radius: f64, t_max: f64) -> Option<f64> {
    if radius <= 0.0 {
        return None;
    }
    let oc = ray.origin - center;
    let b = oc.dot(ray.dir);
    let c = oc.dot(oc) - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    if t < 0.0 || t > t_max {
        return None;
    }
    Some(t)
}

#[cfg(test)]
mod tests {
    use super::{PickOptions, Ray, pick_ray, pick_screen};
    use crate::World;
    use crate::components::{PickBounds, Transform, Visibility};
    use foundation::math::Vec3;

    fn spawn_pickable(world: &mut World, pos: Vec3, radius: f64) -> crate::entity::EntityId {
        let e = world.spawn();
        world.set_transform(e, Transform::translate(pos));
        world.set_pick_bounds(e, PickBounds::new(radius));
        e
    }

    #[test]
    fn closest_hit_wins() {
        let mut world = World::new();
        let far = spawn_pickable(&mut world, Vec3::new(0.0, 0.0, -20.0), 1.0);
        let near = spawn_pickable(&mut world, Vec3::new(0.0, 0.0, -10.0), 1.0);

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let hit = pick_ray(&world, ray, PickOptions::default()).expect("hit");
        assert_eq!(hit.entity, near);
        assert!((hit.distance - 9.0).abs() < 1e-9);
        assert_ne!(hit.entity, far);
    }

    #[test]
    fn equal_distance_prefers_lower_index() {
        let mut world = World::new();
        let first = spawn_pickable(&mut world, Vec3::new(0.0, 0.0, -10.0), 1.0);
        let _second = spawn_pickable(&mut world, Vec3::new(0.0, 0.0, -10.0), 1.0);
        let hit = pick_ray(
            &world,
            Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -3.0)),
            PickOptions::default(),
        )
        .expect("hit");
        assert_eq!(hit.entity, first);
    }

    #[test]
    fn misses_and_hidden_entities_are_ignored() {
        let mut world = World::new();
        let e = spawn_pickable(&mut world, Vec3::new(0.0, 0.0, -10.0), 1.0);
        let sideways = Ray::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        assert!(pick_ray(&world, sideways, PickOptions::default()).is_none());

        world.set_visibility(e, Visibility::HIDDEN);
        let straight = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        assert!(pick_ray(&world, straight, PickOptions::default()).is_none());
    }

    #[test]
    fn entities_without_bounds_are_not_pickable() {
        let mut world = World::new();
        let e = world.spawn();
        world.set_transform(e, Transform::translate(Vec3::new(0.0, 0.0, -5.0)));
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        assert!(pick_ray(&world, ray, PickOptions::default()).is_none());
    }

    #[test]
    fn scale_enlarges_hit_sphere() {
        let mut world = World::new();
        let e = spawn_pickable(&mut world, Vec3::new(1.5, 0.0, -10.0), 1.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        assert!(pick_ray(&world, ray, PickOptions::default()).is_none());
        if let Some(t) = world.transform_mut(e) {
            t.scale = 2.0;
        }
        assert!(pick_ray(&world, ray, PickOptions::default()).is_some());
    }

    #[test]
    fn pick_screen_respects_missing_ray() {
        let mut world = World::new();
        spawn_pickable(&mut world, Vec3::new(0.0, 0.0, -10.0), 1.0);
        let hit = pick_screen(&world, 10.0, 10.0, |_, _| None, PickOptions::default());
        assert!(hit.is_none());
    }
}
