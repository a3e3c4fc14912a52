//! Scene construction from a POI list.
//!
//! Each POI becomes a `SceneMarker`: core shape, halo ring, label billboard
//! and an optional hazard dot. Rebuilds diff by POI id so unchanged markers
//! keep their entities and label textures.

use std::collections::{BTreeMap, HashMap};

use foundation::math::{CoordinateMapper, Quat, Vec3};
use scene::World;
use scene::components::{Drawable3D, Material, PickBounds, Transform, Visibility};
use scene::entity::EntityId;
use tracing::{debug, warn};

use crate::config::MapConfig;
use crate::hazard::{HazardZoneVolume, hazard_zone};
use crate::labels::{LabelCanvas, LabelFactory};
use crate::poi::{Category, Poi};
use crate::symbology::{CoreShape, HAZARD_COLOR, category_style, css_color};

/// Halo ring radii relative to the core radius.
const RING_INNER: f64 = 1.45;
const RING_OUTER: f64 = 1.85;
const RING_ALPHA: f32 = 0.55;

const HAZARD_DOT_RADIUS: f64 = 0.35;
const HAZARD_DOT_GAP: f64 = 0.5;

/// Gap between the top of the core and the label center.
const LABEL_LIFT: f64 = 1.4;

const ZONE_VOLUME_ALPHA: f32 = 0.08;
const ZONE_WIRE_ALPHA: f32 = 0.35;

#[derive(Debug, Clone, PartialEq)]
pub struct SceneMarker {
    pub poi_id: String,
    pub category: Category,
    /// Authored visibility; filtering can only hide further.
    pub authored_visible: bool,
    pub position: Vec3,
    pub core: EntityId,
    pub ring: EntityId,
    pub label: Option<EntityId>,
    pub hazard_dot: Option<EntityId>,
    pub core_radius: f64,
    pub base_emissive: f32,
}

impl SceneMarker {
    pub fn parts(&self) -> impl Iterator<Item = EntityId> + '_ {
        [Some(self.core), Some(self.ring), self.label, self.hazard_dot]
            .into_iter()
            .flatten()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HazardZoneEntities {
    pub zone: HazardZoneVolume,
    pub volume: EntityId,
    pub wireframe: EntityId,
}

/// Per-map registry of built markers, keyed by POI id.
#[derive(Debug, Default)]
pub struct MarkerRegistry {
    markers: BTreeMap<String, SceneMarker>,
    by_core: HashMap<EntityId, String>,
    hazard: Option<HazardZoneEntities>,
    mapper: CoordinateMapper,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn get(&self, poi_id: &str) -> Option<&SceneMarker> {
        self.markers.get(poi_id)
    }

    pub fn markers(&self) -> impl Iterator<Item = &SceneMarker> {
        self.markers.values()
    }

    /// POI id owning the given core entity.
    pub fn poi_for_core(&self, core: EntityId) -> Option<&str> {
        self.by_core.get(&core).map(String::as_str)
    }

    pub fn hazard(&self) -> Option<&HazardZoneEntities> {
        self.hazard.as_ref()
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    /// Despawn every marker and the hazard zone, releasing label textures.
    pub fn clear<C: LabelCanvas>(&mut self, world: &mut World, labels: &mut LabelFactory<C>) {
        for (id, marker) in std::mem::take(&mut self.markers) {
            for e in marker.parts() {
                world.despawn(e);
            }
            labels.release(&id);
        }
        self.by_core.clear();
        if let Some(h) = self.hazard.take() {
            world.despawn(h.volume);
            world.despawn(h.wireframe);
        }
    }
}

/// Counts from one `SceneBuilder::rebuild`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub hazard: Option<HazardZoneVolume>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneBuilder {
    target_radius: f64,
    min_range: f64,
    hazard_margin: f64,
    hazard_category: Category,
}

impl SceneBuilder {
    pub fn new(config: &MapConfig) -> Self {
        Self {
            target_radius: config.target_scene_radius,
            min_range: config.min_range,
            hazard_margin: config.hazard_margin,
            hazard_category: config.hazard_category,
        }
    }

    pub fn hazard_category(&self) -> Category {
        self.hazard_category
    }

    /// Bring `registry`/`world` in line with `pois`.
    pub fn rebuild<C: LabelCanvas>(
        &self,
        pois: &[Poi],
        world: &mut World,
        registry: &mut MarkerRegistry,
        labels: &mut LabelFactory<C>,
    ) -> BuildReport {
        let mut report = BuildReport::default();
        registry.mapper = CoordinateMapper::fit(
            pois.iter().map(Poi::position),
            self.target_radius,
            self.min_range,
        );

        let stale: Vec<String> = registry
            .markers
            .keys()
            .filter(|id| !pois.iter().any(|p| &p.id == *id))
            .cloned()
            .collect();
        for id in stale {
            if let Some(marker) = registry.markers.remove(&id) {
                for e in marker.parts() {
                    world.despawn(e);
                }
                registry.by_core.remove(&marker.core);
                labels.release(&id);
                report.removed += 1;
            }
        }

        for poi in pois {
            let position = registry.mapper.to_scene(poi.position());
            match registry.markers.remove(&poi.id) {
                Some(existing) => {
                    let marker = self.update_marker(existing, poi, position, world, labels);
                    registry.markers.insert(poi.id.clone(), marker);
                    report.updated += 1;
                }
                None => {
                    let marker = self.spawn_marker(poi, position, world, labels);
                    registry.by_core.insert(marker.core, poi.id.clone());
                    registry.markers.insert(poi.id.clone(), marker);
                    report.created += 1;
                }
            }
        }

        if let Some(old) = registry.hazard.take() {
            world.despawn(old.volume);
            world.despawn(old.wireframe);
        }
        let members: Vec<Vec3> = registry
            .markers
            .values()
            .filter(|m| m.category == self.hazard_category)
            .map(|m| m.position)
            .collect();
        if let Some(zone) = hazard_zone(&members, self.hazard_margin) {
            registry.hazard = Some(spawn_hazard_zone(world, zone));
            report.hazard = Some(zone);
        }

        debug!(
            created = report.created,
            updated = report.updated,
            removed = report.removed,
            hazard = report.hazard.is_some(),
            "scene rebuilt"
        );
        report
    }

    fn spawn_marker<C: LabelCanvas>(
        &self,
        poi: &Poi,
        position: Vec3,
        world: &mut World,
        labels: &mut LabelFactory<C>,
    ) -> SceneMarker {
        let core = world.spawn();
        let ring = world.spawn();
        let mut marker = SceneMarker {
            poi_id: poi.id.clone(),
            category: poi.category,
            authored_visible: poi.visible,
            position,
            core,
            ring,
            label: None,
            hazard_dot: None,
            core_radius: 0.0,
            base_emissive: 0.0,
        };
        self.apply_poi(&mut marker, poi, position, world, labels);
        marker
    }

    fn update_marker<C: LabelCanvas>(
        &self,
        mut marker: SceneMarker,
        poi: &Poi,
        position: Vec3,
        world: &mut World,
        labels: &mut LabelFactory<C>,
    ) -> SceneMarker {
        self.apply_poi(&mut marker, poi, position, world, labels);
        marker
    }

    /// Write every component of a marker from its POI.
    fn apply_poi<C: LabelCanvas>(
        &self,
        marker: &mut SceneMarker,
        poi: &Poi,
        position: Vec3,
        world: &mut World,
        labels: &mut LabelFactory<C>,
    ) {
        let style = category_style(poi.category);
        marker.category = poi.category;
        marker.authored_visible = poi.visible;
        marker.position = position;
        marker.core_radius = style.core_radius;
        marker.base_emissive = style.emissive;
        let r = style.core_radius;

        world.set_transform(marker.core, Transform::translate(position));
        world.set_drawable(
            marker.core,
            match style.core_shape {
                CoreShape::Octahedron => Drawable3D::octahedron(r),
                CoreShape::Sphere => Drawable3D::sphere(r),
            },
        );
        world.set_material(
            marker.core,
            Material::opaque(style.color).with_emissive(style.emissive),
        );
        world.set_pick_bounds(marker.core, PickBounds::new(r));

        let ring_rotation = world
            .transform(marker.ring)
            .map(|t| t.rotation)
            .unwrap_or(Quat::IDENTITY);
        world.set_transform(
            marker.ring,
            Transform {
                rotation: ring_rotation,
                ..Transform::translate(position)
            },
        );
        world.set_drawable(marker.ring, Drawable3D::ring(r * RING_INNER, r * RING_OUTER));
        world.set_material(marker.ring, Material::translucent(style.color, RING_ALPHA));

        match labels.label(&poi.id, &poi.name, &css_color(style.color)) {
            Ok(baked) => {
                let label = *marker.label.get_or_insert_with(|| world.spawn());
                world.set_transform(
                    label,
                    Transform::translate(position + Vec3::new(0.0, r + LABEL_LIFT, 0.0)),
                );
                world.set_drawable(
                    label,
                    Drawable3D::label(baked.world_width, baked.world_height, baked.texture),
                );
                world.set_material(label, Material::translucent([1.0, 1.0, 1.0], 1.0));
            }
            Err(e) => {
                warn!(poi_id = %poi.id, error = %e, "label bake failed; marker has no label");
                if let Some(label) = marker.label.take() {
                    world.despawn(label);
                }
            }
        }

        match (poi.pvp_lootable, marker.hazard_dot) {
            (true, existing) => {
                let dot = existing.unwrap_or_else(|| world.spawn());
                let offset = Vec3::new(r + HAZARD_DOT_GAP, r + HAZARD_DOT_GAP, 0.0);
                world.set_transform(dot, Transform::translate(position + offset));
                world.set_drawable(dot, Drawable3D::sphere(HAZARD_DOT_RADIUS));
                world.set_material(dot, Material::opaque(HAZARD_COLOR).with_emissive(0.8));
                marker.hazard_dot = Some(dot);
            }
            (false, Some(dot)) => {
                world.despawn(dot);
                marker.hazard_dot = None;
            }
            (false, None) => {}
        }

        let visibility = Visibility::when(poi.visible);
        for e in marker.parts() {
            world.set_visibility(e, visibility);
        }
    }
}

fn spawn_hazard_zone(world: &mut World, zone: HazardZoneVolume) -> HazardZoneEntities {
    let volume = world.spawn();
    world.set_transform(volume, Transform::translate(zone.centroid));
    world.set_drawable(volume, Drawable3D::sphere(zone.radius));
    world.set_material(
        volume,
        Material::translucent(HAZARD_COLOR, ZONE_VOLUME_ALPHA).with_emissive(0.4),
    );

    let wireframe = world.spawn();
    world.set_transform(wireframe, Transform::translate(zone.centroid));
    world.set_drawable(wireframe, Drawable3D::wire_sphere(zone.radius));
    world.set_material(
        wireframe,
        Material::translucent(HAZARD_COLOR, ZONE_WIRE_ALPHA).with_emissive(1.0),
    );

    HazardZoneEntities {
        zone,
        volume,
        wireframe,
    }
}
