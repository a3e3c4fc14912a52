//! Category filtering over already-built markers.

use std::collections::BTreeSet;

use scene::World;
use scene::components::Visibility;

use crate::builder::MarkerRegistry;
use crate::poi::Category;

/// Active category set. Empty means "no filter": everything is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterController {
    active: BTreeSet<Category>,
}

impl FilterController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_keys(&self) -> Vec<String> {
        self.active.iter().map(|c| c.key().to_string()).collect()
    }

    pub fn shows(&self, category: Category) -> bool {
        self.active.is_empty() || self.active.contains(&category)
    }

    /// Flip one category in or out of the active set.
    pub fn toggle(&mut self, category: Category) {
        if !self.active.remove(&category) {
            self.active.insert(category);
        }
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    /// Write visibility flags for every marker part. No geometry is touched.
    ///
    /// Returns how many markers are visible afterwards.
    pub fn apply(&self, registry: &MarkerRegistry, world: &mut World) -> usize {
        let mut shown = 0;
        for marker in registry.markers() {
            let visible = marker.authored_visible && self.shows(marker.category);
            if visible {
                shown += 1;
            }
            let v = Visibility::when(visible);
            for e in marker.parts() {
                world.set_visibility(e, v);
            }
        }
        shown
    }
}

#[cfg(test)]
mod tests {
    use super::FilterController;
    use crate::builder::{MarkerRegistry, SceneBuilder};
    use crate::config::MapConfig;
    use crate::labels::{LabelFactory, LabelStyle, RecordingCanvas};
    use crate::poi::{Category, Poi};
    use scene::World;

    fn scene() -> (World, MarkerRegistry) {
        let pois = vec![
            Poi::new("s", "S", Category::Station, [0.0, 0.0, 0.0]),
            Poi::new("a", "A", Category::AsteroidBelt, [10.0, 0.0, 0.0]),
            Poi::new("g", "G", Category::GasCloud, [0.0, 10.0, 0.0]),
            Poi::new("a2", "A2", Category::AsteroidBelt, [0.0, 0.0, 10.0]),
        ];
        let mut world = World::new();
        let mut registry = MarkerRegistry::new();
        let mut labels = LabelFactory::new(RecordingCanvas::default(), LabelStyle::default(), 8, 8);
        SceneBuilder::new(&MapConfig::default()).rebuild(&pois, &mut world, &mut registry, &mut labels);
        (world, registry)
    }

    fn visible_ids(world: &World, registry: &MarkerRegistry) -> Vec<String> {
        registry
            .markers()
            .filter(|m| world.is_visible(m.core))
            .map(|m| m.poi_id.clone())
            .collect()
    }

    #[test]
    fn empty_set_shows_all() {
        let (mut world, registry) = scene();
        let f = FilterController::new();
        assert_eq!(f.apply(&registry, &mut world), 4);
    }

    #[test]
    fn active_category_hides_the_rest() {
        let (mut world, registry) = scene();
        let mut f = FilterController::new();
        f.toggle(Category::AsteroidBelt);
        assert_eq!(f.apply(&registry, &mut world), 2);
        assert_eq!(visible_ids(&world, &registry), vec!["a", "a2"]);

        let hidden = registry.get("s").expect("s");
        assert!(hidden.parts().all(|e| !world.is_visible(e)));
    }

    #[test]
    fn toggle_order_does_not_matter() {
        let seq_a = [Category::Station, Category::GasCloud, Category::Station, Category::AsteroidBelt];
        let seq_b = [Category::AsteroidBelt, Category::Station, Category::GasCloud, Category::Station];

        let run = |seq: &[Category]| {
            let (mut world, registry) = scene();
            let mut f = FilterController::new();
            for c in seq {
                f.toggle(*c);
                f.apply(&registry, &mut world);
            }
            visible_ids(&world, &registry)
        };
        assert_eq!(run(&seq_a), run(&seq_b));
        assert_eq!(run(&seq_a), vec!["a", "a2", "g"]);
    }

    #[test]
    fn toggling_twice_restores_no_filter() {
        let (mut world, registry) = scene();
        let mut f = FilterController::new();
        f.toggle(Category::GasCloud);
        f.toggle(Category::GasCloud);
        assert!(f.active_keys().is_empty());
        assert_eq!(f.apply(&registry, &mut world), 4);
    }
}
