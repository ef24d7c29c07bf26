use glam::{Vec2, Vec3};

use crate::scene::SceneBuild;

/// Slab-test ray/AABB intersection. Returns the entry distance and the entry
/// point, with `t = 0` when the ray starts inside the box.
pub fn ray_aabb_intersection(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<(f32, Vec3)> {
    let mut t_min: f32 = 0.0;
    let mut t_max: f32 = f32::INFINITY;
    let origin_arr = origin.to_array();
    let dir_arr = dir.to_array();
    let min_arr = min.to_array();
    let max_arr = max.to_array();
    for i in 0..3 {
        let o = origin_arr[i];
        let d = dir_arr[i];
        let min_axis = min_arr[i];
        let max_axis = max_arr[i];
        if d.abs() < 1e-6 {
            if o < min_axis || o > max_axis {
                return None;
            }
        } else {
            let inv_d = 1.0 / d;
            let mut t1 = (min_axis - o) * inv_d;
            let mut t2 = (max_axis - o) * inv_d;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return None;
            }
        }
    }
    Some((t_min, origin + dir * t_min))
}

/// Index of the volume hit first along the ray, or `None` on a miss.
///
/// All volumes are tested and the smallest entry distance wins, so a small box
/// poking out in front of a large one is picked even when both intersect.
pub fn hit_test(scene: &SceneBuild, origin: Vec3, dir: Vec3) -> Option<usize> {
    let mut best: Option<(f32, usize)> = None;
    for (index, volume) in scene.volumes.iter().enumerate() {
        if let Some((t, _)) = ray_aabb_intersection(origin, dir, volume.min, volume.max) {
            if best.map_or(true, |(best_t, _)| t < best_t) {
                best = Some((t, index));
            }
        }
    }
    best.map(|(_, index)| index)
}

/// Hover transition reported by [`PickEngine::update_hover`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverChange {
    pub cleared: Option<usize>,
    pub hovered: Option<usize>,
}

/// Tracks the cursor and the currently hovered volume across frames.
///
/// Hover updates are suppressed while the user is orbit-dragging so the
/// highlight does not flicker through boxes sweeping under the cursor.
#[derive(Debug, Default)]
pub struct PickEngine {
    cursor: Option<Vec2>,
    hovered: Option<usize>,
    dragging: bool,
}

impl PickEngine {
    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    pub fn set_cursor(&mut self, position: Option<Vec2>) {
        self.cursor = position;
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    /// Drops hover state without reporting a transition. Called when the
    /// scene is rebuilt and old indices no longer mean anything.
    pub fn clear_hover(&mut self) {
        self.hovered = None;
    }

    /// Re-resolves hover against the scene, returning the transition if the
    /// hovered volume changed.
    pub fn update_hover(
        &mut self,
        scene: &SceneBuild,
        ray: Option<(Vec3, Vec3)>,
    ) -> Option<HoverChange> {
        if self.dragging {
            return None;
        }
        let next = ray.and_then(|(origin, dir)| hit_test(scene, origin, dir));
        if next == self.hovered {
            return None;
        }
        let change = HoverChange { cleared: self.hovered, hovered: next };
        self.hovered = next;
        Some(change)
    }

    /// One-shot pick for a click at the current cursor ray.
    pub fn pick(&self, scene: &SceneBuild, origin: Vec3, dir: Vec3) -> Option<usize> {
        hit_test(scene, origin, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{CameraFraming, Volume, VolumeColor};
    use crate::element::Element;

    fn volume(index: usize, min: Vec3, max: Vec3) -> Volume {
        Volume {
            element_index: index,
            key: Element::default().key(),
            min,
            max,
            color: VolumeColor::Default,
            depth_index: index,
            area: 1,
        }
    }

    fn scene(volumes: Vec<Volume>) -> SceneBuild {
        SceneBuild {
            volumes,
            framing: CameraFraming { center: Vec3::ZERO, distance: 100.0 },
            generation: 1,
        }
    }

    #[test]
    fn ray_through_center_hits() {
        let (t, point) = ray_aabb_intersection(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::splat(-1.0),
            Vec3::splat(1.0),
        )
        .expect("hit");
        assert!((t - 9.0).abs() < 1e-5);
        assert!((point.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn ray_starting_inside_reports_zero_distance() {
        let (t, _) = ray_aabb_intersection(
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::splat(-1.0),
            Vec3::splat(1.0),
        )
        .expect("hit");
        assert_eq!(t, 0.0);
    }

    #[test]
    fn parallel_ray_outside_slab_misses() {
        let miss = ray_aabb_intersection(
            Vec3::new(0.0, 5.0, 10.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::splat(-1.0),
            Vec3::splat(1.0),
        );
        assert!(miss.is_none());
    }

    #[test]
    fn nearest_volume_wins_when_both_intersect() {
        // A small box in front of a big one, both on the ray.
        let scene = scene(vec![
            volume(0, Vec3::new(-50.0, -50.0, -5.0), Vec3::new(50.0, 50.0, 5.0)),
            volume(1, Vec3::new(-2.0, -2.0, 15.0), Vec3::new(2.0, 2.0, 25.0)),
        ]);
        let hit = hit_test(&scene, Vec3::new(0.0, 0.0, 100.0), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(hit, Some(1));
    }

    #[test]
    fn hover_transitions_are_reported_once() {
        let scene = scene(vec![volume(0, Vec3::splat(-1.0), Vec3::splat(1.0))]);
        let mut engine = PickEngine::default();
        let ray = Some((Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0)));

        let change = engine.update_hover(&scene, ray).expect("transition");
        assert_eq!(change, HoverChange { cleared: None, hovered: Some(0) });
        assert_eq!(engine.update_hover(&scene, ray), None);

        let change = engine.update_hover(&scene, None).expect("transition");
        assert_eq!(change, HoverChange { cleared: Some(0), hovered: None });
    }

    #[test]
    fn hover_is_frozen_while_dragging() {
        let scene = scene(vec![volume(0, Vec3::splat(-1.0), Vec3::splat(1.0))]);
        let mut engine = PickEngine::default();
        engine.set_dragging(true);
        let ray = Some((Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0)));
        assert_eq!(engine.update_hover(&scene, ray), None);
        assert_eq!(engine.hovered(), None);

        engine.set_dragging(false);
        assert!(engine.update_hover(&scene, ray).is_some());
    }

    #[test]
    fn clear_hover_resets_without_a_transition() {
        let scene = scene(vec![volume(0, Vec3::splat(-1.0), Vec3::splat(1.0))]);
        let mut engine = PickEngine::default();
        let ray = Some((Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0)));
        engine.update_hover(&scene, ray);
        engine.clear_hover();
        assert_eq!(engine.hovered(), None);
        // The next update re-reports the hover as a fresh transition.
        assert!(engine.update_hover(&scene, ray).is_some());
    }
}
