use glam::Vec3;

use crate::bounds::Bounds;
use crate::element::{ElementCollection, ElementKey};

/// Categorical tint resolved per element, highest-priority rule first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeColor {
    Highlighted,
    Labeled,
    Clickable,
    Default,
}

impl VolumeColor {
    pub fn rgb8(self) -> [u8; 3] {
        match self {
            VolumeColor::Highlighted => [0xef, 0x44, 0x44],
            VolumeColor::Labeled => [0x8b, 0x5c, 0xf6],
            VolumeColor::Clickable => [0x10, 0xb9, 0x81],
            VolumeColor::Default => [0xf5, 0x9e, 0x0b],
        }
    }

    pub fn rgb_f32(self) -> [f32; 3] {
        let [r, g, b] = self.rgb8();
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
    }
}

/// One renderable box derived from an element's bounds.
#[derive(Debug, Clone)]
pub struct Volume {
    /// Index back into the source collection.
    pub element_index: usize,
    pub key: ElementKey,
    pub min: Vec3,
    pub max: Vec3,
    pub color: VolumeColor,
    /// Position in the area-sorted stack, 0 = largest = closest to the base.
    pub depth_index: usize,
    pub area: i64,
}

impl Volume {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extent(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }
}

/// Geometry constants mapping dump pixels into world units.
#[derive(Debug, Clone, Copy)]
pub struct SceneLayout {
    pub screen_width: f32,
    pub screen_height: f32,
    pub box_depth: f32,
    pub depth_step: f32,
    pub fit_padding: f32,
}

impl Default for SceneLayout {
    fn default() -> Self {
        Self {
            screen_width: 1080.0,
            screen_height: 2400.0,
            box_depth: 20.0,
            depth_step: 10.0,
            fit_padding: 1.2,
        }
    }
}

/// Camera placement that frames the whole stack.
#[derive(Debug, Clone, Copy)]
pub struct CameraFraming {
    pub center: Vec3,
    pub distance: f32,
}

/// Built scene: render-ordered volumes plus a suggested framing.
#[derive(Debug, Clone)]
pub struct SceneBuild {
    pub volumes: Vec<Volume>,
    pub framing: CameraFraming,
    pub generation: u64,
}

impl SceneBuild {
    pub fn empty() -> Self {
        Self {
            volumes: Vec::new(),
            framing: CameraFraming { center: Vec3::ZERO, distance: 1000.0 },
            generation: 0,
        }
    }
}

/// Turns an element collection into a stack of 3D volumes.
///
/// Every element with parseable bounds becomes a box centered on the screen
/// plane (dump origin top-left mapped so the screen midpoint sits at the
/// world origin, y up). Inverted and zero-size rectangles are kept; their
/// extents are normalized so they stay visible and pickable. Boxes are
/// stacked along +z from largest signed area to smallest so that small
/// controls sit in front of the panels containing them. Each build carries a
/// fresh generation number so stale hover indices from a previous layout can
/// be rejected.
#[derive(Debug, Default)]
pub struct SceneBuilder {
    generation: u64,
}

impl SceneBuilder {
    pub fn build(
        &mut self,
        collection: &ElementCollection,
        highlight: Option<&ElementKey>,
        layout: &SceneLayout,
        fov_y_radians: f32,
    ) -> SceneBuild {
        self.generation += 1;

        let mut sized: Vec<(usize, Bounds, i64)> = collection
            .elements()
            .iter()
            .enumerate()
            .filter_map(|(index, element)| {
                let raw = element.bounds.as_deref()?;
                let bounds = Bounds::parse(raw)?;
                Some((index, bounds, bounds.area()))
            })
            .collect();
        // Stable sort keeps collection order as the tiebreaker for equal areas.
        sized.sort_by(|a, b| b.2.cmp(&a.2));

        let volumes: Vec<Volume> = sized
            .into_iter()
            .enumerate()
            .map(|(depth_index, (element_index, bounds, area))| {
                let element = &collection.elements()[element_index];
                let key = element.key();
                let color = if highlight == Some(&key) {
                    VolumeColor::Highlighted
                } else if element.labeled() {
                    VolumeColor::Labeled
                } else if element.clickable() {
                    VolumeColor::Clickable
                } else {
                    VolumeColor::Default
                };

                let width = bounds.width() as f32;
                let height = bounds.height() as f32;
                let center_x = bounds.left as f32 + width / 2.0 - layout.screen_width / 2.0;
                let center_y = -(bounds.top as f32 + height / 2.0 - layout.screen_height / 2.0);
                let center_z = depth_index as f32 * layout.depth_step;
                // Inverted rectangles keep their midpoint; extents are
                // normalized so the box is still drawable and hittable.
                let half =
                    Vec3::new(width.abs() / 2.0, height.abs() / 2.0, layout.box_depth / 2.0);
                let center = Vec3::new(center_x, center_y, center_z);

                Volume {
                    element_index,
                    key,
                    min: center - half,
                    max: center + half,
                    color,
                    depth_index,
                    area,
                }
            })
            .collect();

        let framing = Self::frame(&volumes, layout, fov_y_radians);
        SceneBuild { volumes, framing, generation: self.generation }
    }

    fn frame(volumes: &[Volume], layout: &SceneLayout, fov_y_radians: f32) -> CameraFraming {
        if volumes.is_empty() {
            return SceneBuild::empty().framing;
        }
        let mut min = volumes[0].min;
        let mut max = volumes[0].max;
        for volume in &volumes[1..] {
            min = min.min(volume.min);
            max = max.max(volume.max);
        }
        let size = max - min;
        let max_dim = size.x.max(size.y).max(size.z).max(1.0);
        let distance = max_dim / 2.0 / (fov_y_radians / 2.0).tan() * layout.fit_padding;
        CameraFraming { center: (min + max) * 0.5, distance }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;

    fn element(bounds: &str) -> Element {
        Element { bounds: Some(bounds.to_string()), ..Element::default() }
    }

    fn build(elements: Vec<Element>) -> SceneBuild {
        let collection = ElementCollection::new(elements);
        SceneBuilder::default().build(
            &collection,
            None,
            &SceneLayout::default(),
            75f32.to_radians(),
        )
    }

    #[test]
    fn volumes_are_stacked_by_descending_area() {
        let scene = build(vec![
            element("[0,0][10,5]"),  // area 50
            element("[0,0][20,10]"), // area 200
            element("[0,0][5,2]"),   // area 10
        ]);
        let areas: Vec<i64> = scene.volumes.iter().map(|v| v.area).collect();
        assert_eq!(areas, vec![200, 50, 10]);
        // Largest sits at the base, each later volume one step further out.
        assert_eq!(scene.volumes[0].element_index, 1);
        assert!((scene.volumes[0].center().z - 0.0).abs() < 1e-5);
        assert!((scene.volumes[1].center().z - 10.0).abs() < 1e-5);
        assert!((scene.volumes[2].center().z - 20.0).abs() < 1e-5);
    }

    #[test]
    fn equal_areas_keep_collection_order() {
        let scene = build(vec![element("[0,0][10,10]"), element("[50,50][60,60]")]);
        assert_eq!(scene.volumes[0].element_index, 0);
        assert_eq!(scene.volumes[1].element_index, 1);
    }

    #[test]
    fn only_unparseable_bounds_are_skipped() {
        let scene = build(vec![
            element("[0,0][10,10]"),
            Element::default(),
            element("garbage"),
            element("[5,5][5,9]"),        // zero width
            element("[100,100][40,120]"), // inverted, negative area
        ]);
        assert_eq!(scene.volumes.len(), 3);
        // Zero and negative areas sort behind positive ones.
        assert_eq!(scene.volumes[0].element_index, 0);
        assert_eq!(scene.volumes[1].element_index, 3);
        assert_eq!(scene.volumes[2].element_index, 4);
    }

    #[test]
    fn zero_area_elements_still_produce_volumes() {
        let scene = build(vec![element("[0,0][0,0]"), element("[0,0][10,10]")]);
        assert_eq!(scene.volumes.len(), 2);
    }

    #[test]
    fn inverted_rectangles_get_normalized_extents() {
        let scene = build(vec![element("[100,100][40,120]")]);
        let volume = &scene.volumes[0];
        assert!(volume.min.x < volume.max.x);
        assert!(volume.min.y < volume.max.y);
        // Midpoint matches the rectangle's own, unaffected by the inversion.
        let layout = SceneLayout::default();
        assert!((volume.center().x - (70.0 - layout.screen_width / 2.0)).abs() < 1e-4);
    }

    #[test]
    fn screen_center_maps_to_world_origin() {
        let scene = build(vec![element("[0,0][1080,2400]")]);
        let center = scene.volumes[0].center();
        assert!(center.x.abs() < 1e-4);
        assert!(center.y.abs() < 1e-4);
    }

    #[test]
    fn dump_y_axis_is_flipped() {
        // A rectangle near the top of the dump lands at positive world y.
        let scene = build(vec![element("[0,0][1080,100]")]);
        assert!(scene.volumes[0].center().y > 0.0);
    }

    #[test]
    fn color_priority_is_highlight_then_label_then_clickable() {
        let mut labeled_clickable = element("[0,0][10,10]");
        labeled_clickable.information = Some("menu".to_string());
        labeled_clickable.is_clickable = Some(true);
        let mut clickable = element("[0,0][20,20]");
        clickable.is_clickable = Some(true);
        let plain = element("[0,0][30,30]");

        let highlight_key = labeled_clickable.key();
        let collection = ElementCollection::new(vec![labeled_clickable.clone(), clickable, plain]);
        let mut builder = SceneBuilder::default();
        let layout = SceneLayout::default();

        let scene = builder.build(&collection, None, &layout, 75f32.to_radians());
        let color_of = |scene: &SceneBuild, index: usize| {
            scene.volumes.iter().find(|v| v.element_index == index).map(|v| v.color)
        };
        assert_eq!(color_of(&scene, 0), Some(VolumeColor::Labeled));
        assert_eq!(color_of(&scene, 1), Some(VolumeColor::Clickable));
        assert_eq!(color_of(&scene, 2), Some(VolumeColor::Default));

        let scene = builder.build(&collection, Some(&highlight_key), &layout, 75f32.to_radians());
        assert_eq!(color_of(&scene, 0), Some(VolumeColor::Highlighted));
    }

    #[test]
    fn generation_advances_on_every_build() {
        let collection = ElementCollection::new(vec![element("[0,0][10,10]")]);
        let mut builder = SceneBuilder::default();
        let layout = SceneLayout::default();
        let first = builder.build(&collection, None, &layout, 1.0);
        let second = builder.build(&collection, None, &layout, 1.0);
        assert!(second.generation > first.generation);
    }

    #[test]
    fn framing_distance_covers_the_largest_dimension() {
        let scene = build(vec![element("[0,0][1080,2400]")]);
        let fov = 75f32.to_radians();
        let expected = 2400.0 / 2.0 / (fov / 2.0).tan() * 1.2;
        assert!((scene.framing.distance - expected).abs() < 1e-2);
    }

    #[test]
    fn empty_collection_builds_an_empty_scene() {
        let scene = build(vec![]);
        assert!(scene.volumes.is_empty());
        assert!(scene.framing.distance > 0.0);
    }
}
