use glam::Vec2;
use winit::dpi::PhysicalSize;

use strata::camera3d::OrbitCamera;
use strata::element::ElementCollection;
use strata::picking::hit_test;
use strata::scene::{SceneBuilder, SceneLayout, VolumeColor};

const FOV: f32 = 75.0 * std::f32::consts::PI / 180.0;

#[test]
fn stack_orders_largest_area_first() {
    let collection = ElementCollection::from_json(
        r#"[
            {"bounds":"[0,0][10,5]","resource_id":"mid"},
            {"bounds":"[0,0][20,10]","resource_id":"big"},
            {"bounds":"[0,0][5,2]","resource_id":"small"}
        ]"#,
    )
    .expect("parse");

    let mut builder = SceneBuilder::default();
    let build = builder.build(&collection, None, &SceneLayout::default(), FOV);

    let order: Vec<&str> = build
        .volumes
        .iter()
        .map(|volume| volume.key.resource_id.as_deref().expect("id"))
        .collect();
    assert_eq!(order, vec!["big", "mid", "small"]);
    assert_eq!(build.volumes[0].depth_index, 0);
    assert_eq!(build.volumes[2].depth_index, 2);
    // Smaller boxes sit further along +z.
    assert!(build.volumes[2].center().z > build.volumes[0].center().z);
}

#[test]
fn only_unparseable_bounds_are_excluded() {
    let collection = ElementCollection::from_json(
        r#"[
            {"bounds":"[0,0][10,10]","resource_id":"keep"},
            {"bounds":"not bounds","resource_id":"garbled"},
            {"bounds":"[5,5][5,9]","resource_id":"zero_width"},
            {"text":"no bounds at all"}
        ]"#,
    )
    .expect("parse");

    let mut builder = SceneBuilder::default();
    let build = builder.build(&collection, None, &SceneLayout::default(), FOV);
    // Degenerate rectangles stay renderable; only missing or garbled bounds drop out.
    assert_eq!(build.volumes.len(), 2);
    assert_eq!(build.volumes[0].key.resource_id.as_deref(), Some("keep"));
    assert_eq!(build.volumes[1].key.resource_id.as_deref(), Some("zero_width"));
}

#[test]
fn highlight_outranks_labeled_and_clickable() {
    let collection = ElementCollection::from_json(
        r#"[
            {"bounds":"[0,0][100,100]","resource_id":"annotated","information":"menu","is_clickable":true},
            {"bounds":"[0,0][50,50]","resource_id":"tappable","is_clickable":true},
            {"bounds":"[0,0][25,25]","resource_id":"plain"}
        ]"#,
    )
    .expect("parse");
    let highlight = collection.elements()[0].key();

    let mut builder = SceneBuilder::default();
    let build = builder.build(&collection, Some(&highlight), &SceneLayout::default(), FOV);

    assert_eq!(build.volumes[0].color, VolumeColor::Highlighted);
    assert_eq!(build.volumes[1].color, VolumeColor::Clickable);
    assert_eq!(build.volumes[2].color, VolumeColor::Default);

    let replay = builder.build(&collection, None, &SceneLayout::default(), FOV);
    assert_eq!(replay.volumes[0].color, VolumeColor::Labeled);
    assert!(replay.generation > build.generation);
}

#[test]
fn nested_button_is_picked_in_front_of_its_panel() {
    let collection = ElementCollection::from_json(
        r#"[
            {"bounds":"[0,0][1080,2400]","class_name":"android.widget.FrameLayout"},
            {"bounds":"[480,1150][600,1250]","text":"OK","resource_id":"btn_ok","is_clickable":true}
        ]"#,
    )
    .expect("parse");

    let mut builder = SceneBuilder::default();
    let build = builder.build(&collection, None, &SceneLayout::default(), FOV);
    assert_eq!(build.volumes.len(), 2);

    // Frame the stack the way the viewer does, then pick through the
    // viewport center, where the button overlaps the full-screen panel.
    let mut orbit = OrbitCamera::new(glam::Vec3::ZERO, 1.0);
    orbit.apply_framing(&build.framing);
    let camera = orbit.to_camera(FOV, 0.1, 50_000.0);

    let viewport = PhysicalSize::new(1080, 2400);
    let (origin, dir) = camera
        .screen_ray(Vec2::new(540.0, 1200.0), viewport)
        .expect("ray");

    let hit = hit_test(&build, origin, dir).expect("hit");
    assert_eq!(build.volumes[hit].key.resource_id.as_deref(), Some("btn_ok"));

    // Off to the side only the panel remains under the cursor.
    let (origin, dir) = camera
        .screen_ray(Vec2::new(120.0, 300.0), viewport)
        .expect("ray");
    let hit = hit_test(&build, origin, dir).expect("hit");
    assert_eq!(
        build.volumes[hit].key.bounds.as_deref(),
        Some("[0,0][1080,2400]")
    );
}
