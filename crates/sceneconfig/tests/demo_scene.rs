use std::path::Path;
use std::time::Duration;

use sceneconfig::{FragmentConfig, GeometryConfig, Rgb, SceneConfig, VertexKind};

fn demo_path() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../../scenes/demo.toml"))
}

#[test]
fn shipped_demo_matches_builtin_scene() {
    let demo = SceneConfig::load(demo_path()).expect("load demo scene");
    let builtin = SceneConfig::builtin();

    assert_eq!(demo.duration, Some(Duration::from_millis(2500)));
    assert_eq!(demo.meshes.len(), builtin.meshes.len());
    for (loaded, expected) in demo.meshes.iter().zip(&builtin.meshes) {
        assert_eq!(loaded.name, expected.name);
        assert_eq!(loaded.position, expected.position);
        assert_eq!(loaded.vertex_kind(), expected.vertex_kind());
        assert_eq!(loaded.uniforms.color, expected.uniforms.color);
        assert_eq!(loaded.uniforms.u_pow, expected.uniforms.u_pow);
        assert_eq!(loaded.animate.is_some(), expected.animate.is_some());
    }
    assert_eq!(demo.canvas.clear_color, Rgb::from_hex(0x444444));
}

#[test]
fn demo_meshes_pair_programs_with_geometry() {
    let demo = SceneConfig::load(demo_path()).unwrap();

    let wall = demo.mesh("scan-wall").unwrap();
    assert_eq!(wall.vertex_kind(), VertexKind::WorldPosition);
    assert!(matches!(wall.geometry, GeometryConfig::Plane(_)));
    assert!(matches!(wall.fragment, FragmentConfig::BandHighlight(_)));

    let dome = demo.mesh("rim-dome").unwrap();
    assert_eq!(dome.vertex_kind(), VertexKind::ViewNormal);
    match &dome.geometry {
        GeometryConfig::Sphere(sphere) => assert_eq!(sphere.theta_length, 90.0),
        other => panic!("unexpected geometry {other:?}"),
    }
}
