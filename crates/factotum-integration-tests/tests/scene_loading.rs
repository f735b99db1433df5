//! Scene files driving full simulations, across every supported format.

use std::fs;
use std::path::{Path, PathBuf};

use factotum_core::id::MineralId;
use factotum_core::object::BuildingKind;
use factotum_core::test_utils::run_ticks;
use factotum_data::{DataLoadError, load_engine, load_scene_dir};
use glam::Vec3;

fn make_test_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "factotum_scene_test_{suffix}_{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn cleanup(dir: &Path) {
    let _ = fs::remove_dir_all(dir);
}

const CHAIN_RON: &str = r#"(
    minerals: [
        (position: (0.0, 0.0, 0.0)),
        (position: (40.0, 0.0, 0.0)),
    ],
    buildings: [
        (kind: Extractor, position: (0.0, 0.0, 0.0)),
        (kind: Transporter, position: (-10.0, 0.0, 6.0)),
        (kind: Transporter, position: (-10.0, 0.0, 8.0)),
        (kind: Processor, position: (-10.0, 0.0, 10.0)),
    ],
)"#;

const CHAIN_JSON: &str = r#"{
    "minerals": [{ "position": [0.0, 0.0, 0.0] }],
    "simulation": { "spawn_interval": 2.0 },
    "buildings": [
        { "kind": "Extractor", "position": [0.0, 0.0, 0.0] },
        { "kind": "Transporter", "position": [-10.0, 0.0, 6.0] },
        { "kind": "Transporter", "position": [-10.0, 0.0, 8.0] },
        { "kind": "Processor", "position": [-10.0, 0.0, 10.0] }
    ]
}"#;

fn processor_ore(engine: &factotum_core::engine::Engine) -> usize {
    engine
        .objects()
        .processors()
        .filter_map(|p| p.as_processor())
        .map(|p| p.ore_arrivals.len())
        .sum()
}

#[test]
fn ron_scene_runs_a_mining_chain() {
    let dir = make_test_dir("ron_chain");
    fs::write(dir.join("scene.ron"), CHAIN_RON).unwrap();

    let scene = load_scene_dir(&dir).unwrap();
    let mut engine = factotum_data::build_engine(&scene).unwrap();
    assert_eq!(engine.objects().len(), 4);
    assert!(engine.minerals().get(MineralId(0)).unwrap().is_being_mined);
    assert!(!engine.minerals().get(MineralId(1)).unwrap().is_being_mined);

    run_ticks(&mut engine, 120, 0.25);
    assert!(processor_ore(&engine) >= 3);

    cleanup(&dir);
}

#[test]
fn shorter_interval_from_scene_speeds_up_delivery() {
    let dir = make_test_dir("json_chain");
    let ron_path = dir.join("slow.ron");
    let json_path = dir.join("fast.json");
    fs::write(&ron_path, CHAIN_RON).unwrap();
    fs::write(&json_path, CHAIN_JSON).unwrap();

    let mut slow = load_engine(&ron_path).unwrap();
    let mut fast = load_engine(&json_path).unwrap();
    assert_eq!(fast.config().spawn_interval, 2.0);

    run_ticks(&mut slow, 160, 0.25);
    run_ticks(&mut fast, 160, 0.25);
    assert!(processor_ore(&fast) > processor_ore(&slow));

    cleanup(&dir);
}

#[test]
fn toml_scene_with_rotated_belt() {
    let dir = make_test_dir("toml_rotated");
    let path = dir.join("scene.toml");
    fs::write(
        &path,
        r#"
        [[buildings]]
        kind = "Transporter"
        position = [4.0, 0.0, 4.0]
        rotation_degrees = 90.0
        "#,
    )
    .unwrap();

    let engine = load_engine(&path).unwrap();
    let belt = engine.objects().transporters().next().unwrap();
    assert_eq!(belt.kind(), BuildingKind::Transporter);
    assert_eq!(engine.geometry().belt_direction(belt.rotation), Vec3::X);

    cleanup(&dir);
}

#[test]
fn overlapping_scene_buildings_are_refused() {
    let dir = make_test_dir("overlap");
    let path = dir.join("scene.ron");
    fs::write(
        &path,
        r#"(
            buildings: [
                (kind: Processor, position: (10.0, 0.0, 10.0)),
                (kind: Transporter, position: (8.0, 0.0, 10.0)),
            ],
        )"#,
    )
    .unwrap();

    match load_engine(&path) {
        Err(DataLoadError::Placement { index, kind, .. }) => {
            assert_eq!(index, 1);
            assert_eq!(kind, BuildingKind::Transporter);
        }
        other => panic!("expected placement error, got {:?}", other.map(|_| ())),
    }

    cleanup(&dir);
}
