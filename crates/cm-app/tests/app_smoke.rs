//! Smoke test for the cm-app service layer.

use std::path::PathBuf;

use cm_app::{
    RunOptions, list_circuits, list_zones, load_config, load_states, simulate, validate_config,
};
use cm_core::HvacMode;
use cm_project::RegulatorType;

fn demo(file: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.pop(); // go to crates
    path.pop(); // go to repo root
    path.push("demos");
    path.push(file);
    path
}

#[test]
fn demo_config_loads_and_lists() {
    let config = load_config(&demo("house.yaml")).expect("Failed to load config");
    validate_config(&config).expect("Validation should succeed");

    let zones = list_zones(&config);
    assert_eq!(zones.len(), 3);
    assert_eq!(zones[0].id, "living_room");
    assert_eq!(zones[0].regulator_type, RegulatorType::Pid);
    assert_eq!(zones[0].circuits, vec!["ground_floor".to_string()]);
    assert_eq!(zones[2].regulator_type, RegulatorType::Hysteresis);

    let circuits = list_circuits(&config);
    assert_eq!(circuits.len(), 2);
    assert!(circuits.iter().all(|c| c.missing_zones.is_empty()));
}

#[test]
fn demo_run_reports_heating_state() {
    let config = load_config(&demo("house.yaml")).unwrap();
    let states = load_states(&demo("states.yaml")).unwrap();

    let report = simulate(
        &config,
        &states,
        &RunOptions {
            ticks: Some(30),
            ..RunOptions::default()
        },
    )
    .unwrap();

    assert_eq!(report.ticks, 30);
    assert!(!report.control_fault);
    assert!(!report.boiler_fault);

    let living = &report.zones[0];
    assert!(living.output > 0.0);
    assert!(living.trv_open);
    assert_eq!(living.hvac_mode, HvacMode::Heat);

    let bedroom = &report.zones[1];
    assert!(bedroom.output <= 0.0);
    assert!(!bedroom.trv_open);

    let ground = &report.circuits[0];
    assert!(ground.active);
    assert_eq!(ground.current_temperature, Some(19.2));
    assert_eq!(ground.target_temperature, Some(22.0));

    let first = &report.circuits[1];
    assert!(!first.active);
}

#[test]
fn snapshots_carry_over_between_runs() {
    let config = load_config(&demo("house.yaml")).unwrap();
    let states = load_states(&demo("states.yaml")).unwrap();
    let snapshot_path = std::env::temp_dir().join("cm_app_snapshot_carry_over.json");
    let _ = std::fs::remove_file(&snapshot_path);

    let first = simulate(
        &config,
        &states,
        &RunOptions {
            ticks: Some(2),
            restore: Some(snapshot_path.clone()),
            save: Some(snapshot_path.clone()),
            ..RunOptions::default()
        },
    )
    .unwrap();
    assert_eq!(first.restored_zones, 0);

    let second = simulate(
        &config,
        &states,
        &RunOptions {
            ticks: Some(2),
            restore: Some(snapshot_path.clone()),
            ..RunOptions::default()
        },
    )
    .unwrap();
    assert_eq!(second.restored_zones, 3);
}
