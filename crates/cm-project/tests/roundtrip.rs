use std::collections::BTreeMap;

use cm_core::{EntityRef, HvacMode};
use cm_project::schema::*;
use cm_project::snapshot::*;
use cm_project::{
    ProjectError, ValidationError, config_from_yaml_str, load_snapshots, load_yaml,
    save_snapshots, save_yaml, validate_config, validate_zone_snapshot,
};

fn zone(name: &str, regulator_type: RegulatorType) -> ZoneConfig {
    ZoneConfig {
        id: None,
        name: name.to_string(),
        regulator_type,
        temperature_sensor: EntityRef::new(format!(
            "sensor.{}_temperature",
            cm_core::slugify(name)
        )),
        window_sensors: vec![],
        trvs: vec![],
        sensor_grace_s: 5.0,
        window_warmup_s: 300.0,
        pid: PidConfig::default(),
    }
}

fn house() -> HubConfig {
    let mut living = zone("Living Room", RegulatorType::Pid);
    living.window_sensors = vec![EntityRef::from("binary_sensor.living_window")];
    living.trvs = vec![EntityRef::from("climate.living_trv")];

    HubConfig {
        version: LATEST_VERSION,
        name: "House".to_string(),
        boiler_status_sensor: Some(EntityRef::from("binary_sensor.boiler_online")),
        tick_interval_s: 1.0,
        boiler_grace_s: 20.0,
        zones: vec![living, zone("Bathroom", RegulatorType::Hysteresis)],
        circuits: vec![CircuitConfig {
            id: None,
            name: "Ground Floor".to_string(),
            zones: vec!["living_room".to_string(), "bathroom".to_string()],
            switches: vec![EntityRef::from("switch.ground_floor_pump")],
        }],
    }
}

#[test]
fn roundtrip_yaml_house() {
    let config = house();
    validate_config(&config).unwrap();

    let path = std::env::temp_dir().join("cm_project_roundtrip_house.yaml");
    save_yaml(&path, &config).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(config, loaded);
}

#[test]
fn roundtrip_snapshots_json() {
    let mut presets = BTreeMap::new();
    presets.insert(
        "sleep".to_string(),
        PresetSnapshot {
            temperature: Some(18.5),
            mode: Some(HvacMode::Heat),
            kp: Some(0.3),
            ki: None,
        },
    );

    let mut set = SnapshotSet::now();
    set.zones.insert(
        "living_room".to_string(),
        ZoneSnapshot {
            climate: ClimateSnapshot {
                hvac_mode: Some(HvacMode::Heat),
                target_temperature: Some(21.0),
                preset_mode: Some("sleep".to_string()),
                presets,
            },
            pid: Some(PidSnapshot { kp: 0.3, ki: 0.001 }),
        },
    );

    let path = std::env::temp_dir().join("cm_project_roundtrip_snapshots.json");
    save_snapshots(&path, &set).unwrap();
    let loaded = load_snapshots(&path).unwrap();

    assert_eq!(set, loaded);
    validate_zone_snapshot(loaded.zone("living_room").unwrap()).unwrap();
}

#[test]
fn duplicate_zone_ids_are_rejected() {
    let mut config = house();
    config.zones.push(zone("Living room", RegulatorType::Hysteresis));

    assert_eq!(
        validate_config(&config),
        Err(ValidationError::DuplicateId {
            id: "living_room".to_string(),
            context: "zones".to_string(),
        })
    );
}

#[test]
fn circuit_may_reference_unknown_zone() {
    let mut config = house();
    config.circuits[0].zones.push("garage".to_string());
    validate_config(&config).unwrap();
}

#[test]
fn zero_average_window_is_rejected() {
    let mut config = house();
    config.zones[0].pid.average_samples = 0;
    assert!(matches!(
        validate_config(&config),
        Err(ValidationError::InvalidValue { .. })
    ));
}

#[test]
fn future_version_is_rejected() {
    let yaml = "version: 99\nname: House\n";
    let err = config_from_yaml_str(yaml).unwrap_err();
    assert!(matches!(
        err,
        ProjectError::Validation(ValidationError::UnsupportedVersion { version: 99 })
    ));
}

#[test]
fn negative_preset_gain_is_rejected() {
    let mut snapshot = ZoneSnapshot::default();
    snapshot.climate.presets.insert(
        "away".to_string(),
        PresetSnapshot {
            ki: Some(-0.1),
            ..PresetSnapshot::default()
        },
    );
    assert!(validate_zone_snapshot(&snapshot).is_err());
}

#[test]
fn unknown_hvac_mode_in_snapshot_fails_to_parse() {
    let json = r#"{ "zones": { "attic": { "hvac_mode": "cool" } } }"#;
    assert!(serde_json::from_str::<SnapshotSet>(json).is_err());
}

#[test]
fn intervals_longer_than_a_day_are_rejected() {
    let cases: [fn(&mut HubConfig); 4] = [
        |c| c.tick_interval_s = 1.0e19,
        |c| c.boiler_grace_s = 1.0e19,
        |c| c.zones[0].sensor_grace_s = 1.0e19,
        |c| c.zones[0].window_warmup_s = MAX_INTERVAL_S + 1.0,
    ];
    for apply in cases {
        let mut config = house();
        apply(&mut config);
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    let yaml = r#"
name: House
zones:
  - name: Office
    regulator_type: PID
    temperature_sensor: sensor.office
    sensor_grace_s: 1.0e19
"#;
    assert!(matches!(
        config_from_yaml_str(yaml),
        Err(ProjectError::Validation(ValidationError::InvalidValue { .. }))
    ));

    let mut config = house();
    config.zones[0].window_warmup_s = MAX_INTERVAL_S;
    validate_config(&config).unwrap();
}
